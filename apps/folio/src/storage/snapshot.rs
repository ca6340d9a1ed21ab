//! Session snapshots on top of a `KvStore`: the form as a flat field map
//! under `folio:{session}:formData`, and the editor theme under
//! `folio:{session}:theme`.

use tracing::warn;
use uuid::Uuid;

use super::{KvStore, StorageError};
use crate::form::fields::{from_field_map, to_field_map};
use crate::form::FieldMap;
use crate::models::{FormState, Theme};

pub fn form_key(session: Uuid) -> String {
    format!("folio:{session}:formData")
}

pub fn theme_key(session: Uuid) -> String {
    format!("folio:{session}:theme")
}

pub async fn save_form(
    store: &dyn KvStore,
    session: Uuid,
    form: &FormState,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(&to_field_map(form))?;
    store.set(&form_key(session), &json).await
}

/// `None` when nothing is stored. A snapshot that no longer parses is
/// treated the same way and logged.
pub async fn load_form(
    store: &dyn KvStore,
    session: Uuid,
) -> Result<Option<FormState>, StorageError> {
    let Some(raw) = store.get(&form_key(session)).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<FieldMap>(&raw) {
        Ok(map) => Ok(Some(from_field_map(&map))),
        Err(e) => {
            warn!(session_id = %session, error = %e, "Discarding unreadable form snapshot");
            Ok(None)
        }
    }
}

pub async fn clear_form(store: &dyn KvStore, session: Uuid) -> Result<(), StorageError> {
    store.remove(&form_key(session)).await
}

pub async fn save_theme(
    store: &dyn KvStore,
    session: Uuid,
    theme: Theme,
) -> Result<(), StorageError> {
    store.set(&theme_key(session), theme.as_str()).await
}

/// Unknown or missing values give the default light theme.
pub async fn load_theme(store: &dyn KvStore, session: Uuid) -> Result<Theme, StorageError> {
    let raw = store.get(&theme_key(session)).await?;
    Ok(raw.and_then(|v| v.parse().ok()).unwrap_or_default())
}
