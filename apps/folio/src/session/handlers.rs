use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{Render, SessionHandle, SessionView};
use crate::errors::AppError;
use crate::form::fields::set_field;
use crate::form::{FieldId, Notice, Sample};
use crate::models::{FieldValue, NavItem, SectionKind, TagKind, TemplateId, Theme};
use crate::preview::PreviewDocument;
use crate::state::AppState;

pub const GENERATE_SUCCESS: &str = "Portfolio generated successfully!";

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    /// Resume this session instead of starting a new one.
    pub session_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ValueBody {
    pub value: FieldValue,
}

#[derive(Deserialize)]
pub struct TagBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct LevelBody {
    pub level: i64,
}

#[derive(Deserialize)]
pub struct ThemeBody {
    pub theme: String,
}

#[derive(Deserialize)]
pub struct NavItemsBody {
    /// Empty restores the default anchors.
    pub items: Vec<NavItem>,
}

pub(crate) async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

async fn view_of(handle: &SessionHandle) -> Json<SessionView> {
    Json(handle.view().await)
}

// ────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let handle = state.sessions.open(req.session_id).await?;
    Ok((StatusCode::CREATED, view_of(&handle).await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    Ok(view_of(&handle).await)
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!(session_id = %id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Field store, sections, tags
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/fields/:field
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(body): Json<ValueBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let field: FieldId = field.parse()?;
    handle
        .update(Render::for_field(field), |form| set_field(form, field, body.value))
        .await?;
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/sections/:kind
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let handle = find_session(&state, id).await?;
    let kind: SectionKind = kind.parse()?;
    handle
        .update(Render::Immediate, |form| Ok(form.add_entry(kind)))
        .await?;
    Ok((StatusCode::CREATED, view_of(&handle).await))
}

/// DELETE /api/v1/sessions/:id/sections/:kind/:index
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((id, kind, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let kind: SectionKind = kind.parse()?;
    handle
        .update(Render::Immediate, |form| form.remove_entry(kind, index))
        .await?;
    Ok(view_of(&handle).await)
}

/// PUT /api/v1/sessions/:id/sections/:kind/:index/:field
pub async fn handle_set_entry_field(
    State(state): State<AppState>,
    Path((id, kind, index, field)): Path<(Uuid, String, usize, String)>,
    Json(body): Json<ValueBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let kind: SectionKind = kind.parse()?;
    handle
        .update(Render::for_entry_field(&field), |form| {
            form.set_entry_field(kind, index, &field, body.value)
        })
        .await?;
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/tags/:collection
pub async fn handle_add_tag(
    State(state): State<AppState>,
    Path((id, collection)): Path<(Uuid, String)>,
    Json(body): Json<TagBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let kind: TagKind = collection.parse()?;
    handle
        .update(Render::Immediate, |form| form.add_tag(kind, &body.name))
        .await?;
    Ok(view_of(&handle).await)
}

/// DELETE /api/v1/sessions/:id/tags/:collection/:name
pub async fn handle_remove_tag(
    State(state): State<AppState>,
    Path((id, collection, name)): Path<(Uuid, String, String)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let kind: TagKind = collection.parse()?;
    handle
        .update(Render::Immediate, |form| form.remove_tag(kind, &name))
        .await?;
    Ok(view_of(&handle).await)
}

/// PUT /api/v1/sessions/:id/skills/:name/level
pub async fn handle_set_skill_level(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    Json(body): Json<LevelBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    handle
        .update(Render::Immediate, |form| form.set_skill_level(&name, body.level))
        .await?;
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/template/:template
pub async fn handle_select_template(
    State(state): State<AppState>,
    Path((id, template)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let template: TemplateId = template.parse()?;
    handle
        .update(Render::Immediate, |form| {
            set_field(
                form,
                FieldId::TemplateSelect,
                FieldValue::Text(template.as_str().to_string()),
            )
        })
        .await?;
    handle
        .notify(Notice::success(format!(
            "\"{}\" template selected!",
            template.display_name()
        )))
        .await;
    Ok(view_of(&handle).await)
}

/// PUT /api/v1/sessions/:id/export/nav-items
pub async fn handle_set_nav_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NavItemsBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    handle
        .update(Render::Immediate, |form| form.set_nav_items(body.items))
        .await?;
    Ok(view_of(&handle).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Wizard
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/wizard/next
pub async fn handle_wizard_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    {
        let mut guard = handle.lock().await;
        let session = &mut *guard;
        session.wizard.next(&session.form, Utc::now())?;
    }
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/wizard/back
pub async fn handle_wizard_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    handle.lock().await.wizard.back();
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/wizard/step/:step
pub async fn handle_wizard_go_to(
    State(state): State<AppState>,
    Path((id, step)): Path<(Uuid, u8)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    {
        let mut guard = handle.lock().await;
        let session = &mut *guard;
        session.wizard.go_to(step, &session.form, Utc::now())?;
    }
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/wizard/generate
pub async fn handle_wizard_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    {
        let mut guard = handle.lock().await;
        let session = &mut *guard;
        session.wizard.generate(&session.form, Utc::now())?;
        handle.refresh_preview(session);
        session.notify(Notice::success(GENERATE_SUCCESS));
    }
    info!(session_id = %id, "Portfolio generated");
    Ok(view_of(&handle).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Samples, reset, theme, preview
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/samples/:sample
pub async fn handle_load_sample(
    State(state): State<AppState>,
    Path((id, sample)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let sample: Sample = sample.parse()?;
    handle
        .update(Render::Immediate, |form| Ok(sample.apply(form)))
        .await?;
    handle.notify(Notice::success(sample.loaded_message())).await;
    info!(session_id = %id, sample = sample.as_str(), "Example profile loaded");
    Ok(view_of(&handle).await)
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    handle.reset().await?;
    Ok(view_of(&handle).await)
}

/// PUT /api/v1/sessions/:id/theme
pub async fn handle_set_theme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let theme: Theme = body.theme.parse()?;
    handle.set_theme(theme).await?;
    Ok(view_of(&handle).await)
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewDocument>, AppError> {
    let handle = find_session(&state, id).await?;
    let preview = handle.lock().await.preview.clone();
    Ok(Json(preview))
}
