// Live editing sessions. Each session owns its form, wizard position,
// notice slot and last composed preview behind one async mutex; preview
// re-composition and persistence run from debounced background tasks.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::debounce::Debouncer;
use crate::form::{FieldError, FieldId, Notice, NotificationCenter, Wizard};
use crate::models::{FormError, FormState, Theme};
use crate::preview::{compose, PreviewDocument, SectionGating};
use crate::storage::{snapshot, KvStore, StorageError};

pub const RESET_SUCCESS: &str = "Form reset successfully!";

pub struct Session {
    pub form: FormState,
    pub wizard: Wizard,
    pub notices: NotificationCenter,
    /// What the compositor last produced. Exports bring it up to date first.
    pub preview: PreviewDocument,
    pub theme: Theme,
}

impl Session {
    fn new(form: FormState, theme: Theme, gating: SectionGating) -> Self {
        let preview = compose(&form, gating);
        Self {
            form,
            wizard: Wizard::default(),
            notices: NotificationCenter::default(),
            preview,
            theme,
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.post(notice, Utc::now());
    }
}

/// When the preview catches up with a form change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Immediate,
    /// Free-text typing: wait for the preview quiet period.
    Debounced,
}

impl Render {
    pub fn for_field(id: FieldId) -> Self {
        if id.is_free_text() {
            Render::Debounced
        } else {
            Render::Immediate
        }
    }

    pub fn for_entry_field(field: &str) -> Self {
        if crate::form::fields::is_free_text_entry_field(field) {
            Render::Debounced
        } else {
            Render::Immediate
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub gating: SectionGating,
    pub preview_delay: Duration,
    pub persist_delay: Duration,
    /// Sessions untouched for this long are flushed and dropped by the sweep.
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            gating: SectionGating::default(),
            preview_delay: Duration::from_millis(300),
            persist_delay: Duration::from_millis(1000),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub form: FormState,
    pub step: u8,
    pub progress: u8,
    pub preview: PreviewDocument,
    pub notice: Option<Notice>,
    pub field_errors: Vec<FieldError>,
    pub exporting: bool,
    /// A form snapshot is scheduled but not yet written.
    pub unsaved: bool,
    pub theme: Theme,
}

// ────────────────────────────────────────────────────────────────────────────
// Session handle
// ────────────────────────────────────────────────────────────────────────────

pub struct SessionHandle {
    id: Uuid,
    settings: SessionSettings,
    store: Arc<dyn KvStore>,
    state: Mutex<Session>,
    exporting: AtomicBool,
    last_active: std::sync::Mutex<Instant>,
    preview_debounce: Debouncer,
    persist_debounce: Debouncer,
}

/// Held for the duration of one PDF export; dropping it reopens the gate.
pub struct ExportTicket<'a> {
    gate: &'a AtomicBool,
}

impl Drop for ExportTicket<'_> {
    fn drop(&mut self) {
        self.gate.store(false, Ordering::Release);
    }
}

impl SessionHandle {
    fn new(
        id: Uuid,
        session: Session,
        store: Arc<dyn KvStore>,
        settings: SessionSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            settings,
            store,
            state: Mutex::new(session),
            exporting: AtomicBool::new(false),
            last_active: std::sync::Mutex::new(Instant::now()),
            preview_debounce: Debouncer::new(settings.preview_delay),
            persist_debounce: Debouncer::new(settings.persist_delay),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().await
    }

    fn touch(&self) {
        *self.last_seen() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen())
    }

    fn last_seen(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.last_active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `mutate` against the current form and swaps the result in. A
    /// refusal leaves the form untouched and posts the error as a notice,
    /// except for silent refusals, which are reported as success.
    pub async fn update<F>(self: &Arc<Self>, render: Render, mutate: F) -> Result<(), FormError>
    where
        F: FnOnce(&FormState) -> Result<FormState, FormError>,
    {
        let mut session = self.state.lock().await;
        match mutate(&session.form) {
            Ok(next) => {
                session.form = next;
                self.changed(&mut session, render);
                Ok(())
            }
            Err(e) if e.is_silent() => {
                debug!(session_id = %self.id, error = %e, "Ignoring empty input");
                Ok(())
            }
            Err(e) => {
                debug!(session_id = %self.id, code = e.code(), "Mutation refused");
                session.notify(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Call after replacing `session.form` while holding the lock.
    fn changed(self: &Arc<Self>, session: &mut Session, render: Render) {
        match render {
            Render::Immediate => {
                self.preview_debounce.cancel();
                session.preview = compose(&session.form, self.settings.gating);
            }
            Render::Debounced => self.schedule_preview(),
        }
        self.schedule_persist();
    }

    /// Re-composes the preview now, outside of any form change.
    pub fn refresh_preview(&self, session: &mut Session) {
        self.preview_debounce.cancel();
        session.preview = compose(&session.form, self.settings.gating);
    }

    pub async fn notify(&self, notice: Notice) {
        self.state.lock().await.notify(notice);
    }

    fn schedule_preview(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.preview_debounce.schedule(async move {
            let Some(handle) = weak.upgrade() else {
                return;
            };
            let mut session = handle.state.lock().await;
            session.preview = compose(&session.form, handle.settings.gating);
        });
    }

    fn schedule_persist(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.persist_debounce.schedule(async move {
            let Some(handle) = weak.upgrade() else {
                return;
            };
            let form = handle.state.lock().await.form.clone();
            handle.save_snapshot(&form).await;
        });
    }

    async fn save_snapshot(&self, form: &FormState) {
        match snapshot::save_form(self.store.as_ref(), self.id, form).await {
            Ok(()) => debug!(session_id = %self.id, "Form snapshot saved"),
            Err(e) => warn!(session_id = %self.id, error = %e, "Form snapshot failed"),
        }
    }

    /// Writes a scheduled snapshot now instead of after the quiet period.
    /// Does nothing when no write is pending.
    pub async fn flush(&self) {
        let session = self.state.lock().await;
        if !self.persist_debounce.is_pending() {
            return;
        }
        self.persist_debounce.cancel();
        let form = session.form.clone();
        drop(session);
        self.save_snapshot(&form).await;
    }

    /// `None` while another export for this session is still running.
    pub fn begin_export(&self) -> Option<ExportTicket<'_>> {
        self.exporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportTicket {
                gate: &self.exporting,
            })
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Back to an empty form on step 1. The theme survives; the stored form
    /// snapshot does not.
    pub async fn reset(self: &Arc<Self>) -> Result<(), StorageError> {
        {
            let mut session = self.state.lock().await;
            self.persist_debounce.cancel();
            session.form = FormState::default();
            session.wizard.reset();
            self.refresh_preview(&mut session);
            session.notify(Notice::success(RESET_SUCCESS));
        }
        snapshot::clear_form(self.store.as_ref(), self.id).await?;
        info!(session_id = %self.id, "Session reset");
        Ok(())
    }

    /// Stored right away; the theme is not part of the debounced snapshot.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.state.lock().await.theme = theme;
        snapshot::save_theme(self.store.as_ref(), self.id, theme).await
    }

    pub async fn view(&self) -> SessionView {
        let now = Utc::now();
        let session = self.state.lock().await;
        SessionView {
            session_id: self.id,
            form: session.form.clone(),
            step: session.wizard.step(),
            progress: session.wizard.progress_percent(),
            preview: session.preview.clone(),
            notice: session.notices.visible(now).cloned(),
            field_errors: session.wizard.active_errors(now),
            exporting: self.is_exporting(),
            unsaved: self.persist_debounce.is_pending(),
            theme: session.theme,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    store: Arc<dyn KvStore>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KvStore>, settings: SessionSettings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            settings,
        }
    }

    /// Starts a fresh session, or picks up `resume` from memory or from the
    /// stored snapshot. An id with nothing stored starts empty under that id.
    pub async fn open(&self, resume: Option<Uuid>) -> Result<Arc<SessionHandle>, StorageError> {
        let Some(id) = resume else {
            let id = Uuid::new_v4();
            let session = Session::new(FormState::default(), Theme::default(), self.settings.gating);
            let handle = SessionHandle::new(id, session, self.store.clone(), self.settings);
            self.sessions.write().await.insert(id, handle.clone());
            info!(session_id = %id, "Session created");
            return Ok(handle);
        };

        if let Some(existing) = self.get(id).await {
            return Ok(existing);
        }

        let form = snapshot::load_form(self.store.as_ref(), id).await?;
        let theme = snapshot::load_theme(self.store.as_ref(), id).await?;
        let restored = form.is_some();
        let session = Session::new(form.unwrap_or_default(), theme, self.settings.gating);

        let mut sessions = self.sessions.write().await;
        // another request may have restored the same id meanwhile
        let handle = sessions
            .entry(id)
            .or_insert_with(|| SessionHandle::new(id, session, self.store.clone(), self.settings))
            .clone();
        handle.touch();
        info!(session_id = %id, restored, "Session resumed");
        Ok(handle)
    }

    /// Looks up a live session and marks it active.
    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.read().await.get(&id).cloned()?;
        handle.touch();
        Some(handle)
    }

    /// Drops the in-memory session after writing any pending snapshot.
    /// Stored snapshots are kept.
    pub async fn remove(&self, id: Uuid) -> bool {
        let Some(handle) = self.sessions.write().await.remove(&id) else {
            return false;
        };
        handle.flush().await;
        true
    }

    /// Flushes and drops every session idle for longer than the configured
    /// timeout. Sessions with an export in flight are left alone.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let evicted: Vec<Arc<SessionHandle>> = {
            let mut sessions = self.sessions.write().await;
            let idle: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, h)| !h.is_exporting() && h.idle_for(now) >= self.settings.idle_timeout)
                .map(|(id, _)| *id)
                .collect();
            idle.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for handle in &evicted {
            handle.flush().await;
            debug!(session_id = %handle.id, "Idle session evicted");
        }
        evicted.len()
    }

    /// Runs `evict_idle` every `period`, forever.
    pub async fn sweep_idle(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = self.evict_idle().await;
            if evicted > 0 {
                info!(evicted, "Idle sessions evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::fields::set_field;
    use crate::form::notice::Severity;
    use crate::models::{FieldValue, SectionKind, TagKind};
    use crate::storage::MemoryStore;

    fn registry(store: Arc<MemoryStore>) -> SessionRegistry {
        SessionRegistry::new(store, SessionSettings::default())
    }

    fn set_text(id: FieldId, value: &str) -> impl FnOnce(&FormState) -> Result<FormState, FormError> {
        let value = FieldValue::Text(value.to_string());
        move |form| set_field(form, id, value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_text_preview_waits_for_quiet_period() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();

        handle
            .update(Render::Debounced, set_text(FieldId::FullName, "Ada"))
            .await
            .unwrap();
        assert!(handle.view().await.preview.markup.contains("Your Name"));

        tokio::time::sleep(Duration::from_millis(350)).await;
        let view = handle.view().await;
        assert!(view.preview.markup.contains("Ada"));
        assert!(!view.preview.markup.contains("Your Name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_render_for_structural_change() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();

        handle
            .update(Render::Immediate, |form| {
                set_field(form, FieldId::TemplateSelect, FieldValue::Text("modern".into()))
            })
            .await
            .unwrap();
        assert!(handle.view().await.preview.markup.contains("template-modern"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusal_posts_notice_and_keeps_form() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();

        let err = handle
            .update(Render::Immediate, |form| form.remove_entry(SectionKind::Education, 0))
            .await
            .unwrap_err();
        assert_eq!(err, FormError::LastEntry(SectionKind::Education));

        let view = handle.view().await;
        assert_eq!(view.form.section_len(SectionKind::Education), 1);
        let notice = view.notice.unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(
            notice.message,
            "Cannot remove the last education section. Clear fields if not needed."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_tag_is_silent() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();

        handle
            .update(Render::Immediate, |form| form.add_tag(TagKind::Skills, "   "))
            .await
            .unwrap();
        let view = handle.view().await;
        assert_eq!(view.form.tag_len(TagKind::Skills), 0);
        assert!(view.notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_persists_latest_state_once_quiet() {
        let store = Arc::new(MemoryStore::new());
        let sessions = registry(store.clone());
        let handle = sessions.open(None).await.unwrap();
        let key = snapshot::form_key(handle.id());

        for name in ["A", "Ad", "Ada"] {
            handle
                .update(Render::Debounced, set_text(FieldId::FullName, name))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(handle.view().await.unsaved);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!handle.view().await.unsaved);
        let restored = snapshot::load_form(store.as_ref(), handle.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored.profile.full_name, "Ada");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_restores_form_and_theme_from_store() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        let mut form = FormState::default();
        form.profile.full_name = "Grace Hopper".into();
        snapshot::save_form(store.as_ref(), id, &form).await.unwrap();
        snapshot::save_theme(store.as_ref(), id, Theme::Dark).await.unwrap();

        let sessions = registry(store);
        let handle = sessions.open(Some(id)).await.unwrap();
        assert_eq!(handle.id(), id);
        let view = handle.view().await;
        assert_eq!(view.form.profile.full_name, "Grace Hopper");
        assert_eq!(view.theme, Theme::Dark);
        assert!(view.preview.markup.contains("Grace Hopper"));

        let again = sessions.open(Some(id)).await.unwrap();
        assert!(Arc::ptr_eq(&handle, &again));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_form_and_snapshot_but_keeps_theme() {
        let store = Arc::new(MemoryStore::new());
        let sessions = registry(store.clone());
        let handle = sessions.open(None).await.unwrap();

        handle
            .update(Render::Immediate, set_text(FieldId::Profession, "Analyst"))
            .await
            .unwrap();
        handle.set_theme(Theme::Dark).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(snapshot::load_form(store.as_ref(), handle.id())
            .await
            .unwrap()
            .is_some());

        handle.reset().await.unwrap();
        let view = handle.view().await;
        assert_eq!(view.form, FormState::default());
        assert_eq!(view.step, 1);
        assert_eq!(view.theme, Theme::Dark);
        assert_eq!(view.notice.unwrap().message, RESET_SUCCESS);
        assert!(snapshot::load_form(store.as_ref(), handle.id())
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            snapshot::load_theme(store.as_ref(), handle.id()).await.unwrap(),
            Theme::Dark
        );
    }

    #[tokio::test]
    async fn test_export_gate_admits_one_at_a_time() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();

        let ticket = handle.begin_export().unwrap();
        assert!(handle.is_exporting());
        assert!(handle.begin_export().is_none());
        drop(ticket);
        assert!(!handle.is_exporting());
        assert!(handle.begin_export().is_some());
    }

    #[tokio::test]
    async fn test_remove_forgets_session() {
        let sessions = registry(Arc::new(MemoryStore::new()));
        let handle = sessions.open(None).await.unwrap();
        assert!(sessions.remove(handle.id()).await);
        assert!(sessions.get(handle.id()).await.is_none());
        assert!(!sessions.remove(handle.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_writes_pending_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let sessions = registry(store.clone());
        let handle = sessions.open(None).await.unwrap();
        let id = handle.id();

        handle
            .update(Render::Debounced, set_text(FieldId::FullName, "Ada"))
            .await
            .unwrap();
        drop(handle);
        assert!(sessions.remove(id).await);

        let stored = snapshot::load_form(store.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(stored.profile.full_name, "Ada");

        tokio::time::sleep(Duration::from_secs(3)).await;
        let stored = snapshot::load_form(store.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(stored.profile.full_name, "Ada");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_flushed_and_evicted() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionRegistry::new(
            store.clone(),
            SessionSettings {
                idle_timeout: Duration::from_secs(60),
                persist_delay: Duration::from_secs(600),
                ..SessionSettings::default()
            },
        );
        let idle = sessions.open(None).await.unwrap();
        let active = sessions.open(None).await.unwrap();
        let exporting = sessions.open(None).await.unwrap();
        let (idle_id, active_id) = (idle.id(), active.id());
        idle.update(Render::Immediate, set_text(FieldId::FullName, "Ada"))
            .await
            .unwrap();
        let ticket = exporting.begin_export().unwrap();
        drop(idle);
        drop(active);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert!(sessions.get(active_id).await.is_some());
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(sessions.evict_idle().await, 1);
        assert!(sessions.get(idle_id).await.is_none());
        assert!(sessions.get(active_id).await.is_some());
        assert!(sessions.get(exporting.id()).await.is_some());
        let stored = snapshot::load_form(store.as_ref(), idle_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.profile.full_name, "Ada");
        drop(ticket);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_reclaims_abandoned_sessions() {
        let sessions = Arc::new(SessionRegistry::new(
            Arc::new(MemoryStore::new()),
            SessionSettings {
                idle_timeout: Duration::from_secs(60),
                ..SessionSettings::default()
            },
        ));
        let mut ids = Vec::new();
        for _ in 0..100 {
            ids.push(sessions.open(None).await.unwrap().id());
        }

        let sweeper = tokio::spawn(sessions.clone().sweep_idle(Duration::from_secs(15)));
        tokio::time::sleep(Duration::from_secs(90)).await;
        for id in ids {
            assert!(sessions.get(id).await.is_none());
        }
        sweeper.abort();
    }
}
