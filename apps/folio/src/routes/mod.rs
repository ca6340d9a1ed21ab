pub mod health;
pub mod templates;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::export::handlers as export;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates", get(templates::handle_list_templates))
        // Sessions
        .route("/api/v1/sessions", post(session::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_close_session),
        )
        // Field store
        .route(
            "/api/v1/sessions/:id/fields/:field",
            put(session::handle_set_field),
        )
        // Dynamic sections
        .route(
            "/api/v1/sessions/:id/sections/:kind",
            post(session::handle_add_entry),
        )
        .route(
            "/api/v1/sessions/:id/sections/:kind/:index",
            delete(session::handle_remove_entry),
        )
        .route(
            "/api/v1/sessions/:id/sections/:kind/:index/:field",
            put(session::handle_set_entry_field),
        )
        // Tag collections
        .route(
            "/api/v1/sessions/:id/tags/:collection",
            post(session::handle_add_tag),
        )
        .route(
            "/api/v1/sessions/:id/tags/:collection/:name",
            delete(session::handle_remove_tag),
        )
        .route(
            "/api/v1/sessions/:id/skills/:name/level",
            put(session::handle_set_skill_level),
        )
        .route(
            "/api/v1/sessions/:id/template/:template",
            post(session::handle_select_template),
        )
        // Wizard
        .route(
            "/api/v1/sessions/:id/wizard/next",
            post(session::handle_wizard_next),
        )
        .route(
            "/api/v1/sessions/:id/wizard/back",
            post(session::handle_wizard_back),
        )
        .route(
            "/api/v1/sessions/:id/wizard/step/:step",
            post(session::handle_wizard_go_to),
        )
        .route(
            "/api/v1/sessions/:id/wizard/generate",
            post(session::handle_wizard_generate),
        )
        .route(
            "/api/v1/sessions/:id/samples/:sample",
            post(session::handle_load_sample),
        )
        .route("/api/v1/sessions/:id/reset", post(session::handle_reset))
        .route("/api/v1/sessions/:id/theme", put(session::handle_set_theme))
        .route(
            "/api/v1/sessions/:id/preview",
            get(session::handle_get_preview),
        )
        // Export
        .route(
            "/api/v1/sessions/:id/export/html",
            post(export::handle_export_html),
        )
        .route(
            "/api/v1/sessions/:id/export/pdf",
            post(export::handle_export_pdf),
        )
        .route(
            "/api/v1/sessions/:id/export/nav-items",
            put(session::handle_set_nav_items),
        )
        .with_state(state)
}
