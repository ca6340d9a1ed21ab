use axum::extract::{Path, State};
use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use super::{export_html, ExportFile};
use crate::errors::AppError;
use crate::form::Notice;
use crate::session::handlers::find_session;
use crate::state::AppState;

pub const HTML_SUCCESS: &str = "HTML portfolio downloaded!";

/// POST /api/v1/sessions/:id/export/html
pub async fn handle_export_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ExportFile, AppError> {
    let handle = find_session(&state, id).await?;
    let file = {
        let mut session = handle.lock().await;
        // a debounced edit may not have reached the preview yet
        handle.refresh_preview(&mut session);
        let file = export_html(&session.preview, &session.form, Utc::now().year());
        session.notify(Notice::success(HTML_SUCCESS));
        file
    };
    info!(session_id = %id, filename = %file.filename, "HTML exported");
    Ok(file)
}

/// POST /api/v1/sessions/:id/export/pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ExportFile, AppError> {
    let handle = find_session(&state, id).await?;
    let _ticket = handle.begin_export().ok_or(AppError::ExportInProgress)?;

    let (preview, profession) = {
        let mut session = handle.lock().await;
        handle.refresh_preview(&mut session);
        (session.preview.clone(), session.form.profile.profession.clone())
    };

    match state.pdf.export(&preview, &profession).await {
        Ok(outcome) => {
            handle.notify(Notice::success(outcome.strategy.notice())).await;
            Ok(outcome.file)
        }
        Err(e) => {
            handle.notify(Notice::error(e.to_string())).await;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::build_router;
    use crate::session::Render;

    async fn post(state: &AppState, uri: &str) -> Response {
        build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn open(state: &AppState) -> Uuid {
        state.sessions.open(None).await.unwrap().id()
    }

    async fn notice_of(state: &AppState, id: Uuid) -> Option<String> {
        let handle = state.sessions.get(id).await.unwrap();
        handle.view().await.notice.map(|n| n.message)
    }

    #[tokio::test]
    async fn test_html_export_download() {
        let state = AppState::for_tests(false);
        let id = open(&state).await;
        {
            let handle = state.sessions.get(id).await.unwrap();
            handle
                .update(Render::Immediate, |form| {
                    let mut next = form.clone();
                    next.profile.full_name = "Ada Lovelace".into();
                    Ok(next)
                })
                .await
                .unwrap();
        }

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/html")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("ada-lovelace-portfolio.html"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("<title>Ada Lovelace - Portfolio</title>"));
        assert_eq!(notice_of(&state, id).await.as_deref(), Some(HTML_SUCCESS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_html_export_includes_edit_still_in_debounce() {
        let state = AppState::for_tests(false);
        let id = open(&state).await;
        let handle = state.sessions.get(id).await.unwrap();
        handle
            .update(Render::Debounced, |form| {
                let mut next = form.clone();
                next.profile.full_name = "Grace Hopper".into();
                Ok(next)
            })
            .await
            .unwrap();
        assert!(handle.view().await.preview.markup.contains("Your Name"));

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/html")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("<title>Grace Hopper - Portfolio</title>"));
        assert!(page.contains(r#"<h1 class="portfolio-name">Grace Hopper</h1>"#));
        assert!(!page.contains("Your Name"));
    }

    #[tokio::test]
    async fn test_pdf_export_raster_path() {
        let state = AppState::for_tests(false);
        let id = open(&state).await;

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/pdf")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            notice_of(&state, id).await.as_deref(),
            Some("PDF downloaded successfully!")
        );
        let handle = state.sessions.get(id).await.unwrap();
        assert!(!handle.is_exporting());
    }

    #[tokio::test]
    async fn test_pdf_export_falls_back_to_text() {
        let state = AppState::for_tests(true);
        let id = open(&state).await;

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/pdf")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            notice_of(&state, id).await.as_deref(),
            Some("PDF downloaded (text version).")
        );
    }

    #[tokio::test]
    async fn test_pdf_export_total_failure_is_bad_gateway() {
        let state = AppState::for_tests_with(true, true);
        let id = open(&state).await;

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/pdf")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "EXPORT_FAILED");
        assert_eq!(
            notice_of(&state, id).await.as_deref(),
            Some("PDF generation failed completely. Please use HTML download.")
        );
        assert!(!state.sessions.get(id).await.unwrap().is_exporting());
    }

    #[tokio::test]
    async fn test_second_pdf_export_while_pending_is_rejected() {
        let state = AppState::for_tests(false);
        let id = open(&state).await;
        let handle = state.sessions.get(id).await.unwrap();

        let ticket = handle.begin_export().unwrap();
        let response = post(&state, &format!("/api/v1/sessions/{id}/export/pdf")).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        drop(ticket);

        let response = post(&state, &format!("/api/v1/sessions/{id}/export/pdf")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
