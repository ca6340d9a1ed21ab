use axum::Json;

use crate::models::customization::{template_catalog, TemplateInfo};

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(template_catalog())
}
