//! Template API handlers.

use axum::{Json, extract::Path, http::StatusCode};
use serde_json::json;

use crate::blocks::templates::{self, Template};

use super::ApiError;

/// GET /api/templates - List built-in templates with their blocks.
pub async fn list() -> Json<Vec<Template>> {
    Json(templates::all())
}

/// GET /api/templates/:name - One template.
pub async fn get(Path(name): Path<String>) -> Result<Json<Template>, ApiError> {
    templates::by_name(&name).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": format!("Template not found: {}", name)})),
        )
    })
}
