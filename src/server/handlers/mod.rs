//! HTTP handlers for the server.

pub mod blocks;
pub mod pages;
pub mod scene;
pub mod share;
pub mod templates;
pub mod uploads;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::MemoriaError;

/// Error half of every JSON handler result.
pub type ApiError = (StatusCode, Json<Value>);

/// Map a library error onto a status code and JSON body.
///
/// Validation failures carry a per-field map under `fields`.
pub fn error_response(err: MemoriaError) -> ApiError {
    let status = match &err {
        MemoriaError::Parse(_) | MemoriaError::Json(_) | MemoriaError::Asset(_) => {
            StatusCode::BAD_REQUEST
        }
        MemoriaError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MemoriaError::NotFound(_) => StatusCode::NOT_FOUND,
        MemoriaError::Persistence(_) => StatusCode::BAD_GATEWAY,
        MemoriaError::Render(_) | MemoriaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(status = status.as_u16(), error = %err, "request failed");
    }
    let body = match err {
        MemoriaError::Validation(fields) => json!({
            "success": false,
            "error": "Validation failed",
            "fields": fields,
        }),
        other => json!({"success": false, "error": other.to_string()}),
    };
    (status, Json(body))
}
