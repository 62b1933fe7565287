//! Page load/save API handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::MemoriaError;
use crate::persist::{PageContent, PageId};

use super::super::state::AppState;
use super::{ApiError, error_response};

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub id: PageId,
}

/// Parse a page body, reporting problems as a parse error (400).
fn parse_page(body: &str) -> Result<PageContent, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| error_response(MemoriaError::Parse(format!("invalid page: {}", e))))
}

/// GET /api/pages/:id - Load a page.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PageContent>, ApiError> {
    let id = PageId::new(id);
    match state.store.load(&id).await.map_err(error_response)? {
        Some(content) => Ok(Json(content)),
        None => Err(error_response(MemoriaError::NotFound(id.to_string()))),
    }
}

/// POST /api/pages - Create a page; the backend assigns the id.
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let content = parse_page(&body)?;
    content.validate().map_err(error_response)?;
    let id = state
        .store
        .save(None, &content)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(SaveResponse { success: true, id }),
    ))
}

/// PUT /api/pages/:id - Overwrite an existing page.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<SaveResponse>, ApiError> {
    let content = parse_page(&body)?;
    content.validate().map_err(error_response)?;
    let id = state
        .store
        .save(Some(&PageId::new(id)), &content)
        .await
        .map_err(error_response)?;
    Ok(Json(SaveResponse { success: true, id }))
}
