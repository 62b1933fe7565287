//! Block import API.

use axum::Json;
use serde::Serialize;

use crate::blocks::{Block, IdGenerator, editor::parse_blocks};

use super::{ApiError, error_response};

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub count: usize,
    /// Normalized blocks: ids assigned, irrelevant fields dropped.
    pub blocks: Vec<Block>,
}

/// POST /api/blocks/import - Validate and normalize a block export.
///
/// The body is read as raw text so malformed JSON is reported the same way
/// as a structurally invalid block.
pub async fn import(body: String) -> Result<Json<ImportResponse>, ApiError> {
    let mut ids = IdGenerator::new();
    let blocks = parse_blocks(&body, || ids.next_id()).map_err(error_response)?;
    Ok(Json(ImportResponse {
        count: blocks.len(),
        blocks,
    }))
}
