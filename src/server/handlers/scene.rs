//! Canvas scene preview.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::canvas::Scene;
use crate::share;

use super::super::state::AppState;
use super::{ApiError, error_response};

/// POST /api/scene/preview - Rasterize a scene snapshot to PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let scene = Scene::from_snapshot(&body).map_err(error_response)?;
    let png_bytes = share::scene_png(scene, &state.assets)
        .await
        .map_err(error_response)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}
