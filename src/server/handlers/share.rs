//! Public sharing view.
//!
//! Only published pages are visible; drafts answer 404 like unknown ids.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::persist::{PageContent, PageId};
use crate::share;

use super::super::state::AppState;
use super::error_response;

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><body><h1>Page not found</h1></body></html>"),
    )
        .into_response()
}

async fn published(state: &AppState, id: &str) -> Result<Option<PageContent>, Response> {
    let content = state
        .store
        .load(&PageId::new(id))
        .await
        .map_err(|e| error_response(e).into_response())?;
    Ok(content.filter(PageContent::is_published))
}

/// GET /share/:id - Read-only HTML page.
pub async fn page(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match published(&state, &id).await {
        Ok(Some(content)) => {
            let scene_url = format!("/share/{}/scene.png", id);
            Html(share::render_page_html(&content, Some(&scene_url))).into_response()
        }
        Ok(None) => not_found(),
        Err(response) => response,
    }
}

/// GET /share/:id/scene.png - The page's canvas as PNG.
pub async fn scene_png(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let scene = match published(&state, &id).await {
        Ok(Some(content)) => match content.scene {
            Some(scene) => scene,
            None => return not_found(),
        },
        Ok(None) => return not_found(),
        Err(response) => return response,
    };
    match share::scene_png(scene, &state.assets).await {
        Ok(png_bytes) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "public, max-age=60"),
            ],
            png_bytes,
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
