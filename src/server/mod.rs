//! # HTTP Server for Memorial Pages
//!
//! Serves the editor shell, the JSON API the editor talks to, and the public
//! sharing view.
//!
//! ## Usage
//!
//! ```bash
//! memoria serve --listen 0.0.0.0:8080 --backend-url https://xyz.supabase.co --api-key ...
//! ```
//!
//! Then open http://localhost:8080 in a browser to edit a page.
//!
//! ## Routes
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Editor shell |
//! | `GET /api/templates` | Template library |
//! | `POST /api/blocks/import` | Validate and normalize a block export |
//! | `GET/POST/PUT /api/pages` | Page load and save |
//! | `POST /api/scene/preview` | Scene snapshot to PNG |
//! | `POST /api/uploads` | Image upload, answered with a data URI |
//! | `GET /share/:id` | Read-only page |
//! | `GET /share/:id/scene.png` | Page canvas as PNG |

mod handlers;
mod state;
mod static_files;

pub use crate::config::ServerConfig;
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::MemoriaError;
use state::CACHE_EXPIRATION_SECS;

/// Upload and page bodies may carry data URIs.
const BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Build the router for a prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        .route("/assets/*path", get(static_files::asset_handler))
        // Templates and blocks
        .route("/api/templates", get(handlers::templates::list))
        .route("/api/templates/:name", get(handlers::templates::get))
        .route("/api/blocks/import", post(handlers::blocks::import))
        // Pages
        .route("/api/pages", post(handlers::pages::create))
        .route(
            "/api/pages/:id",
            get(handlers::pages::get).put(handlers::pages::update),
        )
        // Canvas
        .route("/api/scene/preview", post(handlers::scene::preview))
        .route("/api/uploads", post(handlers::uploads::upload))
        // Sharing view
        .route("/share/:id", get(handlers::share::page))
        .route("/share/:id/scene.png", get(handlers::share::scene_png))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use memoria::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), memoria::MemoriaError> {
/// serve(ServerConfig::new("0.0.0.0:8080")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), MemoriaError> {
    let app_state = Arc::new(AppState::new(config.clone())?);

    // Spawn background cache cleanup task
    tokio::spawn(cleanup_caches(app_state.clone()));

    let app = router(app_state.clone());

    info!(
        listen = %config.listen_addr,
        adapter = app_state.store.name(),
        "memoria HTTP server starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task to clean up expired image cache entries.
async fn cleanup_caches(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(CACHE_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let removed = state.assets.cleanup(expiration).await;
        if removed > 0 {
            let remaining = state.image_cache.read().await.len();
            info!(removed, remaining, "cleaned up expired image cache entries");
        }
    }
}
