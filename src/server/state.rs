//! Server state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::info;

use crate::canvas::AssetResolver;
use crate::canvas::assets::ImageCache;
use crate::config::ServerConfig;
use crate::error::MemoriaError;
use crate::persist::{MemoryStore, PersistenceAdapter, RestStore};

/// Image cache entries idle this long are dropped by the cleanup task.
pub const CACHE_EXPIRATION_SECS: u64 = 30 * 60;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
    pub store: Arc<dyn PersistenceAdapter>,
    pub image_cache: ImageCache,
    pub assets: AssetResolver,
}

impl AppState {
    /// Build state with the adapter the config asks for.
    pub fn new(config: ServerConfig) -> Result<Self, MemoriaError> {
        let store: Arc<dyn PersistenceAdapter> = match &config.backend {
            Some(backend) => {
                info!(url = %backend.url, table = %backend.table, "using REST backend");
                Arc::new(RestStore::new(backend)?)
            }
            None => {
                info!("no backend configured, pages are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: ServerConfig,
        store: Arc<dyn PersistenceAdapter>,
    ) -> Result<Self, MemoriaError> {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let image_cache: ImageCache = Arc::new(RwLock::new(HashMap::new()));
        let assets = AssetResolver::new(image_cache.clone())?;
        Ok(Self {
            config,
            boot_time,
            store,
            image_cache,
            assets,
        })
    }
}
