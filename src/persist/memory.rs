//! In-process page store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{PageContent, PageId, PersistenceAdapter};
use crate::error::MemoriaError;

/// Pages kept in a map; ids are random UUIDs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: RwLock<HashMap<PageId, PageContent>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, id: &PageId) -> Result<Option<PageContent>, MemoriaError> {
        Ok(self.pages.read().await.get(id).cloned())
    }

    async fn save(
        &self,
        id: Option<&PageId>,
        content: &PageContent,
    ) -> Result<PageId, MemoriaError> {
        let mut pages = self.pages.write().await;
        let id = match id {
            Some(id) if pages.contains_key(id) => id.clone(),
            Some(id) => return Err(MemoriaError::NotFound(id.to_string())),
            None => PageId::new(Uuid::new_v4().to_string()),
        };
        let mut stored = content.clone();
        stored.updated_at = Some(Utc::now());
        pages.insert(id.clone(), stored);
        self.saves.fetch_add(1, Ordering::SeqCst);
        debug!(page = %id, blocks = content.blocks.len(), "page stored in memory");
        Ok(id)
    }
}
