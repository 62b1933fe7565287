//! Debounced auto-save.
//!
//! ```text
//! mutation ──▶ schedule ──▶ [quiet period] ──▶ save ──▶ Notice
//!                 ▲               │
//!   next mutation ┘ (abort timer) │ save lock held ─▶ dropped
//! ```
//!
//! The timer and the save run as separate tasks: aborting a timer never
//! cancels a save that already started. Every save, timed or manual, holds
//! the saver's lock for its whole request, so at most one request is out at
//! a time. A timer that finds the lock taken drops its save; `save_now`
//! waits for it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{PageContent, PageId, PersistenceAdapter};
use crate::config::EditorConfig;
use crate::error::MemoriaError;

/// Save outcome reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved { id: PageId },
    Failed { message: String },
}

pub struct AutoSaver {
    adapter: Arc<dyn PersistenceAdapter>,
    quiet: Duration,
    enabled: bool,
    lock: Arc<Mutex<()>>,
    pending: Option<JoinHandle<()>>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl AutoSaver {
    /// Create a saver and the receiving end of its notice channel.
    pub fn new(
        adapter: Arc<dyn PersistenceAdapter>,
        config: &EditorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let saver = Self {
            adapter,
            quiet: config.autosave_quiet,
            enabled: config.autosave,
            lock: Arc::new(Mutex::new(())),
            pending: None,
            notices: tx,
        };
        (saver, rx)
    }

    pub fn adapter(&self) -> &Arc<dyn PersistenceAdapter> {
        &self.adapter
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel();
        }
    }

    /// True while a save request is out.
    pub fn is_saving(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// True while a timer is waiting out the quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Restart the quiet-period timer with `content` as the state to save.
    ///
    /// Returns false (nothing scheduled) when auto-save is off or the page
    /// has no id yet.
    pub fn schedule(&mut self, id: Option<&PageId>, content: PageContent) -> bool {
        self.cancel();
        let Some(id) = id.filter(|_| self.enabled).cloned() else {
            return false;
        };

        let adapter = self.adapter.clone();
        let lock = self.lock.clone();
        let notices = self.notices.clone();
        let quiet = self.quiet;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let Ok(guard) = lock.try_lock_owned() else {
                warn!(page = %id, "auto-save dropped: previous save still in flight");
                return;
            };
            tokio::spawn(async move {
                let _guard = guard;
                let notice = run_save(adapter.as_ref(), Some(&id), &content).await;
                let _ = notices.send(notice);
            });
        }));
        debug!(quiet_ms = quiet.as_millis() as u64, "auto-save scheduled");
        true
    }

    /// Save immediately, replacing any pending timer. Waits for an auto-save
    /// already in flight before sending its own request.
    pub async fn save_now(
        &mut self,
        id: Option<&PageId>,
        content: &PageContent,
    ) -> Result<PageId, MemoriaError> {
        self.cancel();
        let _guard = self.lock.clone().lock_owned().await;
        let result = self.adapter.save(id, content).await;
        let notice = match &result {
            Ok(saved) => {
                info!(page = %saved, adapter = self.adapter.name(), "page saved");
                Notice::Saved { id: saved.clone() }
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                Notice::Failed {
                    message: e.to_string(),
                }
            }
        };
        let _ = self.notices.send(notice);
        result
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_save(
    adapter: &dyn PersistenceAdapter,
    id: Option<&PageId>,
    content: &PageContent,
) -> Notice {
    match adapter.save(id, content).await {
        Ok(saved) => {
            info!(page = %saved, adapter = adapter.name(), "auto-saved");
            Notice::Saved { id: saved }
        }
        Err(e) => {
            warn!(error = %e, "auto-save failed");
            Notice::Failed {
                message: e.to_string(),
            }
        }
    }
}
