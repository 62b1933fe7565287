//! Editor and server configuration.
//!
//! The editor timings are plain constants with no synchronization meaning;
//! they only shape how often the backend is hit.

use std::time::Duration;

/// Quiet period before an auto-save fires.
pub const AUTOSAVE_QUIET_MS: u64 = 2000;

/// Delay before an export reads the block list, so a pending save can land.
pub const EXPORT_SETTLE_MS: u64 = 600;

/// Snapshots kept by the canvas history.
pub const HISTORY_CAPACITY: usize = 50;

pub const ZOOM_MIN: u32 = 25;
pub const ZOOM_MAX: u32 = 200;

/// Fixed canvas resolution used for new scenes and PNG export.
pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 1000;

/// Offset applied to duplicated canvas objects.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Tunables shared by the block editor, canvas editor and auto-saver.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub autosave: bool,
    pub autosave_quiet: Duration,
    pub export_settle: Duration,
    pub history_capacity: usize,
    pub zoom_min: u32,
    pub zoom_max: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub duplicate_offset: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            autosave_quiet: Duration::from_millis(AUTOSAVE_QUIET_MS),
            export_settle: Duration::from_millis(EXPORT_SETTLE_MS),
            history_capacity: HISTORY_CAPACITY,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            duplicate_offset: DUPLICATE_OFFSET,
        }
    }
}

/// Connection settings for the hosted REST backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub url: String,
    /// Anonymous or service API key, sent as `apikey` and bearer token
    pub api_key: String,
    /// Table holding page rows
    pub table: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Hosted backend; `None` keeps pages in memory
    pub backend: Option<BackendConfig>,
    pub editor: EditorConfig,
}

impl ServerConfig {
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            backend: None,
            editor: EditorConfig::default(),
        }
    }
}
