//! # Memoria - Memorial Page Editor
//!
//! Memoria is the engine behind a memorial page builder. It provides:
//!
//! - **Block editor**: an ordered list of heading, text, image and video
//!   blocks with templates, drag-and-drop and JSON import/export
//! - **Canvas editor**: a free-form scene of text, images, shapes and icons
//!   with bounded undo/redo and PNG export
//! - **Persistence**: a backend adapter with debounced auto-save
//! - **Sharing**: a read-only HTML rendering of published pages
//! - **Server**: the HTTP API and embedded editor shell
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use memoria::{
//!     blocks::BlockType,
//!     canvas::ShapeKind,
//!     config::EditorConfig,
//!     persist::{MemoryStore, PageMeta},
//!     PageSession,
//! };
//!
//! # async fn example() -> Result<(), memoria::MemoriaError> {
//! let store = Arc::new(MemoryStore::new());
//! let mut session = PageSession::new(store, EditorConfig::default());
//!
//! session.set_meta(PageMeta {
//!     title: "In Loving Memory".into(),
//!     full_name: "Ada Lovelace".into(),
//!     ..PageMeta::default()
//! });
//! session.apply_template("classic");
//! session.add_block(BlockType::Text);
//! session.edit_canvas(|canvas| canvas.add_shape(ShapeKind::Circle));
//!
//! let id = session.save_now().await?;
//! println!("saved page {}", id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Block model, editor, templates and HTML rendering |
//! | [`canvas`] | Scene model, commands, history and rasterizer |
//! | [`persist`] | Page model, backend adapters and auto-save |
//! | [`session`] | One open page tying the editors to persistence |
//! | [`share`] | Read-only page rendering |
//! | [`server`] | HTTP API |
//! | [`config`] | Tunables and server configuration |
//! | [`error`] | Error types |

pub mod blocks;
pub mod canvas;
pub mod config;
pub mod error;
pub mod persist;
pub mod server;
pub mod session;
pub mod share;

// Re-exports for convenience
pub use config::{EditorConfig, ServerConfig};
pub use error::MemoriaError;
pub use session::PageSession;
