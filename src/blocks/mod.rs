//! # Block Model
//!
//! A memorial page is an ordered list of blocks. Each [`Block`] pairs a stable
//! id with a [`BlockKind`], a tagged union whose variants carry only the
//! fields meaningful for that type.
//!
//! On the wire a block is one flat object with the keys
//! `id, type, content, level, url, alt`. Absent optionals are omitted:
//!
//! ```
//! use memoria::blocks::{Block, BlockId, BlockKind, Heading};
//!
//! let block = Block::new(BlockId::from("1700000000000"), BlockKind::Heading(Heading {
//!     content: "<h1>In loving memory</h1>".into(),
//!     level: 1,
//! }));
//! let json = serde_json::to_string(&block).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"id":"1700000000000","type":"heading","content":"<h1>In loving memory</h1>","level":1}"#
//! );
//! ```

pub mod drag;
pub mod editor;
pub mod html;
pub mod templates;

pub use drag::{DragSource, DragState, DropOutcome, DropTarget};
pub use editor::{BlockEditor, BlockPatch};

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDS
// ============================================================================

/// Opaque block identifier, stable for the block's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creation-timestamp ids.
///
/// The id is the current time in milliseconds. Ids minted within the same
/// millisecond get a `-N` suffix so one generator never repeats itself.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: i64,
    seq: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> BlockId {
        self.next_at(chrono::Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, millis: i64) -> BlockId {
        // Clock going backwards still yields a fresh suffix.
        if millis <= self.last_millis {
            self.seq += 1;
            BlockId(format!("{}-{}", self.last_millis, self.seq))
        } else {
            self.last_millis = millis;
            self.seq = 0;
            BlockId(millis.to_string())
        }
    }
}

// ============================================================================
// BLOCK TYPES
// ============================================================================

/// Metadata every block variant provides for the editor palette.
pub trait BlockMeta: Sized {
    /// Display label (e.g. "Heading").
    fn label() -> &'static str;

    /// Starter value used by "add block". Carries placeholder content so a
    /// new block is visible on the page, not empty.
    fn editor_default() -> Self;
}

/// Heading block: rich-text content rendered at `level` (1–6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub content: String,
    pub level: u8,
}

impl BlockMeta for Heading {
    fn label() -> &'static str { "Heading" }
    fn editor_default() -> Self {
        Self { content: "New Heading".into(), level: 1 }
    }
}

/// Paragraph of rich text (HTML).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub content: String,
}

impl BlockMeta for TextBlock {
    fn label() -> &'static str { "Text" }
    fn editor_default() -> Self {
        Self { content: "<p>Share a memory...</p>".into() }
    }
}

/// Picture from a remote URL or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageBlock {
    pub url: Option<String>,
    pub alt: Option<String>,
}

impl BlockMeta for ImageBlock {
    fn label() -> &'static str { "Image" }
    fn editor_default() -> Self {
        Self::default()
    }
}

/// Video link (YouTube, Vimeo or a direct file URL).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoBlock {
    pub url: Option<String>,
}

impl BlockMeta for VideoBlock {
    fn label() -> &'static str { "Video" }
    fn editor_default() -> Self {
        Self::default()
    }
}

/// The closed set of block types, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Heading,
    Text,
    Image,
    Video,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Heading,
        BlockType::Text,
        BlockType::Image,
        BlockType::Video,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Video => "video",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockType::Heading => Heading::label(),
            BlockType::Text => TextBlock::label(),
            BlockType::Image => ImageBlock::label(),
            BlockType::Video => VideoBlock::label(),
        }
    }

    /// Payload used by "add block" for this type.
    pub fn editor_default(self) -> BlockKind {
        match self {
            BlockType::Heading => BlockKind::Heading(Heading::editor_default()),
            BlockType::Text => BlockKind::Text(TextBlock::editor_default()),
            BlockType::Image => BlockKind::Image(ImageBlock::editor_default()),
            BlockType::Video => BlockKind::Video(VideoBlock::editor_default()),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block payload, one variant per [`BlockType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Heading(Heading),
    Text(TextBlock),
    Image(ImageBlock),
    Video(VideoBlock),
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Heading(_) => BlockType::Heading,
            BlockKind::Text(_) => BlockType::Text,
            BlockKind::Image(_) => BlockType::Image,
            BlockKind::Video(_) => BlockType::Video,
        }
    }
}

/// One unit of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self { id, kind }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }
}

// ============================================================================
// WIRE SHAPE
// ============================================================================

pub const MIN_HEADING_LEVEL: u8 = 1;
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Flat JSON shape shared by export, import and the backend.
///
/// Field order here is the serialized key order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RawBlock {
    /// Convert to a typed block, assigning an id from `fresh_id` when the
    /// payload has none. Fields irrelevant to the type are dropped.
    pub(crate) fn into_block(
        self,
        fresh_id: impl FnOnce() -> BlockId,
    ) -> Result<Block, String> {
        let block_type = BlockType::parse(&self.block_type)
            .ok_or_else(|| format!("unknown block type '{}'", self.block_type))?;

        let kind = match block_type {
            BlockType::Heading => {
                let level = match self.level {
                    None => MIN_HEADING_LEVEL,
                    Some(l) if (MIN_HEADING_LEVEL as i64..=MAX_HEADING_LEVEL as i64).contains(&l) => {
                        l as u8
                    }
                    Some(l) => return Err(format!("heading level {} is outside 1-6", l)),
                };
                BlockKind::Heading(Heading {
                    content: self.content.unwrap_or_default(),
                    level,
                })
            }
            BlockType::Text => BlockKind::Text(TextBlock {
                content: self.content.unwrap_or_default(),
            }),
            BlockType::Image => BlockKind::Image(ImageBlock {
                url: self.url,
                alt: self.alt,
            }),
            BlockType::Video => BlockKind::Video(VideoBlock { url: self.url }),
        };

        let id = match self.id {
            Some(id) if !id.is_empty() => BlockId(id),
            _ => fresh_id(),
        };

        Ok(Block { id, kind })
    }
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "block is missing an 'id'".to_string())?;
        raw.into_block(|| BlockId(id))
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let mut raw = RawBlock {
            id: Some(block.id.0),
            block_type: block.kind.block_type().as_str().to_string(),
            ..Default::default()
        };
        match block.kind {
            BlockKind::Heading(h) => {
                raw.content = Some(h.content);
                raw.level = Some(h.level as i64);
            }
            BlockKind::Text(t) => raw.content = Some(t.content),
            BlockKind::Image(i) => {
                raw.url = i.url;
                raw.alt = i.alt;
            }
            BlockKind::Video(v) => raw.url = v.url,
        }
        raw
    }
}

// ============================================================================
// PALETTE METADATA
// ============================================================================

/// Block type metadata for the editor palette.
#[derive(Debug, Clone, Serialize)]
pub struct BlockTypeMeta {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub label: &'static str,
}

/// All block types in palette order.
pub fn block_types() -> Vec<BlockTypeMeta> {
    BlockType::ALL
        .iter()
        .map(|t| BlockTypeMeta {
            type_name: t.as_str(),
            label: t.label(),
        })
        .collect()
}
