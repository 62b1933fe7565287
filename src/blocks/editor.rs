//! Block list editor: the ordered, mutable block sequence of one page.

use serde::Deserialize;
use tracing::debug;

use super::drag::{DragSource, DragState, DropAction, DropOutcome, DropTarget};
use super::{Block, BlockId, BlockKind, BlockType, IdGenerator, RawBlock};
use super::{MAX_HEADING_LEVEL, MIN_HEADING_LEVEL};
use crate::error::MemoriaError;

/// Partial field update for [`BlockEditor::update_block`].
///
/// `None` leaves the field untouched. Fields that do not apply to the
/// block's type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlockPatch {
    pub content: Option<String>,
    pub level: Option<u8>,
    pub url: Option<String>,
    pub alt: Option<String>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    fn apply(self, kind: &mut BlockKind) {
        match kind {
            BlockKind::Heading(h) => {
                if let Some(content) = self.content {
                    h.content = content;
                }
                if let Some(level) = self.level {
                    h.level = level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL);
                }
            }
            BlockKind::Text(t) => {
                if let Some(content) = self.content {
                    t.content = content;
                }
            }
            BlockKind::Image(i) => {
                if self.url.is_some() {
                    i.url = self.url;
                }
                if self.alt.is_some() {
                    i.alt = self.alt;
                }
            }
            BlockKind::Video(v) => {
                if self.url.is_some() {
                    v.url = self.url;
                }
            }
        }
    }
}

/// Owns the block sequence of one page.
#[derive(Debug, Default)]
pub struct BlockEditor {
    blocks: Vec<Block>,
    ids: IdGenerator,
    drag: DragState,
    revision: u64,
}

impl BlockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor over an existing sequence (e.g. loaded from the backend).
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Bumped by every mutation that changed the sequence.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Append a block of `block_type` with editor defaults.
    pub fn add_block(&mut self, block_type: BlockType) -> BlockId {
        let id = self.fresh_id();
        self.blocks
            .push(Block::new(id.clone(), block_type.editor_default()));
        self.revision += 1;
        debug!(%id, %block_type, "block added");
        id
    }

    /// Merge `patch` into the block with `id`. Returns false if absent. The
    /// revision only moves when the block actually changed.
    pub fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> bool {
        match self.blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                let before = block.kind.clone();
                patch.apply(&mut block.kind);
                if block.kind != before {
                    self.revision += 1;
                }
                debug!(%id, "block updated");
                true
            }
            None => false,
        }
    }

    /// Remove the block with `id`. Returns false if absent.
    pub fn delete_block(&mut self, id: &BlockId) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.blocks.remove(idx);
                self.revision += 1;
                debug!(%id, "block deleted");
                true
            }
            None => false,
        }
    }

    /// Move `source` to the position currently held by `target`, shifting the
    /// blocks in between by one.
    ///
    /// Returns false (and changes nothing) when the ids are equal or either is
    /// unknown.
    pub fn reorder(&mut self, source: &BlockId, target: &BlockId) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            return false;
        };
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        self.revision += 1;
        debug!(%source, from, to, "block moved");
        true
    }

    /// Replace the whole sequence with a template, giving each block a new id.
    pub fn load_template(&mut self, blocks: &[Block]) {
        let fresh: Vec<Block> = blocks
            .iter()
            .map(|b| Block::new(self.fresh_id(), b.kind.clone()))
            .collect();
        debug!(count = fresh.len(), "template loaded");
        self.blocks = fresh;
        self.revision += 1;
    }

    /// Replace the sequence with blocks as given (ids kept).
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.revision += 1;
    }

    /// Replace the sequence with the blocks encoded in `text`.
    ///
    /// The input must be a JSON array of block objects. On any error the
    /// current sequence is left untouched. Blocks without an id get one.
    pub fn import_json(&mut self, text: &str) -> Result<usize, MemoriaError> {
        let blocks = parse_blocks(text, || self.ids.next_id())?;
        let count = blocks.len();
        self.blocks = blocks;
        self.revision += 1;
        debug!(count, "blocks imported");
        Ok(count)
    }

    /// Deterministic JSON of the current sequence.
    pub fn export_json(&self) -> Result<String, MemoriaError> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Drag and drop
    // ─────────────────────────────────────────────────────────────────────

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn begin_drag(&mut self, source: DragSource) {
        self.drag.start(source);
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Complete the current drag over `target` and apply the resulting edit.
    pub fn drop_on(&mut self, target: DropTarget) -> DropOutcome {
        match self.drag.finish(target) {
            DropAction::Add(block_type) => DropOutcome::Added(self.add_block(block_type)),
            DropAction::Reorder { source, target } => {
                if self.reorder(&source, &target) {
                    DropOutcome::Reordered
                } else {
                    DropOutcome::SnappedBack
                }
            }
            DropAction::SnapBack => DropOutcome::SnappedBack,
        }
    }

    fn fresh_id(&mut self) -> BlockId {
        let mut id = self.ids.next_id();
        // Imported ids share the timestamp format; never hand out a duplicate.
        while self.position(&id).is_some() {
            id = self.ids.next_id();
        }
        id
    }
}

/// Parse a block array, assigning ids from `fresh_id` where missing.
///
/// Errors name the offending element, like `blocks[2]: unknown block type`.
pub fn parse_blocks(
    text: &str,
    mut fresh_id: impl FnMut() -> BlockId,
) -> Result<Vec<Block>, MemoriaError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| MemoriaError::Parse(format!("not valid JSON: {}", e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(MemoriaError::Parse(format!(
                "expected an array of blocks, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut blocks: Vec<Block> = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let raw: RawBlock = serde_json::from_value(item)
            .map_err(|e| MemoriaError::Parse(format!("blocks[{}]: {}", i, e)))?;
        let block = raw
            .into_block(&mut fresh_id)
            .map_err(|e| MemoriaError::Parse(format!("blocks[{}]: {}", i, e)))?;
        if blocks.iter().any(|b| b.id == block.id) {
            return Err(MemoriaError::Parse(format!(
                "blocks[{}]: duplicate id '{}'",
                i, block.id
            )));
        }
        blocks.push(block);
    }
    Ok(blocks)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Heading, ImageBlock};
    use pretty_assertions::assert_eq;

    fn editor_with(ids: &[&str]) -> BlockEditor {
        BlockEditor::with_blocks(
            ids.iter()
                .map(|id| Block::new(BlockId::from(*id), BlockType::Text.editor_default()))
                .collect(),
        )
    }

    fn order(editor: &BlockEditor) -> Vec<&str> {
        editor.blocks().iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn add_heading_uses_level_one() {
        let mut editor = BlockEditor::new();
        let id = editor.add_block(BlockType::Heading);
        assert!(matches!(
            &editor.get(&id).unwrap().kind,
            BlockKind::Heading(Heading { level: 1, content }) if !content.is_empty()
        ));
    }

    #[test]
    fn added_ids_are_unique() {
        let mut editor = BlockEditor::new();
        let ids: Vec<_> = (0..20).map(|_| editor.add_block(BlockType::Text)).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn update_preserves_unspecified_fields_and_position() {
        let mut editor = editor_with(&["a"]);
        let id = editor.add_block(BlockType::Image);
        editor.update_block(&id, BlockPatch::url("https://example.com/p.jpg"));
        editor.update_block(
            &id,
            BlockPatch {
                alt: Some("Portrait".into()),
                ..Default::default()
            },
        );
        assert_eq!(editor.position(&id), Some(1));
        assert_eq!(
            editor.get(&id).unwrap().kind,
            BlockKind::Image(ImageBlock {
                url: Some("https://example.com/p.jpg".into()),
                alt: Some("Portrait".into()),
            })
        );
    }

    #[test]
    fn update_clamps_heading_level() {
        let mut editor = BlockEditor::new();
        let id = editor.add_block(BlockType::Heading);
        editor.update_block(
            &id,
            BlockPatch {
                level: Some(9),
                ..Default::default()
            },
        );
        assert!(matches!(
            editor.get(&id).unwrap().kind,
            BlockKind::Heading(Heading { level: 6, .. })
        ));
    }

    #[test]
    fn update_and_delete_unknown_id_are_noops() {
        let mut editor = editor_with(&["a", "b"]);
        assert!(!editor.update_block(&BlockId::from("zz"), BlockPatch::content("x")));
        assert!(!editor.delete_block(&BlockId::from("zz")));
        assert_eq!(order(&editor), vec!["a", "b"]);
    }

    #[test]
    fn reorder_moves_forward_and_backward() {
        let mut editor = editor_with(&["a", "b", "c", "d"]);
        assert!(editor.reorder(&BlockId::from("a"), &BlockId::from("c")));
        assert_eq!(order(&editor), vec!["b", "c", "a", "d"]);

        assert!(editor.reorder(&BlockId::from("d"), &BlockId::from("b")));
        assert_eq!(order(&editor), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn reorder_same_or_unknown_is_noop() {
        let mut editor = editor_with(&["a", "b"]);
        assert!(!editor.reorder(&BlockId::from("a"), &BlockId::from("a")));
        assert!(!editor.reorder(&BlockId::from("a"), &BlockId::from("x")));
        assert_eq!(order(&editor), vec!["a", "b"]);
    }

    #[test]
    fn drop_from_palette_adds_block() {
        let mut editor = BlockEditor::new();
        editor.begin_drag(DragSource::Palette(BlockType::Video));
        let outcome = editor.drop_on(DropTarget::AddZone);
        assert!(matches!(outcome, DropOutcome::Added(_)));
        assert_eq!(editor.len(), 1);
        assert!(!editor.drag_state().is_dragging());
    }

    #[test]
    fn drop_block_on_block_reorders() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.begin_drag(DragSource::Block(BlockId::from("c")));
        assert_eq!(
            editor.drop_on(DropTarget::Block(BlockId::from("a"))),
            DropOutcome::Reordered
        );
        assert_eq!(order(&editor), vec!["c", "a", "b"]);
    }

    #[test]
    fn drop_onto_removed_block_snaps_back() {
        let mut editor = editor_with(&["a", "b"]);
        editor.begin_drag(DragSource::Block(BlockId::from("a")));
        editor.delete_block(&BlockId::from("b"));
        assert_eq!(
            editor.drop_on(DropTarget::Block(BlockId::from("b"))),
            DropOutcome::SnappedBack
        );
        assert_eq!(order(&editor), vec!["a"]);
    }

    #[test]
    fn import_rejects_non_array_and_keeps_state() {
        let mut editor = editor_with(&["a"]);
        let err = editor.import_json(r#"{"not":"an array"}"#).unwrap_err();
        assert!(matches!(err, MemoriaError::Parse(msg) if msg.contains("an object")));
        assert_eq!(order(&editor), vec!["a"]);
    }

    #[test]
    fn import_rejects_invalid_json_and_keeps_state() {
        let mut editor = editor_with(&["a"]);
        assert!(editor.import_json("[{").is_err());
        assert_eq!(order(&editor), vec!["a"]);
    }

    #[test]
    fn import_reports_bad_element_index() {
        let mut editor = BlockEditor::new();
        let err = editor
            .import_json(r#"[{"id":"1","type":"text"},{"id":"2","type":"poem"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("blocks[1]"));
        assert!(editor.is_empty());
    }

    #[test]
    fn import_rejects_duplicate_ids() {
        let mut editor = BlockEditor::new();
        let err = editor
            .import_json(r#"[{"id":"1","type":"text"},{"id":"1","type":"text"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate id"));
    }

    #[test]
    fn import_assigns_missing_ids() {
        let mut editor = BlockEditor::new();
        editor
            .import_json(r#"[{"type":"text","content":"a"},{"type":"text","content":"b"}]"#)
            .unwrap();
        assert_eq!(editor.len(), 2);
        assert_ne!(editor.blocks()[0].id, editor.blocks()[1].id);
    }

    #[test]
    fn export_import_round_trip() {
        let mut editor = BlockEditor::new();
        let h = editor.add_block(BlockType::Heading);
        editor.update_block(&h, BlockPatch::content("<h2>Remembering</h2>"));
        let img = editor.add_block(BlockType::Image);
        editor.update_block(&img, BlockPatch::url("data:image/png;base64,AAAA"));
        editor.add_block(BlockType::Video);
        editor.add_block(BlockType::Text);

        let exported = editor.export_json().unwrap();
        let mut other = BlockEditor::new();
        other.import_json(&exported).unwrap();
        assert_eq!(other.blocks(), editor.blocks());
        assert_eq!(other.export_json().unwrap(), exported);
    }

    #[test]
    fn template_load_regenerates_ids() {
        let template = vec![Block::new(BlockId::from("t1"), BlockType::Text.editor_default())];
        let mut editor = editor_with(&["a", "b"]);
        editor.load_template(&template);
        assert_eq!(editor.len(), 1);
        assert_ne!(editor.blocks()[0].id.as_str(), "t1");
        assert_eq!(editor.blocks()[0].kind, template[0].kind);
    }

    #[test]
    fn revision_moves_only_on_change() {
        let mut editor = editor_with(&["a", "b"]);
        let start = editor.revision();

        assert!(!editor.update_block(&BlockId::from("ghost"), BlockPatch::content("x")));
        assert!(!editor.delete_block(&BlockId::from("ghost")));
        assert!(!editor.reorder(&BlockId::from("a"), &BlockId::from("a")));
        assert!(editor.import_json("{}").is_err());
        editor.begin_drag(DragSource::Block(BlockId::from("a")));
        assert_eq!(editor.drop_on(DropTarget::Nowhere), DropOutcome::SnappedBack);
        assert!(editor.update_block(&BlockId::from("a"), BlockPatch::default()));
        assert_eq!(editor.revision(), start);

        assert!(editor.update_block(&BlockId::from("a"), BlockPatch::content("changed")));
        assert!(editor.reorder(&BlockId::from("b"), &BlockId::from("a")));
        assert_eq!(editor.revision(), start + 2);
    }
}
