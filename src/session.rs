//! Page editing session.
//!
//! Ties the two editors to a page record and keeps the backend in sync:
//! every edit that changes the page restarts the auto-save timer. Edits that
//! change nothing (unknown ids, undo at the start of history, a drop that
//! snaps back) leave the timer alone.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::blocks::{
    BlockEditor, BlockId, BlockPatch, BlockType, DragSource, DropOutcome, DropTarget, templates,
};
use crate::canvas::CanvasEditor;
use crate::config::EditorConfig;
use crate::error::MemoriaError;
use crate::persist::{AutoSaver, Notice, PageContent, PageId, PageMeta, PersistenceAdapter};

pub struct PageSession {
    id: Option<PageId>,
    meta: PageMeta,
    blocks: BlockEditor,
    canvas: CanvasEditor,
    saver: AutoSaver,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
    config: EditorConfig,
}

impl PageSession {
    /// A fresh, unsaved page.
    pub fn new(adapter: Arc<dyn PersistenceAdapter>, config: EditorConfig) -> Self {
        let (saver, notices) = AutoSaver::new(adapter, &config);
        Self {
            id: None,
            meta: PageMeta::default(),
            blocks: BlockEditor::new(),
            canvas: CanvasEditor::new(&config),
            saver,
            notices: Some(notices),
            config,
        }
    }

    /// Open an existing page from the backend.
    pub async fn open(
        adapter: Arc<dyn PersistenceAdapter>,
        config: EditorConfig,
        id: &PageId,
    ) -> Result<Self, MemoriaError> {
        let mut session = Self::new(adapter, config);
        session.load(id).await?;
        Ok(session)
    }

    pub fn id(&self) -> Option<&PageId> {
        self.id.as_ref()
    }

    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    pub fn blocks(&self) -> &BlockEditor {
        &self.blocks
    }

    pub fn canvas(&self) -> &CanvasEditor {
        &self.canvas
    }

    pub fn is_saving(&self) -> bool {
        self.saver.is_saving()
    }

    /// The save notice receiver. Returns `None` after the first call.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notices.take()
    }

    /// Current state as a page record.
    pub fn content(&self) -> PageContent {
        PageContent {
            meta: self.meta.clone(),
            blocks: self.blocks.blocks().to_vec(),
            scene: Some(self.canvas.scene().clone()),
            updated_at: None,
        }
    }

    fn touch(&mut self) {
        let content = self.content();
        self.saver.schedule(self.id.as_ref(), content);
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn set_meta(&mut self, meta: PageMeta) {
        if self.meta != meta {
            self.meta = meta;
            self.touch();
        }
    }

    /// Run a block edit, then schedule an auto-save if it changed anything.
    pub fn edit_blocks<R>(&mut self, edit: impl FnOnce(&mut BlockEditor) -> R) -> R {
        let before = self.blocks.revision();
        let result = edit(&mut self.blocks);
        if self.blocks.revision() != before {
            self.touch();
        }
        result
    }

    /// Run a canvas edit, then schedule an auto-save if it changed the scene.
    pub fn edit_canvas<R>(&mut self, edit: impl FnOnce(&mut CanvasEditor) -> R) -> R {
        let before = self.canvas.revision();
        let result = edit(&mut self.canvas);
        if self.canvas.revision() != before {
            self.touch();
        }
        result
    }

    pub fn add_block(&mut self, block_type: BlockType) -> BlockId {
        self.edit_blocks(|b| b.add_block(block_type))
    }

    pub fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> bool {
        self.edit_blocks(|b| b.update_block(id, patch))
    }

    pub fn delete_block(&mut self, id: &BlockId) -> bool {
        self.edit_blocks(|b| b.delete_block(id))
    }

    pub fn reorder(&mut self, source: &BlockId, target: &BlockId) -> bool {
        self.edit_blocks(|b| b.reorder(source, target))
    }

    /// Start a drag. Only the drop edits content.
    pub fn begin_drag(&mut self, source: DragSource) {
        self.blocks.begin_drag(source);
    }

    pub fn drop_on(&mut self, target: DropTarget) -> DropOutcome {
        self.edit_blocks(|b| b.drop_on(target))
    }

    /// Replace the blocks with a named template. Unknown names change nothing.
    pub fn apply_template(&mut self, name: &str) -> bool {
        match templates::by_name(name) {
            Some(template) => {
                self.edit_blocks(|b| b.load_template(&template.blocks));
                true
            }
            None => false,
        }
    }

    /// Import a block export; on error nothing changes and nothing is saved.
    pub fn import_json(&mut self, text: &str) -> Result<usize, MemoriaError> {
        let count = self.blocks.import_json(text)?;
        self.touch();
        Ok(count)
    }

    pub fn undo(&mut self) -> bool {
        self.edit_canvas(CanvasEditor::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.edit_canvas(CanvasEditor::redo)
    }

    /// Zoom is view state and does not trigger a save.
    pub fn set_zoom(&mut self, percent: i64) -> u32 {
        self.canvas.set_zoom(percent)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Validate and save right away. The first save assigns the page id.
    pub async fn save_now(&mut self) -> Result<PageId, MemoriaError> {
        let content = self.content();
        content.validate()?;
        let id = self.saver.save_now(self.id.as_ref(), &content).await?;
        self.id = Some(id.clone());
        Ok(id)
    }

    /// Replace the session state with a stored page.
    pub async fn load(&mut self, id: &PageId) -> Result<(), MemoriaError> {
        let content = self
            .saver
            .adapter()
            .load(id)
            .await?
            .ok_or_else(|| MemoriaError::NotFound(id.to_string()))?;

        self.saver.cancel();
        self.meta = content.meta;
        self.blocks.replace_blocks(content.blocks);
        match content.scene {
            Some(scene) => self.canvas.load_scene(scene)?,
            None => self.canvas = CanvasEditor::new(&self.config),
        }
        self.id = Some(id.clone());
        info!(page = %id, blocks = self.blocks.len(), "page loaded");
        Ok(())
    }

    /// Block export taken after the settle delay, so a save in flight lands first.
    pub async fn export_json_settled(&self) -> Result<String, MemoriaError> {
        debug!(settle_ms = self.config.export_settle.as_millis() as u64, "export settling");
        tokio::time::sleep(self.config.export_settle).await;
        self.blocks.export_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ShapeKind;
    use crate::persist::{MemoryStore, PageStatus};
    use std::time::Duration;

    fn session() -> (PageSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PageSession::new(store.clone(), EditorConfig::default()), store)
    }

    fn named_meta() -> PageMeta {
        PageMeta {
            title: "In Loving Memory".into(),
            full_name: "Rosa Díaz".into(),
            ..PageMeta::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unsaved_page_is_not_auto_saved() {
        let (mut session, store) = session();
        session.add_block(BlockType::Heading);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_validates_first() {
        let (mut session, store) = session();
        assert!(matches!(
            session.save_now().await,
            Err(MemoriaError::Validation(_))
        ));
        assert_eq!(store.save_count(), 0);
        assert!(session.id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn saved_page_auto_saves_after_edits() {
        let (mut session, store) = session();
        session.set_meta(named_meta());
        let id = session.save_now().await.unwrap();
        let mut notices = session.take_notices().unwrap();
        assert_eq!(notices.recv().await, Some(Notice::Saved { id: id.clone() }));

        session.add_block(BlockType::Text);
        session.edit_canvas(|c| c.add_shape(ShapeKind::Circle));
        assert_eq!(notices.recv().await, Some(Notice::Saved { id: id.clone() }));
        assert_eq!(store.save_count(), 2);

        let stored = store.load(&id).await.unwrap().unwrap();
        assert_eq!(stored.blocks.len(), 1);
        assert_eq!(stored.scene.unwrap().objects.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn load_restores_everything() {
        let (mut session, store) = session();
        let mut meta = named_meta();
        meta.status = PageStatus::Published;
        session.set_meta(meta);
        session.apply_template("classic");
        session.edit_canvas(|c| c.add_shape(ShapeKind::Rect));
        let id = session.save_now().await.unwrap();

        let other = PageSession::open(store, EditorConfig::default(), &id)
            .await
            .unwrap();
        assert_eq!(other.id(), Some(&id));
        assert_eq!(other.meta(), session.meta());
        assert_eq!(other.blocks().blocks(), session.blocks().blocks());
        assert_eq!(other.canvas().scene(), session.canvas().scene());
        assert!(!other.canvas().can_undo());
    }

    #[tokio::test(start_paused = true)]
    async fn loading_unknown_page_is_not_found() {
        let (mut session, _store) = session();
        assert!(matches!(
            session.load(&PageId::from("missing")).await,
            Err(MemoriaError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn settled_export_waits() {
        let (mut session, _store) = session();
        session.add_block(BlockType::Heading);
        let start = tokio::time::Instant::now();
        let json = session.export_json_settled().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(600));
        assert!(json.contains("\"type\": \"heading\""));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_import_changes_nothing() {
        let (mut session, _store) = session();
        session.add_block(BlockType::Text);
        assert!(session.import_json(r#"{"not":"an array"}"#).is_err());
        assert_eq!(session.blocks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_that_change_nothing_do_not_save() {
        let (mut session, store) = session();
        session.set_meta(named_meta());
        let id = session.save_now().await.unwrap();
        let block = session.add_block(BlockType::Text);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.save_count(), 2);

        assert!(!session.update_block(&BlockId::from("ghost"), BlockPatch::content("x")));
        assert!(!session.delete_block(&BlockId::from("ghost")));
        assert!(!session.undo());
        assert!(!session.redo());
        session.begin_drag(DragSource::Block(block));
        assert_eq!(session.drop_on(DropTarget::Nowhere), DropOutcome::SnappedBack);
        session.set_meta(named_meta());
        session.set_zoom(150);
        assert!(!session.apply_template("nope"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.save_count(), 2);

        session.edit_canvas(|c| c.add_shape(ShapeKind::Rect));
        assert!(session.undo());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.save_count(), 3);
        let stored = store.load(&id).await.unwrap().unwrap();
        assert!(stored.scene.unwrap().objects.is_empty());
    }
}
