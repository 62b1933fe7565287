//! Canvas editor: scene, selection, zoom and snapshot history.

use tracing::{debug, warn};

use super::command::{Command, Selection};
use super::history::History;
use super::render::{self, ImageMap};
use super::{
    Color, FONT_SIZE_MAX, FONT_SIZE_MIN, FontWeight, IconKind, IconObject, ImageObject, ObjectId, ObjectKind, Scene,
    SceneObject, ShapeKind, ShapeObject, TextKind, TextObject,
};
use crate::config::EditorConfig;
use crate::error::MemoriaError;

/// Where newly added objects land.
const DEFAULT_LEFT: f32 = 100.0;
const DEFAULT_TOP: f32 = 100.0;

const DEFAULT_TEXT_WIDTH: f32 = 300.0;
const DEFAULT_IMAGE_WIDTH: f32 = 300.0;
const DEFAULT_IMAGE_HEIGHT: f32 = 200.0;
const DEFAULT_SHAPE_SIZE: f32 = 100.0;
const DEFAULT_LINE_LENGTH: f32 = 150.0;
const DEFAULT_ICON_SIZE: f32 = 48.0;

/// True for `http(s)://...` URLs and `data:image/...` URIs.
pub fn is_image_source(url: &str) -> bool {
    let url = url.trim();
    if url.starts_with("data:image/") {
        return true;
    }
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}

#[derive(Debug, Clone)]
pub struct CanvasEditor {
    scene: Scene,
    history: History,
    selected: Option<ObjectId>,
    zoom: u32,
    zoom_min: u32,
    zoom_max: u32,
    width: u32,
    height: u32,
    revision: u64,
}

impl Default for CanvasEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl CanvasEditor {
    /// Empty canvas with the initial scene already recorded in history.
    pub fn new(config: &EditorConfig) -> Self {
        let mut editor = Self {
            scene: Scene::new(config.canvas_width, config.canvas_height),
            history: History::with_capacity(config.history_capacity),
            selected: None,
            zoom: 100,
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max.max(config.zoom_min),
            width: config.canvas_width,
            height: config.canvas_height,
            revision: 0,
        };
        editor.zoom = editor.zoom.clamp(editor.zoom_min, editor.zoom_max);
        editor.record();
        editor
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Bumped whenever the scene changes: commands, undo, redo and loads.
    /// Selection and zoom do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selected.and_then(|id| self.scene.get(id))
    }

    /// Select an object. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: ObjectId) -> bool {
        if self.scene.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Set the view zoom in percent, clamped to the configured range.
    pub fn set_zoom(&mut self, percent: i64) -> u32 {
        let clamped = percent.clamp(i64::from(self.zoom_min), i64::from(self.zoom_max));
        self.zoom = clamped as u32;
        self.zoom
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Apply a command and record a snapshot if it changed the scene.
    pub fn execute(&mut self, command: Command) -> bool {
        let name = command.name();
        match command.apply(&mut self.scene) {
            Some(selection) => {
                match selection {
                    Selection::Select(id) => self.selected = Some(id),
                    Selection::Deselect => self.selected = None,
                    Selection::Keep => {}
                }
                self.record();
                self.revision += 1;
                debug!(command = name, objects = self.scene.objects.len(), "canvas command");
                true
            }
            None => {
                debug!(command = name, "canvas command ignored");
                false
            }
        }
    }

    fn add(&mut self, kind: ObjectKind) -> ObjectId {
        let object = SceneObject::new(DEFAULT_LEFT, DEFAULT_TOP, kind);
        let id = object.id;
        self.execute(Command::Add(object));
        id
    }

    pub fn add_text(&mut self, kind: TextKind, placeholder: &str, font_size: f32) -> ObjectId {
        let font_weight = match kind {
            TextKind::Heading => FontWeight::Bold,
            TextKind::Subheading | TextKind::Body => FontWeight::Normal,
        };
        self.add(ObjectKind::Text(TextObject {
            text: placeholder.to_string(),
            text_kind: kind,
            font_size: if font_size.is_finite() {
                font_size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
            } else {
                16.0
            },
            font_weight,
            fill: Color::INK,
            width: DEFAULT_TEXT_WIDTH,
        }))
    }

    /// Add an image; rejected sources are logged and nothing is added.
    pub fn add_image(&mut self, url: &str) -> Option<ObjectId> {
        if !is_image_source(url) {
            warn!(url = %url.chars().take(64).collect::<String>(), "image source rejected");
            return None;
        }
        Some(self.add(ObjectKind::Image(ImageObject {
            url: url.trim().to_string(),
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
            scale_x: 1.0,
            scale_y: 1.0,
        })))
    }

    pub fn add_shape(&mut self, shape: ShapeKind) -> ObjectId {
        let object = match shape {
            ShapeKind::Line => ShapeObject {
                shape,
                width: DEFAULT_LINE_LENGTH,
                height: 0.0,
                fill: None,
                stroke: Color::INK,
                stroke_width: 3.0,
            },
            ShapeKind::Rect | ShapeKind::Circle | ShapeKind::Triangle => ShapeObject {
                shape,
                width: DEFAULT_SHAPE_SIZE,
                height: DEFAULT_SHAPE_SIZE,
                fill: Some(Color::SILVER),
                stroke: Color::INK,
                stroke_width: 2.0,
            },
        };
        self.add(ObjectKind::Shape(object))
    }

    pub fn add_icon(&mut self, content: &str, kind: IconKind) -> ObjectId {
        self.add(ObjectKind::Icon(IconObject {
            content: content.to_string(),
            icon_kind: kind,
            font_size: DEFAULT_ICON_SIZE,
            fill: Color::INK,
        }))
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.execute(Command::Remove(id)),
            None => false,
        }
    }

    /// Copy the selection `offset` pixels down and right; the copy is selected.
    pub fn duplicate_selected(&mut self, offset: f32) -> Option<ObjectId> {
        let id = self.selected?;
        if self.execute(Command::Duplicate { id, offset }) {
            self.selected
        } else {
            None
        }
    }

    pub fn move_object(&mut self, id: ObjectId, left: f32, top: f32) -> bool {
        self.execute(Command::Move { id, left, top })
    }

    pub fn scale_object(&mut self, id: ObjectId, scale_x: f32, scale_y: f32) -> bool {
        self.execute(Command::Scale {
            id,
            scale_x,
            scale_y,
        })
    }

    pub fn resize_object(&mut self, id: ObjectId, width: f32, height: f32) -> bool {
        self.execute(Command::Resize { id, width, height })
    }

    pub fn update_text(&mut self, id: ObjectId, text: &str) -> bool {
        self.execute(Command::SetText {
            id,
            text: text.to_string(),
        })
    }

    pub fn set_fill(&mut self, id: ObjectId, fill: Color) -> bool {
        self.execute(Command::SetFill { id, fill })
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        self.execute(Command::BringToFront(id))
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        self.execute(Command::SendToBack(id))
    }

    pub fn clear(&mut self) -> bool {
        self.execute(Command::Clear)
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    fn record(&mut self) {
        match self.scene.to_snapshot() {
            Ok(snapshot) => self.history.push(snapshot),
            Err(e) => warn!(error = %e, "failed to snapshot scene"),
        }
    }

    /// Parse a history entry, or `None` (logged) if it cannot be loaded.
    fn parse_entry(snapshot: &str) -> Option<Scene> {
        match Scene::from_snapshot(snapshot) {
            Ok(scene) => Some(scene),
            Err(e) => {
                warn!(error = %e, "failed to restore snapshot");
                None
            }
        }
    }

    fn restore(&mut self, scene: Scene) {
        self.scene = scene;
        self.revision += 1;
        if let Some(id) = self.selected {
            if !self.scene.contains(id) {
                self.selected = None;
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one snapshot. The cursor only moves once the target
    /// snapshot has been parsed.
    pub fn undo(&mut self) -> bool {
        let Some(scene) = self.history.peek_undo().and_then(Self::parse_entry) else {
            return false;
        };
        self.history.undo();
        self.restore(scene);
        debug!(cursor = ?self.history.cursor(), "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(scene) = self.history.peek_redo().and_then(Self::parse_entry) else {
            return false;
        };
        self.history.redo();
        self.restore(scene);
        debug!(cursor = ?self.history.cursor(), "redo");
        true
    }

    /// The current scene as a snapshot document.
    pub fn snapshot(&self) -> Result<String, MemoriaError> {
        self.scene.to_snapshot()
    }

    /// Replace the scene with a snapshot; history restarts from it.
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), MemoriaError> {
        let scene = Scene::from_snapshot(json)?;
        self.load_scene(scene)
    }

    pub fn load_scene(&mut self, scene: Scene) -> Result<(), MemoriaError> {
        scene
            .check()
            .map_err(|e| MemoriaError::Parse(format!("invalid scene: {}", e)))?;
        let snapshot = scene.to_snapshot()?;
        self.scene = scene;
        self.selected = None;
        self.history.reset(snapshot);
        self.revision += 1;
        debug!(objects = self.scene.objects.len(), "scene loaded");
        Ok(())
    }

    /// Rasterize the scene at its own resolution.
    pub fn export_png(&self, images: &ImageMap) -> Result<Vec<u8>, MemoriaError> {
        render::render_png(&self.scene, images)
    }

    /// Canvas resolution configured for new scenes.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn circle_then_undo_leaves_no_shapes() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Circle);
        assert_eq!(editor.scene().count_kind("shape"), 1);
        assert!(editor.undo());
        assert_eq!(editor.scene().count_kind("shape"), 0);
    }

    #[test]
    fn added_object_is_selected_at_default_position() {
        let mut editor = CanvasEditor::default();
        let id = editor.add_text(TextKind::Heading, "In Loving Memory", 36.0);
        assert_eq!(editor.selected(), Some(id));
        let object = editor.selected_object().unwrap();
        assert_eq!((object.left, object.top), (100.0, 100.0));
        match &object.kind {
            ObjectKind::Text(t) => assert_eq!(t.font_weight, FontWeight::Bold),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_image_url_is_omitted() {
        let mut editor = CanvasEditor::default();
        assert!(editor.add_image("javascript:alert(1)").is_none());
        assert!(editor.add_image("ftp://x/y.png").is_none());
        assert!(editor.add_image("https://").is_none());
        assert_eq!(editor.history().len(), 1);
        assert!(editor.add_image("https://example.com/a.jpg").is_some());
        assert!(editor.add_image("data:image/png;base64,AAAA").is_some());
    }

    #[test]
    fn undo_all_then_redo_all() {
        let mut editor = CanvasEditor::default();
        let initial = editor.snapshot().unwrap();
        let id = editor.add_shape(ShapeKind::Rect);
        editor.move_object(id, 10.0, 20.0);
        editor.add_icon("✝", IconKind::Symbol);
        let last = editor.snapshot().unwrap();

        for _ in 0..3 {
            assert!(editor.undo());
        }
        assert!(!editor.undo());
        assert_eq!(editor.snapshot().unwrap(), initial);

        for _ in 0..3 {
            assert!(editor.redo());
        }
        assert!(!editor.redo());
        assert_eq!(editor.snapshot().unwrap(), last);
    }

    #[test]
    fn undo_drops_vanished_selection() {
        let mut editor = CanvasEditor::default();
        let id = editor.add_shape(ShapeKind::Triangle);
        assert_eq!(editor.selected(), Some(id));
        editor.undo();
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn delete_and_duplicate_need_selection() {
        let mut editor = CanvasEditor::default();
        assert!(!editor.delete_selected());
        assert!(editor.duplicate_selected(20.0).is_none());
        assert_eq!(editor.history().len(), 1);

        let id = editor.add_shape(ShapeKind::Rect);
        let copy = editor.duplicate_selected(20.0).unwrap();
        assert_ne!(copy, id);
        assert_eq!(editor.selected(), Some(copy));
        assert_eq!(editor.scene().objects.last().map(|o| o.id), Some(copy));

        assert!(editor.delete_selected());
        assert_eq!(editor.selected(), None);
        assert_eq!(editor.scene().objects.len(), 1);
    }

    #[test]
    fn zoom_is_clamped_and_not_recorded() {
        let mut editor = CanvasEditor::default();
        assert_eq!(editor.set_zoom(10), 25);
        assert_eq!(editor.set_zoom(500), 200);
        assert_eq!(editor.set_zoom(150), 150);
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let mut editor = CanvasEditor::default();
        for _ in 0..80 {
            editor.add_shape(ShapeKind::Rect);
        }
        assert_eq!(editor.history().len(), 50);
        let mut undos = 0;
        while editor.undo() {
            undos += 1;
        }
        assert_eq!(undos, 49);
        assert_eq!(editor.scene().objects.len(), 31);
    }

    #[test]
    fn push_after_undo_discards_redo() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        editor.add_shape(ShapeKind::Circle);
        editor.undo();
        editor.add_shape(ShapeKind::Line);
        assert!(!editor.can_redo());
        assert_eq!(editor.history().len(), 3);
    }

    #[test]
    fn load_snapshot_resets_history_and_selection() {
        let mut source = CanvasEditor::default();
        source.add_shape(ShapeKind::Circle);
        source.add_text(TextKind::Body, "A life remembered", 16.0);
        let json = source.snapshot().unwrap();

        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        editor.load_snapshot(&json).unwrap();
        assert_eq!(editor.scene(), source.scene());
        assert_eq!(editor.selected(), None);
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.undo());
    }

    #[test]
    fn invalid_snapshot_leaves_state() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        let before = editor.scene().clone();
        assert!(editor.load_snapshot("[1,2]").is_err());
        assert_eq!(editor.scene(), &before);
    }

    #[test]
    fn clear_is_undoable() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        editor.add_shape(ShapeKind::Circle);
        assert!(editor.clear());
        assert!(editor.scene().objects.is_empty());
        assert_eq!(editor.selected(), None);
        editor.undo();
        assert_eq!(editor.scene().objects.len(), 2);
    }

    #[test]
    fn text_and_fill_updates() {
        let mut editor = CanvasEditor::default();
        let id = editor.add_text(TextKind::Body, "placeholder", 16.0);
        assert!(editor.update_text(id, "Beloved father"));
        assert!(editor.set_fill(id, Color::rgb(0x11, 0x22, 0x33)));
        match &editor.scene().get(id).unwrap().kind {
            ObjectKind::Text(t) => {
                assert_eq!(t.text, "Beloved father");
                assert_eq!(t.fill, Color::rgb(0x11, 0x22, 0x33));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    fn corrupted(editor: &CanvasEditor) -> String {
        let mut value: serde_json::Value = serde_json::from_str(&editor.snapshot().unwrap()).unwrap();
        value["objects"][0]["left"] = serde_json::json!(1e39);
        value.to_string()
    }

    #[test]
    fn undo_onto_unreadable_entry_keeps_cursor() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        let bad = corrupted(&editor);
        editor.history.reset(bad);
        editor.add_shape(ShapeKind::Circle);
        let before = editor.scene().clone();

        assert_eq!(editor.history().cursor(), Some(1));
        assert!(!editor.undo());
        assert_eq!(editor.history().cursor(), Some(1));
        assert_eq!(editor.scene(), &before);
    }

    #[test]
    fn redo_onto_unreadable_entry_keeps_cursor() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        let bad = corrupted(&editor);
        editor.history.push(bad);
        editor.history.undo();
        let before = editor.scene().clone();

        assert!(!editor.redo());
        assert_eq!(editor.history().cursor(), Some(1));
        assert!(editor.can_redo());
        assert_eq!(editor.scene(), &before);
    }

    #[test]
    fn snapshot_with_overflowing_geometry_is_refused() {
        let mut editor = CanvasEditor::default();
        editor.add_shape(ShapeKind::Rect);
        let bad = corrupted(&editor);
        let before = editor.scene().clone();
        assert!(matches!(editor.load_snapshot(&bad), Err(MemoriaError::Parse(_))));
        assert_eq!(editor.scene(), &before);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn text_size_is_clamped() {
        let mut editor = CanvasEditor::default();
        let big = editor.add_text(TextKind::Body, "x", 1e7);
        let tiny = editor.add_text(TextKind::Body, "x", -4.0);
        let nan = editor.add_text(TextKind::Body, "x", f32::NAN);
        let size = |id| match &editor.scene().get(id).unwrap().kind {
            ObjectKind::Text(t) => t.font_size,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(size(big), FONT_SIZE_MAX);
        assert_eq!(size(tiny), FONT_SIZE_MIN);
        assert_eq!(size(nan), 16.0);
        assert!(editor.export_png(&Default::default()).is_ok());
    }

    #[test]
    fn revision_ignores_view_state_and_noops() {
        let mut editor = CanvasEditor::default();
        let id = editor.add_shape(ShapeKind::Rect);
        let after_add = editor.revision();
        assert_eq!(after_add, 1);

        editor.set_zoom(150);
        editor.deselect();
        editor.select(id);
        assert!(!editor.redo());
        assert!(!editor.move_object(ObjectId::new_v4(), 1.0, 1.0));
        assert_eq!(editor.revision(), after_add);

        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(editor.revision(), after_add + 1);
    }
}
