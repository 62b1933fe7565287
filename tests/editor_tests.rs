//! End-to-end editor behavior through the public API.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use memoria::{
    EditorConfig, MemoriaError, PageSession,
    blocks::{
        BlockEditor, BlockId, BlockPatch, BlockType, DragSource, DropOutcome, DropTarget,
    },
    canvas::{CanvasEditor, IconKind, ShapeKind, TextKind},
    persist::{MemoryStore, Notice, PageMeta, PersistenceAdapter},
};

fn editor_with(types: &[BlockType]) -> (BlockEditor, Vec<BlockId>) {
    let mut editor = BlockEditor::new();
    let ids = types.iter().map(|t| editor.add_block(*t)).collect();
    (editor, ids)
}

// ============================================================================
// BLOCK LIST
// ============================================================================

#[test]
fn export_then_import_is_identity() {
    let (mut editor, ids) = editor_with(&[
        BlockType::Heading,
        BlockType::Text,
        BlockType::Image,
        BlockType::Video,
    ]);
    editor.update_block(&ids[0], BlockPatch { level: Some(3), ..BlockPatch::content("Ada") });
    editor.update_block(&ids[1], BlockPatch::content("<p>She wrote the <em>first</em> program.</p>"));
    editor.update_block(
        &ids[2],
        BlockPatch {
            url: Some("https://example.com/portrait.jpg".into()),
            alt: Some("Portrait, 1840".into()),
            ..Default::default()
        },
    );
    editor.update_block(&ids[3], BlockPatch::url("https://youtu.be/dQw4w9WgXcQ"));

    let exported = editor.export_json().unwrap();
    let mut other = BlockEditor::new();
    assert_eq!(other.import_json(&exported).unwrap(), 4);
    assert_eq!(other.blocks(), editor.blocks());
    assert_eq!(other.export_json().unwrap(), exported);
}

#[test]
fn reorder_is_an_array_move() {
    let (mut editor, ids) = editor_with(&[
        BlockType::Heading,
        BlockType::Text,
        BlockType::Image,
        BlockType::Video,
        BlockType::Text,
    ]);

    // Forward: 0 to 3
    assert!(editor.reorder(&ids[0], &ids[3]));
    let order: Vec<_> = editor.blocks().iter().map(|b| b.id.clone()).collect();
    assert_eq!(
        order,
        vec![ids[1].clone(), ids[2].clone(), ids[3].clone(), ids[0].clone(), ids[4].clone()]
    );

    // Backward: 4 to 1
    assert!(editor.reorder(&ids[4], &ids[2]));
    let order: Vec<_> = editor.blocks().iter().map(|b| b.id.clone()).collect();
    assert_eq!(
        order,
        vec![ids[1].clone(), ids[4].clone(), ids[2].clone(), ids[3].clone(), ids[0].clone()]
    );

    let mut sorted = order.clone();
    sorted.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn reorder_noops() {
    let (mut editor, ids) = editor_with(&[BlockType::Heading, BlockType::Text]);
    let before = editor.blocks().to_vec();
    assert!(!editor.reorder(&ids[0], &ids[0]));
    assert!(!editor.reorder(&ids[0], &BlockId::from("ghost")));
    assert!(!editor.reorder(&BlockId::from("ghost"), &ids[1]));
    assert_eq!(editor.blocks(), &before[..]);
}

#[test]
fn drag_from_palette_and_between_blocks() {
    let (mut editor, ids) = editor_with(&[BlockType::Heading, BlockType::Text]);

    editor.begin_drag(DragSource::Palette(BlockType::Image));
    let added = match editor.drop_on(DropTarget::AddZone) {
        DropOutcome::Added(id) => id,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(editor.blocks().last().unwrap().id, added);

    editor.begin_drag(DragSource::Block(added.clone()));
    assert_eq!(editor.drop_on(DropTarget::Block(ids[0].clone())), DropOutcome::Reordered);
    assert_eq!(editor.blocks()[0].id, added);

    editor.begin_drag(DragSource::Block(ids[1].clone()));
    assert_eq!(editor.drop_on(DropTarget::Nowhere), DropOutcome::SnappedBack);
    assert_eq!(editor.len(), 3);
}

#[test]
fn scenario_heading_export() {
    let mut editor = BlockEditor::new();
    let id = editor.add_block(BlockType::Heading);
    editor.update_block(&id, BlockPatch::content("<h1>Hello</h1>"));

    let exported: Value = serde_json::from_str(&editor.export_json().unwrap()).unwrap();
    assert_eq!(
        exported,
        json!([{"id": id.as_str(), "type": "heading", "content": "<h1>Hello</h1>", "level": 1}])
    );
}

#[test]
fn scenario_import_of_object_fails_cleanly() {
    let (mut editor, _) = editor_with(&[BlockType::Text, BlockType::Image]);
    let before = editor.export_json().unwrap();

    let err = editor.import_json(r#"{"not":"an array"}"#).unwrap_err();
    assert!(matches!(err, MemoriaError::Parse(_)));
    assert_eq!(editor.export_json().unwrap(), before);
}

#[test]
fn template_blocks_get_fresh_ids() {
    let mut editor = BlockEditor::new();
    let template = memoria::blocks::templates::by_name("life-story").unwrap();
    editor.load_template(&template.blocks);
    assert_eq!(editor.len(), template.blocks.len());
    for (ours, theirs) in editor.blocks().iter().zip(&template.blocks) {
        assert_ne!(ours.id, theirs.id);
        assert_eq!(ours.kind, theirs.kind);
    }
}

// ============================================================================
// CANVAS
// ============================================================================

#[test]
fn scenario_circle_then_undo() {
    let mut canvas = CanvasEditor::default();
    canvas.add_shape(ShapeKind::Circle);
    assert_eq!(canvas.scene().objects.len(), 1);
    assert!(canvas.undo());
    assert_eq!(canvas.scene().objects.len(), 0);
    assert_eq!(canvas.selected(), None);
}

#[test]
fn undo_all_then_redo_all() {
    let mut canvas = CanvasEditor::default();
    let initial = canvas.snapshot().unwrap();

    let text = canvas.add_text(TextKind::Heading, "In Loving Memory", 36.0);
    canvas.add_shape(ShapeKind::Rect);
    canvas.add_icon("✝", IconKind::Symbol);
    canvas.move_object(text, 240.0, 40.0);
    canvas.update_text(text, "Forever in our hearts");
    canvas.bring_to_front(text);
    let duplicate = canvas.duplicate_selected(20.0);
    assert!(duplicate.is_some());
    let final_state = canvas.snapshot().unwrap();
    let operations = 7;

    for _ in 0..operations {
        assert!(canvas.undo());
    }
    assert!(!canvas.can_undo());
    assert_eq!(canvas.snapshot().unwrap(), initial);

    for _ in 0..operations {
        assert!(canvas.redo());
    }
    assert!(!canvas.can_redo());
    assert_eq!(canvas.snapshot().unwrap(), final_state);
}

#[test]
fn history_stays_bounded() {
    let mut canvas = CanvasEditor::default();
    for _ in 0..120 {
        canvas.add_shape(ShapeKind::Triangle);
        assert!(canvas.history().len() <= 50);
    }
    let mut undos = 0;
    while canvas.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    assert!(!canvas.undo());
    assert_eq!(canvas.scene().objects.len(), 120 - 49);
}

#[test]
fn zoom_is_clamped_and_not_recorded() {
    let mut canvas = CanvasEditor::default();
    assert_eq!(canvas.set_zoom(10), 25);
    assert_eq!(canvas.set_zoom(500), 200);
    assert_eq!(canvas.set_zoom(75), 75);
    assert!(!canvas.can_undo());
}

#[test]
fn rejected_image_url_adds_nothing() {
    let mut canvas = CanvasEditor::default();
    assert!(canvas.add_image("javascript:alert(1)").is_none());
    assert!(canvas.add_image("ftp://example.com/a.png").is_none());
    assert!(canvas.scene().objects.is_empty());
    assert!(!canvas.can_undo());
}

#[test]
fn export_png_has_canvas_size() {
    let mut canvas = CanvasEditor::default();
    canvas.add_text(TextKind::Body, "Beloved", 18.0);
    canvas.add_image("https://example.invalid/missing.png");
    let png = canvas.export_png(&Default::default()).unwrap();
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), canvas.canvas_size());
}

// ============================================================================
// SESSION AND AUTO-SAVE
// ============================================================================

fn named() -> PageMeta {
    PageMeta {
        title: "In Loving Memory".into(),
        full_name: "Ada Lovelace".into(),
        birth_date: Some("1815-12-10".into()),
        death_date: Some("1852-11-27".into()),
        ..PageMeta::default()
    }
}

#[tokio::test(start_paused = true)]
async fn ten_quick_edits_save_once() {
    let store = Arc::new(MemoryStore::new());
    let mut session = PageSession::new(store.clone(), EditorConfig::default());
    session.set_meta(named());
    let id = session.save_now().await.unwrap();
    let mut notices = session.take_notices().unwrap();
    assert_eq!(notices.recv().await, Some(Notice::Saved { id: id.clone() }));
    assert_eq!(store.save_count(), 1);

    let block = session.add_block(BlockType::Text);
    for i in 1..10 {
        tokio::time::sleep(Duration::from_millis(190)).await;
        session.update_block(&block, BlockPatch::content(format!("edit {}", i)));
    }
    assert_eq!(store.save_count(), 1);

    assert_eq!(notices.recv().await, Some(Notice::Saved { id: id.clone() }));
    assert_eq!(store.save_count(), 2);

    let stored = store.load(&id).await.unwrap().unwrap();
    assert_eq!(stored.blocks, session.blocks().blocks());
    assert_eq!(serde_json::to_value(&stored.blocks).unwrap()[0]["content"], "edit 9");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn autosave_can_be_disabled() {
    let store = Arc::new(MemoryStore::new());
    let config = EditorConfig {
        autosave: false,
        ..EditorConfig::default()
    };
    let mut session = PageSession::new(store.clone(), config);
    session.set_meta(named());
    session.save_now().await.unwrap();

    session.add_block(BlockType::Heading);
    session.edit_canvas(|c| c.add_shape(ShapeKind::Line));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn saved_page_reopens_with_canvas() {
    let store = Arc::new(MemoryStore::new());
    let mut session = PageSession::new(store.clone(), EditorConfig::default());
    session.set_meta(named());
    session.apply_template("gallery");
    session.edit_canvas(|c| c.add_text(TextKind::Heading, "Ada", 40.0));
    let id = session.save_now().await.unwrap();

    let reopened = PageSession::open(store, EditorConfig::default(), &id)
        .await
        .unwrap();
    assert_eq!(reopened.content().blocks, session.content().blocks);
    assert_eq!(reopened.canvas().scene(), session.canvas().scene());
}
