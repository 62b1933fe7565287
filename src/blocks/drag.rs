//! Drag-and-drop state machine for the block list.
//!
//! ```text
//! Idle ──start──▶ Dragging { active } ──finish(target)──▶ Idle
//!                        └──────────cancel──────────────▶ Idle
//! ```
//!
//! `finish` resolves the (source, target) pair into a [`DropAction`]; the
//! editor performs the action. Unsupported pairs resolve to `SnapBack`.

use super::{BlockId, BlockType};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A block type picked from the side palette.
    Palette(BlockType),
    /// An existing content block.
    Block(BlockId),
}

/// Where the drag ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// The "add new block" zone below the content.
    AddZone,
    /// An existing content block.
    Block(BlockId),
    /// Outside any drop zone.
    Nowhere,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { active: DragSource },
}

/// Edit requested by a completed drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    Add(BlockType),
    Reorder { source: BlockId, target: BlockId },
    SnapBack,
}

/// Result of a drop as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Added(BlockId),
    Reordered,
    SnappedBack,
}

impl DragState {
    /// Begin dragging `source`. A drag already in progress is replaced.
    pub fn start(&mut self, source: DragSource) {
        *self = DragState::Dragging { active: source };
    }

    /// Finish the drag over `target`, returning to `Idle`.
    ///
    /// Finishing while idle is a stray drop event and snaps back.
    pub fn finish(&mut self, target: DropTarget) -> DropAction {
        match std::mem::take(self) {
            DragState::Idle => DropAction::SnapBack,
            DragState::Dragging { active } => resolve(active, target),
        }
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn active(&self) -> Option<&DragSource> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { active } => Some(active),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}

fn resolve(source: DragSource, target: DropTarget) -> DropAction {
    match (source, target) {
        (DragSource::Palette(block_type), DropTarget::AddZone) => DropAction::Add(block_type),
        (DragSource::Block(source), DropTarget::Block(target)) if source != target => {
            DropAction::Reorder { source, target }
        }
        _ => DropAction::SnapBack,
    }
}
