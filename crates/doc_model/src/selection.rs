//! Selection model - cursor position and text selection
//!
//! Selections are ephemeral editing state. They are never serialized and do
//! not survive a document reload.

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// A position in the document tree.
///
/// The node may be a run (offset within the run's text) or a block holding
/// inline content (offset across the block's concatenated text). Block
/// offsets are stable across run splits and merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The node containing this position
    pub node_id: NodeId,
    /// Character offset within the node
    pub offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(node_id: NodeId, offset: usize) -> Self {
        Self { node_id, offset }
    }

    /// Create a position at the start of a node
    pub fn start_of(node_id: NodeId) -> Self {
        Self { node_id, offset: 0 }
    }
}

/// A selection in the document.
///
/// A selection has an anchor (where it started) and a focus (where the
/// caret is). When anchor == focus the selection is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Where the selection started
    pub anchor: Position,
    /// Where the selection ends (caret position)
    pub focus: Position,
}

impl Selection {
    /// Create a new selection
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (caret only)
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    /// Create a collapsed selection at the start of a node
    pub fn at_start_of(node_id: NodeId) -> Self {
        Self::collapsed(Position::start_of(node_id))
    }

    /// Check if this selection is collapsed (just a caret)
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Move the focus, extending the selection
    pub fn extend_to(&self, focus: Position) -> Self {
        Self {
            anchor: self.anchor,
            focus,
        }
    }

    /// Collapse the selection to the focus position
    pub fn collapse_to_focus(&self) -> Self {
        Self::collapsed(self.focus)
    }

    /// Collapse the selection to the anchor position
    pub fn collapse_to_anchor(&self) -> Self {
        Self::collapsed(self.anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed() {
        let id = NodeId::new();
        let sel = Selection::collapsed(Position::new(id, 3));
        assert!(sel.is_collapsed());

        let extended = sel.extend_to(Position::new(id, 7));
        assert!(!extended.is_collapsed());
        assert_eq!(extended.anchor.offset, 3);
        assert_eq!(extended.focus.offset, 7);
    }

    #[test]
    fn test_collapse_to_ends() {
        let id = NodeId::new();
        let sel = Selection::new(Position::new(id, 1), Position::new(id, 5));
        assert_eq!(sel.collapse_to_focus().anchor.offset, 5);
        assert_eq!(sel.collapse_to_anchor().focus.offset, 1);
    }
}
