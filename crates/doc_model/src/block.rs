//! Block node - a container for runs, links, images, or nested blocks

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// The closed set of block kinds.
///
/// List containers (`BulletedList`, `NumberedList`) hold only `ListItem`
/// children; every other kind holds inline content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    Blockquote,
    BulletedList,
    NumberedList,
    ListItem,
}

impl BlockKind {
    /// Check if this kind is a list container
    pub fn is_list_container(&self) -> bool {
        matches!(self, BlockKind::BulletedList | BlockKind::NumberedList)
    }

    /// Check if this kind is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::HeadingOne | BlockKind::HeadingTwo)
    }

    /// Check if blocks of this kind hold inline content (runs, links, images)
    pub fn holds_inline_content(&self) -> bool {
        !self.is_list_container()
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A block node containing inline content or, for list containers, list items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    id: NodeId,
    parent: Option<NodeId>,
    /// IDs of child nodes
    children: Vec<NodeId>,
    /// The block kind
    pub kind: BlockKind,
    /// Alignment override; absent means left
    #[serde(default)]
    pub alignment: Option<Alignment>,
}

impl Block {
    /// Create a new empty block of the given kind
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            kind,
            alignment: None,
        }
    }

    /// Create a new empty paragraph
    pub fn paragraph() -> Self {
        Self::new(BlockKind::Paragraph)
    }

    /// Create a block with an alignment override
    pub fn with_alignment(kind: BlockKind, alignment: Alignment) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            kind,
            alignment: Some(alignment),
        }
    }

    /// The effective alignment (left when no override is set)
    pub fn effective_alignment(&self) -> Alignment {
        self.alignment.unwrap_or_default()
    }

    /// Add a child node ID
    pub fn add_child(&mut self, child_id: NodeId) {
        self.children.push(child_id);
    }

    /// Insert a child at a specific index
    pub fn insert_child(&mut self, index: usize, child_id: NodeId) {
        self.children.insert(index, child_id);
    }

    /// Remove a child by ID
    pub fn remove_child(&mut self, child_id: NodeId) -> bool {
        if let Some(pos) = self.children.iter().position(|&id| id == child_id) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::paragraph()
    }
}

impl Node for Block {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Block
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_predicates() {
        assert!(BlockKind::BulletedList.is_list_container());
        assert!(BlockKind::NumberedList.is_list_container());
        assert!(!BlockKind::ListItem.is_list_container());
        assert!(BlockKind::HeadingOne.is_heading());
        assert!(!BlockKind::Blockquote.is_heading());
        assert!(BlockKind::Paragraph.holds_inline_content());
        assert!(!BlockKind::BulletedList.holds_inline_content());
    }

    #[test]
    fn test_effective_alignment_defaults_left() {
        let block = Block::paragraph();
        assert_eq!(block.effective_alignment(), Alignment::Left);

        let centered = Block::with_alignment(BlockKind::Paragraph, Alignment::Center);
        assert_eq!(centered.effective_alignment(), Alignment::Center);
    }

    #[test]
    fn test_child_management() {
        let mut block = Block::paragraph();
        let a = NodeId::new();
        let b = NodeId::new();
        block.add_child(a);
        block.insert_child(0, b);
        assert_eq!(block.children(), &[b, a]);
        assert!(block.remove_child(b));
        assert!(!block.remove_child(b));
        assert_eq!(block.children(), &[a]);
    }
}
