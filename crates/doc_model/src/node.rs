//! Core node trait and types

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// Enumeration of all node types in the document tree.
///
/// The set is closed: every stored node is exactly one of these, and all
/// dispatch over node kinds is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// A container block (paragraph, heading, blockquote, list, list item)
    Block,
    /// A leaf text run
    Run,
    /// An inline link wrapping runs
    Link,
    /// A void image, no editable content
    Image,
}

/// Common interface for all document nodes
pub trait Node: std::fmt::Debug {
    /// Get the unique ID of this node
    fn id(&self) -> NodeId;

    /// Get the type of this node
    fn node_type(&self) -> NodeType;

    /// Get the IDs of child nodes
    fn children(&self) -> &[NodeId];

    /// Get the ID of the parent node (None for top-level blocks)
    fn parent(&self) -> Option<NodeId>;

    /// Set the parent node ID
    fn set_parent(&mut self, parent: Option<NodeId>);

    /// Check if this node can have children
    fn can_have_children(&self) -> bool;

    /// Get the text content of this node (if any)
    fn text_content(&self) -> Option<&str> {
        None
    }
}
