//! Image node - a void block rendered as a single unit

use crate::link::{validate_url, LinkValidationError};
use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// A void image node. Has no editable text content and no children; the
/// caret can only sit before or after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageNode {
    id: NodeId,
    parent: Option<NodeId>,
    /// Source URL, non-empty by invariant
    pub url: String,
}

impl ImageNode {
    /// Create a new image node with the given source URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            url: url.into(),
        }
    }

    /// Validate this image's URL
    pub fn validate(&self) -> Result<(), LinkValidationError> {
        validate_url(&self.url)
    }
}

impl Node for ImageNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Image
    }

    fn children(&self) -> &[NodeId] {
        // Void node: never has children
        &[]
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_is_void() {
        let image = ImageNode::new("https://example.com/pic.png");
        assert!(image.children().is_empty());
        assert!(!image.can_have_children());
        assert!(image.validate().is_ok());
    }
}
