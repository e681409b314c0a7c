//! Link node - wraps text runs with a target URL

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Errors that can occur during link URL validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValidationError {
    EmptyUrl,
    UnsafeProtocol,
}

impl std::fmt::Display for LinkValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkValidationError::EmptyUrl => write!(f, "URL cannot be empty"),
            LinkValidationError::UnsafeProtocol => write!(f, "Unsafe protocol detected"),
        }
    }
}

impl std::error::Error for LinkValidationError {}

/// Validate a link or image URL.
///
/// Rejects empty URLs and script-injection protocols. Relative URLs and
/// fragment links are allowed.
pub fn validate_url(url: &str) -> Result<(), LinkValidationError> {
    if url.is_empty() {
        return Err(LinkValidationError::EmptyUrl);
    }
    let lower = url.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") || lower.starts_with("vbscript:")
    {
        return Err(LinkValidationError::UnsafeProtocol);
    }
    Ok(())
}

/// A link that wraps one or more runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkNode {
    id: NodeId,
    parent: Option<NodeId>,
    /// IDs of child runs (the text content of the link)
    children: Vec<NodeId>,
    /// The target URL, non-empty by invariant
    pub url: String,
}

impl LinkNode {
    /// Create a new link with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            url: url.into(),
        }
    }

    /// Add a child run ID
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

    /// Validate this link's URL
    pub fn validate(&self) -> Result<(), LinkValidationError> {
        validate_url(&self.url)
    }
}

impl Node for LinkNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Link
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
