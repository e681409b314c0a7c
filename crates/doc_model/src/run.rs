//! Text run node - a contiguous span of text with consistent marks

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Boolean style flags carried by a run.
///
/// Flags are orthogonal; any combination is legal. An unset flag means the
/// mark is not applied; there is no "explicitly false" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
}

impl Marks {
    /// Check if no mark is applied
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

/// A text run - contiguous text with consistent marks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    id: NodeId,
    parent: Option<NodeId>,
    /// The text content of this run
    pub text: String,
    /// Marks applied to this run
    #[serde(default)]
    pub marks: Marks,
}

impl Run {
    /// Create a new run with text content and no marks
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            text: text.into(),
            marks: Marks::default(),
        }
    }

    /// Create a new run with text and marks
    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            text: text.into(),
            marks,
        }
    }

    /// Get the length of the text in this run (in chars)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if this run is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Get the number of grapheme clusters in this run
    pub fn grapheme_count(&self) -> usize {
        use unicode_segmentation::UnicodeSegmentation;
        self.text.graphemes(true).count()
    }

    /// Split the text at a char offset, leaving the prefix in this run and
    /// returning the suffix. Marks carry over to the caller.
    pub fn split_off_at(&mut self, char_offset: usize) -> String {
        let byte_offset: usize = self
            .text
            .chars()
            .take(char_offset)
            .map(|c| c.len_utf8())
            .sum();
        self.text.split_off(byte_offset)
    }
}

impl Node for Run {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Run
    }

    fn children(&self) -> &[NodeId] {
        // Runs are leaves
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

    fn text_content(&self) -> Option<&str> {
        Some(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_orthogonal() {
        let mut marks = Marks::default();
        assert!(marks.is_plain());
        marks.bold = true;
        marks.code = true;
        assert!(!marks.is_plain());
        assert!(!marks.italic);
    }

    #[test]
    fn test_char_len_multibyte() {
        let run = Run::new("héllo");
        assert_eq!(run.char_len(), 5);
        assert_eq!(run.text.len(), 6);
    }

    #[test]
    fn test_grapheme_count() {
        // Family emoji is one grapheme built from several scalars
        let run = Run::new("a\u{1F469}\u{200D}\u{1F469}\u{200D}\u{1F466}b");
        assert_eq!(run.grapheme_count(), 3);
        assert!(run.char_len() > 3);
    }

    #[test]
    fn test_split_off_at() {
        let mut run = Run::with_marks(
            "héllo",
            Marks {
                bold: true,
                ..Marks::default()
            },
        );
        let tail = run.split_off_at(2);
        assert_eq!(run.text, "hé");
        assert_eq!(tail, "llo");
        assert!(run.marks.bold);
    }
}
