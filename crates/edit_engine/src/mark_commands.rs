//! Mark commands for toggling inline formatting

use crate::command::{resolve_selection, runs_in_span, split_run_at};
use crate::{Command, CommandResult, RestoreState};
use doc_model::{DocumentTree, Marks, NodeId, Selection};
use serde::{Deserialize, Serialize};

/// The closed set of inline marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Mark {
    /// Check whether this mark is set in a marks value
    pub fn is_set(&self, marks: &Marks) -> bool {
        match self {
            Mark::Bold => marks.bold,
            Mark::Italic => marks.italic,
            Mark::Underline => marks.underline,
            Mark::Strikethrough => marks.strikethrough,
            Mark::Code => marks.code,
        }
    }

    /// Set or clear this mark in a marks value
    pub fn write(&self, marks: &mut Marks, value: bool) {
        match self {
            Mark::Bold => marks.bold = value,
            Mark::Italic => marks.italic = value,
            Mark::Underline => marks.underline = value,
            Mark::Strikethrough => marks.strikethrough = value,
            Mark::Code => marks.code = value,
        }
    }
}

/// Toggle a mark across the selection.
///
/// When the mark is active on every non-empty run spanned by the selection
/// it is removed from all of them; otherwise it is added to all. Boundary
/// runs are split so only the selected span changes, and touched blocks are
/// re-normalized, which makes a double toggle restore the prior structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleMark {
    pub mark: Mark,
}

impl ToggleMark {
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }
}

impl Command for ToggleMark {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let resolved = resolve_selection(tree, selection)?;
        if resolved.is_collapsed() {
            // No runs spanned; nothing to toggle.
            return Ok(CommandResult {
                tree: tree.clone(),
                selection: *selection,
                inverse: Box::new(RestoreState {
                    tree: tree.clone(),
                    selection: *selection,
                }),
            });
        }

        // Spans per touched block, skipping blocks with nothing selected.
        let mut spans: Vec<(NodeId, usize, usize)> = Vec::new();
        for &block_id in &resolved.blocks {
            let (start, end) = resolved.span_in(tree, block_id);
            if start < end {
                spans.push((block_id, start, end));
            }
        }

        let adding = !self.active_across(tree, &spans);

        let mut new_tree = tree.clone();
        for &(block_id, start, end) in &spans {
            split_run_at(&mut new_tree, block_id, start)?;
            split_run_at(&mut new_tree, block_id, end)?;
            for run_id in runs_in_span(&new_tree, block_id, start, end) {
                if let Some(run) = new_tree.get_run_mut(run_id) {
                    self.mark.write(&mut run.marks, adding);
                }
            }
            new_tree.merge_adjacent_runs(block_id);
        }

        Ok(CommandResult {
            tree: new_tree,
            selection: resolved.to_selection(),
            inverse: Box::new(RestoreState {
                tree: tree.clone(),
                selection: *selection,
            }),
        })
    }

    fn display_name(&self) -> &str {
        match self.mark {
            Mark::Bold => "Toggle Bold",
            Mark::Italic => "Toggle Italic",
            Mark::Underline => "Toggle Underline",
            Mark::Strikethrough => "Toggle Strikethrough",
            Mark::Code => "Toggle Code",
        }
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

impl ToggleMark {
    /// True when the mark is set on every non-empty run overlapping the
    /// spans (and at least one such run exists)
    fn active_across(&self, tree: &DocumentTree, spans: &[(NodeId, usize, usize)]) -> bool {
        let mut any_run = false;
        for &(block_id, start, end) in spans {
            let mut cursor = 0;
            for run_id in tree.inline_runs(block_id) {
                let Some(run) = tree.get_run(run_id) else {
                    continue;
                };
                let run_len = run.char_len();
                let (run_start, run_end) = (cursor, cursor + run_len);
                cursor = run_end;
                if run_len == 0 || run_end <= start || run_start >= end {
                    continue;
                }
                any_run = true;
                if !self.mark.is_set(&run.marks) {
                    return false;
                }
            }
        }
        any_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Block, Node, Position, Run};

    fn tree_with_text(text: &str) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new(text), para_id, None).unwrap();
        (tree, para_id)
    }

    fn select(para_id: NodeId, start: usize, end: usize) -> Selection {
        Selection::new(Position::new(para_id, start), Position::new(para_id, end))
    }

    #[test]
    fn test_toggle_bold_whole_run() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = select(para_id, 0, 5);

        let result = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();

        let runs = result.tree.inline_runs(para_id);
        assert_eq!(runs.len(), 1);
        assert!(result.tree.get_run(runs[0]).unwrap().marks.bold);
    }

    #[test]
    fn test_toggle_bold_partial_splits_runs() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = select(para_id, 1, 4);

        let result = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();

        let runs = result.tree.inline_runs(para_id);
        assert_eq!(runs.len(), 3);
        let texts: Vec<&str> = runs
            .iter()
            .map(|&id| result.tree.get_run(id).unwrap().text.as_str())
            .collect();
        assert_eq!(texts, vec!["H", "ell", "o"]);
        assert!(!result.tree.get_run(runs[0]).unwrap().marks.bold);
        assert!(result.tree.get_run(runs[1]).unwrap().marks.bold);
        assert!(!result.tree.get_run(runs[2]).unwrap().marks.bold);
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_toggle_twice_restores_structure() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = select(para_id, 1, 4);

        let toggled = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();
        let restored = ToggleMark::new(Mark::Bold)
            .apply(&toggled.tree, &toggled.selection)
            .unwrap();

        let runs = restored.tree.inline_runs(para_id);
        assert_eq!(runs.len(), 1);
        assert_eq!(restored.tree.block_text(para_id), "Hello");
        assert!(!restored.tree.get_run(runs[0]).unwrap().marks.bold);
    }

    #[test]
    fn test_mixed_state_adds_everywhere() {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new("plain "), para_id, None).unwrap();
        let bold = doc_model::Marks {
            bold: true,
            ..Default::default()
        };
        tree.insert_run(Run::with_marks("bold", bold), para_id, None)
            .unwrap();

        let selection = select(para_id, 0, 10);
        let result = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();

        for run_id in result.tree.inline_runs(para_id) {
            assert!(result.tree.get_run(run_id).unwrap().marks.bold);
        }
    }

    #[test]
    fn test_marks_are_orthogonal_across_toggles() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = select(para_id, 0, 5);

        let bolded = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();
        let both = ToggleMark::new(Mark::Italic)
            .apply(&bolded.tree, &bolded.selection)
            .unwrap();

        let runs = both.tree.inline_runs(para_id);
        let marks = both.tree.get_run(runs[0]).unwrap().marks;
        assert!(marks.bold);
        assert!(marks.italic);
        assert!(!marks.code);
    }

    #[test]
    fn test_toggle_across_blocks() {
        let mut tree = DocumentTree::new();
        let first = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new("one"), first, None).unwrap();
        let second = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new("two"), second, None).unwrap();

        let selection = Selection::new(Position::new(first, 0), Position::new(second, 3));
        let result = ToggleMark::new(Mark::Italic).apply(&tree, &selection).unwrap();

        for block_id in [first, second] {
            for run_id in result.tree.inline_runs(block_id) {
                assert!(result.tree.get_run(run_id).unwrap().marks.italic);
            }
        }
    }

    #[test]
    fn test_collapsed_selection_is_noop() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = Selection::collapsed(Position::new(para_id, 2));

        let result = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();
        let runs = result.tree.inline_runs(para_id);
        assert!(!result.tree.get_run(runs[0]).unwrap().marks.bold);
        assert_eq!(result.tree.get_block(para_id).unwrap().children().len(), 1);
    }
}
