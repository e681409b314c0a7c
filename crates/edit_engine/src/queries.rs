//! Read-only queries over (tree, selection), used by toolbars to render
//! toggle state. All of them degrade to defaults on unresolvable
//! selections instead of failing.

use crate::command::{extract_selection_text, resolve_selection};
use crate::Mark;
use doc_model::{Alignment, BlockKind, DocumentTree, Marks, Selection};

const ALL_MARKS: [Mark; 5] = [
    Mark::Bold,
    Mark::Italic,
    Mark::Underline,
    Mark::Strikethrough,
    Mark::Code,
];

/// Marks common to every non-empty run spanned by the selection. A
/// collapsed selection reports the marks of the run holding the caret.
pub fn active_marks(tree: &DocumentTree, selection: &Selection) -> Marks {
    let Ok(resolved) = resolve_selection(tree, selection) else {
        return Marks::default();
    };

    if resolved.is_collapsed() {
        return marks_at_caret(tree, resolved.start.block_id, resolved.start.offset);
    }

    let mut acc: Option<Marks> = None;
    for &block_id in &resolved.blocks {
        let (start, end) = resolved.span_in(tree, block_id);
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
            acc = Some(match acc {
                None => run.marks,
                Some(mut common) => {
                    for mark in ALL_MARKS {
                        let both = mark.is_set(&common) && mark.is_set(&run.marks);
                        mark.write(&mut common, both);
                    }
                    common
                }
            });
        }
    }
    acc.unwrap_or_default()
}

fn marks_at_caret(tree: &DocumentTree, block_id: doc_model::NodeId, offset: usize) -> Marks {
    let mut cursor = 0;
    for run_id in tree.inline_runs(block_id) {
        let Some(run) = tree.get_run(run_id) else {
            continue;
        };
        let run_len = run.char_len();
        if cursor + run_len >= offset {
            return run.marks;
        }
        cursor += run_len;
    }
    Marks::default()
}

/// Check whether one mark is active across the selection
pub fn is_mark_active(tree: &DocumentTree, selection: &Selection, mark: Mark) -> bool {
    mark.is_set(&active_marks(tree, selection))
}

/// The block kind at the selection start. List items report their
/// container's kind, which is what a toolbar highlights.
pub fn block_kind_at(tree: &DocumentTree, selection: &Selection) -> Option<BlockKind> {
    let resolved = resolve_selection(tree, selection).ok()?;
    let block = tree.get_block(resolved.start.block_id)?;
    if block.kind == BlockKind::ListItem {
        let container = tree.parent_of(resolved.start.block_id)?;
        return tree.get_block(container).map(|c| c.kind);
    }
    Some(block.kind)
}

/// The effective alignment of the block at the selection start
pub fn alignment_at(tree: &DocumentTree, selection: &Selection) -> Alignment {
    resolve_selection(tree, selection)
        .ok()
        .and_then(|resolved| tree.get_block(resolved.start.block_id))
        .map(|block| block.effective_alignment())
        .unwrap_or_default()
}

/// The list container kind holding the selection start, if any
pub fn list_kind_at(tree: &DocumentTree, selection: &Selection) -> Option<BlockKind> {
    match block_kind_at(tree, selection) {
        Some(kind) if kind.is_list_container() => Some(kind),
        _ => None,
    }
}

/// The plain text covered by the selection, with newlines between blocks
pub fn selected_text(tree: &DocumentTree, selection: &Selection) -> String {
    match resolve_selection(tree, selection) {
        Ok(resolved) => extract_selection_text(tree, &resolved),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, ToggleBlock, ToggleMark};
    use doc_model::{Block, NodeId, Position, Run};

    fn tree_with_text(text: &str) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new(text), para_id, None).unwrap();
        (tree, para_id)
    }

    #[test]
    fn test_active_marks_after_toggle() {
        let (tree, para_id) = tree_with_text("Hello");
        let selection = Selection::new(Position::new(para_id, 0), Position::new(para_id, 5));

        assert!(!is_mark_active(&tree, &selection, Mark::Bold));

        let bolded = ToggleMark::new(Mark::Bold).apply(&tree, &selection).unwrap();
        assert!(is_mark_active(&bolded.tree, &bolded.selection, Mark::Bold));
        assert!(!is_mark_active(&bolded.tree, &bolded.selection, Mark::Italic));
    }

    #[test]
    fn test_active_marks_mixed_span() {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        let bold = doc_model::Marks {
            bold: true,
            ..Default::default()
        };
        tree.insert_run(Run::with_marks("bold", bold), para_id, None)
            .unwrap();
        tree.insert_run(Run::new(" plain"), para_id, None).unwrap();

        let over_both = Selection::new(Position::new(para_id, 0), Position::new(para_id, 10));
        assert!(!is_mark_active(&tree, &over_both, Mark::Bold));

        let over_bold = Selection::new(Position::new(para_id, 0), Position::new(para_id, 4));
        assert!(is_mark_active(&tree, &over_bold, Mark::Bold));
    }

    #[test]
    fn test_caret_reports_surrounding_marks() {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        let bold = doc_model::Marks {
            bold: true,
            ..Default::default()
        };
        tree.insert_run(Run::with_marks("bold", bold), para_id, None)
            .unwrap();

        let caret = Selection::collapsed(Position::new(para_id, 2));
        assert!(is_mark_active(&tree, &caret, Mark::Bold));
    }

    #[test]
    fn test_block_kind_reports_list_container() {
        let (tree, para_id) = tree_with_text("item");
        let selection = Selection::at_start_of(para_id);

        assert_eq!(block_kind_at(&tree, &selection), Some(BlockKind::Paragraph));
        assert_eq!(list_kind_at(&tree, &selection), None);

        let listed = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &selection)
            .unwrap();
        assert_eq!(
            block_kind_at(&listed.tree, &listed.selection),
            Some(BlockKind::BulletedList)
        );
        assert_eq!(
            list_kind_at(&listed.tree, &listed.selection),
            Some(BlockKind::BulletedList)
        );
    }

    #[test]
    fn test_alignment_at_defaults_left() {
        let (tree, para_id) = tree_with_text("x");
        let selection = Selection::at_start_of(para_id);
        assert_eq!(alignment_at(&tree, &selection), Alignment::Left);
    }

    #[test]
    fn test_selected_text_across_blocks() {
        let mut tree = DocumentTree::new();
        let first = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new("one two"), first, None).unwrap();
        let second = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new("three"), second, None).unwrap();

        let selection = Selection::new(Position::new(first, 4), Position::new(second, 5));
        assert_eq!(selected_text(&tree, &selection), "two\nthree");
    }
}
