//! Link commands for inserting and removing links

use crate::command::{resolve_selection, split_run_at};
use crate::{Command, CommandResult, RestoreState};
use doc_model::{
    validate_url, DocumentTree, LinkNode, Node, NodeId, NodeType, Position, Run, Selection,
};
use serde::{Deserialize, Serialize};

/// Char length a block child contributes to the block's text
fn child_char_len(tree: &DocumentTree, child_id: NodeId) -> usize {
    match tree.node_type(child_id) {
        Some(NodeType::Run) => tree.get_run(child_id).map(|r| r.char_len()).unwrap_or(0),
        Some(NodeType::Link) => tree
            .get_link(child_id)
            .map(|l| {
                l.children()
                    .iter()
                    .filter_map(|&id| tree.get_run(id))
                    .map(|r| r.char_len())
                    .sum()
            })
            .unwrap_or(0),
        _ => 0,
    }
}

/// Child index at which new inline content lands for a char offset that
/// falls on a run boundary
fn child_index_at_offset(tree: &DocumentTree, block_id: NodeId, offset: usize) -> usize {
    let Some(block) = tree.get_block(block_id) else {
        return 0;
    };
    let mut cursor = 0;
    for (index, &child_id) in block.children().iter().enumerate() {
        if cursor >= offset {
            return index;
        }
        cursor += child_char_len(tree, child_id);
    }
    block.children().len()
}

/// Direct child runs of a block fully covered by `[start, end)`, with their
/// child indices. Runs inside existing links are not included; they keep
/// their link.
fn direct_runs_in_span(
    tree: &DocumentTree,
    block_id: NodeId,
    start: usize,
    end: usize,
) -> Vec<(usize, NodeId)> {
    let Some(block) = tree.get_block(block_id) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = 0;
    for (index, &child_id) in block.children().iter().enumerate() {
        let len = child_char_len(tree, child_id);
        let (child_start, child_end) = (cursor, cursor + len);
        cursor = child_end;
        if tree.node_type(child_id) != Some(NodeType::Run) || len == 0 {
            continue;
        }
        if child_start >= start && child_end <= end {
            out.push((index, child_id));
        }
    }
    out
}

/// Insert a link at the selection.
///
/// Collapsed selection: a new link whose single run equals the URL appears
/// at the caret. Range selection: the spanned runs are wrapped in a link
/// (splitting boundary runs) and the selection collapses to the range end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertLink {
    pub url: String,
}

impl InsertLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Command for InsertLink {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        validate_url(&self.url)
            .map_err(|e| crate::EditError::InvalidCommand(format!("Invalid link URL: {}", e)))?;

        let resolved = resolve_selection(tree, selection)?;
        let mut new_tree = tree.clone();

        let new_selection = if resolved.is_collapsed() {
            let block_id = resolved.start.block_id;
            let offset = resolved.start.offset;

            split_run_at(&mut new_tree, block_id, offset)?;
            let index = child_index_at_offset(&new_tree, block_id, offset);
            let link_id = new_tree.insert_link(LinkNode::new(&self.url), block_id, Some(index))?;
            new_tree.insert_run(Run::new(&self.url), link_id, None)?;
            new_tree.merge_adjacent_runs(block_id);

            Selection::collapsed(Position::new(
                block_id,
                offset + self.url.chars().count(),
            ))
        } else {
            for &block_id in &resolved.blocks {
                let (start, end) = resolved.span_in(tree, block_id);
                if start >= end {
                    continue;
                }
                split_run_at(&mut new_tree, block_id, start)?;
                split_run_at(&mut new_tree, block_id, end)?;

                let covered = direct_runs_in_span(&new_tree, block_id, start, end);
                let Some(&(first_index, _)) = covered.first() else {
                    continue;
                };

                let mut moved = Vec::with_capacity(covered.len());
                for &(_, run_id) in &covered {
                    moved.push(new_tree.remove_run(run_id)?);
                }
                let link_id =
                    new_tree.insert_link(LinkNode::new(&self.url), block_id, Some(first_index))?;
                for run in moved {
                    new_tree.insert_run(run, link_id, None)?;
                }
                new_tree.merge_adjacent_runs(block_id);
            }

            Selection::collapsed(Position::new(resolved.end.block_id, resolved.end.offset))
        };

        Ok(CommandResult {
            tree: new_tree,
            selection: new_selection,
            inverse: Box::new(RestoreState {
                tree: tree.clone(),
                selection: *selection,
            }),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Link"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Remove the link touched by the selection, keeping its text runs in place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLink;

impl RemoveLink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RemoveLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for RemoveLink {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let resolved = resolve_selection(tree, selection)?;
        let block_id = resolved.start.block_id;
        let (start, end) = resolved.span_in(tree, block_id);

        // First link child overlapping the selected span (or holding the
        // collapsed caret).
        let mut target: Option<(usize, NodeId)> = None;
        if let Some(block) = tree.get_block(block_id) {
            let mut cursor = 0;
            for (index, &child_id) in block.children().iter().enumerate() {
                let len = child_char_len(tree, child_id);
                let (child_start, child_end) = (cursor, cursor + len);
                cursor = child_end;
                if tree.node_type(child_id) != Some(NodeType::Link) {
                    continue;
                }
                if child_end >= start && child_start <= end {
                    target = Some((index, child_id));
                    break;
                }
            }
        }
        let Some((index, link_id)) = target else {
            return Err(crate::EditError::InvalidCommand(
                "No link in the selection".to_string(),
            ));
        };

        let mut new_tree = tree.clone();
        let runs: Vec<Run> = new_tree
            .get_link(link_id)
            .map(|l| {
                l.children()
                    .iter()
                    .filter_map(|&id| new_tree.get_run(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        new_tree.remove_link(link_id)?;
        for (i, run) in runs.into_iter().enumerate() {
            new_tree.insert_run(Run::with_marks(run.text, run.marks), block_id, Some(index + i))?;
        }
        new_tree.merge_adjacent_runs(block_id);

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
        "Remove Link"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Block;

    fn tree_with_text(text: &str) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new();
        let para_id = tree.push_body_block(Block::paragraph());
        tree.insert_run(Run::new(text), para_id, None).unwrap();
        (tree, para_id)
    }

    fn links_in(tree: &DocumentTree, block_id: NodeId) -> Vec<NodeId> {
        tree.get_block(block_id)
            .map(|b| {
                b.children()
                    .iter()
                    .copied()
                    .filter(|&id| tree.node_type(id) == Some(NodeType::Link))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_insert_link_collapsed_uses_url_as_text() {
        let tree = DocumentTree::with_empty_paragraph();
        let para_id = tree.body()[0];
        let selection = Selection::at_start_of(para_id);

        let result = InsertLink::new("https://example.com")
            .apply(&tree, &selection)
            .unwrap();

        let links = links_in(&result.tree, para_id);
        assert_eq!(links.len(), 1);
        let link = result.tree.get_link(links[0]).unwrap();
        assert_eq!(link.url, "https://example.com");
        assert_eq!(result.tree.block_text(para_id), "https://example.com");
        // Caret sits after the inserted link text.
        assert_eq!(result.selection.focus.offset, 19);
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_insert_link_wraps_range() {
        let (tree, para_id) = tree_with_text("read the docs now");
        let selection = Selection::new(Position::new(para_id, 9), Position::new(para_id, 13));

        let result = InsertLink::new("https://example.com/docs")
            .apply(&tree, &selection)
            .unwrap();

        let links = links_in(&result.tree, para_id);
        assert_eq!(links.len(), 1);
        let link = result.tree.get_link(links[0]).unwrap();
        let link_text: String = link
            .children()
            .iter()
            .filter_map(|&id| result.tree.get_run(id))
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(link_text, "docs");
        // Full text unchanged, selection collapsed to the range end.
        assert_eq!(result.tree.block_text(para_id), "read the docs now");
        assert!(result.selection.is_collapsed());
        assert_eq!(result.selection.focus.offset, 13);
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_insert_link_rejects_bad_urls() {
        let (tree, para_id) = tree_with_text("x");
        let selection = Selection::at_start_of(para_id);

        assert!(InsertLink::new("").apply(&tree, &selection).is_err());
        assert!(InsertLink::new("javascript:alert(1)")
            .apply(&tree, &selection)
            .is_err());
    }

    #[test]
    fn test_remove_link_keeps_text() {
        let (tree, para_id) = tree_with_text("read the docs now");
        let selection = Selection::new(Position::new(para_id, 9), Position::new(para_id, 13));
        let linked = InsertLink::new("https://example.com/docs")
            .apply(&tree, &selection)
            .unwrap();

        let caret = Selection::collapsed(Position::new(para_id, 11));
        let result = RemoveLink::new().apply(&linked.tree, &caret).unwrap();

        assert!(links_in(&result.tree, para_id).is_empty());
        assert_eq!(result.tree.block_text(para_id), "read the docs now");
        // Runs merged back into one.
        assert_eq!(result.tree.inline_runs(para_id).len(), 1);
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_remove_link_without_link_errors() {
        let (tree, para_id) = tree_with_text("plain");
        let selection = Selection::at_start_of(para_id);
        assert!(RemoveLink::new().apply(&tree, &selection).is_err());
    }
}
