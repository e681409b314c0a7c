//! Command system for document editing

use doc_model::{DocumentTree, Node, NodeId, NodeType, Position, Run, Selection};
use serde::{Deserialize, Serialize};

/// Result of applying a command
#[derive(Debug)]
pub struct CommandResult {
    /// The new document tree after the command
    pub tree: DocumentTree,
    /// The new selection after the command
    pub selection: Selection,
    /// The inverse command (for undo)
    pub inverse: Box<dyn Command>,
}

/// Trait for all editing commands
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult>;

    /// Try to merge this command with a following one (for undo batching)
    fn merge_with(&self, _other: &dyn Command) -> Option<Box<dyn Command>> {
        None
    }

    /// Get a display name for this command
    fn display_name(&self) -> &str;

    /// Clone this command into a box
    fn clone_box(&self) -> Box<dyn Command>;
}

/// Inverse used by structural commands: restores a captured (tree,
/// selection) snapshot. The arena tree is cloned per command anyway, so the
/// snapshot is the cheap undo path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreState {
    pub tree: DocumentTree,
    pub selection: Selection,
}

impl Command for RestoreState {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        Ok(CommandResult {
            tree: self.tree.clone(),
            selection: self.selection,
            inverse: Box::new(RestoreState {
                tree: tree.clone(),
                selection: *selection,
            }),
        })
    }

    fn display_name(&self) -> &str {
        "Restore State"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Position and selection resolution
// ============================================================================

/// A position resolved to the block directly holding the inline content,
/// with a char offset into the block's concatenated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedPosition {
    pub block_id: NodeId,
    pub offset: usize,
}

/// A selection resolved and ordered by document position
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSelection {
    /// Anchor mapped to block-relative coordinates
    pub anchor: ResolvedPosition,
    /// Focus mapped to block-relative coordinates
    pub focus: ResolvedPosition,
    /// First touched block in document order and the offset within it
    pub start: ResolvedPosition,
    /// Last touched block in document order and the offset within it
    pub end: ResolvedPosition,
    /// All inline-content blocks touched by the selection, in order
    pub blocks: Vec<NodeId>,
}

impl ResolvedSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The selection expressed in stable block-relative coordinates,
    /// preserving anchor/focus direction
    pub fn to_selection(&self) -> Selection {
        Selection::new(
            Position::new(self.anchor.block_id, self.anchor.offset),
            Position::new(self.focus.block_id, self.focus.offset),
        )
    }

    /// The char span of the selection within one touched block
    pub fn span_in(&self, tree: &DocumentTree, block_id: NodeId) -> (usize, usize) {
        let len = tree.block_char_len(block_id);
        let start = if block_id == self.start.block_id {
            self.start.offset
        } else {
            0
        };
        let end = if block_id == self.end.block_id {
            self.end.offset
        } else {
            len
        };
        (start.min(len), end.min(len))
    }
}

/// Resolve a position to the inline-content block holding it
pub(crate) fn resolve_position(
    tree: &DocumentTree,
    position: &Position,
) -> crate::Result<ResolvedPosition> {
    let node_type = tree.node_type(position.node_id).ok_or_else(|| {
        crate::EditError::InvalidCommand(format!("Node not found: {}", position.node_id))
    })?;

    match node_type {
        NodeType::Block => {
            let block = tree.get_block(position.node_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!("Block not found: {}", position.node_id))
            })?;
            if block.kind.holds_inline_content() {
                let len = tree.block_char_len(position.node_id);
                return Ok(ResolvedPosition {
                    block_id: position.node_id,
                    offset: position.offset.min(len),
                });
            }
            // A position on a list container resolves into its first item.
            let first_item = block.children().first().copied().ok_or_else(|| {
                crate::EditError::InvalidCommand("Position on an empty list container".to_string())
            })?;
            resolve_position(tree, &Position::new(first_item, position.offset))
        }
        NodeType::Run => {
            let block_id = tree.containing_block(position.node_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!(
                    "Run without containing block: {}",
                    position.node_id
                ))
            })?;
            let run_start = run_char_start(tree, block_id, position.node_id)?;
            let run_len = tree
                .get_run(position.node_id)
                .map(|r| r.char_len())
                .unwrap_or(0);
            Ok(ResolvedPosition {
                block_id,
                offset: run_start + position.offset.min(run_len),
            })
        }
        NodeType::Link => {
            let block_id = tree.containing_block(position.node_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!(
                    "Link without containing block: {}",
                    position.node_id
                ))
            })?;
            let link = tree.get_link(position.node_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!("Link not found: {}", position.node_id))
            })?;
            let link_start = match link.children().first() {
                Some(&first_run) => run_char_start(tree, block_id, first_run)?,
                None => 0,
            };
            let link_len: usize = link
                .children()
                .iter()
                .filter_map(|&id| tree.get_run(id))
                .map(|r| r.char_len())
                .sum();
            Ok(ResolvedPosition {
                block_id,
                offset: link_start + position.offset.min(link_len),
            })
        }
        NodeType::Image => Err(crate::EditError::InvalidCommand(
            "Cannot resolve a position inside a void image".to_string(),
        )),
    }
}

/// Char offset of a run's first char within its block's concatenated text
fn run_char_start(tree: &DocumentTree, block_id: NodeId, run_id: NodeId) -> crate::Result<usize> {
    let mut offset = 0;
    for id in tree.inline_runs(block_id) {
        if id == run_id {
            return Ok(offset);
        }
        offset += tree.get_run(id).map(|r| r.char_len()).unwrap_or(0);
    }
    Err(crate::EditError::InvalidCommand(format!(
        "Run {} not in block {}",
        run_id, block_id
    )))
}

/// All inline-content blocks of the document in order, descending into
/// list containers
pub(crate) fn inline_blocks_in_order(tree: &DocumentTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &top_id in tree.body() {
        collect_inline_blocks(tree, top_id, &mut out);
    }
    out
}

fn collect_inline_blocks(tree: &DocumentTree, id: NodeId, out: &mut Vec<NodeId>) {
    match tree.node_type(id) {
        Some(NodeType::Block) => {
            let Some(block) = tree.get_block(id) else {
                return;
            };
            if block.kind.holds_inline_content() {
                out.push(id);
                // A list item may hold nested blocks after its inline content.
                for &child_id in block.children() {
                    if tree.node_type(child_id) == Some(NodeType::Block) {
                        collect_inline_blocks(tree, child_id, out);
                    }
                }
            } else {
                for &child_id in block.children() {
                    collect_inline_blocks(tree, child_id, out);
                }
            }
        }
        _ => {}
    }
}

/// Resolve a selection into ordered block-relative coordinates plus the
/// list of touched blocks
pub(crate) fn resolve_selection(
    tree: &DocumentTree,
    selection: &Selection,
) -> crate::Result<ResolvedSelection> {
    let anchor = resolve_position(tree, &selection.anchor)?;
    let focus = resolve_position(tree, &selection.focus)?;

    let order = inline_blocks_in_order(tree);
    let anchor_index = order
        .iter()
        .position(|&id| id == anchor.block_id)
        .ok_or_else(|| {
            crate::EditError::InvalidCommand(format!("Block not in body: {}", anchor.block_id))
        })?;
    let focus_index = order
        .iter()
        .position(|&id| id == focus.block_id)
        .ok_or_else(|| {
            crate::EditError::InvalidCommand(format!("Block not in body: {}", focus.block_id))
        })?;

    let forward = (anchor_index, anchor.offset) <= (focus_index, focus.offset);
    let (start, end, start_index, end_index) = if forward {
        (anchor, focus, anchor_index, focus_index)
    } else {
        (focus, anchor, focus_index, anchor_index)
    };

    Ok(ResolvedSelection {
        anchor,
        focus,
        start,
        end,
        blocks: order[start_index..=end_index].to_vec(),
    })
}

// ============================================================================
// Span surgery helpers
// ============================================================================

/// Index of a child within its parent block or link
pub(crate) fn child_index_of(
    tree: &DocumentTree,
    parent_id: NodeId,
    child_id: NodeId,
) -> crate::Result<usize> {
    let children: &[NodeId] = match tree.node_type(parent_id) {
        Some(NodeType::Block) => tree
            .get_block(parent_id)
            .map(|b| b.children())
            .unwrap_or(&[]),
        Some(NodeType::Link) => tree.get_link(parent_id).map(|l| l.children()).unwrap_or(&[]),
        _ => &[],
    };
    children
        .iter()
        .position(|&id| id == child_id)
        .ok_or_else(|| {
            crate::EditError::InvalidCommand(format!(
                "Node {} not a child of {}",
                child_id, parent_id
            ))
        })
}

/// Split the run containing `offset` so that `offset` falls on a run
/// boundary. No-op when it already does.
pub(crate) fn split_run_at(
    tree: &mut DocumentTree,
    block_id: NodeId,
    offset: usize,
) -> crate::Result<()> {
    let mut cursor = 0;
    for run_id in tree.inline_runs(block_id) {
        let run_len = tree.get_run(run_id).map(|r| r.char_len()).unwrap_or(0);
        let (start, end) = (cursor, cursor + run_len);
        if offset > start && offset < end {
            let parent_id = tree.parent_of(run_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!("Run without parent: {}", run_id))
            })?;
            let insert_index = child_index_of(tree, parent_id, run_id)? + 1;
            let (suffix, marks) = {
                let run = tree.get_run_mut(run_id).ok_or(
                    doc_model::DocModelError::NodeNotFound(run_id.as_uuid()),
                )?;
                (run.split_off_at(offset - start), run.marks)
            };
            tree.insert_run(Run::with_marks(suffix, marks), parent_id, Some(insert_index))?;
            return Ok(());
        }
        cursor = end;
    }
    Ok(())
}

/// Run IDs fully covered by the char span `[start, end)`. Call after
/// splitting both boundaries.
pub(crate) fn runs_in_span(
    tree: &DocumentTree,
    block_id: NodeId,
    start: usize,
    end: usize,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for run_id in tree.inline_runs(block_id) {
        let run_len = tree.get_run(run_id).map(|r| r.char_len()).unwrap_or(0);
        let (run_start, run_end) = (cursor, cursor + run_len);
        if run_start >= start && run_end <= end && run_len > 0 {
            out.push(run_id);
        }
        cursor = run_end;
    }
    out
}

/// Remove links that lost all their runs
pub(crate) fn drop_empty_links(tree: &mut DocumentTree, block_id: NodeId) {
    let link_ids: Vec<NodeId> = tree
        .get_block(block_id)
        .map(|b| {
            b.children()
                .iter()
                .copied()
                .filter(|&id| tree.node_type(id) == Some(NodeType::Link))
                .collect()
        })
        .unwrap_or_default();
    for link_id in link_ids {
        let empty = tree
            .get_link(link_id)
            .map(|l| l.children().is_empty())
            .unwrap_or(false);
        if empty {
            let _ = tree.remove_link(link_id);
        }
    }
}

/// Give an inline-content block a single empty run when it has no inline
/// children left
pub(crate) fn ensure_placeholder_run(tree: &mut DocumentTree, block_id: NodeId) {
    let needs_placeholder = tree
        .get_block(block_id)
        .map(|b| {
            b.kind.holds_inline_content()
                && !b
                    .children()
                    .iter()
                    .any(|&id| !matches!(tree.node_type(id), Some(NodeType::Block) | None))
        })
        .unwrap_or(false);
    if needs_placeholder {
        let _ = tree.insert_run(Run::new(""), block_id, Some(0));
    }
}

/// Delete the char span `[start, end)` from a block's inline content
pub(crate) fn delete_block_range(
    tree: &mut DocumentTree,
    block_id: NodeId,
    start: usize,
    end: usize,
) -> crate::Result<()> {
    if start >= end {
        return Ok(());
    }
    split_run_at(tree, block_id, start)?;
    split_run_at(tree, block_id, end)?;
    for run_id in runs_in_span(tree, block_id, start, end) {
        tree.remove_run(run_id)?;
    }
    drop_empty_links(tree, block_id);
    ensure_placeholder_run(tree, block_id);
    tree.merge_adjacent_runs(block_id);
    Ok(())
}

/// Remove an inline-content block entirely; an emptied list container goes
/// with it
pub(crate) fn remove_inline_block(tree: &mut DocumentTree, block_id: NodeId) -> crate::Result<()> {
    let parent = tree.parent_of(block_id);
    tree.remove_block(block_id)?;
    if let Some(parent_id) = parent {
        let container_empty = tree
            .get_block(parent_id)
            .map(|b| b.kind.is_list_container() && b.children().is_empty())
            .unwrap_or(false);
        if container_empty {
            tree.remove_block(parent_id)?;
        }
    }
    Ok(())
}

/// Delete the content covered by a resolved selection, returning the
/// collapsed caret position afterwards
pub(crate) fn delete_selection_content(
    tree: &mut DocumentTree,
    resolved: &ResolvedSelection,
) -> crate::Result<Position> {
    let start_block = resolved.start.block_id;
    let start_offset = resolved.start.offset;

    if resolved.start.block_id == resolved.end.block_id {
        delete_block_range(tree, start_block, start_offset, resolved.end.offset)?;
        return Ok(Position::new(start_block, start_offset));
    }

    let end_block = resolved.end.block_id;
    let start_len = tree.block_char_len(start_block);
    delete_block_range(tree, start_block, start_offset, start_len)?;
    delete_block_range(tree, end_block, 0, resolved.end.offset)?;

    // Blocks strictly between the endpoints vanish entirely.
    for &block_id in &resolved.blocks[1..resolved.blocks.len() - 1] {
        remove_inline_block(tree, block_id)?;
    }

    // Merge what is left of the end block into the start block.
    let leftover: Vec<NodeId> = tree
        .get_block(end_block)
        .map(|b| b.children().to_vec())
        .unwrap_or_default();
    for child_id in leftover {
        move_inline_child(tree, child_id, end_block, start_block)?;
    }
    remove_inline_block(tree, end_block)?;

    ensure_placeholder_run(tree, start_block);
    tree.merge_adjacent_runs(start_block);
    Ok(Position::new(start_block, start_offset))
}

/// Move an inline child (run, link, or image) from one block to the end of
/// another
fn move_inline_child(
    tree: &mut DocumentTree,
    child_id: NodeId,
    from_block: NodeId,
    to_block: NodeId,
) -> crate::Result<()> {
    match tree.node_type(child_id) {
        Some(NodeType::Run) => {
            let run = tree.remove_run(child_id)?;
            tree.insert_run(run, to_block, None)?;
        }
        Some(NodeType::Link) => {
            // Detach the link together with its runs, then re-attach.
            let runs: Vec<Run> = {
                let link = tree.get_link(child_id).ok_or(
                    doc_model::DocModelError::NodeNotFound(child_id.as_uuid()),
                )?;
                link.children()
                    .iter()
                    .filter_map(|&id| tree.get_run(id).cloned())
                    .collect()
            };
            let link = tree.remove_link(child_id)?;
            let link_id = tree.insert_link(doc_model::LinkNode::new(link.url.clone()), to_block, None)?;
            for run in runs {
                tree.insert_run(run, link_id, None)?;
            }
        }
        Some(NodeType::Image) => {
            if let Some(block) = tree.get_block_mut(from_block) {
                block.remove_child(child_id);
            }
            if let Some(image) = tree.get_image_mut(child_id) {
                image.set_parent(Some(to_block));
            }
            if let Some(block) = tree.get_block_mut(to_block) {
                block.add_child(child_id);
            }
        }
        Some(NodeType::Block) | None => {}
    }
    Ok(())
}

/// Insert text at a char offset within a block, inheriting the marks of the
/// run it lands in
pub(crate) fn insert_text_at(
    tree: &mut DocumentTree,
    block_id: NodeId,
    offset: usize,
    text: &str,
) -> crate::Result<()> {
    let runs = tree.inline_runs(block_id);
    if runs.is_empty() {
        tree.insert_run(Run::new(text), block_id, None)?;
        return Ok(());
    }

    let mut cursor = 0;
    let mut target: Option<(NodeId, usize)> = None;
    for run_id in &runs {
        let run_len = tree.get_run(*run_id).map(|r| r.char_len()).unwrap_or(0);
        if cursor + run_len >= offset {
            target = Some((*run_id, offset - cursor));
            break;
        }
        cursor += run_len;
    }
    // Past the end of the block: append to the last run.
    let (run_id, offset_in_run) = match (target, runs.last()) {
        (Some(found), _) => found,
        (None, Some(&last)) => {
            let len = tree.get_run(last).map(|r| r.char_len()).unwrap_or(0);
            (last, len)
        }
        (None, None) => return Ok(()),
    };

    let run = tree
        .get_run_mut(run_id)
        .ok_or(doc_model::DocModelError::NodeNotFound(run_id.as_uuid()))?;
    let byte_offset: usize = run
        .text
        .chars()
        .take(offset_in_run)
        .map(|c| c.len_utf8())
        .sum();
    run.text.insert_str(byte_offset, text);
    Ok(())
}

/// Extract the text covered by a resolved selection
pub(crate) fn extract_selection_text(
    tree: &DocumentTree,
    resolved: &ResolvedSelection,
) -> String {
    let mut out = String::new();
    for (i, &block_id) in resolved.blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let (start, end) = resolved.span_in(tree, block_id);
        let text = tree.block_text(block_id);
        out.extend(text.chars().skip(start).take(end.saturating_sub(start)));
    }
    out
}

// ============================================================================
// Text commands
// ============================================================================

/// Insert text at the current selection, replacing any selected range first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertText {
    pub text: String,
}

impl InsertText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Command for InsertText {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let resolved = resolve_selection(tree, selection)?;
        let mut new_tree = tree.clone();

        let caret = if resolved.is_collapsed() {
            Position::new(resolved.start.block_id, resolved.start.offset)
        } else {
            delete_selection_content(&mut new_tree, &resolved)?
        };

        insert_text_at(&mut new_tree, caret.node_id, caret.offset, &self.text)?;
        new_tree.merge_adjacent_runs(caret.node_id);

        let new_selection = Selection::collapsed(Position::new(
            caret.node_id,
            caret.offset + self.text.chars().count(),
        ));

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
        "Insert Text"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Delete the currently selected range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRange;

impl DeleteRange {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeleteRange {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for DeleteRange {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let resolved = resolve_selection(tree, selection)?;
        if resolved.is_collapsed() {
            return Ok(CommandResult {
                tree: tree.clone(),
                selection: *selection,
                inverse: Box::new(RestoreState {
                    tree: tree.clone(),
                    selection: *selection,
                }),
            });
        }

        let mut new_tree = tree.clone();
        let caret = delete_selection_content(&mut new_tree, &resolved)?;

        Ok(CommandResult {
            tree: new_tree,
            selection: Selection::collapsed(caret),
            inverse: Box::new(RestoreState {
                tree: tree.clone(),
                selection: *selection,
            }),
        })
    }

    fn display_name(&self) -> &str {
        "Delete"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
