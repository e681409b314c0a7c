//! Block commands for toggling block kinds and setting alignment

use crate::command::resolve_selection;
use crate::list_commands::{all_items_of_kind, unwrap_items_from_containers, wrap_blocks_in_list};
use crate::{Command, CommandResult, RestoreState};
use doc_model::{Alignment, BlockKind, DocumentTree, NodeId, Selection};
use serde::{Deserialize, Serialize};

/// Toggle the kind of every block touched by the selection.
///
/// When all touched blocks already have the requested kind they revert to
/// paragraphs. List kinds wrap the touched blocks in a new list container
/// (releasing them from any current container first); toggling a list kind
/// off unwraps the touched items into bare paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleBlock {
    pub kind: BlockKind,
}

impl ToggleBlock {
    pub fn new(kind: BlockKind) -> Self {
        Self { kind }
    }
}

impl Command for ToggleBlock {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        if self.kind == BlockKind::ListItem {
            return Err(crate::EditError::InvalidCommand(
                "ListItem cannot be toggled directly; toggle a list kind".to_string(),
            ));
        }

        let resolved = resolve_selection(tree, selection)?;
        let mut new_tree = tree.clone();

        if self.kind.is_list_container() {
            let active = all_items_of_kind(&new_tree, &resolved.blocks, self.kind);
            unwrap_items_from_containers(&mut new_tree, &resolved.blocks)?;
            if !active {
                wrap_blocks_in_list(&mut new_tree, &resolved.blocks, self.kind)?;
            }
        } else {
            let all_match = resolved.blocks.iter().all(|&id| {
                new_tree
                    .get_block(id)
                    .map(|b| b.kind == self.kind)
                    .unwrap_or(false)
            });
            let target = if all_match {
                BlockKind::Paragraph
            } else {
                self.kind
            };
            unwrap_items_from_containers(&mut new_tree, &resolved.blocks)?;
            for &block_id in &resolved.blocks {
                if let Some(block) = new_tree.get_block_mut(block_id) {
                    block.kind = target;
                }
            }
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
        "Toggle Block"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Set the alignment of every block touched by the selection. Inline marks
/// are untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAlignment {
    pub alignment: Alignment,
}

impl SetAlignment {
    pub fn new(alignment: Alignment) -> Self {
        Self { alignment }
    }

    pub fn left() -> Self {
        Self::new(Alignment::Left)
    }

    pub fn center() -> Self {
        Self::new(Alignment::Center)
    }

    pub fn right() -> Self {
        Self::new(Alignment::Right)
    }
}

impl Command for SetAlignment {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let resolved = resolve_selection(tree, selection)?;

        // Store old alignments for undo
        let old_alignments: Vec<(NodeId, Option<Alignment>)> = resolved
            .blocks
            .iter()
            .filter_map(|&id| tree.get_block(id).map(|b| (id, b.alignment)))
            .collect();

        let mut new_tree = tree.clone();
        for &block_id in &resolved.blocks {
            if let Some(block) = new_tree.get_block_mut(block_id) {
                block.alignment = Some(self.alignment);
            }
        }

        Ok(CommandResult {
            tree: new_tree,
            selection: resolved.to_selection(),
            inverse: Box::new(RestoreAlignments {
                entries: old_alignments,
            }),
        })
    }

    fn display_name(&self) -> &str {
        "Set Alignment"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Restore per-block alignments captured by [`SetAlignment`] (undo path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreAlignments {
    pub entries: Vec<(NodeId, Option<Alignment>)>,
}

impl Command for RestoreAlignments {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        let current: Vec<(NodeId, Option<Alignment>)> = self
            .entries
            .iter()
            .filter_map(|&(id, _)| tree.get_block(id).map(|b| (id, b.alignment)))
            .collect();

        let mut new_tree = tree.clone();
        for &(block_id, alignment) in &self.entries {
            if let Some(block) = new_tree.get_block_mut(block_id) {
                block.alignment = alignment;
            }
        }

        Ok(CommandResult {
            tree: new_tree,
            selection: *selection,
            inverse: Box::new(RestoreAlignments { entries: current }),
        })
    }

    fn display_name(&self) -> &str {
        "Restore Alignments"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
