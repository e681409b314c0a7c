//! List wrap/unwrap machinery used by block toggling
//!
//! Toggling a list kind on first releases any touched items from their
//! containers, then wraps the affected blocks in a fresh container.
//! Containers are split rather than flattened: items outside the selection
//! keep their list.

use crate::command::child_index_of;
use doc_model::{Block, BlockKind, DocumentTree, Node, NodeId};

/// True when every touched block is a list item inside a container of the
/// given kind
pub(crate) fn all_items_of_kind(
    tree: &DocumentTree,
    block_ids: &[NodeId],
    kind: BlockKind,
) -> bool {
    !block_ids.is_empty()
        && block_ids.iter().all(|&block_id| {
            let is_item = tree
                .get_block(block_id)
                .map(|b| b.kind == BlockKind::ListItem)
                .unwrap_or(false);
            let container_matches = tree
                .parent_of(block_id)
                .and_then(|parent| tree.get_block(parent))
                .map(|container| container.kind == kind)
                .unwrap_or(false);
            is_item && container_matches
        })
}

/// Release every touched list item from its container, leaving it as a bare
/// paragraph sibling of the (split) container. Blocks that are not list
/// items are left alone.
pub(crate) fn unwrap_items_from_containers(
    tree: &mut DocumentTree,
    block_ids: &[NodeId],
) -> crate::Result<()> {
    let mut by_container: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    for &block_id in block_ids {
        let is_item = tree
            .get_block(block_id)
            .map(|b| b.kind == BlockKind::ListItem)
            .unwrap_or(false);
        if !is_item {
            continue;
        }
        let Some(container_id) = tree.parent_of(block_id) else {
            continue;
        };
        match by_container.iter_mut().find(|(c, _)| *c == container_id) {
            Some((_, items)) => items.push(block_id),
            None => by_container.push((container_id, vec![block_id])),
        }
    }

    for (container_id, items) in by_container {
        split_out_items(tree, container_id, &items)?;
    }
    Ok(())
}

/// Split the selected items out of one container. Items before the
/// selection stay in the container; items after it move into a new
/// container of the same kind so their list survives.
fn split_out_items(
    tree: &mut DocumentTree,
    container_id: NodeId,
    items: &[NodeId],
) -> crate::Result<()> {
    let (container_kind, container_parent, children) = {
        let container = tree.get_block(container_id).ok_or_else(|| {
            crate::EditError::InvalidCommand(format!("Container not found: {}", container_id))
        })?;
        (container.kind, container.parent(), container.children().to_vec())
    };

    let Some(first) = children.iter().position(|id| items.contains(id)) else {
        return Ok(());
    };
    let last = children
        .iter()
        .rposition(|id| items.contains(id))
        .unwrap_or(first);

    // The selection is contiguous, so everything between the first and last
    // selected item leaves the container with it.
    let selected: Vec<NodeId> = children[first..=last].to_vec();
    let before_empty = first == 0;
    let after: Vec<NodeId> = children[last + 1..].to_vec();

    for &id in selected.iter().chain(after.iter()) {
        if let Some(container) = tree.get_block_mut(container_id) {
            container.remove_child(id);
        }
    }

    match container_parent {
        None => {
            let index = tree.body_index_of(container_id).ok_or_else(|| {
                crate::EditError::InvalidCommand(format!(
                    "Container not in body: {}",
                    container_id
                ))
            })?;
            let mut insert_at = index + 1;
            if before_empty {
                tree.remove_block(container_id)?;
                insert_at = index;
            }
            for &item in &selected {
                if let Some(block) = tree.get_block_mut(item) {
                    block.kind = BlockKind::Paragraph;
                }
                tree.attach_body_block(insert_at, item)?;
                insert_at += 1;
            }
            if !after.is_empty() {
                let tail_id = tree.insert_body_block(insert_at, Block::new(container_kind));
                reattach_items(tree, tail_id, &after);
            }
        }
        Some(parent_id) => {
            let index = child_index_of(tree, parent_id, container_id)?;
            let mut insert_at = index + 1;
            if before_empty {
                tree.remove_block(container_id)?;
                insert_at = index;
            }
            for &item in &selected {
                if let Some(block) = tree.get_block_mut(item) {
                    block.kind = BlockKind::Paragraph;
                    block.set_parent(Some(parent_id));
                }
                if let Some(parent) = tree.get_block_mut(parent_id) {
                    parent.insert_child(insert_at, item);
                }
                insert_at += 1;
            }
            if !after.is_empty() {
                let tail_id =
                    tree.insert_block_into(Block::new(container_kind), parent_id, Some(insert_at))?;
                reattach_items(tree, tail_id, &after);
            }
        }
    }
    Ok(())
}

fn reattach_items(tree: &mut DocumentTree, container_id: NodeId, items: &[NodeId]) {
    for &item in items {
        if let Some(block) = tree.get_block_mut(item) {
            block.set_parent(Some(container_id));
        }
        if let Some(container) = tree.get_block_mut(container_id) {
            container.add_child(item);
        }
    }
}

/// Wrap contiguous top-level blocks in a new list container of the given
/// kind, converting each to a list item
pub(crate) fn wrap_blocks_in_list(
    tree: &mut DocumentTree,
    block_ids: &[NodeId],
    kind: BlockKind,
) -> crate::Result<()> {
    let Some(&first) = block_ids.first() else {
        return Ok(());
    };
    let index = tree.body_index_of(first).ok_or_else(|| {
        crate::EditError::InvalidCommand(format!("Block not at top level: {}", first))
    })?;
    let container_id = tree.insert_body_block(index, Block::new(kind));

    for &block_id in block_ids {
        tree.detach_body_block(block_id)?;
        if let Some(block) = tree.get_block_mut(block_id) {
            block.kind = BlockKind::ListItem;
            block.set_parent(Some(container_id));
        }
        if let Some(container) = tree.get_block_mut(container_id) {
            container.add_child(block_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Command, ToggleBlock};
    use doc_model::{Block, BlockKind, DocumentTree, Node, NodeId, Position, Run, Selection};

    fn tree_with_paragraphs(texts: &[&str]) -> (DocumentTree, Vec<NodeId>) {
        let mut tree = DocumentTree::new();
        let mut ids = Vec::new();
        for text in texts {
            let para_id = tree.push_body_block(Block::paragraph());
            tree.insert_run(Run::new(*text), para_id, None).unwrap();
            ids.push(para_id);
        }
        (tree, ids)
    }

    #[test]
    fn test_toggle_bulleted_list_on() {
        let (tree, ids) = tree_with_paragraphs(&["one", "two"]);
        let selection = Selection::new(Position::new(ids[0], 0), Position::new(ids[1], 3));

        let result = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &selection)
            .unwrap();

        assert_eq!(result.tree.body().len(), 1);
        let container = result.tree.get_block(result.tree.body()[0]).unwrap();
        assert_eq!(container.kind, BlockKind::BulletedList);
        assert_eq!(container.children().len(), 2);
        for &item_id in container.children() {
            assert_eq!(
                result.tree.get_block(item_id).unwrap().kind,
                BlockKind::ListItem
            );
        }
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_toggle_list_off_leaves_paragraphs() {
        let (tree, ids) = tree_with_paragraphs(&["one", "two"]);
        let selection = Selection::new(Position::new(ids[0], 0), Position::new(ids[1], 3));

        let wrapped = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &selection)
            .unwrap();
        let unwrapped = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&wrapped.tree, &wrapped.selection)
            .unwrap();

        assert_eq!(unwrapped.tree.body().len(), 2);
        for &id in unwrapped.tree.body() {
            assert_eq!(
                unwrapped.tree.get_block(id).unwrap().kind,
                BlockKind::Paragraph
            );
        }
        unwrapped.tree.validate().unwrap();
    }

    #[test]
    fn test_list_kinds_are_exclusive() {
        let (tree, ids) = tree_with_paragraphs(&["one", "two"]);
        let selection = Selection::new(Position::new(ids[0], 0), Position::new(ids[1], 3));

        let bulleted = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &selection)
            .unwrap();
        let numbered = ToggleBlock::new(BlockKind::NumberedList)
            .apply(&bulleted.tree, &bulleted.selection)
            .unwrap();

        assert_eq!(numbered.tree.body().len(), 1);
        let container = numbered.tree.get_block(numbered.tree.body()[0]).unwrap();
        assert_eq!(container.kind, BlockKind::NumberedList);
        for &item_id in container.children() {
            assert_eq!(
                numbered.tree.get_block(item_id).unwrap().kind,
                BlockKind::ListItem
            );
        }
        numbered.tree.validate().unwrap();
    }

    #[test]
    fn test_partial_toggle_splits_container() {
        let (tree, ids) = tree_with_paragraphs(&["one", "two", "three"]);
        let all = Selection::new(Position::new(ids[0], 0), Position::new(ids[2], 5));
        let wrapped = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &all)
            .unwrap();

        // Unwrap only the middle item.
        let middle = Selection::new(Position::new(ids[1], 0), Position::new(ids[1], 3));
        let result = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&wrapped.tree, &middle)
            .unwrap();

        // head list, released paragraph, tail list
        assert_eq!(result.tree.body().len(), 3);
        let head = result.tree.get_block(result.tree.body()[0]).unwrap();
        assert_eq!(head.kind, BlockKind::BulletedList);
        assert_eq!(head.children().len(), 1);
        assert_eq!(
            result.tree.get_block(result.tree.body()[1]).unwrap().kind,
            BlockKind::Paragraph
        );
        let tail = result.tree.get_block(result.tree.body()[2]).unwrap();
        assert_eq!(tail.kind, BlockKind::BulletedList);
        assert_eq!(tail.children().len(), 1);
        assert_eq!(result.tree.block_text(ids[1]), "two");
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_toggle_list_over_partial_selection_retargets_only_selected() {
        let (tree, ids) = tree_with_paragraphs(&["one", "two", "three"]);
        let all = Selection::new(Position::new(ids[0], 0), Position::new(ids[2], 5));
        let bulleted = ToggleBlock::new(BlockKind::BulletedList)
            .apply(&tree, &all)
            .unwrap();

        let middle = Selection::new(Position::new(ids[1], 0), Position::new(ids[1], 3));
        let result = ToggleBlock::new(BlockKind::NumberedList)
            .apply(&bulleted.tree, &middle)
            .unwrap();

        // head bulleted list, new numbered list, tail bulleted list
        assert_eq!(result.tree.body().len(), 3);
        let kinds: Vec<BlockKind> = result
            .tree
            .body()
            .iter()
            .map(|&id| result.tree.get_block(id).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::BulletedList,
                BlockKind::NumberedList,
                BlockKind::BulletedList
            ]
        );
        result.tree.validate().unwrap();
    }

    #[test]
    fn test_single_paragraph_collapsed_selection() {
        let (tree, ids) = tree_with_paragraphs(&["solo"]);
        let selection = Selection::collapsed(Position::new(ids[0], 2));

        let result = ToggleBlock::new(BlockKind::NumberedList)
            .apply(&tree, &selection)
            .unwrap();

        let container = result.tree.get_block(result.tree.body()[0]).unwrap();
        assert_eq!(container.kind, BlockKind::NumberedList);
        assert_eq!(result.tree.block_text(ids[0]), "solo");
        // Selection still points at the (now) list item.
        assert_eq!(result.selection.focus.node_id, ids[0]);
        result.tree.validate().unwrap();
    }
}
