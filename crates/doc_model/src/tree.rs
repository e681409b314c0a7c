//! Document tree operations and storage

use crate::{
    Block, BlockKind, DocModelError, ImageNode, LinkNode, Node, NodeId, NodeType, Position, Result,
    Run,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena storage for all node types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStorage {
    pub blocks: HashMap<NodeId, Block>,
    pub runs: HashMap<NodeId, Run>,
    pub links: HashMap<NodeId, LinkNode>,
    pub images: HashMap<NodeId, ImageNode>,
}

/// The complete document tree.
///
/// Top-level blocks are listed in `body` order; all nodes live in the arena
/// keyed by their `NodeId`. The tree is exclusively owned by one editing
/// session: commands clone it, mutate the clone, and hand it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTree {
    /// IDs of top-level blocks in document order
    body: Vec<NodeId>,
    /// Storage for all nodes
    pub nodes: NodeStorage,
}

impl DocumentTree {
    /// Create a new, completely empty tree. Callers building a document by
    /// hand should prefer [`DocumentTree::with_empty_paragraph`], which is
    /// the canonical empty document.
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            nodes: NodeStorage::default(),
        }
    }

    /// The canonical empty document: a single paragraph holding a single
    /// empty run. Creation default and the terminal state after a full
    /// clear.
    pub fn with_empty_paragraph() -> Self {
        let mut tree = Self::new();
        let para_id = tree.push_body_block(Block::paragraph());
        let run = Run::new("");
        // Inserting into a block we just created cannot fail.
        let _ = tree.insert_run(run, para_id, None);
        tree
    }

    /// Top-level block IDs in document order
    pub fn body(&self) -> &[NodeId] {
        &self.body
    }

    /// Index of a top-level block in the body
    pub fn body_index_of(&self, block_id: NodeId) -> Option<usize> {
        self.body.iter().position(|&id| id == block_id)
    }

    /// A caret position at the very start of the document
    pub fn start_position(&self) -> Option<Position> {
        self.body.first().map(|&id| Position::start_of(id))
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    pub fn get_block(&self, id: NodeId) -> Option<&Block> {
        self.nodes.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        self.nodes.blocks.get_mut(&id)
    }

    pub fn get_run(&self, id: NodeId) -> Option<&Run> {
        self.nodes.runs.get(&id)
    }

    pub fn get_run_mut(&mut self, id: NodeId) -> Option<&mut Run> {
        self.nodes.runs.get_mut(&id)
    }

    pub fn get_link(&self, id: NodeId) -> Option<&LinkNode> {
        self.nodes.links.get(&id)
    }

    pub fn get_link_mut(&mut self, id: NodeId) -> Option<&mut LinkNode> {
        self.nodes.links.get_mut(&id)
    }

    pub fn get_image(&self, id: NodeId) -> Option<&ImageNode> {
        self.nodes.images.get(&id)
    }

    pub fn get_image_mut(&mut self, id: NodeId) -> Option<&mut ImageNode> {
        self.nodes.images.get_mut(&id)
    }

    /// Get the node type for a given ID
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        if self.nodes.blocks.contains_key(&id) {
            return Some(NodeType::Block);
        }
        if self.nodes.runs.contains_key(&id) {
            return Some(NodeType::Run);
        }
        if self.nodes.links.contains_key(&id) {
            return Some(NodeType::Link);
        }
        if self.nodes.images.contains_key(&id) {
            return Some(NodeType::Image);
        }
        None
    }

    /// Get the parent of any node (None for top-level nodes)
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        match self.node_type(id)? {
            NodeType::Block => self.nodes.blocks.get(&id)?.parent(),
            NodeType::Run => self.nodes.runs.get(&id)?.parent(),
            NodeType::Link => self.nodes.links.get(&id)?.parent(),
            NodeType::Image => self.nodes.images.get(&id)?.parent(),
        }
    }

    /// Walk up to the top-level ancestor of a node
    pub fn top_level_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => {
                    return if self.node_type(current).is_some() {
                        Some(current)
                    } else {
                        None
                    }
                }
            }
        }
    }

    /// The block directly holding a node's inline content: a run inside a
    /// link resolves through the link to the block; a block resolves to
    /// itself.
    pub fn containing_block(&self, id: NodeId) -> Option<NodeId> {
        match self.node_type(id)? {
            NodeType::Block => Some(id),
            NodeType::Image => self.parent_of(id),
            NodeType::Run | NodeType::Link => {
                let parent = self.parent_of(id)?;
                match self.node_type(parent)? {
                    NodeType::Block => Some(parent),
                    NodeType::Link => self.parent_of(parent),
                    NodeType::Run | NodeType::Image => None,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append a block at the end of the body, returning its ID
    pub fn push_body_block(&mut self, block: Block) -> NodeId {
        let id = block.id();
        self.nodes.blocks.insert(id, block);
        self.body.push(id);
        id
    }

    /// Insert a block into the body at a specific index
    pub fn insert_body_block(&mut self, index: usize, mut block: Block) -> NodeId {
        block.set_parent(None);
        let id = block.id();
        self.nodes.blocks.insert(id, block);
        self.body.insert(index.min(self.body.len()), id);
        id
    }

    /// Insert a block as a child of another block (list items under list
    /// containers)
    pub fn insert_block_into(
        &mut self,
        mut block: Block,
        parent_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let id = block.id();
        block.set_parent(Some(parent_id));

        let parent = self
            .nodes
            .blocks
            .get_mut(&parent_id)
            .ok_or(DocModelError::NodeNotFound(parent_id.as_uuid()))?;
        match index {
            Some(idx) => parent.insert_child(idx, id),
            None => parent.add_child(id),
        }

        self.nodes.blocks.insert(id, block);
        Ok(id)
    }

    /// Detach a top-level block from the body without touching its subtree
    /// storage. Returns its former index.
    pub fn detach_body_block(&mut self, block_id: NodeId) -> Result<usize> {
        let index = self
            .body_index_of(block_id)
            .ok_or(DocModelError::NodeNotFound(block_id.as_uuid()))?;
        self.body.remove(index);
        Ok(index)
    }

    /// Re-attach a previously detached block at a body index
    pub fn attach_body_block(&mut self, index: usize, block_id: NodeId) -> Result<()> {
        if !self.nodes.blocks.contains_key(&block_id) {
            return Err(DocModelError::NodeNotFound(block_id.as_uuid()));
        }
        if let Some(block) = self.nodes.blocks.get_mut(&block_id) {
            block.set_parent(None);
        }
        self.body.insert(index.min(self.body.len()), block_id);
        Ok(())
    }

    /// Remove a block and its entire subtree from the tree
    pub fn remove_block(&mut self, block_id: NodeId) -> Result<Block> {
        let block = self
            .nodes
            .blocks
            .remove(&block_id)
            .ok_or(DocModelError::NodeNotFound(block_id.as_uuid()))?;

        for &child_id in block.children() {
            self.remove_subtree(child_id);
        }

        match block.parent() {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.blocks.get_mut(&parent_id) {
                    parent.remove_child(block_id);
                }
            }
            None => {
                self.body.retain(|&id| id != block_id);
            }
        }

        Ok(block)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        match self.node_type(id) {
            Some(NodeType::Run) => {
                self.nodes.runs.remove(&id);
            }
            Some(NodeType::Image) => {
                self.nodes.images.remove(&id);
            }
            Some(NodeType::Link) => {
                if let Some(link) = self.nodes.links.remove(&id) {
                    for &child in link.children() {
                        self.nodes.runs.remove(&child);
                    }
                }
            }
            Some(NodeType::Block) => {
                if let Some(block) = self.nodes.blocks.remove(&id) {
                    for &child in block.children() {
                        self.remove_subtree(child);
                    }
                }
            }
            None => {}
        }
    }

    /// Insert a run into a block or link, returning the run's ID
    pub fn insert_run(
        &mut self,
        mut run: Run,
        parent_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let run_id = run.id();
        run.set_parent(Some(parent_id));

        match self.node_type(parent_id) {
            Some(NodeType::Block) => {
                let block = self
                    .nodes
                    .blocks
                    .get_mut(&parent_id)
                    .ok_or(DocModelError::NodeNotFound(parent_id.as_uuid()))?;
                match index {
                    Some(idx) => block.insert_child(idx, run_id),
                    None => block.add_child(run_id),
                }
            }
            Some(NodeType::Link) => {
                let link = self
                    .nodes
                    .links
                    .get_mut(&parent_id)
                    .ok_or(DocModelError::NodeNotFound(parent_id.as_uuid()))?;
                match index {
                    Some(idx) => link.insert_child(idx, run_id),
                    None => link.add_child(run_id),
                }
            }
            _ => {
                return Err(DocModelError::InvalidOperation(format!(
                    "Cannot insert run into {:?}",
                    parent_id
                )))
            }
        }

        self.nodes.runs.insert(run_id, run);
        Ok(run_id)
    }

    /// Remove a run from the tree
    pub fn remove_run(&mut self, run_id: NodeId) -> Result<Run> {
        let run = self
            .nodes
            .runs
            .remove(&run_id)
            .ok_or(DocModelError::NodeNotFound(run_id.as_uuid()))?;

        if let Some(parent_id) = run.parent() {
            match self.node_type(parent_id) {
                Some(NodeType::Block) => {
                    if let Some(block) = self.nodes.blocks.get_mut(&parent_id) {
                        block.remove_child(run_id);
                    }
                }
                Some(NodeType::Link) => {
                    if let Some(link) = self.nodes.links.get_mut(&parent_id) {
                        link.remove_child(run_id);
                    }
                }
                _ => {}
            }
        }

        Ok(run)
    }

    /// Insert a link into a block, returning the link's ID
    pub fn insert_link(
        &mut self,
        mut link: LinkNode,
        block_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let link_id = link.id();
        link.set_parent(Some(block_id));

        let block = self
            .nodes
            .blocks
            .get_mut(&block_id)
            .ok_or(DocModelError::NodeNotFound(block_id.as_uuid()))?;
        match index {
            Some(idx) => block.insert_child(idx, link_id),
            None => block.add_child(link_id),
        }

        self.nodes.links.insert(link_id, link);
        Ok(link_id)
    }

    /// Remove a link and its child runs from the tree
    pub fn remove_link(&mut self, link_id: NodeId) -> Result<LinkNode> {
        let link = self
            .nodes
            .links
            .remove(&link_id)
            .ok_or(DocModelError::NodeNotFound(link_id.as_uuid()))?;

        for &child_id in link.children() {
            self.nodes.runs.remove(&child_id);
        }

        if let Some(parent_id) = link.parent() {
            if let Some(block) = self.nodes.blocks.get_mut(&parent_id) {
                block.remove_child(link_id);
            }
        }

        Ok(link)
    }

    /// Insert an image into the body at a specific index
    pub fn insert_body_image(&mut self, index: usize, mut image: ImageNode) -> NodeId {
        image.set_parent(None);
        let id = image.id();
        self.nodes.images.insert(id, image);
        self.body.insert(index.min(self.body.len()), id);
        id
    }

    /// Insert an image as inline content of a block
    pub fn insert_image_into(
        &mut self,
        mut image: ImageNode,
        block_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let id = image.id();
        image.set_parent(Some(block_id));

        let block = self
            .nodes
            .blocks
            .get_mut(&block_id)
            .ok_or(DocModelError::NodeNotFound(block_id.as_uuid()))?;
        match index {
            Some(idx) => block.insert_child(idx, id),
            None => block.add_child(id),
        }

        self.nodes.images.insert(id, image);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Text access
    // ------------------------------------------------------------------

    /// Run IDs of a block's inline content in visual order, descending into
    /// links. Images contribute no runs.
    pub fn inline_runs(&self, block_id: NodeId) -> Vec<NodeId> {
        let mut runs = Vec::new();
        let Some(block) = self.get_block(block_id) else {
            return runs;
        };
        for &child_id in block.children() {
            match self.node_type(child_id) {
                Some(NodeType::Run) => runs.push(child_id),
                Some(NodeType::Link) => {
                    if let Some(link) = self.get_link(child_id) {
                        runs.extend(link.children().iter().copied());
                    }
                }
                _ => {}
            }
        }
        runs
    }

    /// Concatenated text of a block's inline content
    pub fn block_text(&self, block_id: NodeId) -> String {
        self.inline_runs(block_id)
            .iter()
            .filter_map(|&id| self.get_run(id))
            .map(|run| run.text.as_str())
            .collect()
    }

    /// Total char length of a block's inline content
    pub fn block_char_len(&self, block_id: NodeId) -> usize {
        self.inline_runs(block_id)
            .iter()
            .filter_map(|&id| self.get_run(id))
            .map(|run| run.char_len())
            .sum()
    }

    // ------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------

    /// Merge adjacent sibling runs with identical marks and drop empty runs
    /// (keeping one empty run when a container would otherwise have no
    /// inline content). Applies to the block's direct children and to each
    /// link child.
    pub fn merge_adjacent_runs(&mut self, block_id: NodeId) {
        let Some(block) = self.get_block(block_id) else {
            return;
        };
        let link_children: Vec<NodeId> = block
            .children()
            .iter()
            .copied()
            .filter(|&id| self.node_type(id) == Some(NodeType::Link))
            .collect();

        for link_id in link_children {
            self.normalize_run_list(link_id);
        }
        self.normalize_run_list(block_id);
    }

    fn normalize_run_list(&mut self, parent_id: NodeId) {
        let child_ids: Vec<NodeId> = match self.node_type(parent_id) {
            Some(NodeType::Block) => self
                .get_block(parent_id)
                .map(|b| b.children().to_vec())
                .unwrap_or_default(),
            Some(NodeType::Link) => self
                .get_link(parent_id)
                .map(|l| l.children().to_vec())
                .unwrap_or_default(),
            _ => return,
        };

        // Merge each run into its preceding sibling when marks match.
        let mut previous_run: Option<NodeId> = None;
        for child_id in child_ids {
            if self.node_type(child_id) != Some(NodeType::Run) {
                previous_run = None;
                continue;
            }
            let Some(prev_id) = previous_run else {
                previous_run = Some(child_id);
                continue;
            };
            let mergeable = match (self.get_run(prev_id), self.get_run(child_id)) {
                (Some(prev), Some(current)) => prev.marks == current.marks,
                _ => false,
            };
            if mergeable {
                let absorbed = match self.remove_run(child_id) {
                    Ok(run) => run,
                    Err(_) => continue,
                };
                if let Some(prev) = self.get_run_mut(prev_id) {
                    prev.text.push_str(&absorbed.text);
                }
            } else {
                previous_run = Some(child_id);
            }
        }

        // Drop empty runs, keeping one when the container would end up with
        // no inline children at all.
        let child_ids: Vec<NodeId> = match self.node_type(parent_id) {
            Some(NodeType::Block) => self
                .get_block(parent_id)
                .map(|b| b.children().to_vec())
                .unwrap_or_default(),
            Some(NodeType::Link) => self
                .get_link(parent_id)
                .map(|l| l.children().to_vec())
                .unwrap_or_default(),
            _ => return,
        };
        let non_empty_inline = child_ids
            .iter()
            .filter(|&&id| match self.node_type(id) {
                Some(NodeType::Run) => self.get_run(id).is_some_and(|r| !r.is_empty()),
                Some(NodeType::Link) | Some(NodeType::Image) => true,
                _ => false,
            })
            .count();
        let mut kept_any = false;
        for child_id in child_ids {
            if self.node_type(child_id) != Some(NodeType::Run) {
                continue;
            }
            let is_empty = self.get_run(child_id).is_some_and(|r| r.is_empty());
            if is_empty {
                if non_empty_inline == 0 && !kept_any {
                    kept_any = true;
                    continue;
                }
                let _ = self.remove_run(child_id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------

    /// Check the structural invariants of the tree:
    /// - the body is non-empty,
    /// - list items appear only under list containers and list containers
    ///   hold only list items,
    /// - links hold only runs,
    /// - every child reference resolves and agrees with its parent pointer,
    /// - link and image URLs are non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.body.is_empty() {
            return Err(DocModelError::TreeStructureError(
                "document body is empty".to_string(),
            ));
        }

        for &top_id in &self.body {
            match self.node_type(top_id) {
                Some(NodeType::Block) => {
                    let block = self
                        .get_block(top_id)
                        .ok_or(DocModelError::NodeNotFound(top_id.as_uuid()))?;
                    if block.kind == BlockKind::ListItem {
                        return Err(DocModelError::TreeStructureError(
                            "list item at top level".to_string(),
                        ));
                    }
                    self.validate_block(top_id, None)?;
                }
                Some(NodeType::Image) => {
                    let image = self
                        .get_image(top_id)
                        .ok_or(DocModelError::NodeNotFound(top_id.as_uuid()))?;
                    if image.url.is_empty() {
                        return Err(DocModelError::TreeStructureError(
                            "image with empty url".to_string(),
                        ));
                    }
                }
                _ => {
                    return Err(DocModelError::TreeStructureError(
                        "top-level node is neither block nor image".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn validate_block(&self, block_id: NodeId, parent: Option<NodeId>) -> Result<()> {
        let block = self
            .get_block(block_id)
            .ok_or(DocModelError::NodeNotFound(block_id.as_uuid()))?;
        if block.parent() != parent {
            return Err(DocModelError::TreeStructureError(format!(
                "parent pointer mismatch on block {}",
                block_id
            )));
        }

        for &child_id in block.children() {
            match self.node_type(child_id) {
                Some(NodeType::Block) => {
                    let child = self
                        .get_block(child_id)
                        .ok_or(DocModelError::NodeNotFound(child_id.as_uuid()))?;
                    if block.kind.is_list_container() && child.kind != BlockKind::ListItem {
                        return Err(DocModelError::TreeStructureError(
                            "list container holds a non-list-item block".to_string(),
                        ));
                    }
                    if child.kind == BlockKind::ListItem && !block.kind.is_list_container() {
                        return Err(DocModelError::TreeStructureError(
                            "list item outside a list container".to_string(),
                        ));
                    }
                    self.validate_block(child_id, Some(block_id))?;
                }
                Some(NodeType::Run) => {
                    if block.kind.is_list_container() {
                        return Err(DocModelError::TreeStructureError(
                            "list container holds a bare run".to_string(),
                        ));
                    }
                    self.validate_child_parent(child_id, block_id)?;
                }
                Some(NodeType::Link) => {
                    if block.kind.is_list_container() {
                        return Err(DocModelError::TreeStructureError(
                            "list container holds a link".to_string(),
                        ));
                    }
                    self.validate_link(child_id, block_id)?;
                }
                Some(NodeType::Image) => {
                    let image = self
                        .get_image(child_id)
                        .ok_or(DocModelError::NodeNotFound(child_id.as_uuid()))?;
                    if image.url.is_empty() {
                        return Err(DocModelError::TreeStructureError(
                            "image with empty url".to_string(),
                        ));
                    }
                    self.validate_child_parent(child_id, block_id)?;
                }
                None => return Err(DocModelError::NodeNotFound(child_id.as_uuid())),
            }
        }
        Ok(())
    }

    fn validate_link(&self, link_id: NodeId, parent_id: NodeId) -> Result<()> {
        let link = self
            .get_link(link_id)
            .ok_or(DocModelError::NodeNotFound(link_id.as_uuid()))?;
        if link.parent() != Some(parent_id) {
            return Err(DocModelError::TreeStructureError(format!(
                "parent pointer mismatch on link {}",
                link_id
            )));
        }
        if link.url.is_empty() {
            return Err(DocModelError::TreeStructureError(
                "link with empty url".to_string(),
            ));
        }
        for &child_id in link.children() {
            if self.node_type(child_id) != Some(NodeType::Run) {
                return Err(DocModelError::TreeStructureError(
                    "link holds a non-run child".to_string(),
                ));
            }
            self.validate_child_parent(child_id, link_id)?;
        }
        Ok(())
    }

    fn validate_child_parent(&self, child_id: NodeId, parent_id: NodeId) -> Result<()> {
        let actual = self.parent_of(child_id);
        if actual != Some(parent_id) {
            return Err(DocModelError::TreeStructureError(format!(
                "parent pointer mismatch on node {}",
                child_id
            )));
        }
        Ok(())
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::with_empty_paragraph()
    }
}
