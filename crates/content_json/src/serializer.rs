//! Document serialization to and from the persisted JSON string
//!
//! `parse` is total: malformed input falls back to the canonical empty
//! document and recoverable shape problems are repaired in place, because
//! the editor must never refuse to mount. `serialize` is total and pure.

use crate::wire::{WireAlign, WireElement, WireKind, WireNode, WireText};
use doc_model::{
    Alignment, Block, BlockKind, DocumentTree, ImageNode, LinkNode, Marks, Node, NodeId, NodeType,
    Run,
};

/// Serialize a document tree to the persisted JSON string
pub fn serialize(tree: &DocumentTree) -> String {
    let wire = tree_to_wire(tree);
    match serde_json::to_string(&wire) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!("document serialization failed: {err}");
            "[]".to_string()
        }
    }
}

/// Parse a persisted JSON string into a document tree.
///
/// Never fails: empty or malformed input yields the canonical empty
/// document, and structurally invalid trees are repaired while parsing.
pub fn parse(raw: &str) -> DocumentTree {
    if raw.trim().is_empty() {
        return DocumentTree::with_empty_paragraph();
    }
    let wire: Vec<WireNode> = match serde_json::from_str(raw) {
        Ok(wire) => wire,
        Err(err) => {
            tracing::warn!("malformed document JSON, using empty document: {err}");
            return DocumentTree::with_empty_paragraph();
        }
    };
    wire_to_tree(&wire)
}

// ----------------------------------------------------------------------
// Tree -> wire
// ----------------------------------------------------------------------

fn tree_to_wire(tree: &DocumentTree) -> Vec<WireNode> {
    let mut out = Vec::with_capacity(tree.body().len());
    for &top_id in tree.body() {
        match tree.node_type(top_id) {
            Some(NodeType::Block) => {
                if let Some(element) = block_to_wire(tree, top_id) {
                    out.push(WireNode::Element(element));
                }
            }
            Some(NodeType::Image) => {
                if let Some(image) = tree.get_image(top_id) {
                    out.push(WireNode::Element(image_element(&image.url)));
                }
            }
            _ => {}
        }
    }
    out
}

fn block_to_wire(tree: &DocumentTree, block_id: NodeId) -> Option<WireElement> {
    let block = tree.get_block(block_id)?;
    let mut children = Vec::with_capacity(block.children().len());
    for &child_id in block.children() {
        match tree.node_type(child_id) {
            Some(NodeType::Run) => {
                if let Some(run) = tree.get_run(child_id) {
                    children.push(WireNode::Text(run_to_wire(run)));
                }
            }
            Some(NodeType::Link) => {
                if let Some(link) = tree.get_link(child_id) {
                    let runs = link
                        .children()
                        .iter()
                        .filter_map(|&id| tree.get_run(id))
                        .map(|run| WireNode::Text(run_to_wire(run)))
                        .collect();
                    children.push(WireNode::Element(WireElement {
                        kind: WireKind::Link,
                        url: Some(link.url.clone()),
                        align: None,
                        children: runs,
                    }));
                }
            }
            Some(NodeType::Image) => {
                if let Some(image) = tree.get_image(child_id) {
                    children.push(WireNode::Element(image_element(&image.url)));
                }
            }
            Some(NodeType::Block) => {
                if let Some(element) = block_to_wire(tree, child_id) {
                    children.push(WireNode::Element(element));
                }
            }
            None => {}
        }
    }

    Some(WireElement {
        kind: kind_to_wire(block.kind),
        url: None,
        align: block.alignment.map(align_to_wire),
        children,
    })
}

fn image_element(url: &str) -> WireElement {
    WireElement {
        kind: WireKind::Image,
        url: Some(url.to_string()),
        align: None,
        // Void elements still carry a single empty text child on the wire.
        children: vec![WireNode::Text(WireText {
            text: String::new(),
            ..WireText::default()
        })],
    }
}

fn run_to_wire(run: &Run) -> WireText {
    WireText {
        text: run.text.clone(),
        bold: run.marks.bold,
        italic: run.marks.italic,
        underline: run.marks.underline,
        strikethrough: run.marks.strikethrough,
        code: run.marks.code,
    }
}

fn kind_to_wire(kind: BlockKind) -> WireKind {
    match kind {
        BlockKind::Paragraph => WireKind::Paragraph,
        BlockKind::HeadingOne => WireKind::HeadingOne,
        BlockKind::HeadingTwo => WireKind::HeadingTwo,
        BlockKind::Blockquote => WireKind::Blockquote,
        BlockKind::BulletedList => WireKind::BulletedList,
        BlockKind::NumberedList => WireKind::NumberedList,
        BlockKind::ListItem => WireKind::ListItem,
    }
}

fn align_to_wire(alignment: Alignment) -> WireAlign {
    match alignment {
        Alignment::Left => WireAlign::Left,
        Alignment::Center => WireAlign::Center,
        Alignment::Right => WireAlign::Right,
    }
}

// ----------------------------------------------------------------------
// Wire -> tree
// ----------------------------------------------------------------------

fn wire_to_tree(wire: &[WireNode]) -> DocumentTree {
    let mut tree = DocumentTree::new();

    for node in wire {
        match node {
            WireNode::Element(element) => match element.kind {
                WireKind::Image => {
                    if let Some(url) = non_empty_url(element) {
                        let index = tree.body().len();
                        tree.insert_body_image(index, ImageNode::new(url));
                    }
                }
                WireKind::Link => {
                    // A link cannot float at top level; wrap it in a paragraph.
                    let para_id = tree.push_body_block(Block::paragraph());
                    build_inline_child(&mut tree, para_id, node);
                    finish_inline_block(&mut tree, para_id);
                }
                _ => {
                    build_block(&mut tree, element, None);
                }
            },
            WireNode::Text(_) => {
                // A stray top-level text run gets its own paragraph.
                let para_id = tree.push_body_block(Block::paragraph());
                build_inline_child(&mut tree, para_id, node);
                finish_inline_block(&mut tree, para_id);
            }
        }
    }

    if tree.body().is_empty() {
        return DocumentTree::with_empty_paragraph();
    }
    tree
}

fn build_block(tree: &mut DocumentTree, element: &WireElement, parent: Option<NodeId>) {
    let mut kind = match element.kind {
        WireKind::Paragraph => BlockKind::Paragraph,
        WireKind::HeadingOne => BlockKind::HeadingOne,
        WireKind::HeadingTwo => BlockKind::HeadingTwo,
        WireKind::Blockquote => BlockKind::Blockquote,
        WireKind::BulletedList => BlockKind::BulletedList,
        WireKind::NumberedList => BlockKind::NumberedList,
        WireKind::ListItem => BlockKind::ListItem,
        WireKind::Image | WireKind::Link => return,
    };

    // Repair misplaced kinds instead of refusing the document.
    let parent_is_container = parent
        .and_then(|id| tree.get_block(id))
        .map(|b| b.kind.is_list_container())
        .unwrap_or(false);
    if parent_is_container && kind != BlockKind::ListItem {
        tracing::debug!("coercing {:?} inside a list container to a list item", kind);
        kind = BlockKind::ListItem;
    }
    if !parent_is_container && kind == BlockKind::ListItem {
        tracing::debug!("coercing a stray list item to a paragraph");
        kind = BlockKind::Paragraph;
    }

    let mut block = Block::new(kind);
    block.alignment = element.align.map(wire_to_align);
    let block_id = match parent {
        Some(parent_id) => match tree.insert_block_into(block, parent_id, None) {
            Ok(id) => id,
            Err(_) => return,
        },
        None => tree.push_body_block(block),
    };

    if kind.is_list_container() {
        for child in &element.children {
            match child {
                WireNode::Element(sub) => build_block(tree, sub, Some(block_id)),
                WireNode::Text(text) => {
                    // A bare text run inside a container gets its own item.
                    let item = Block::new(BlockKind::ListItem);
                    if let Ok(item_id) = tree.insert_block_into(item, block_id, None) {
                        let _ = tree.insert_run(wire_to_run(text), item_id, None);
                    }
                }
            }
        }
        return;
    }

    for child in &element.children {
        build_inline_child(tree, block_id, child);
    }
    finish_inline_block(tree, block_id);
}

fn build_inline_child(tree: &mut DocumentTree, block_id: NodeId, node: &WireNode) {
    match node {
        WireNode::Text(text) => {
            let _ = tree.insert_run(wire_to_run(text), block_id, None);
        }
        WireNode::Element(element) => match element.kind {
            WireKind::Link => match non_empty_url(element) {
                Some(url) => {
                    if let Ok(link_id) = tree.insert_link(LinkNode::new(url), block_id, None) {
                        let mut has_run = false;
                        for child in &element.children {
                            if let WireNode::Text(text) = child {
                                has_run = true;
                                let _ = tree.insert_run(wire_to_run(text), link_id, None);
                            }
                        }
                        if !has_run {
                            let _ = tree.insert_run(Run::new(url), link_id, None);
                        }
                    }
                }
                None => {
                    // No usable target: keep the text, drop the link.
                    for child in &element.children {
                        if let WireNode::Text(text) = child {
                            let _ = tree.insert_run(wire_to_run(text), block_id, None);
                        }
                    }
                }
            },
            WireKind::Image => {
                if let Some(url) = non_empty_url(element) {
                    let _ = tree.insert_image_into(ImageNode::new(url), block_id, None);
                }
            }
            _ => build_block(tree, element, Some(block_id)),
        },
    }
}

/// Inline blocks always end up with at least one run
fn finish_inline_block(tree: &mut DocumentTree, block_id: NodeId) {
    let has_inline = tree
        .get_block(block_id)
        .map(|b| {
            b.children()
                .iter()
                .any(|&id| !matches!(tree.node_type(id), Some(NodeType::Block) | None))
        })
        .unwrap_or(true);
    if !has_inline {
        let _ = tree.insert_run(Run::new(""), block_id, Some(0));
    }
}

fn non_empty_url(element: &WireElement) -> Option<&str> {
    element.url.as_deref().filter(|url| !url.is_empty())
}

fn wire_to_run(text: &WireText) -> Run {
    Run::with_marks(
        text.text.clone(),
        Marks {
            bold: text.bold,
            italic: text.italic,
            underline: text.underline,
            strikethrough: text.strikethrough,
            code: text.code,
        },
    )
}

fn wire_to_align(align: WireAlign) -> Alignment {
    match align {
        WireAlign::Left => Alignment::Left,
        WireAlign::Center => Alignment::Center,
        WireAlign::Right => Alignment::Right,
    }
}
