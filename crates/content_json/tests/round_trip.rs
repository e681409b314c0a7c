//! Round-trip property: any document reachable through the command layer
//! survives serialize/parse unchanged (by serialized form; node IDs are
//! not part of the wire format).

use doc_model::{BlockKind, DocumentTree, Node, NodeId, NodeType, Position, Selection};
use edit_engine::{
    Command, EditingEngine, InsertImage, InsertLink, InsertText, Mark, ToggleBlock, ToggleMark,
};
use proptest::prelude::*;

/// Blocks that can hold a selection, in document order
fn inline_blocks(tree: &DocumentTree) -> Vec<NodeId> {
    fn walk(tree: &DocumentTree, id: NodeId, out: &mut Vec<NodeId>) {
        if tree.node_type(id) != Some(NodeType::Block) {
            return;
        }
        let Some(block) = tree.get_block(id) else {
            return;
        };
        if block.kind.holds_inline_content() {
            out.push(id);
        }
        for &child_id in block.children() {
            walk(tree, child_id, out);
        }
    }
    let mut out = Vec::new();
    for &top_id in tree.body() {
        walk(tree, top_id, &mut out);
    }
    out
}

/// Interpret one fuzz step against the current engine state
fn apply_step(engine: &mut EditingEngine, op: u8, a: u8, b: u8, c: u8) {
    let blocks = inline_blocks(engine.tree());
    if blocks.is_empty() {
        return;
    }
    let block_id = blocks[a as usize % blocks.len()];
    let len = engine.tree().block_char_len(block_id);
    let start = b as usize % (len + 1);
    let end = start + c as usize % (len + 1 - start);
    engine.set_selection(Selection::new(
        Position::new(block_id, start),
        Position::new(block_id, end),
    ));

    let command: Box<dyn Command> = match op % 10 {
        0 | 1 => Box::new(InsertText::new("ab")),
        2 => Box::new(InsertText::new("héllo ")),
        3 => Box::new(ToggleMark::new(Mark::Bold)),
        4 => Box::new(ToggleMark::new(Mark::Italic)),
        5 => Box::new(ToggleMark::new(Mark::Code)),
        6 => Box::new(ToggleBlock::new(BlockKind::HeadingOne)),
        7 => Box::new(ToggleBlock::new(BlockKind::Blockquote)),
        8 => Box::new(ToggleBlock::new(BlockKind::BulletedList)),
        _ => Box::new(InsertLink::new("https://example.com")),
    };
    engine
        .execute(command)
        .expect("fuzzed commands stay within valid state");
}

proptest! {
    #[test]
    fn round_trip_of_reachable_documents(
        steps in proptest::collection::vec(
            (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>()),
            0..32,
        )
    ) {
        let mut engine = EditingEngine::new();
        engine.focus_start();

        for (op, a, b, c) in steps {
            apply_step(&mut engine, op, a, b, c);
            prop_assert!(engine.tree().validate().is_ok());
        }

        let json = content_json::serialize(engine.tree());
        let reparsed = content_json::parse(&json);
        prop_assert!(reparsed.validate().is_ok());
        prop_assert_eq!(content_json::serialize(&reparsed), json);
    }
}

#[test]
fn round_trip_scenario_type_then_bold() {
    let mut engine = EditingEngine::new();
    engine.focus_start();
    let para_id = engine.tree().body()[0];

    engine
        .execute(Box::new(InsertText::new("Hello")))
        .unwrap();
    engine.set_selection(Selection::new(
        Position::new(para_id, 0),
        Position::new(para_id, 5),
    ));
    engine
        .execute(Box::new(ToggleMark::new(Mark::Bold)))
        .unwrap();

    assert_eq!(
        content_json::serialize(engine.tree()),
        r#"[{"type":"paragraph","children":[{"text":"Hello","bold":true}]}]"#
    );
}

#[test]
fn round_trip_scenario_heading_on_empty_document() {
    let mut engine = EditingEngine::new();
    engine.focus_start();

    engine
        .execute(Box::new(ToggleBlock::new(BlockKind::HeadingOne)))
        .unwrap();

    assert_eq!(
        content_json::serialize(engine.tree()),
        r#"[{"type":"heading-one","children":[{"text":""}]}]"#
    );
}

#[test]
fn round_trip_scenario_link_in_empty_paragraph() {
    let mut engine = EditingEngine::new();
    engine.focus_start();

    engine
        .execute(Box::new(InsertLink::new("https://example.com")))
        .unwrap();

    assert_eq!(
        content_json::serialize(engine.tree()),
        concat!(
            r#"[{"type":"paragraph","children":["#,
            r#"{"type":"link","url":"https://example.com","children":[{"text":"https://example.com"}]}]}]"#
        )
    );
}

#[test]
fn round_trip_document_with_image() {
    let mut engine = EditingEngine::new();
    engine.focus_start();
    engine.execute(Box::new(InsertText::new("above"))).unwrap();
    engine
        .execute(Box::new(InsertImage::new("https://example.com/pic.png")))
        .unwrap();

    let json = content_json::serialize(engine.tree());
    let reparsed = content_json::parse(&json);
    assert_eq!(content_json::serialize(&reparsed), json);
}
