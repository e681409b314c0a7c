//! Drives an editor session from the command line and prints every value
//! handed to `on_change`.
//!
//! Run with `RUST_LOG=debug cargo run -p editor_session --example demo` to
//! see the engine's diagnostics as well.

use anyhow::Result;
use doc_model::{Alignment, BlockKind, Position, Selection};
use edit_engine::Mark;
use editor_session::EditorSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut session = EditorSession::new("", |value| println!("on_change: {value}"));
    session.focus_start();

    session.insert_text("Quarterly update")?;
    session.toggle_block(BlockKind::HeadingOne)?;
    session.set_alignment(Alignment::Center)?;

    // New paragraph content below the heading.
    session.insert_image("https://example.com/banner.png")?;
    session.insert_text("All results are ")?;

    let para = *session.tree().body().last().expect("body is never empty");
    let len = session.tree().block_char_len(para);
    session.set_selection(Selection::collapsed(Position::new(para, len)));
    session.insert_text("green")?;

    let start = len;
    session.set_selection(Selection::new(
        Position::new(para, start),
        Position::new(para, start + 5),
    ));
    session.toggle_mark(Mark::Bold)?;
    session.insert_link("https://example.com/results")?;

    session.undo()?;
    session.redo()?;

    println!("final value: {}", session.value());
    Ok(())
}
