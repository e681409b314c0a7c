//! Editor Session - the editor component contract
//!
//! A session is constructed from the persisted `value` string (possibly
//! empty or invalid) and an `on_change` callback. Every document-changing
//! operation re-serializes the document and hands the fresh string to
//! `on_change`; persistence itself belongs to the surrounding application.

use doc_model::{Alignment, BlockKind, DocumentTree, Marks, Selection};
use edit_engine::{
    queries, Command, DeleteRange, EditingEngine, InsertImage, InsertLink, InsertText, Mark,
    RemoveLink, Result, SetAlignment, ToggleBlock, ToggleMark,
};
use std::time::Duration;

/// Session configuration: undo history limits
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of undo entries kept
    pub max_undo_entries: usize,
    /// Commands landing within this window may batch into one undo entry
    pub batch_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_undo_entries: 100,
            batch_window: Duration::from_millis(500),
        }
    }
}

/// An editing session owning one document
pub struct EditorSession {
    engine: EditingEngine,
    on_change: Box<dyn FnMut(&str)>,
}

impl EditorSession {
    /// Create a session from a persisted value. Malformed input mounts the
    /// canonical empty document; the editor never refuses to mount.
    pub fn new(value: &str, on_change: impl FnMut(&str) + 'static) -> Self {
        Self::with_config(value, SessionConfig::default(), on_change)
    }

    /// Create a session with explicit configuration
    pub fn with_config(
        value: &str,
        config: SessionConfig,
        on_change: impl FnMut(&str) + 'static,
    ) -> Self {
        let tree = content_json::parse(value);
        tracing::debug!(blocks = tree.body().len(), "editor session mounted");
        Self {
            engine: EditingEngine::with_undo_limits(
                tree,
                config.max_undo_entries,
                config.batch_window,
            ),
            on_change: Box::new(on_change),
        }
    }

    /// The current document serialized to the wire format
    pub fn value(&self) -> String {
        content_json::serialize(self.engine.tree())
    }

    /// The current document tree
    pub fn tree(&self) -> &DocumentTree {
        self.engine.tree()
    }

    // ------------------------------------------------------------------
    // Selection management
    // ------------------------------------------------------------------

    pub fn selection(&self) -> Option<Selection> {
        self.engine.selection()
    }

    /// Focus the editor with an explicit selection
    pub fn set_selection(&mut self, selection: Selection) {
        self.engine.set_selection(selection);
    }

    /// Unfocus the editor; commands become silent no-ops
    pub fn clear_selection(&mut self) {
        self.engine.clear_selection();
    }

    /// Place a collapsed caret at the start of the document
    pub fn focus_start(&mut self) {
        self.engine.focus_start();
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn insert_text(&mut self, text: &str) -> Result<bool> {
        self.run(Box::new(InsertText::new(text)))
    }

    pub fn delete_selection(&mut self) -> Result<bool> {
        self.run(Box::new(DeleteRange::new()))
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> Result<bool> {
        self.run(Box::new(ToggleMark::new(mark)))
    }

    pub fn toggle_block(&mut self, kind: BlockKind) -> Result<bool> {
        self.run(Box::new(ToggleBlock::new(kind)))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> Result<bool> {
        self.run(Box::new(SetAlignment::new(alignment)))
    }

    pub fn insert_link(&mut self, url: &str) -> Result<bool> {
        self.run(Box::new(InsertLink::new(url)))
    }

    pub fn remove_link(&mut self) -> Result<bool> {
        self.run(Box::new(RemoveLink::new()))
    }

    pub fn insert_image(&mut self, url: &str) -> Result<bool> {
        self.run(Box::new(InsertImage::new(url)))
    }

    fn run(&mut self, command: Box<dyn Command>) -> Result<bool> {
        let applied = self.engine.execute(command)?;
        if applied {
            self.notify();
        }
        Ok(applied)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<()> {
        self.engine.undo()?;
        self.notify();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        self.engine.redo()?;
        self.notify();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    // ------------------------------------------------------------------
    // Toolbar state
    // ------------------------------------------------------------------

    /// Marks common to the runs spanned by the current selection
    pub fn active_marks(&self) -> Marks {
        self.with_selection(|tree, selection| queries::active_marks(tree, selection))
            .unwrap_or_default()
    }

    pub fn is_mark_active(&self, mark: Mark) -> bool {
        self.with_selection(|tree, selection| queries::is_mark_active(tree, selection, mark))
            .unwrap_or(false)
    }

    pub fn block_kind(&self) -> Option<BlockKind> {
        self.with_selection(queries::block_kind_at).flatten()
    }

    pub fn alignment(&self) -> Alignment {
        self.with_selection(queries::alignment_at).unwrap_or_default()
    }

    pub fn selected_text(&self) -> String {
        self.with_selection(queries::selected_text).unwrap_or_default()
    }

    fn with_selection<T>(&self, f: impl Fn(&DocumentTree, &Selection) -> T) -> Option<T> {
        self.engine
            .selection()
            .map(|selection| f(self.engine.tree(), &selection))
    }

    fn notify(&mut self) {
        let value = content_json::serialize(self.engine.tree());
        (self.on_change)(&value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Position;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_session(value: &str) -> (EditorSession, Rc<RefCell<Vec<String>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        let session = EditorSession::new(value, move |v: &str| {
            sink.borrow_mut().push(v.to_string());
        });
        (session, changes)
    }

    #[test]
    fn test_invalid_value_mounts_empty_document() {
        let (session, _) = recording_session("definitely not json");
        assert_eq!(
            session.value(),
            r#"[{"type":"paragraph","children":[{"text":""}]}]"#
        );
    }

    #[test]
    fn test_on_change_fires_after_each_command() {
        let (mut session, changes) = recording_session("");
        session.focus_start();

        session.insert_text("Hi").unwrap();
        session.toggle_block(BlockKind::HeadingOne).unwrap();

        let changes = changes.borrow();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            r#"[{"type":"paragraph","children":[{"text":"Hi"}]}]"#
        );
        assert_eq!(
            changes[1],
            r#"[{"type":"heading-one","children":[{"text":"Hi"}]}]"#
        );
    }

    #[test]
    fn test_unfocused_commands_are_silent_noops() {
        let (mut session, changes) = recording_session("");
        let before = session.value();

        let applied = session.insert_text("ignored").unwrap();

        assert!(!applied);
        assert_eq!(session.value(), before);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_undo_redo_fire_on_change() {
        let (mut session, changes) = recording_session("");
        session.focus_start();
        session.insert_text("Hello").unwrap();

        session.undo().unwrap();
        assert_eq!(
            session.value(),
            r#"[{"type":"paragraph","children":[{"text":""}]}]"#
        );

        session.redo().unwrap();
        assert_eq!(
            session.value(),
            r#"[{"type":"paragraph","children":[{"text":"Hello"}]}]"#
        );
        assert_eq!(changes.borrow().len(), 3);
    }

    #[test]
    fn test_session_round_trips_existing_value() {
        let raw = concat!(
            r#"[{"type":"heading-two","children":[{"text":"News"}]},"#,
            r#"{"type":"paragraph","children":[{"text":"body","italic":true}]}]"#
        );
        let (session, _) = recording_session(raw);
        assert_eq!(session.value(), raw);
    }

    #[test]
    fn test_toolbar_state() {
        let (mut session, _) = recording_session("");
        session.focus_start();
        session.insert_text("Hello").unwrap();

        let para = session.tree().body()[0];
        session.set_selection(Selection::new(
            Position::new(para, 0),
            Position::new(para, 5),
        ));
        assert!(!session.is_mark_active(Mark::Bold));

        session.toggle_mark(Mark::Bold).unwrap();
        assert!(session.is_mark_active(Mark::Bold));
        assert_eq!(session.block_kind(), Some(BlockKind::Paragraph));
        assert_eq!(session.alignment(), Alignment::Left);
        assert_eq!(session.selected_text(), "Hello");
    }

    #[test]
    fn test_full_flow_against_persisted_shape() {
        let (mut session, _) = recording_session("");
        session.focus_start();
        session.insert_text("Read the docs").unwrap();

        let para = session.tree().body()[0];
        session.set_selection(Selection::new(
            Position::new(para, 9),
            Position::new(para, 13),
        ));
        session.insert_link("https://example.com/docs").unwrap();

        assert_eq!(
            session.value(),
            concat!(
                r#"[{"type":"paragraph","children":[{"text":"Read the "},"#,
                r#"{"type":"link","url":"https://example.com/docs","children":[{"text":"docs"}]}]}]"#
            )
        );
    }
}
