//! Command execution engine

use crate::{Command, Result, UndoManager};
use doc_model::{DocumentTree, Selection};
use std::time::Duration;

/// The main editing engine owning the document state, the current
/// selection, and the undo history.
///
/// The selection is optional: an unfocused editor has none, and every
/// command is a silent no-op until one is set.
pub struct EditingEngine {
    /// Current document tree
    tree: DocumentTree,
    /// Current selection, absent while the editor is unfocused
    selection: Option<Selection>,
    /// Undo manager
    undo_manager: UndoManager,
}

impl EditingEngine {
    /// Create a new editing engine with the canonical empty document and no
    /// selection
    pub fn new() -> Self {
        Self {
            tree: DocumentTree::default(),
            selection: None,
            undo_manager: UndoManager::new(),
        }
    }

    /// Create an editing engine with a specific document tree
    pub fn with_tree(tree: DocumentTree) -> Self {
        Self {
            tree,
            selection: None,
            undo_manager: UndoManager::new(),
        }
    }

    /// Create an editing engine with custom undo limits
    pub fn with_undo_limits(
        tree: DocumentTree,
        max_entries: usize,
        batch_threshold: Duration,
    ) -> Self {
        Self {
            tree,
            selection: None,
            undo_manager: UndoManager::with_limits(max_entries, batch_threshold),
        }
    }

    /// Get the current document tree
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Get the current selection
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Set the selection (editor focused)
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Clear the selection (editor unfocused)
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Place a collapsed caret at the start of the document
    pub fn focus_start(&mut self) {
        if let Some(position) = self.tree.start_position() {
            self.selection = Some(Selection::collapsed(position));
        }
    }

    /// Execute a command against the current state.
    ///
    /// Returns `Ok(true)` when the command was applied, `Ok(false)` when it
    /// was ignored because no selection is active.
    pub fn execute(&mut self, command: Box<dyn Command>) -> Result<bool> {
        let Some(selection) = self.selection else {
            tracing::debug!(
                command = command.display_name(),
                "ignoring command without an active selection"
            );
            return Ok(false);
        };

        let result = command.apply(&self.tree, &selection)?;

        // Record for undo
        self.undo_manager
            .push(command, result.inverse, selection, result.selection);

        // Update state
        self.tree = result.tree;
        self.selection = Some(result.selection);

        Ok(true)
    }

    /// Undo the last command
    pub fn undo(&mut self) -> Result<()> {
        let step = self.undo_manager.pop_undo()?;
        let result = step.command.apply(&self.tree, &step.apply_at)?;

        self.tree = result.tree;
        self.selection = Some(step.restore_to);

        Ok(())
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> Result<()> {
        let step = self.undo_manager.pop_redo()?;
        let result = step.command.apply(&self.tree, &step.apply_at)?;

        self.tree = result.tree;
        self.selection = Some(step.restore_to);

        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }
}

impl Default for EditingEngine {
    fn default() -> Self {
        Self::new()
    }
}
