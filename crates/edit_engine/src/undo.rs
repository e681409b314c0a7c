//! Undo/redo manager with bounded history
//!
//! Each entry records the command, its inverse, and the selections on both
//! sides of the edit, so undo and redo replay against the selection the
//! edit actually happened at rather than wherever the caret is now.

use crate::{Command, EditError, Result};
use doc_model::Selection;
use std::time::{Duration, Instant};

/// An entry in the undo history
struct UndoEntry {
    /// The original command
    command: Box<dyn Command>,
    /// The inverse command (for undo)
    inverse: Box<dyn Command>,
    /// Selection the command was applied at
    selection_before: Selection,
    /// Selection after the command ran
    selection_after: Selection,
    /// When this entry was created
    timestamp: Instant,
}

/// A replayable step handed back to the engine: the command to apply, the
/// selection to apply it at, and the selection to restore afterwards
pub struct ReplayStep {
    pub command: Box<dyn Command>,
    pub apply_at: Selection,
    pub restore_to: Selection,
}

/// Manages undo and redo stacks
pub struct UndoManager {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    /// Maximum number of undo entries
    max_entries: usize,
    /// Commands pushed within this window may merge into one entry
    batch_threshold: Duration,
}

impl UndoManager {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: 100,
            batch_threshold: Duration::from_millis(500),
        }
    }

    /// Create with custom limits
    pub fn with_limits(max_entries: usize, batch_threshold: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
            batch_threshold,
        }
    }

    /// Push a command onto the undo stack
    pub fn push(
        &mut self,
        command: Box<dyn Command>,
        inverse: Box<dyn Command>,
        selection_before: Selection,
        selection_after: Selection,
    ) {
        // New work invalidates the redo stack.
        self.redo_stack.clear();

        let now = Instant::now();

        // Within the batch window, commands may merge into the previous
        // entry. The entry's inverse and pre-selection stay the original
        // ones so a single undo rolls back the whole batch.
        if let Some(last) = self.undo_stack.last_mut() {
            if now.duration_since(last.timestamp) < self.batch_threshold {
                if let Some(merged) = last.command.merge_with(command.as_ref()) {
                    last.command = merged;
                    last.selection_after = selection_after;
                    last.timestamp = now;
                    return;
                }
            }
        }

        self.undo_stack.push(UndoEntry {
            command,
            inverse,
            selection_before,
            selection_after,
            timestamp: now,
        });

        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Take the undo step for the most recent entry, moving the entry to
    /// the redo stack
    pub fn pop_undo(&mut self) -> Result<ReplayStep> {
        let entry = self.undo_stack.pop().ok_or(EditError::UndoStackEmpty)?;
        let step = ReplayStep {
            command: entry.inverse.clone_box(),
            apply_at: entry.selection_after,
            restore_to: entry.selection_before,
        };
        self.redo_stack.push(entry);
        Ok(step)
    }

    /// Take the redo step for the most recently undone entry, moving the
    /// entry back to the undo stack
    pub fn pop_redo(&mut self) -> Result<ReplayStep> {
        let entry = self.redo_stack.pop().ok_or(EditError::RedoStackEmpty)?;
        let step = ReplayStep {
            command: entry.command.clone_box(),
            apply_at: entry.selection_before,
            restore_to: entry.selection_after,
        };
        self.undo_stack.push(entry);
        Ok(step)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
