//! Undo/redo over the document reducer
//!
//! `DocumentStore` owns the live document state and wraps dispatch with
//! before/after snapshot capture for undoable actions. Both snapshots are
//! taken synchronously around the reducer call: `after` comes straight from
//! the reducer's return value, never from a later read of shared state.

use std::collections::VecDeque;

use crate::document::{reduce, DocumentAction, DocumentState};

/// Maximum number of retained undo entries; oldest evicted first
pub const MAX_UNDO_DEPTH: usize = 50;

/// Before/after state pair for one undoable action
#[derive(Debug, Clone)]
struct UndoEntry {
    before: DocumentState,
    after: DocumentState,
}

/// Document state plus bounded undo/redo history
///
/// Non-whitelisted actions (selection, view, cache fills) pass through to
/// the reducer without touching either stack.
#[derive(Debug)]
pub struct DocumentStore {
    state: DocumentState,
    past: VecDeque<UndoEntry>,
    future: Vec<UndoEntry>,
    max_depth: usize,
}

impl DocumentStore {
    /// Create a store over the default empty document
    pub fn new() -> Self {
        Self::with_state(DocumentState::default())
    }

    /// Create a store over an existing document state
    pub fn with_state(state: DocumentState) -> Self {
        Self {
            state,
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: MAX_UNDO_DEPTH,
        }
    }

    /// Override the history depth (mainly for tests)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Current document state
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Apply an action, recording an undo entry if it is whitelisted
    ///
    /// Any dispatch of an undoable action invalidates the redo history.
    pub fn dispatch(&mut self, action: DocumentAction) {
        if action.is_undoable() {
            let before = self.state.clone();
            let after = reduce(std::mem::take(&mut self.state), action);
            self.state = after.clone();
            self.past.push_back(UndoEntry { before, after });
            if self.past.len() > self.max_depth {
                self.past.pop_front();
            }
            self.future.clear();
        } else {
            self.state = reduce(std::mem::take(&mut self.state), action);
        }
    }

    /// Restore the state before the most recent undoable action
    ///
    /// Silent no-op when the history is empty.
    pub fn undo(&mut self) {
        let Some(entry) = self.past.pop_back() else {
            return;
        };
        self.state = reduce(
            std::mem::take(&mut self.state),
            DocumentAction::Replace(entry.before.clone()),
        );
        self.future.push(entry);
    }

    /// Re-apply the most recently undone action
    ///
    /// Silent no-op when nothing has been undone.
    pub fn redo(&mut self) {
        let Some(entry) = self.future.pop() else {
            return;
        };
        self.state = reduce(
            std::mem::take(&mut self.state),
            DocumentAction::Replace(entry.after.clone()),
        );
        self.past.push_back(entry);
    }

    /// Whether an undo entry is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether a redo entry is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
