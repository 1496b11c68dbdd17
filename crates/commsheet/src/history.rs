//! Undo/redo coordination.
//!
//! A bounded dual-stack of snapshots. One user-visible action maps to one
//! snapshot, taken immediately before the mutation; the stacks swap the
//! running state with popped snapshots on undo and redo. The same
//! coordinator serves the sheet editor (snapshotting [`crate::sheet::Sheet`])
//! and the library editor (snapshotting [`crate::store::LibraryBundle`]).

/// Default maximum number of retained snapshots.
pub const DEFAULT_DEPTH: usize = 20;

/// A bounded undo/redo stack over cloneable snapshots.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: Vec<T>,
    redo: Vec<T>,
    limit: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl<T: Clone> History<T> {
    /// Create a history bounded to `limit` snapshots (at least one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record a snapshot of the current state immediately before a mutating
    /// action. Clears the redo stack; the oldest snapshot is silently
    /// dropped once the bound is reached.
    pub fn push(&mut self, current: T) {
        if self.undo.len() == self.limit {
            self.undo.remove(0);
        }
        self.undo.push(current);
        self.redo.clear();
    }

    /// Pop the most recent snapshot, pushing the pre-undo state onto the
    /// redo stack. Returns the state to restore, or `None` if there is
    /// nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop()?;
        if self.redo.len() == self.limit {
            self.redo.remove(0);
        }
        self.redo.push(current);
        Some(previous)
    }

    /// Mirror of [`History::undo`]: pop the most recent redo snapshot,
    /// pushing the pre-redo state onto the undo stack.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        if self.undo.len() == self.limit {
            self.undo.remove(0);
        }
        self.undo.push(current);
        Some(next)
    }

    /// Whether an undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of retained undo snapshots.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of retained redo snapshots.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
