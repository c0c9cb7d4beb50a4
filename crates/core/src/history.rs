#![allow(missing_docs)]

//! Bounded undo/redo over whole-state snapshots.

/// Linear snapshot history with a cursor.
///
/// Pushing after an undo discards the redo tail; pushing a state equal to
/// the current one is a no-op. When the limit is reached the oldest
/// snapshot is dropped.
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    snapshots: Vec<T>,
    index: usize,
    limit: usize,
}

impl<T: Clone + PartialEq> EditHistory<T> {
    pub fn new(initial: T, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> &T {
        &self.snapshots[self.index]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Record a new state. Returns false when it equals the current one.
    pub fn push(&mut self, state: T) -> bool {
        if self.current() == &state {
            return false;
        }
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(state);
        if self.snapshots.len() > self.limit {
            let overflow = self.snapshots.len() - self.limit;
            self.snapshots.drain(..overflow);
        }
        self.index = self.snapshots.len() - 1;
        true
    }

    /// Step back one snapshot.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Step forward one snapshot.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Forget everything and start over from `state`.
    pub fn reset(&mut self, state: T) {
        self.snapshots.clear();
        self.snapshots.push(state);
        self.index = 0;
    }
}
