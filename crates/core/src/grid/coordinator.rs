#![allow(missing_docs)]

use super::CellPosition;

/// Screen-level coordination between several grid instances.
///
/// Only one grid is live at a time. A structural edit in one grid (a merge
/// that moves focus to the group's primary cell, say) posts a pending focus
/// target which the owning grid consumes on its next update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGrid<Id> {
    active: Option<Id>,
    pending_focus: Option<(Id, CellPosition)>,
}

impl<Id> Default for ActiveGrid<Id> {
    fn default() -> Self {
        Self {
            active: None,
            pending_focus: None,
        }
    }
}

impl<Id: Clone + PartialEq> ActiveGrid<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Id> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &Id) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Make `id` the live grid. Returns true when the live grid changed.
    pub fn activate(&mut self, id: Id) -> bool {
        if self.is_active(&id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Ask `id` to focus `position` and make it live.
    pub fn request_focus(&mut self, id: Id, position: CellPosition) {
        self.active = Some(id.clone());
        self.pending_focus = Some((id, position));
    }

    /// Take the pending target if it is addressed to `id`.
    pub fn take_focus_for(&mut self, id: &Id) -> Option<CellPosition> {
        match &self.pending_focus {
            Some((target, _)) if target == id => self.pending_focus.take().map(|(_, pos)| pos),
            _ => None,
        }
    }

    pub fn pending_focus(&self) -> Option<&(Id, CellPosition)> {
        self.pending_focus.as_ref()
    }
}
