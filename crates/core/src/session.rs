#![allow(missing_docs)]

//! Live editing session: the document, its undo history and save state.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    document::AppDocument,
    error::{EditError, StoreError},
    history::EditHistory,
    store::SaveReceipt,
};

/// History entry: a document and the revision it was committed as.
///
/// Equality looks at the document only, so re-committing an unchanged
/// document is still deduplicated.
#[derive(Debug, Clone)]
struct Snapshot {
    document: AppDocument,
    revision: u64,
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

/// Owns the in-memory document. Every committed edit is one undo step.
#[derive(Debug, Clone)]
pub struct Session {
    document: AppDocument,
    history: EditHistory<Snapshot>,
    is_saving: bool,
    last_saved: Option<DateTime<Utc>>,
    revision: u64,
    next_revision: u64,
    saved_revision: u64,
    pending_revision: Option<u64>,
}

impl Session {
    /// Start from `document` with an undo depth of `history_limit`.
    pub fn new(mut document: AppDocument, history_limit: usize) -> Self {
        document.normalize();
        Self {
            last_saved: document.last_saved,
            history: EditHistory::new(
                Snapshot {
                    document: document.clone(),
                    revision: 0,
                },
                history_limit,
            ),
            document,
            is_saving: false,
            revision: 0,
            next_revision: 1,
            saved_revision: 0,
            pending_revision: None,
        }
    }

    /// The current document.
    pub fn document(&self) -> &AppDocument {
        &self.document
    }

    /// Whether a save round-trip is in flight.
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Time of the last successful save or load.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Whether there are edits the backend has not seen.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply an infallible edit.
    pub fn edit<R>(&mut self, apply: impl FnOnce(&mut AppDocument) -> R) -> R {
        let mut draft = self.document.clone();
        let result = apply(&mut draft);
        self.commit(draft);
        result
    }

    /// Apply a fallible edit. On error the document is left untouched.
    pub fn try_edit<R>(
        &mut self,
        apply: impl FnOnce(&mut AppDocument) -> Result<R, EditError>,
    ) -> Result<R, EditError> {
        let mut draft = self.document.clone();
        let result = apply(&mut draft)?;
        self.commit(draft);
        Ok(result)
    }

    fn take_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    fn commit(&mut self, draft: AppDocument) {
        let snapshot = Snapshot {
            document: draft,
            revision: self.next_revision,
        };
        if self.history.push(snapshot) {
            self.revision = self.take_revision();
            self.document = self.history.current().document.clone();
        }
    }

    fn restore(&mut self, snapshot: Option<Snapshot>) -> bool {
        match snapshot {
            Some(Snapshot { document, revision }) => {
                self.document = document;
                self.revision = revision;
                true
            }
            None => false,
        }
    }

    /// Step back one edit. Undoing back to the saved revision leaves the
    /// session clean.
    pub fn undo(&mut self) -> bool {
        let snapshot = self.history.undo().cloned();
        self.restore(snapshot)
    }

    /// Re-apply an undone edit.
    pub fn redo(&mut self) -> bool {
        let snapshot = self.history.redo().cloned();
        self.restore(snapshot)
    }

    /// Snapshot to send to the backend, or `None` while a save is already
    /// in flight.
    pub fn begin_save(&mut self) -> Option<AppDocument> {
        if self.is_saving {
            return None;
        }
        self.is_saving = true;
        self.pending_revision = Some(self.revision);
        Some(self.document.clone())
    }

    /// Record the save outcome. A failure keeps the edits pending.
    pub fn finish_save(
        &mut self,
        result: Result<SaveReceipt, StoreError>,
    ) -> Result<DateTime<Utc>, StoreError> {
        self.is_saving = false;
        let pending = self.pending_revision.take();
        match result {
            Ok(receipt) => {
                self.last_saved = Some(receipt.last_saved);
                if let Some(revision) = pending {
                    self.saved_revision = revision;
                }
                info!(last_saved = %receipt.last_saved, "save recorded");
                Ok(receipt.last_saved)
            }
            Err(err) => {
                warn!("save failed, keeping unsaved edits: {err}");
                Err(err)
            }
        }
    }

    /// Replace the document with a loaded one. A failure keeps the current
    /// (default) document.
    pub fn apply_loaded(&mut self, result: Result<AppDocument, StoreError>) -> Result<(), StoreError> {
        match result {
            Ok(mut document) => {
                document.normalize();
                self.last_saved = document.last_saved;
                let revision = self.take_revision();
                self.history.reset(Snapshot {
                    document: document.clone(),
                    revision,
                });
                self.document = document;
                self.revision = revision;
                self.saved_revision = revision;
                Ok(())
            }
            Err(err) => {
                warn!("load failed, keeping the current document: {err}");
                Err(err)
            }
        }
    }
}
