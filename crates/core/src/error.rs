//! User-visible error taxonomy.

use thiserror::Error;

/// Rejected edits. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The section must keep at least one page.
    #[error("cannot delete the last remaining page")]
    LastPage,
    /// Names and titles may not be blank.
    #[error("name must not be empty")]
    EmptyName,
    /// No page with this id.
    #[error("page {0} does not exist")]
    UnknownPage(u32),
    /// No teacher with this id on the current schedule page.
    #[error("teacher {0} does not exist")]
    UnknownTeacher(u32),
    /// No table with this id.
    #[error("table {0} does not exist")]
    UnknownTable(u32),
    /// No row with this id.
    #[error("row {0} does not exist")]
    UnknownRow(u32),
    /// A merge or unmerge was requested without a selection.
    #[error("select the cells to merge first")]
    NoSelection,
    /// Merges are vertical only.
    #[error("only cells in a single column can be merged")]
    NotVertical,
    /// A merge covers at least two rows.
    #[error("select at least two rows to merge")]
    TooShort,
    /// The teacher-name row is not mergeable.
    #[error("the name row cannot be merged")]
    IncludesNameRow,
    /// The range touches an existing merge group.
    #[error("the range overlaps an existing merged cell")]
    Overlap,
}

/// Persistence failures surfaced to the user as an alert.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend answered with a non-success status.
    #[error("server responded with {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        detail: String,
    },
    /// The backend accepted the request but reported `success: false`.
    #[error("save was rejected by the server")]
    Rejected,
    /// Network-level failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The payload was not a valid document.
    #[error("invalid document: {0}")]
    Decode(#[from] serde_json::Error),
    /// Local file access failed.
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),
}
