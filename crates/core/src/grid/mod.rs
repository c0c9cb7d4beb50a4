//! Spreadsheet-style grid navigation shared by every editable table.
//!
//! A [`GridNavigator`] owns focus, selection, edit mode and drag state for a
//! single `rows × cols` grid. The data behind the grid is supplied through
//! the [`GridCells`] trait so the same engine drives schedule lanes, roster
//! students, payment rows and intake rows.

mod coordinator;
mod navigator;

pub use coordinator::ActiveGrid;
pub use navigator::{GridAction, GridConfig, GridKey, GridMode, GridNavigator, KeyInput};

use serde::{Deserialize, Serialize};

/// Zero-based cell address inside one grid instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl CellPosition {
    /// Build a position from row and column.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Rectangular selection between two corners. The corners are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    /// Anchor corner (preserved while extending).
    pub start: CellPosition,
    /// Moving corner.
    pub end: CellPosition,
}

impl SelectionRange {
    /// Selection covering exactly one cell.
    pub const fn single(position: CellPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Selection between two corners.
    pub const fn new(start: CellPosition, end: CellPosition) -> Self {
        Self { start, end }
    }

    /// Normalized `(min_row, min_col, max_row, max_col)`.
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (
            self.start.row.min(self.end.row),
            self.start.col.min(self.end.col),
            self.start.row.max(self.end.row),
            self.start.col.max(self.end.col),
        )
    }

    /// Whether the rectangle contains `(row, col)`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (min_row, min_col, max_row, max_col) = self.bounds();
        (min_row..=max_row).contains(&row) && (min_col..=max_col).contains(&col)
    }

    /// Every cell of the rectangle in row-major order.
    pub fn cells(&self) -> Vec<CellPosition> {
        let (min_row, min_col, max_row, max_col) = self.bounds();
        let mut cells = Vec::with_capacity((max_row - min_row + 1) * (max_col - min_col + 1));
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                cells.push(CellPosition::new(row, col));
            }
        }
        cells
    }

    /// True when the rectangle spans a single column.
    pub fn is_single_column(&self) -> bool {
        self.start.col == self.end.col
    }

    /// Number of rows covered.
    pub fn row_count(&self) -> usize {
        let (min_row, _, max_row, _) = self.bounds();
        max_row - min_row + 1
    }
}

/// Merge membership of a grid cell, expressed in grid rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeInfo {
    /// Grid row of the group's primary cell.
    pub main_row: usize,
    /// Number of rows in the group (always at least 2).
    pub rowspan: usize,
    /// Whether the queried cell is the primary cell.
    pub is_main: bool,
}

impl MergeInfo {
    /// Last grid row covered by the group.
    pub fn last_row(&self) -> usize {
        self.main_row + self.rowspan - 1
    }
}

/// Visual state of one cell derived from navigator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Inside the current selection rectangle.
    pub selected: bool,
    /// The focused cell.
    pub focused: bool,
    /// The cell currently in edit mode.
    pub editing: bool,
}

/// Data view a navigator runs against.
///
/// Addresses for which [`GridCells::has_cell`] is false are skipped by
/// arrow-key traversal and cannot take focus. Merge groups must report
/// `has_cell == true` for every row they cover.
pub trait GridCells {
    /// Whether a backing cell exists at the address.
    fn has_cell(&self, row: usize, col: usize) -> bool {
        let _ = (row, col);
        true
    }

    /// Whether the cell holds non-blank text.
    fn has_content(&self, row: usize, col: usize) -> bool;

    /// Merge membership of the cell, if any.
    fn merge_info(&self, row: usize, col: usize) -> Option<MergeInfo> {
        let _ = (row, col);
        None
    }

    /// Rows excluded from arrow-key traversal (e.g. a name row).
    fn skip_row(&self, row: usize) -> bool {
        let _ = row;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_bounds_are_normalized() {
        let range = SelectionRange::new(CellPosition::new(4, 3), CellPosition::new(1, 0));
        assert_eq!(range.bounds(), (1, 0, 4, 3));
        assert!(range.contains(2, 2));
        assert!(!range.contains(5, 0));
        assert_eq!(range.row_count(), 4);
        assert!(!range.is_single_column());
        assert_eq!(range.cells().len(), 16);
    }

    #[test]
    fn single_selection_covers_one_cell() {
        let range = SelectionRange::single(CellPosition::new(2, 2));
        assert_eq!(range.cells(), vec![CellPosition::new(2, 2)]);
        assert!(range.is_single_column());
    }
}
