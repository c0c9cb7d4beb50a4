#![allow(missing_docs)]

//! Flat record tables (students, payment rows, intake rows) as grids.

use crate::{
    error::EditError,
    grid::{CellPosition, GridCells},
};

/// A record whose text fields are laid out as grid columns.
pub trait RecordRow {
    /// Column headers, one per editable field.
    const COLUMNS: &'static [&'static str];

    /// Table-local id.
    fn row_id(&self) -> u32;
    /// Field shown in column `col`.
    fn field(&self, col: usize) -> Option<&str>;
    /// Mutable field for column `col`.
    fn field_mut(&mut self, col: usize) -> Option<&mut String>;
}

/// Grid adapter over a slice of records.
#[derive(Debug, Clone, Copy)]
pub struct RecordGrid<'a, R> {
    rows: &'a [R],
}

impl<'a, R: RecordRow> RecordGrid<'a, R> {
    pub fn new(rows: &'a [R]) -> Self {
        Self { rows }
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows.len(), R::COLUMNS.len())
    }

    pub fn text(&self, row: usize, col: usize) -> &'a str {
        let rows = self.rows;
        rows.get(row).and_then(|record| record.field(col)).unwrap_or("")
    }

    /// Id of the record on grid row `row`.
    pub fn row_id(&self, row: usize) -> Option<u32> {
        self.rows.get(row).map(RecordRow::row_id)
    }
}

impl<R: RecordRow> GridCells for RecordGrid<'_, R> {
    fn has_cell(&self, row: usize, col: usize) -> bool {
        row < self.rows.len() && col < R::COLUMNS.len()
    }

    fn has_content(&self, row: usize, col: usize) -> bool {
        !self.text(row, col).trim().is_empty()
    }
}

/// Set one field of the record with id `row_id`.
pub fn set_field<R: RecordRow>(
    rows: &mut [R],
    row_id: u32,
    col: usize,
    value: &str,
) -> Result<(), EditError> {
    let record = rows
        .iter_mut()
        .find(|record| record.row_id() == row_id)
        .ok_or(EditError::UnknownRow(row_id))?;
    if let Some(field) = record.field_mut(col) {
        *field = value.to_string();
    }
    Ok(())
}

/// Blank every addressed field. Out-of-range positions are ignored.
pub fn clear_fields<R: RecordRow>(rows: &mut [R], positions: &[CellPosition]) -> usize {
    let mut cleared = 0;
    for position in positions {
        if let Some(field) = rows
            .get_mut(position.row)
            .and_then(|record| record.field_mut(position.col))
        {
            if !field.is_empty() {
                field.clear();
                cleared += 1;
            }
        }
    }
    cleared
}

/// Remove the record with id `row_id`.
pub fn remove_row<R: RecordRow>(rows: &mut Vec<R>, row_id: u32) -> Result<R, EditError> {
    let index = rows
        .iter()
        .position(|record| record.row_id() == row_id)
        .ok_or(EditError::UnknownRow(row_id))?;
    Ok(rows.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Pair {
        id: u32,
        left: String,
        right: String,
    }

    impl RecordRow for Pair {
        const COLUMNS: &'static [&'static str] = &["left", "right"];

        fn row_id(&self) -> u32 {
            self.id
        }

        fn field(&self, col: usize) -> Option<&str> {
            match col {
                0 => Some(&self.left),
                1 => Some(&self.right),
                _ => None,
            }
        }

        fn field_mut(&mut self, col: usize) -> Option<&mut String> {
            match col {
                0 => Some(&mut self.left),
                1 => Some(&mut self.right),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Pair> {
        vec![
            Pair {
                id: 4,
                left: "a".into(),
                right: "b".into(),
            },
            Pair {
                id: 9,
                left: " ".into(),
                right: "d".into(),
            },
        ]
    }

    #[test]
    fn grid_reports_shape_and_content() {
        let rows = rows();
        let grid = RecordGrid::new(&rows);
        assert_eq!(grid.dimensions(), (2, 2));
        assert!(grid.has_content(0, 1));
        assert!(!grid.has_content(1, 0));
        assert!(!grid.has_cell(2, 0));
        assert_eq!(grid.row_id(1), Some(9));
    }

    #[test]
    fn edits_address_rows_by_id_and_clears_by_position() {
        let mut rows = rows();
        assert_eq!(set_field(&mut rows, 9, 0, "c"), Ok(()));
        assert_eq!(rows[1].left, "c");
        assert_eq!(set_field(&mut rows, 1, 0, "x"), Err(EditError::UnknownRow(1)));

        let cleared = clear_fields(
            &mut rows,
            &[CellPosition::new(0, 0), CellPosition::new(1, 1), CellPosition::new(5, 0)],
        );
        assert_eq!(cleared, 2);
        assert_eq!(rows[0].left, "");
        assert_eq!(rows[1].right, "");

        assert_eq!(remove_row(&mut rows, 4).map(|r| r.id), Ok(4));
        assert_eq!(rows.len(), 1);
    }
}
