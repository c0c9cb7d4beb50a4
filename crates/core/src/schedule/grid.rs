//! Grid projections of a schedule page.

use super::{CellKey, SchedulePage};
use crate::{
    grid::{GridCells, MergeInfo},
    models::Weekday,
};

/// Which projection of a page a grid shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleView {
    /// One weekday: row 0 holds teacher names, rows 1.. are slots, columns
    /// are teachers.
    Day(Weekday),
    /// One teacher: rows are slots, columns are the seven weekdays.
    Teacher(u32),
}

impl ScheduleView {
    /// Grid row reserved for names, if any.
    pub fn name_row(self) -> Option<usize> {
        match self {
            ScheduleView::Day(_) => Some(0),
            ScheduleView::Teacher(_) => None,
        }
    }

    /// Grid row showing `slot`.
    pub fn grid_row(self, slot: u32) -> usize {
        match self {
            ScheduleView::Day(_) => slot as usize + 1,
            ScheduleView::Teacher(_) => slot as usize,
        }
    }

    /// Slot shown on grid row `row`, if the row is a slot row.
    pub fn slot_at(self, row: usize) -> Option<u32> {
        match self {
            ScheduleView::Day(_) => row.checked_sub(1).map(|slot| slot as u32),
            ScheduleView::Teacher(_) => Some(row as u32),
        }
    }

    /// Grid dimensions `(rows, cols)` for the page.
    pub fn dimensions(self, page: &SchedulePage) -> (usize, usize) {
        let time_rows = page.time_rows() as usize;
        match self {
            ScheduleView::Day(_) => (time_rows + 1, page.teachers.len()),
            ScheduleView::Teacher(_) => (time_rows, Weekday::ALL.len()),
        }
    }

    /// Teacher shown in column `col`.
    pub fn teacher_at(self, page: &SchedulePage, col: usize) -> Option<u32> {
        match self {
            ScheduleView::Day(_) => page.teachers.get(col).map(|teacher| teacher.id),
            ScheduleView::Teacher(id) => page.teacher(id).map(|teacher| teacher.id),
        }
    }

    /// Store key behind a grid cell; `None` for the name row and for
    /// addresses outside the page.
    pub fn key_at(self, page: &SchedulePage, row: usize, col: usize) -> Option<CellKey> {
        let (rows, cols) = self.dimensions(page);
        if row >= rows || col >= cols {
            return None;
        }
        let slot = self.slot_at(row)?;
        match self {
            ScheduleView::Day(day) => {
                let teacher = page.teachers.get(col)?;
                Some(CellKey::new(teacher.id, day, slot))
            }
            ScheduleView::Teacher(id) => {
                let day = Weekday::from_index(col)?;
                Some(CellKey::new(id, day, slot))
            }
        }
    }
}

/// Read-only grid adapter over one page projection.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGrid<'a> {
    page: &'a SchedulePage,
    view: ScheduleView,
}

impl<'a> ScheduleGrid<'a> {
    /// Project `page` through `view`.
    pub fn new(page: &'a SchedulePage, view: ScheduleView) -> Self {
        Self { page, view }
    }

    /// The projection in use.
    pub fn view(&self) -> ScheduleView {
        self.view
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        self.view.dimensions(self.page)
    }

    /// Text shown in a cell: the teacher name on the name row, otherwise the
    /// cell content.
    pub fn text(&self, row: usize, col: usize) -> &'a str {
        let page = self.page;
        if self.view.name_row() == Some(row) {
            return page
                .teachers
                .get(col)
                .map(|teacher| teacher.name.as_str())
                .unwrap_or("");
        }
        self.view
            .key_at(page, row, col)
            .map(|key| page.schedules.content(key))
            .unwrap_or("")
    }

    /// Column header labels.
    pub fn column_labels(&self) -> Vec<String> {
        match self.view {
            ScheduleView::Day(_) => self
                .page
                .teachers
                .iter()
                .map(|teacher| teacher.name.clone())
                .collect(),
            ScheduleView::Teacher(_) => Weekday::ALL
                .iter()
                .map(|day| self.page.day_label(*day))
                .collect(),
        }
    }

    /// Row header labels (blank for the name row).
    pub fn row_labels(&self) -> Vec<String> {
        let slots = self.page.slot_labels();
        match self.view {
            ScheduleView::Day(_) => std::iter::once(String::new()).chain(slots).collect(),
            ScheduleView::Teacher(_) => slots,
        }
    }
}

impl GridCells for ScheduleGrid<'_> {
    fn has_cell(&self, row: usize, col: usize) -> bool {
        let (rows, cols) = self.dimensions();
        row < rows && col < cols
    }

    fn has_content(&self, row: usize, col: usize) -> bool {
        !self.text(row, col).trim().is_empty()
    }

    fn merge_info(&self, row: usize, col: usize) -> Option<MergeInfo> {
        let key = self.view.key_at(self.page, row, col)?;
        let group = self
            .page
            .schedules
            .group_at(key.teacher_id, key.day, key.slot)?;
        Some(MergeInfo {
            main_row: self.view.grid_row(group.start),
            rowspan: group.rowspan as usize,
            is_main: key.slot == group.start,
        })
    }

    fn skip_row(&self, row: usize) -> bool {
        self.view.name_row() == Some(row)
    }
}
