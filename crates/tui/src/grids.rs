//! Binding between on-screen grids and the document sections behind them.

use academy_core::{
    grid::{CellPosition, GridCells, MergeInfo},
    intake::InOutRow,
    models::SchoolLevel,
    payment::{PaymentPage, PaymentRow},
    roster::StudentRow,
    schedule::{ScheduleGrid, SchedulePage, ScheduleView},
    table::{RecordGrid, RecordRow},
    AppDocument, EditError,
};

/// Identity of one grid instance. Navigation state is kept per id, so
/// switching pages or views never leaks focus between grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridId {
    Students { level: SchoolLevel, class_id: u32 },
    Schedule { page_id: u32, view: ScheduleView },
    Payment { page_id: u32, level: SchoolLevel },
    InOut { table_id: u32 },
}

/// Read-only view of the data behind a grid.
pub enum GridSource<'a> {
    Schedule(ScheduleGrid<'a>),
    Students(RecordGrid<'a, StudentRow>),
    Payment(RecordGrid<'a, PaymentRow>),
    InOut(RecordGrid<'a, InOutRow>),
}

impl<'a> GridSource<'a> {
    /// Resolve `id` against the document; `None` once the backing page,
    /// class or table is gone.
    pub fn resolve(document: &'a AppDocument, id: GridId) -> Option<Self> {
        match id {
            GridId::Students { level, class_id } => {
                let section = document.roster(level);
                section.class(class_id)?;
                Some(GridSource::Students(RecordGrid::new(
                    section.students(class_id),
                )))
            }
            GridId::Schedule { page_id, view } => {
                let page = document.schedule.page(page_id)?;
                if let ScheduleView::Teacher(teacher_id) = view {
                    page.teacher(teacher_id)?;
                }
                Some(GridSource::Schedule(page.grid(view)))
            }
            GridId::Payment { page_id, level } => {
                let page = document.payment.page(page_id)?;
                Some(GridSource::Payment(RecordGrid::new(&page.table(level).rows)))
            }
            GridId::InOut { table_id } => {
                let table = document.inout.table(table_id)?;
                Some(GridSource::InOut(RecordGrid::new(&table.rows)))
            }
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            GridSource::Schedule(grid) => grid.dimensions(),
            GridSource::Students(grid) => grid.dimensions(),
            GridSource::Payment(grid) => grid.dimensions(),
            GridSource::InOut(grid) => grid.dimensions(),
        }
    }

    pub fn text(&self, row: usize, col: usize) -> &'a str {
        match self {
            GridSource::Schedule(grid) => grid.text(row, col),
            GridSource::Students(grid) => grid.text(row, col),
            GridSource::Payment(grid) => grid.text(row, col),
            GridSource::InOut(grid) => grid.text(row, col),
        }
    }

    pub fn column_labels(&self) -> Vec<String> {
        fn record_labels<R: RecordRow>() -> Vec<String> {
            R::COLUMNS.iter().map(|label| label.to_string()).collect()
        }
        match self {
            GridSource::Schedule(grid) => match grid.view() {
                // The name row carries the teacher names in the day view.
                ScheduleView::Day(_) => (1..=grid.dimensions().1)
                    .map(|n| format!("#{n}"))
                    .collect(),
                ScheduleView::Teacher(_) => grid.column_labels(),
            },
            GridSource::Students(_) => record_labels::<StudentRow>(),
            GridSource::Payment(_) => record_labels::<PaymentRow>(),
            GridSource::InOut(_) => record_labels::<InOutRow>(),
        }
    }

    pub fn row_labels(&self) -> Vec<String> {
        match self {
            GridSource::Schedule(grid) => grid.row_labels(),
            _ => (1..=self.dimensions().0).map(|n| n.to_string()).collect(),
        }
    }

    /// Record id on a grid row, for the flat tables.
    pub fn row_id(&self, row: usize) -> Option<u32> {
        match self {
            GridSource::Schedule(_) => None,
            GridSource::Students(grid) => grid.row_id(row),
            GridSource::Payment(grid) => grid.row_id(row),
            GridSource::InOut(grid) => grid.row_id(row),
        }
    }

    fn cells(&self) -> &dyn GridCells {
        match self {
            GridSource::Schedule(grid) => grid,
            GridSource::Students(grid) => grid,
            GridSource::Payment(grid) => grid,
            GridSource::InOut(grid) => grid,
        }
    }
}

impl GridCells for GridSource<'_> {
    fn has_cell(&self, row: usize, col: usize) -> bool {
        self.cells().has_cell(row, col)
    }

    fn has_content(&self, row: usize, col: usize) -> bool {
        self.cells().has_content(row, col)
    }

    fn merge_info(&self, row: usize, col: usize) -> Option<MergeInfo> {
        self.cells().merge_info(row, col)
    }

    fn skip_row(&self, row: usize) -> bool {
        self.cells().skip_row(row)
    }
}

/// Write edited text back into the cell at `position`.
pub fn apply_text(
    document: &mut AppDocument,
    id: GridId,
    position: CellPosition,
    text: &str,
) -> Result<(), EditError> {
    let row_id = GridSource::resolve(document, id).and_then(|source| source.row_id(position.row));
    match id {
        GridId::Students { level, class_id } => {
            let student_id = row_id.ok_or(EditError::UnknownRow(position.row as u32))?;
            document
                .roster_mut(level)
                .set_student_field(class_id, student_id, position.col, text)
        }
        GridId::Schedule { page_id, view } => {
            let page = schedule_page_mut(document, page_id)?;
            if view.name_row() == Some(position.row) {
                let teacher = view
                    .teacher_at(page, position.col)
                    .ok_or(EditError::UnknownTeacher(position.col as u32))?;
                return page.rename_teacher(teacher, text);
            }
            let key = view
                .key_at(page, position.row, position.col)
                .ok_or(EditError::UnknownRow(position.row as u32))?;
            page.set_cell(key.teacher_id, key.day, key.slot, text);
            Ok(())
        }
        GridId::Payment { page_id, level } => {
            let row_id = row_id.ok_or(EditError::UnknownRow(position.row as u32))?;
            payment_page_mut(document, page_id)?.set_field(level, row_id, position.col, text)
        }
        GridId::InOut { table_id } => {
            let row_id = row_id.ok_or(EditError::UnknownRow(position.row as u32))?;
            document
                .inout
                .set_field(table_id, row_id, position.col, text)
        }
    }
}

/// Blank every addressed cell of a grid in one step.
pub fn clear_cells(
    document: &mut AppDocument,
    id: GridId,
    positions: &[CellPosition],
) -> Result<(), EditError> {
    match id {
        GridId::Students { level, class_id } => {
            document
                .roster_mut(level)
                .clear_student_cells(class_id, positions)?;
        }
        GridId::Schedule { page_id, view } => {
            schedule_page_mut(document, page_id)?.clear_grid_cells(view, positions);
        }
        GridId::Payment { page_id, level } => {
            payment_page_mut(document, page_id)?.clear_cells(level, positions);
        }
        GridId::InOut { table_id } => {
            document.inout.clear_cells(table_id, positions)?;
        }
    }
    Ok(())
}

pub fn payment_page_mut(
    document: &mut AppDocument,
    page_id: u32,
) -> Result<&mut PaymentPage, EditError> {
    document
        .payment
        .pages
        .iter_mut()
        .find(|page| page.page_id == page_id)
        .ok_or(EditError::UnknownPage(page_id))
}

pub fn schedule_page_mut(
    document: &mut AppDocument,
    page_id: u32,
) -> Result<&mut SchedulePage, EditError> {
    document
        .schedule
        .pages
        .iter_mut()
        .find(|page| page.page_id == page_id)
        .ok_or(EditError::UnknownPage(page_id))
}
