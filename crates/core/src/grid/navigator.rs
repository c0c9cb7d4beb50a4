#![allow(missing_docs)]

use tracing::debug;

use super::{CellPosition, CellStyle, GridCells, SelectionRange};

/// Static shape and behaviour flags of one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    /// Number of addressable rows.
    pub rows: usize,
    /// Number of addressable columns.
    pub cols: usize,
    /// Wrap to the opposite edge instead of stopping.
    pub wrap_around: bool,
    /// Only the live grid on a screen renders focus/selection styling.
    pub is_active: bool,
}

impl GridConfig {
    /// Active, non-wrapping grid of the given size.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            wrap_around: false,
            is_active: true,
        }
    }

    /// Enable or disable wrap-around.
    pub fn with_wrap_around(mut self, wrap_around: bool) -> Self {
        self.wrap_around = wrap_around;
        self
    }
}

/// Coarse interaction state. Drag selection is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// Nothing focused.
    Idle,
    /// A cell has focus.
    Focused,
    /// A cell is being edited.
    Editing,
}

/// Keys the navigator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKey {
    Enter,
    Tab,
    F2,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    /// Anything else; left for the caller.
    Other,
}

impl GridKey {
    fn direction(self) -> Option<(isize, isize)> {
        match self {
            GridKey::Up => Some((-1, 0)),
            GridKey::Down => Some((1, 0)),
            GridKey::Left => Some((0, -1)),
            GridKey::Right => Some((0, 1)),
            _ => None,
        }
    }
}

/// A key press with modifiers.
///
/// `caret_at_boundary` is supplied by the caller's text editor: it is true
/// when an arrow key would move the caret past the edge of the text, which
/// lets navigation take over while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: GridKey,
    pub ctrl: bool,
    pub shift: bool,
    pub caret_at_boundary: bool,
}

impl KeyInput {
    /// Unmodified key press.
    pub fn plain(key: GridKey) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            caret_at_boundary: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn at_boundary(mut self, at_boundary: bool) -> Self {
        self.caret_at_boundary = at_boundary;
        self
    }
}

/// Outcome of [`GridNavigator::handle_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridAction {
    /// Key consumed; nothing observable changed.
    None,
    /// Focus and/or selection moved.
    Moved,
    /// The cell entered edit mode; the caller places the caret at the end.
    EditStarted(CellPosition),
    /// Edit mode ended on the cell, which keeps focus.
    EditFinished(CellPosition),
    /// The caller should clear these cells in one state transition.
    Clear(Vec<CellPosition>),
    /// Key not consumed; the caller (text editor, shortcuts) may handle it.
    Ignored,
}

/// Per-grid focus, selection, edit and drag state.
#[derive(Debug, Clone)]
pub struct GridNavigator {
    config: GridConfig,
    focused: Option<CellPosition>,
    selection: Option<SelectionRange>,
    editing: Option<CellPosition>,
    selecting: bool,
    drag_start: Option<CellPosition>,
    selection_changed: bool,
}

impl GridNavigator {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            focused: None,
            selection: None,
            editing: None,
            selecting: false,
            drag_start: None,
            selection_changed: false,
        }
    }

    pub fn config(&self) -> GridConfig {
        self.config
    }

    pub fn rows(&self) -> usize {
        self.config.rows
    }

    pub fn cols(&self) -> usize {
        self.config.cols
    }

    /// Change the grid shape. Any selection or drag in progress is dropped and
    /// focus/edit positions that fall outside the new shape are cleared.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if self.config.rows == rows && self.config.cols == cols {
            return;
        }
        debug!(rows, cols, "grid resized");
        self.config.rows = rows;
        self.config.cols = cols;
        self.selecting = false;
        self.drag_start = None;
        self.set_selection(None);
        let inside = |pos: &CellPosition| pos.row < rows && pos.col < cols;
        self.focused = self.focused.filter(inside);
        self.editing = self.editing.filter(inside);
    }

    pub fn set_active(&mut self, active: bool) {
        self.config.is_active = active;
    }

    pub fn is_active(&self) -> bool {
        self.config.is_active
    }

    pub fn set_wrap_around(&mut self, wrap_around: bool) {
        self.config.wrap_around = wrap_around;
    }

    pub fn focused(&self) -> Option<CellPosition> {
        self.focused
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    pub fn editing(&self) -> Option<CellPosition> {
        self.editing
    }

    /// True while a mouse drag selection is in progress.
    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn mode(&self) -> GridMode {
        if self.editing.is_some() {
            GridMode::Editing
        } else if self.focused.is_some() {
            GridMode::Focused
        } else {
            GridMode::Idle
        }
    }

    pub fn is_editing_at(&self, row: usize, col: usize) -> bool {
        self.editing == Some(CellPosition::new(row, col))
    }

    /// Returns the new selection once after every change.
    pub fn take_selection_change(&mut self) -> Option<Option<SelectionRange>> {
        if std::mem::take(&mut self.selection_changed) {
            Some(self.selection)
        } else {
            None
        }
    }

    /// Replace the selection (e.g. after a merge rewrote the geometry).
    pub fn select(&mut self, range: Option<SelectionRange>) {
        self.set_selection(range);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
        self.drag_start = None;
    }

    /// Move focus to the address; no-op when nothing backs it.
    pub fn focus_cell(&mut self, row: usize, col: usize, cells: &dyn GridCells) -> bool {
        if !self.contains(row, col) || !cells.has_cell(row, col) {
            return false;
        }
        self.focused = Some(CellPosition::new(row, col));
        true
    }

    /// Put one cell into edit mode. Any other cell leaves edit mode.
    pub fn enter_edit_mode(&mut self, row: usize, col: usize, cells: &dyn GridCells) -> bool {
        if !self.focus_cell(row, col, cells) {
            return false;
        }
        self.editing = Some(CellPosition::new(row, col));
        true
    }

    pub fn exit_edit_mode(&mut self) -> bool {
        self.editing.take().is_some()
    }

    /// Single directional step with skip/merge/skip-row redirection.
    pub fn move_cell(
        &mut self,
        row: usize,
        col: usize,
        d_row: isize,
        d_col: isize,
        cells: &dyn GridCells,
    ) -> bool {
        let rows = self.config.rows as isize;
        let cols = self.config.cols as isize;
        if rows == 0 || cols == 0 || (d_row == 0 && d_col == 0) {
            return false;
        }

        let mut r = row as isize + d_row;
        let mut c = col as isize + d_col;
        if !self.settle(&mut r, &mut c) {
            return false;
        }

        let max_attempts = rows * cols;
        let mut attempts = 0;
        while !cells.has_cell(r as usize, c as usize) {
            if attempts >= max_attempts {
                return false;
            }
            r += d_row;
            c += d_col;
            if !self.settle(&mut r, &mut c) {
                return false;
            }
            attempts += 1;
        }

        let col = c as usize;
        let Some(target) = self.redirect_row(r as usize, col, d_row, cells) else {
            return false;
        };

        self.focus_cell(target, col, cells);
        let end = cells
            .merge_info(target, col)
            .map(|info| info.last_row())
            .unwrap_or(target);
        self.set_selection(Some(SelectionRange::new(
            CellPosition::new(target, col),
            CellPosition::new(end, col),
        )));
        true
    }

    /// Ctrl+direction: run until the first non-blank cell or the edge.
    pub fn move_to_end(
        &mut self,
        row: usize,
        col: usize,
        d_row: isize,
        d_col: isize,
        cells: &dyn GridCells,
    ) -> bool {
        if (d_row == 0 && d_col == 0) || !self.contains(row, col) {
            return false;
        }
        let rows = self.config.rows as isize;
        let cols = self.config.cols as isize;
        let (mut r, mut c) = (row as isize, col as isize);
        let mut last = (row, col);

        loop {
            r += d_row;
            c += d_col;
            if r < 0 || r >= rows || c < 0 || c >= cols {
                break;
            }
            let (ur, uc) = (r as usize, c as usize);
            if cells.skip_row(ur) {
                if d_row != 0 {
                    continue;
                }
                break;
            }
            if !cells.has_cell(ur, uc) {
                break;
            }
            last = (ur, uc);
            if cells.has_content(ur, uc) {
                break;
            }
        }

        // Landing inside a merge group snaps to its primary row.
        let (target, end) = cells
            .merge_info(last.0, last.1)
            .map(|info| (info.main_row, info.last_row()))
            .unwrap_or((last.0, last.0));
        self.focus_cell(target, last.1, cells);
        self.set_selection(Some(SelectionRange::new(
            CellPosition::new(target, last.1),
            CellPosition::new(end, last.1),
        )));
        (target, last.1) != (row, col)
    }

    /// Shift+direction: grow the selection's moving corner by one step.
    pub fn extend_selection(
        &mut self,
        row: usize,
        col: usize,
        d_row: isize,
        d_col: isize,
        cells: &dyn GridCells,
    ) -> bool {
        let r = row as isize + d_row;
        let c = col as isize + d_col;
        if r < 0 || c < 0 || !self.contains(r as usize, c as usize) {
            return false;
        }
        let col_target = c as usize;
        let Some(row_target) = self.redirect_row(r as usize, col_target, d_row, cells) else {
            return false;
        };

        let end = CellPosition::new(row_target, col_target);
        let start = match self.selection {
            Some(existing) => existing.start,
            None => CellPosition::new(row, col),
        };
        self.set_selection(Some(SelectionRange::new(start, end)));
        self.focus_cell(row_target, col_target, cells);
        true
    }

    /// Begin a drag selection. Merge groups are selected whole.
    pub fn handle_mouse_down(&mut self, row: usize, col: usize, cells: &dyn GridCells) {
        if !self.contains(row, col) || self.is_editing_at(row, col) {
            return;
        }
        // Clicking elsewhere ends editing the way a blur would.
        self.editing = None;

        let (start_row, end_row) = cells
            .merge_info(row, col)
            .map(|info| (info.main_row, info.last_row()))
            .unwrap_or((row, row));

        let anchor = CellPosition::new(start_row, col);
        self.selecting = true;
        self.drag_start = Some(anchor);
        self.set_selection(Some(SelectionRange::new(
            anchor,
            CellPosition::new(end_row, col),
        )));
        self.focus_cell(start_row, col, cells);
    }

    /// Extend the live drag selection to the hovered cell.
    pub fn handle_mouse_enter(&mut self, row: usize, col: usize, cells: &dyn GridCells) {
        if !self.selecting || !self.contains(row, col) {
            return;
        }
        let Some(anchor) = self.drag_start else {
            return;
        };
        self.set_selection(Some(SelectionRange::new(anchor, CellPosition::new(row, col))));
        self.focus_cell(row, col, cells);
    }

    /// End the drag. Also used for the global, window-level release.
    pub fn handle_mouse_up(&mut self) {
        self.selecting = false;
    }

    /// Unified keyboard dispatcher for the cell at `(row, col)`.
    pub fn handle_key(
        &mut self,
        input: KeyInput,
        row: usize,
        col: usize,
        cells: &dyn GridCells,
    ) -> GridAction {
        let here = CellPosition::new(row, col);
        let editing_here = self.editing == Some(here);

        match input.key {
            GridKey::Enter | GridKey::Tab => {
                if editing_here {
                    self.exit_edit_mode();
                    self.focus_cell(row, col, cells);
                    return GridAction::EditFinished(here);
                }
                let (d_row, d_col) = if input.key == GridKey::Enter {
                    (1, 0)
                } else {
                    (0, 1)
                };
                let moved = self.move_cell(row, col, d_row, d_col, cells);
                return self.moved(moved);
            }
            GridKey::F2 => {
                if editing_here {
                    return GridAction::None;
                }
                return if self.enter_edit_mode(row, col, cells) {
                    GridAction::EditStarted(here)
                } else {
                    GridAction::None
                };
            }
            GridKey::Delete if !editing_here => {
                let targets = match self.selection {
                    Some(range) => range.cells(),
                    None => vec![here],
                };
                return GridAction::Clear(targets);
            }
            _ => {}
        }

        if editing_here {
            if input.key == GridKey::Escape {
                self.exit_edit_mode();
                self.focus_cell(row, col, cells);
                return GridAction::EditFinished(here);
            }
            if input.key.direction().is_none() || !input.caret_at_boundary {
                return GridAction::Ignored;
            }
            self.exit_edit_mode();
        }

        let Some((d_row, d_col)) = input.key.direction() else {
            return GridAction::Ignored;
        };
        let moved = if input.ctrl {
            self.move_to_end(row, col, d_row, d_col, cells)
        } else if input.shift {
            self.extend_selection(row, col, d_row, d_col, cells)
        } else {
            self.move_cell(row, col, d_row, d_col, cells)
        };
        self.moved(moved)
    }

    /// Visual state of a cell; neutral when the grid is inactive.
    pub fn cell_style(&self, row: usize, col: usize) -> CellStyle {
        if !self.config.is_active {
            return CellStyle::default();
        }
        CellStyle {
            selected: self
                .selection
                .map(|range| range.contains(row, col))
                .unwrap_or(false),
            focused: self.focused == Some(CellPosition::new(row, col)),
            editing: self.is_editing_at(row, col),
        }
    }

    fn moved(&self, moved: bool) -> GridAction {
        if moved {
            GridAction::Moved
        } else {
            GridAction::None
        }
    }

    fn contains(&self, row: usize, col: usize) -> bool {
        row < self.config.rows && col < self.config.cols
    }

    fn set_selection(&mut self, range: Option<SelectionRange>) {
        if self.selection != range {
            self.selection_changed = true;
        }
        self.selection = range;
    }

    /// Wrap or reject a candidate address. Returns false when out of bounds
    /// without wrap-around.
    fn settle(&self, row: &mut isize, col: &mut isize) -> bool {
        let rows = self.config.rows as isize;
        let cols = self.config.cols as isize;
        if self.config.wrap_around {
            *row = row.rem_euclid(rows);
            *col = col.rem_euclid(cols);
            true
        } else {
            *row >= 0 && *row < rows && *col >= 0 && *col < cols
        }
    }

    /// Apply merge-child and skip-row redirection to a destination row.
    fn redirect_row(
        &self,
        row: usize,
        col: usize,
        d_row: isize,
        cells: &dyn GridCells,
    ) -> Option<usize> {
        let rows = self.config.rows;
        let mut row = row;

        if let Some(info) = cells.merge_info(row, col) {
            if !info.is_main {
                if d_row > 0 {
                    row = info.main_row + info.rowspan;
                    if row >= rows {
                        return None;
                    }
                } else {
                    row = info.main_row;
                }
            }
        }

        if cells.skip_row(row) {
            if d_row == 0 {
                return None;
            }
            let next = row as isize + d_row;
            if next < 0 || next >= rows as isize {
                return None;
            }
            row = next as usize;
        }

        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::grid::MergeInfo;

    #[derive(Default)]
    struct TestGrid {
        missing: HashSet<(usize, usize)>,
        filled: HashSet<(usize, usize)>,
        /// (col, main_row, rowspan)
        merges: Vec<(usize, usize, usize)>,
        skip: Option<usize>,
    }

    impl GridCells for TestGrid {
        fn has_cell(&self, row: usize, col: usize) -> bool {
            !self.missing.contains(&(row, col))
        }

        fn has_content(&self, row: usize, col: usize) -> bool {
            self.filled.contains(&(row, col))
        }

        fn merge_info(&self, row: usize, col: usize) -> Option<MergeInfo> {
            self.merges
                .iter()
                .find(|(c, main, span)| *c == col && row >= *main && row < main + span)
                .map(|(_, main, span)| MergeInfo {
                    main_row: *main,
                    rowspan: *span,
                    is_main: row == *main,
                })
        }

        fn skip_row(&self, row: usize) -> bool {
            self.skip == Some(row)
        }
    }

    fn pos(row: usize, col: usize) -> CellPosition {
        CellPosition::new(row, col)
    }

    fn focused_nav(rows: usize, cols: usize, at: CellPosition, grid: &TestGrid) -> GridNavigator {
        let mut nav = GridNavigator::new(GridConfig::new(rows, cols));
        assert!(nav.focus_cell(at.row, at.col, grid));
        nav
    }

    #[test]
    fn move_past_top_edge_is_a_no_op() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(3, 3, pos(0, 0), &grid);
        assert!(!nav.move_cell(0, 0, -1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(0, 0)));
        assert_eq!(nav.selection(), None);
    }

    #[test]
    fn wrap_around_moves_to_opposite_edge() {
        let grid = TestGrid::default();
        let mut nav = GridNavigator::new(GridConfig::new(3, 3).with_wrap_around(true));
        assert!(nav.move_cell(0, 0, -1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 0)));
        assert!(nav.move_cell(2, 2, 0, 1, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 0)));
    }

    #[test]
    fn missing_cells_are_skipped() {
        let mut grid = TestGrid::default();
        grid.missing.insert((0, 1));
        grid.missing.insert((0, 2));
        let mut nav = focused_nav(1, 5, pos(0, 0), &grid);
        assert!(nav.move_cell(0, 0, 0, 1, &grid));
        assert_eq!(nav.focused(), Some(pos(0, 3)));
    }

    #[test]
    fn trailing_missing_cells_stop_movement() {
        let mut grid = TestGrid::default();
        grid.missing.insert((0, 1));
        let mut nav = focused_nav(1, 2, pos(0, 0), &grid);
        assert!(!nav.move_cell(0, 0, 0, 1, &grid));
        assert_eq!(nav.focused(), Some(pos(0, 0)));
    }

    #[test]
    fn fully_missing_wrapping_grid_terminates() {
        let mut grid = TestGrid::default();
        for row in 0..3 {
            for col in 0..3 {
                if (row, col) != (0, 0) {
                    grid.missing.insert((row, col));
                }
            }
        }
        let mut nav = GridNavigator::new(GridConfig::new(3, 3).with_wrap_around(true));
        assert!(nav.focus_cell(0, 0, &grid));
        // Wrapping returns to the origin cell, which is the only backed one.
        assert!(nav.move_cell(0, 0, 0, 1, &grid));
        assert_eq!(nav.focused(), Some(pos(0, 0)));
    }

    #[test]
    fn moving_down_into_merge_child_lands_past_group() {
        let grid = TestGrid {
            merges: vec![(0, 2, 3)],
            ..Default::default()
        };
        let mut nav = focused_nav(8, 1, pos(1, 0), &grid);
        assert!(nav.move_cell(1, 0, 1, 0, &grid));
        // Row 2 is the primary: lands there and selects the whole group.
        assert_eq!(nav.focused(), Some(pos(2, 0)));
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(2, 0), pos(4, 0)))
        );

        assert!(nav.move_cell(2, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(5, 0)));
    }

    #[test]
    fn moving_up_or_sideways_into_child_lands_on_primary() {
        let grid = TestGrid {
            merges: vec![(1, 2, 3)],
            ..Default::default()
        };
        let mut nav = focused_nav(8, 2, pos(5, 1), &grid);
        assert!(nav.move_cell(5, 1, -1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 1)));

        assert!(nav.move_cell(3, 0, 0, 1, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 1)));
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(2, 1), pos(4, 1)))
        );
    }

    #[test]
    fn moving_down_past_group_at_bottom_fails() {
        let grid = TestGrid {
            merges: vec![(0, 2, 2)],
            ..Default::default()
        };
        let mut nav = focused_nav(4, 1, pos(2, 0), &grid);
        // Row 3 is a child whose group ends at the last row.
        assert!(!nav.move_cell(2, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 0)));
    }

    #[test]
    fn skipped_row_is_stepped_over_vertically_only() {
        let grid = TestGrid {
            skip: Some(1),
            ..Default::default()
        };
        let mut nav = focused_nav(4, 2, pos(0, 0), &grid);
        assert!(nav.move_cell(0, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(2, 0)));

        let grid = TestGrid {
            skip: Some(0),
            ..Default::default()
        };
        let mut nav = focused_nav(4, 2, pos(1, 0), &grid);
        assert!(!nav.move_cell(1, 0, -1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(1, 0)));
    }

    #[test]
    fn move_to_end_stops_on_content_or_edge() {
        let mut grid = TestGrid::default();
        grid.filled.insert((5, 0));
        let mut nav = focused_nav(8, 1, pos(0, 0), &grid);
        assert!(nav.move_to_end(0, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(5, 0)));

        assert!(nav.move_to_end(5, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(7, 0)));
        assert_eq!(nav.selection(), Some(SelectionRange::single(pos(7, 0))));
    }

    #[test]
    fn move_to_end_snaps_to_group_primary() {
        let grid = TestGrid {
            merges: vec![(0, 4, 3)],
            ..Default::default()
        };
        let mut nav = focused_nav(7, 1, pos(0, 0), &grid);
        assert!(nav.move_to_end(0, 0, 1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(4, 0)));
        assert_eq!(nav.selection(), Some(SelectionRange::new(pos(4, 0), pos(6, 0))));
    }

    #[test]
    fn move_to_end_passes_over_skipped_rows() {
        let grid = TestGrid {
            skip: Some(0),
            ..Default::default()
        };
        let mut nav = focused_nav(5, 1, pos(3, 0), &grid);
        assert!(nav.move_to_end(3, 0, -1, 0, &grid));
        assert_eq!(nav.focused(), Some(pos(1, 0)));
    }

    #[test]
    fn extend_selection_keeps_anchor() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(5, 5, pos(1, 1), &grid);
        assert!(nav.extend_selection(1, 1, 1, 0, &grid));
        assert!(nav.extend_selection(2, 1, 0, 1, &grid));
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(1, 1), pos(2, 2)))
        );
        assert_eq!(nav.focused(), Some(pos(2, 2)));
        assert!(!nav.extend_selection(2, 2, 0, 5, &grid));
    }

    #[test]
    fn drag_selects_range_and_global_release_ends_it() {
        let grid = TestGrid {
            merges: vec![(0, 1, 2)],
            ..Default::default()
        };
        let mut nav = GridNavigator::new(GridConfig::new(6, 3));
        nav.handle_mouse_down(2, 0, &grid);
        assert!(nav.is_selecting());
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(1, 0), pos(2, 0)))
        );
        assert_eq!(nav.focused(), Some(pos(1, 0)));

        nav.handle_mouse_enter(4, 2, &grid);
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(1, 0), pos(4, 2)))
        );
        nav.handle_mouse_up();
        assert!(!nav.is_selecting());

        nav.handle_mouse_enter(5, 2, &grid);
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(1, 0), pos(4, 2)))
        );
    }

    #[test]
    fn mouse_down_on_editing_cell_does_not_start_drag() {
        let grid = TestGrid::default();
        let mut nav = GridNavigator::new(GridConfig::new(3, 3));
        assert!(nav.enter_edit_mode(1, 1, &grid));
        nav.handle_mouse_down(1, 1, &grid);
        assert!(!nav.is_selecting());
        assert_eq!(nav.mode(), GridMode::Editing);
    }

    #[test]
    fn keyboard_dispatch_follows_edit_state() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(3, 3, pos(0, 0), &grid);

        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Enter), 0, 0, &grid),
            GridAction::Moved
        );
        assert_eq!(nav.focused(), Some(pos(1, 0)));
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Tab), 1, 0, &grid),
            GridAction::Moved
        );
        assert_eq!(nav.focused(), Some(pos(1, 1)));

        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::F2), 1, 1, &grid),
            GridAction::EditStarted(pos(1, 1))
        );
        assert_eq!(nav.mode(), GridMode::Editing);
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Left), 1, 1, &grid),
            GridAction::Ignored
        );
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Delete), 1, 1, &grid),
            GridAction::Ignored
        );
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Escape), 1, 1, &grid),
            GridAction::EditFinished(pos(1, 1))
        );
        assert_eq!(nav.mode(), GridMode::Focused);
        assert_eq!(nav.focused(), Some(pos(1, 1)));
    }

    #[test]
    fn arrow_at_caret_boundary_leaves_edit_mode() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(3, 3, pos(1, 1), &grid);
        nav.enter_edit_mode(1, 1, &grid);
        let action = nav.handle_key(
            KeyInput::plain(GridKey::Down).at_boundary(true),
            1,
            1,
            &grid,
        );
        assert_eq!(action, GridAction::Moved);
        assert_eq!(nav.editing(), None);
        assert_eq!(nav.focused(), Some(pos(2, 1)));
    }

    #[test]
    fn delete_clears_selection_or_focused_cell() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(4, 4, pos(0, 0), &grid);
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Delete), 0, 0, &grid),
            GridAction::Clear(vec![pos(0, 0)])
        );

        nav.extend_selection(0, 0, 1, 0, &grid);
        nav.extend_selection(1, 0, 0, 1, &grid);
        assert_eq!(
            nav.handle_key(KeyInput::plain(GridKey::Delete), 1, 1, &grid),
            GridAction::Clear(vec![pos(0, 0), pos(0, 1), pos(1, 0), pos(1, 1)])
        );
    }

    #[test]
    fn ctrl_and_shift_arrows_dispatch() {
        let mut grid = TestGrid::default();
        grid.filled.insert((0, 3));
        let mut nav = focused_nav(4, 4, pos(0, 0), &grid);
        nav.handle_key(KeyInput::plain(GridKey::Right).with_ctrl(), 0, 0, &grid);
        assert_eq!(nav.focused(), Some(pos(0, 3)));
        nav.handle_key(KeyInput::plain(GridKey::Down).with_shift(), 0, 3, &grid);
        assert_eq!(
            nav.selection(),
            Some(SelectionRange::new(pos(0, 3), pos(1, 3)))
        );
    }

    #[test]
    fn inactive_grid_has_neutral_style() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(2, 2, pos(0, 0), &grid);
        nav.select(Some(SelectionRange::single(pos(0, 0))));
        assert!(nav.cell_style(0, 0).focused);
        assert!(nav.cell_style(0, 0).selected);
        nav.set_active(false);
        assert_eq!(nav.cell_style(0, 0), CellStyle::default());
    }

    #[test]
    fn resize_drops_selection_and_reports_change() {
        let grid = TestGrid::default();
        let mut nav = focused_nav(4, 4, pos(3, 3), &grid);
        nav.select(Some(SelectionRange::single(pos(3, 3))));
        assert_eq!(
            nav.take_selection_change(),
            Some(Some(SelectionRange::single(pos(3, 3))))
        );
        assert_eq!(nav.take_selection_change(), None);
        nav.resize(2, 2);
        assert_eq!(nav.selection(), None);
        assert_eq!(nav.focused(), None);
        assert_eq!(nav.take_selection_change(), Some(None));
    }
}
