//! Weekly teacher/time-slot schedule pages.

mod cells;
mod grid;
mod merge;
mod time;

pub use cells::{CellEntry, CellKey, GroupSpan, ScheduleCell, ScheduleCellStore};
pub use grid::{ScheduleGrid, ScheduleView};
pub use merge::{resolve_merged_text, validate_merge_selection};
pub use time::{parse_hour, slot_labels};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::EditError,
    grid::{CellPosition, SelectionRange},
    models::Weekday,
    pages::Page,
};

/// Default number of time rows on a fresh page.
pub const DEFAULT_TIME_ROWS: u32 = 8;

/// A teacher column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Page-local id.
    pub id: u32,
    /// Display name (may be blank).
    #[serde(default)]
    pub name: String,
}

/// Start time, interval and row count. Start fields hold free-form user
/// input such as `"오후 1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettings {
    /// Start hour with an optional AM/PM marker.
    #[serde(default)]
    pub start_hour: String,
    /// Start minute.
    #[serde(default)]
    pub start_minute: String,
    /// Minutes per row.
    #[serde(default)]
    pub interval: String,
    /// Number of time rows (at least 1).
    #[serde(default = "default_time_rows")]
    pub time_rows: u32,
}

fn default_time_rows() -> u32 {
    DEFAULT_TIME_ROWS
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            start_hour: String::new(),
            start_minute: String::new(),
            interval: String::new(),
            time_rows: DEFAULT_TIME_ROWS,
        }
    }
}

fn default_day_dates() -> BTreeMap<Weekday, String> {
    Weekday::ALL
        .iter()
        .map(|day| (*day, String::new()))
        .collect()
}

/// Result of [`SchedulePage::toggle_merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeToggle {
    /// A new group was created.
    Merged(GroupSpan),
    /// An existing group was dissolved.
    Unmerged(GroupSpan),
}

impl MergeToggle {
    /// The affected group.
    pub fn group(&self) -> GroupSpan {
        match self {
            MergeToggle::Merged(group) | MergeToggle::Unmerged(group) => *group,
        }
    }
}

/// One schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePage {
    /// Page id.
    pub page_id: u32,
    /// Tab label.
    pub page_name: String,
    /// Teacher columns in display order.
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    /// Next teacher id.
    #[serde(default)]
    pub next_teacher_id: u32,
    /// Sparse cell contents.
    #[serde(
        default,
        serialize_with = "cells::serialize_schedules",
        deserialize_with = "cells::deserialize_schedules"
    )]
    pub schedules: ScheduleCellStore,
    /// Time column settings.
    #[serde(default)]
    pub time_settings: TimeSettings,
    /// Per-day date labels.
    #[serde(default = "default_day_dates")]
    pub day_dates: BTreeMap<Weekday, String>,
}

impl Page for SchedulePage {
    const DEFAULT_NAME: &'static str = "시간표";

    fn id(&self) -> u32 {
        self.page_id
    }

    fn set_id(&mut self, id: u32) {
        self.page_id = id;
    }

    fn name(&self) -> &str {
        &self.page_name
    }

    fn set_name(&mut self, name: String) {
        self.page_name = name;
    }

    fn blank(id: u32, name: String) -> Self {
        Self {
            page_id: id,
            page_name: name,
            teachers: vec![Teacher {
                id: 0,
                name: String::new(),
            }],
            next_teacher_id: 1,
            schedules: ScheduleCellStore::new(),
            time_settings: TimeSettings::default(),
            day_dates: default_day_dates(),
        }
    }
}

impl SchedulePage {
    /// Number of time rows.
    pub fn time_rows(&self) -> u32 {
        self.time_settings.time_rows
    }

    /// Teacher by id.
    pub fn teacher(&self, id: u32) -> Option<&Teacher> {
        self.teachers.iter().find(|teacher| teacher.id == id)
    }

    /// Append a teacher column; returns its id.
    pub fn add_teacher(&mut self, name: &str) -> u32 {
        let id = self.next_teacher_id;
        self.teachers.push(Teacher {
            id,
            name: name.trim().to_string(),
        });
        self.next_teacher_id += 1;
        id
    }

    /// Rename a teacher. Blank names are allowed (cleared header).
    pub fn rename_teacher(&mut self, id: u32, name: &str) -> Result<(), EditError> {
        let teacher = self
            .teachers
            .iter_mut()
            .find(|teacher| teacher.id == id)
            .ok_or(EditError::UnknownTeacher(id))?;
        teacher.name = name.to_string();
        Ok(())
    }

    /// Remove a teacher and every cell keyed to it.
    pub fn delete_teacher(&mut self, id: u32) -> Result<usize, EditError> {
        let index = self
            .teachers
            .iter()
            .position(|teacher| teacher.id == id)
            .ok_or(EditError::UnknownTeacher(id))?;
        self.teachers.remove(index);
        let removed = self.schedules.delete_teacher(id);
        info!(teacher_id = id, removed, "deleted teacher");
        Ok(removed)
    }

    /// Cell text, empty when absent.
    pub fn cell(&self, teacher_id: u32, day: Weekday, slot: u32) -> &str {
        self.schedules.content(CellKey::new(teacher_id, day, slot))
    }

    /// Write cell text.
    pub fn set_cell(&mut self, teacher_id: u32, day: Weekday, slot: u32, text: &str) {
        self.schedules
            .set_content(CellKey::new(teacher_id, day, slot), text);
    }

    /// Append a time row at the bottom.
    pub fn insert_time_row(&mut self) {
        self.time_settings.time_rows += 1;
    }

    /// Delete one time row across every lane. The row count never drops
    /// below one.
    pub fn delete_time_row(&mut self, slot: u32) -> Result<(), EditError> {
        if slot >= self.time_settings.time_rows {
            return Err(EditError::UnknownRow(slot));
        }
        self.schedules.delete_time_row(slot);
        self.time_settings.time_rows = self.time_settings.time_rows.saturating_sub(1).max(1);
        info!(slot, rows = self.time_settings.time_rows, "deleted time row");
        Ok(())
    }

    /// Update the start fields; the row count is left alone.
    pub fn set_time_start(&mut self, hour: &str, minute: &str, interval: &str) {
        self.time_settings.start_hour = hour.trim().to_string();
        self.time_settings.start_minute = minute.trim().to_string();
        self.time_settings.interval = interval.trim().to_string();
    }

    /// Labels for every time row.
    pub fn slot_labels(&self) -> Vec<String> {
        slot_labels(&self.time_settings)
    }

    /// Set the date label shown next to a weekday.
    pub fn set_day_date(&mut self, day: Weekday, date: &str) {
        self.day_dates.insert(day, date.trim().to_string());
    }

    /// `"월"` or `"월(3/4)"`.
    pub fn day_label(&self, day: Weekday) -> String {
        match self.day_dates.get(&day).map(|date| date.as_str()) {
            Some(date) if !date.is_empty() => format!("{day}({date})"),
            _ => day.to_string(),
        }
    }

    /// Grid projection of the page.
    pub fn grid(&self, view: ScheduleView) -> ScheduleGrid<'_> {
        ScheduleGrid::new(self, view)
    }

    /// Clear the given grid cells in one step. In the day view the name row
    /// clears teacher names.
    pub fn clear_grid_cells(&mut self, view: ScheduleView, positions: &[CellPosition]) {
        let mut keys = Vec::new();
        for position in positions {
            if view.name_row() == Some(position.row) {
                if let Some(id) = view.teacher_at(self, position.col) {
                    if let Err(err) = self.rename_teacher(id, "") {
                        warn!(teacher = id, %err, "could not clear teacher name");
                    }
                }
                continue;
            }
            if let Some(key) = view.key_at(self, position.row, position.col) {
                keys.push(key);
            }
        }
        self.schedules.clear_cells(keys);
    }

    /// Unmerge when the selection lies inside one group, otherwise validate
    /// and merge it.
    pub fn toggle_merge(
        &mut self,
        view: ScheduleView,
        selection: Option<SelectionRange>,
    ) -> Result<MergeToggle, EditError> {
        let range = selection.ok_or(EditError::NoSelection)?;
        let (min_row, col, max_row, _) = range.bounds();

        if range.is_single_column() && view.name_row() != Some(min_row) {
            if let (Some(first), Some(last)) = (
                view.key_at(self, min_row, col),
                view.key_at(self, max_row, col),
            ) {
                if let Some(group) =
                    self.schedules
                        .group_at(first.teacher_id, first.day, first.slot)
                {
                    if group.contains(last.slot) {
                        self.schedules
                            .unmerge(first.teacher_id, first.day, first.slot);
                        return Ok(MergeToggle::Unmerged(group));
                    }
                }
            }
        }

        let range = validate_merge_selection(Some(range), view.name_row())?;
        let (min_row, col, max_row, _) = range.bounds();
        let first = view
            .key_at(self, min_row, col)
            .ok_or(EditError::NoSelection)?;
        let last = view
            .key_at(self, max_row, col)
            .ok_or(EditError::NoSelection)?;
        self.schedules
            .merge_range(first.teacher_id, first.day, first.slot, last.slot)
            .map(MergeToggle::Merged)
    }
}
