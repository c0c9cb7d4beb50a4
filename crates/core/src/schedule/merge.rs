//! Merge resolution over one `(teacher, day)` lane.

use tracing::info;

use super::cells::{CellEntry, CellKey, GroupSpan, ScheduleCellStore};
use crate::{error::EditError, grid::SelectionRange, models::Weekday};

/// Merge-content policy: the earliest slot with non-blank text wins; the
/// rest is discarded.
pub fn resolve_merged_text<'a>(cells: impl IntoIterator<Item = (u32, &'a CellEntry)>) -> String {
    cells
        .into_iter()
        .filter(|(_, entry)| !entry.content.trim().is_empty())
        .min_by_key(|(slot, _)| *slot)
        .map(|(_, entry)| entry.content.clone())
        .unwrap_or_default()
}

/// Check the grid-level preconditions of a merge. `name_row` is the grid
/// row reserved for names, when the grid has one.
pub fn validate_merge_selection(
    range: Option<SelectionRange>,
    name_row: Option<usize>,
) -> Result<SelectionRange, EditError> {
    let range = range.ok_or(EditError::NoSelection)?;
    if !range.is_single_column() {
        return Err(EditError::NotVertical);
    }
    if range.row_count() < 2 {
        return Err(EditError::TooShort);
    }
    if let Some(name_row) = name_row {
        let (min_row, _, max_row, _) = range.bounds();
        if (min_row..=max_row).contains(&name_row) {
            return Err(EditError::IncludesNameRow);
        }
    }
    Ok(range)
}

impl ScheduleCellStore {
    /// Stored cells of the lane with `start <= slot <= end`.
    pub fn cells_in_range(
        &self,
        teacher_id: u32,
        day: Weekday,
        start: u32,
        end: u32,
    ) -> Vec<(u32, &CellEntry)> {
        self.lane(teacher_id, day, start, end)
            .map(|(key, entry)| (key.slot, entry))
            .collect()
    }

    /// Whether `[start, end]` touches an existing merge group: a cell in the
    /// range carries a merge role, or a group starting above reaches into it.
    pub fn has_overlap(&self, teacher_id: u32, day: Weekday, start: u32, end: u32) -> bool {
        if self
            .lane(teacher_id, day, start, end)
            .any(|(_, entry)| entry.has_merge_role())
        {
            return true;
        }
        if start == 0 {
            return false;
        }
        self.lane(teacher_id, day, 0, start - 1).any(|(key, entry)| {
            entry
                .rowspan
                .map(|span| span > 1 && key.slot + span - 1 >= start)
                .unwrap_or(false)
        })
    }

    /// Replace `[start, end]` with one merge group carrying the resolved
    /// text on its primary cell.
    pub fn merge_range(
        &mut self,
        teacher_id: u32,
        day: Weekday,
        start: u32,
        end: u32,
    ) -> Result<GroupSpan, EditError> {
        let (start, end) = (start.min(end), start.max(end));
        if end == start {
            return Err(EditError::TooShort);
        }
        if self.has_overlap(teacher_id, day, start, end) {
            return Err(EditError::Overlap);
        }

        let text = resolve_merged_text(self.cells_in_range(teacher_id, day, start, end));
        let group = GroupSpan {
            start,
            rowspan: end - start + 1,
        };
        for slot in start..=end {
            let entry = if slot == start {
                CellEntry {
                    content: text.clone(),
                    rowspan: Some(group.rowspan),
                    merged_child: false,
                }
            } else {
                CellEntry {
                    content: String::new(),
                    rowspan: None,
                    merged_child: true,
                }
            };
            self.cells.insert(CellKey::new(teacher_id, day, slot), entry);
        }
        info!(teacher_id, day = %day, start, end, "merged schedule cells");
        Ok(group)
    }

    /// Dissolve the group covering `slot`. Per-slot content stays as is.
    pub fn unmerge(&mut self, teacher_id: u32, day: Weekday, slot: u32) -> Option<GroupSpan> {
        let group = self.group_at(teacher_id, day, slot)?;
        for slot in group.start..=group.end() {
            if let Some(entry) = self.cells.get_mut(&CellKey::new(teacher_id, day, slot)) {
                entry.rowspan = None;
                entry.merged_child = false;
            }
        }
        info!(
            teacher_id,
            day = %day,
            start = group.start,
            rowspan = group.rowspan,
            "unmerged schedule cells"
        );
        Some(group)
    }
}
