//! Sparse `(teacher, day, slot)` cell store.

use std::collections::BTreeMap;

use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::models::Weekday;

/// Address of one schedule cell. Ordered teacher, day, slot so that one
/// lane `(teacher, day)` is a contiguous key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Owning teacher.
    pub teacher_id: u32,
    /// Weekday column/table.
    pub day: Weekday,
    /// Zero-based time slot.
    pub slot: u32,
}

impl CellKey {
    /// Build a key.
    pub const fn new(teacher_id: u32, day: Weekday, slot: u32) -> Self {
        Self {
            teacher_id,
            day,
            slot,
        }
    }
}

/// Stored payload of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellEntry {
    /// Cell text.
    pub content: String,
    /// Group length, set on the primary cell of a merge group only.
    pub rowspan: Option<u32>,
    /// Set on slots 2..rowspan of a merge group.
    pub merged_child: bool,
}

impl CellEntry {
    /// Plain cell with text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Whether the cell is the primary of a group.
    pub fn is_primary(&self) -> bool {
        self.rowspan.map(|span| span > 1).unwrap_or(false)
    }

    /// Whether the cell participates in a merge group at all.
    pub fn has_merge_role(&self) -> bool {
        self.is_primary() || self.merged_child
    }
}

/// Location of a merge group inside one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpan {
    /// Slot of the primary cell.
    pub start: u32,
    /// Number of slots covered (at least 2).
    pub rowspan: u32,
}

impl GroupSpan {
    /// Last slot covered.
    pub fn end(&self) -> u32 {
        self.start + self.rowspan - 1
    }

    /// Whether `slot` lies inside the group.
    pub fn contains(&self, slot: u32) -> bool {
        slot >= self.start && slot <= self.end()
    }
}

/// Backend representation of one stored cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCell {
    /// Owning teacher.
    pub teacher_id: u32,
    /// Weekday tag.
    pub day: Weekday,
    /// Zero-based slot.
    pub time_slot: u32,
    /// Cell text.
    #[serde(default)]
    pub content: String,
    /// Group length on primary cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
    /// Child marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_merged_child: Option<bool>,
}

/// Sparse mapping of schedule cells. Absent keys read as empty content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleCellStore {
    pub(super) cells: BTreeMap<CellKey, CellEntry>,
}

impl ScheduleCellStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stored entry, if any.
    pub fn get(&self, key: CellKey) -> Option<&CellEntry> {
        self.cells.get(&key)
    }

    /// Cell text; empty for absent keys.
    pub fn content(&self, key: CellKey) -> &str {
        self.cells
            .get(&key)
            .map(|entry| entry.content.as_str())
            .unwrap_or("")
    }

    /// Every stored entry in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CellEntry)> {
        self.cells.iter()
    }

    /// Stored entries of one lane with `start <= slot <= end`.
    pub fn lane(
        &self,
        teacher_id: u32,
        day: Weekday,
        start: u32,
        end: u32,
    ) -> impl DoubleEndedIterator<Item = (&CellKey, &CellEntry)> {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        self.cells
            .range(CellKey::new(teacher_id, day, lo)..=CellKey::new(teacher_id, day, hi))
    }

    /// Upsert text. An entry that ends up empty with no merge role is
    /// removed; writing empty text to an absent key stores nothing.
    pub fn set_content(&mut self, key: CellKey, text: impl Into<String>) {
        let text = text.into();
        match self.cells.get_mut(&key) {
            Some(entry) => {
                entry.content = text;
                if entry.content.is_empty() && !entry.has_merge_role() {
                    self.cells.remove(&key);
                }
            }
            None if !text.is_empty() => {
                self.cells.insert(key, CellEntry::text(text));
            }
            None => {}
        }
    }

    /// Clear the text of many cells at once. Merge roles are kept so a
    /// cleared group stays merged. Returns the number of entries touched.
    pub fn clear_cells(&mut self, keys: impl IntoIterator<Item = CellKey>) -> usize {
        let mut touched = 0;
        for key in keys {
            if self.cells.contains_key(&key) {
                self.set_content(key, String::new());
                touched += 1;
            }
        }
        debug!(touched, "cleared schedule cells");
        touched
    }

    /// Group covering `slot` in the lane, if any.
    pub fn group_at(&self, teacher_id: u32, day: Weekday, slot: u32) -> Option<GroupSpan> {
        let entry = self.cells.get(&CellKey::new(teacher_id, day, slot))?;
        if let Some(rowspan) = entry.rowspan.filter(|span| *span > 1) {
            return Some(GroupSpan {
                start: slot,
                rowspan,
            });
        }
        if !entry.merged_child || slot == 0 {
            return None;
        }
        self.lane(teacher_id, day, 0, slot - 1)
            .rev()
            .find_map(|(key, entry)| {
                entry
                    .rowspan
                    .filter(|span| *span > 1 && key.slot + span > slot)
                    .map(|rowspan| GroupSpan {
                        start: key.slot,
                        rowspan,
                    })
            })
    }

    /// All merge groups of a lane in slot order.
    pub fn groups(&self, teacher_id: u32, day: Weekday) -> Vec<GroupSpan> {
        self.lane(teacher_id, day, 0, u32::MAX)
            .filter_map(|(key, entry)| {
                entry.rowspan.filter(|span| *span > 1).map(|rowspan| GroupSpan {
                    start: key.slot,
                    rowspan,
                })
            })
            .collect()
    }

    /// Remove slot `slot` from every lane: entries at the slot are dropped and
    /// later slots move up by one. A merge group that covered the slot loses
    /// one row; a group reduced to a single row stops being a group.
    pub fn delete_time_row(&mut self, slot: u32) {
        let groups: Vec<(u32, Weekday, GroupSpan)> = self
            .cells
            .iter()
            .filter_map(|(key, entry)| {
                entry.rowspan.filter(|span| *span > 1).map(|rowspan| {
                    (
                        key.teacher_id,
                        key.day,
                        GroupSpan {
                            start: key.slot,
                            rowspan,
                        },
                    )
                })
            })
            .collect();

        let old = std::mem::take(&mut self.cells);
        for (key, mut entry) in old {
            if key.slot == slot {
                continue;
            }
            entry.rowspan = None;
            entry.merged_child = false;
            let shifted = if key.slot > slot { key.slot - 1 } else { key.slot };
            self.cells
                .insert(CellKey::new(key.teacher_id, key.day, shifted), entry);
        }

        let mut shrunk = 0usize;
        for (teacher_id, day, group) in groups {
            let adjusted = if slot < group.start {
                GroupSpan {
                    start: group.start - 1,
                    rowspan: group.rowspan,
                }
            } else if group.contains(slot) {
                shrunk += 1;
                GroupSpan {
                    start: group.start,
                    rowspan: group.rowspan - 1,
                }
            } else {
                group
            };
            if adjusted.rowspan >= 2 {
                self.apply_group(teacher_id, day, adjusted);
            } else {
                // Only the members of a dissolved group lost their role here.
                for member in adjusted.start..adjusted.start + adjusted.rowspan {
                    let key = CellKey::new(teacher_id, day, member);
                    if self.cells.get(&key).is_some_and(|entry| entry.content.is_empty()) {
                        self.cells.remove(&key);
                    }
                }
            }
        }
        debug!(slot, shrunk, "deleted time row");
    }

    /// Remove every cell of a teacher.
    pub fn delete_teacher(&mut self, teacher_id: u32) -> usize {
        let before = self.cells.len();
        self.cells.retain(|key, _| key.teacher_id != teacher_id);
        before - self.cells.len()
    }

    /// Mark `group` as merged without touching content.
    pub(super) fn apply_group(&mut self, teacher_id: u32, day: Weekday, group: GroupSpan) {
        for slot in group.start..=group.end() {
            let entry = self
                .cells
                .entry(CellKey::new(teacher_id, day, slot))
                .or_default();
            if slot == group.start {
                entry.rowspan = Some(group.rowspan);
                entry.merged_child = false;
            } else {
                entry.rowspan = None;
                entry.merged_child = true;
            }
        }
    }

    /// Backend representation, in key order.
    pub fn to_cells(&self) -> Vec<ScheduleCell> {
        self.cells
            .iter()
            .map(|(key, entry)| ScheduleCell {
                teacher_id: key.teacher_id,
                day: key.day,
                time_slot: key.slot,
                content: entry.content.clone(),
                rowspan: entry.rowspan,
                is_merged_child: entry.merged_child.then_some(true),
            })
            .collect()
    }

    /// Build from the backend representation. Later duplicates win.
    pub fn from_cells(cells: impl IntoIterator<Item = ScheduleCell>) -> Self {
        let cells = cells
            .into_iter()
            .map(|cell| {
                (
                    CellKey::new(cell.teacher_id, cell.day, cell.time_slot),
                    CellEntry {
                        content: cell.content,
                        rowspan: cell.rowspan.filter(|span| *span > 1),
                        merged_child: cell.is_merged_child.unwrap_or(false),
                    },
                )
            })
            .collect();
        Self { cells }
    }
}

pub(super) fn serialize_schedules<S>(
    value: &ScheduleCellStore,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(value.len()))?;
    for cell in value.to_cells() {
        seq.serialize_element(&cell)?;
    }
    seq.end()
}

pub(super) fn deserialize_schedules<'de, D>(deserializer: D) -> Result<ScheduleCellStore, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<ScheduleCell> = Vec::deserialize(deserializer)?;
    Ok(ScheduleCellStore::from_cells(raw))
}
