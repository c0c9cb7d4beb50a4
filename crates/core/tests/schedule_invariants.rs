//! Randomized merge/unmerge/row-delete sequences against the merge
//! invariants of the schedule store.

use std::collections::BTreeMap;

use academy_core::{
    grid::{CellPosition, SelectionRange},
    models::Weekday,
    pages::Page,
    schedule::{CellKey, GroupSpan, MergeToggle, SchedulePage, ScheduleView},
    EditError,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Every primary covers exactly `rowspan` consecutive slots, each of which
/// is a child; no child exists outside a group and no two groups overlap.
fn assert_merge_invariants(page: &SchedulePage) {
    let mut lanes: BTreeMap<(u32, Weekday), Vec<(u32, bool, Option<u32>)>> = BTreeMap::new();
    for (key, entry) in page.schedules.iter() {
        lanes
            .entry((key.teacher_id, key.day))
            .or_default()
            .push((key.slot, entry.merged_child, entry.rowspan));
        assert!(
            !(entry.merged_child && entry.rowspan.is_some()),
            "{key:?} is both primary and child"
        );
    }

    for ((teacher_id, day), slots) in lanes {
        let mut covered_until: Option<u32> = None;
        let by_slot: BTreeMap<u32, (bool, Option<u32>)> = slots
            .into_iter()
            .map(|(slot, child, span)| (slot, (child, span)))
            .collect();
        for (&slot, &(child, span)) in &by_slot {
            let inside = covered_until.map(|end| slot <= end).unwrap_or(false);
            if child {
                assert!(inside, "orphan child at {teacher_id}/{day}/{slot}");
                continue;
            }
            assert!(!inside, "uncovered slot {slot} inside a group on {teacher_id}/{day}");
            if let Some(span) = span.filter(|span| *span > 1) {
                let end = slot + span - 1;
                for covered in slot + 1..=end {
                    assert_eq!(
                        by_slot.get(&covered).map(|(child, _)| *child),
                        Some(true),
                        "missing child {covered} of group at {slot} on {teacher_id}/{day}"
                    );
                }
                covered_until = Some(end);
            }
        }
    }
}

fn page_with_teachers(count: u32, rows: u32) -> SchedulePage {
    let mut page = SchedulePage::blank(1, SchedulePage::DEFAULT_NAME.to_string());
    for n in 1..count {
        page.add_teacher(&format!("T{n}"));
    }
    page.time_settings.time_rows = rows;
    page
}

#[test]
fn random_edit_sequences_keep_groups_consistent() {
    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut page = page_with_teachers(3, 10);

        for _ in 0..200 {
            let teacher_id = page.teachers[rng.random_range(0..page.teachers.len())].id;
            let day = Weekday::ALL[rng.random_range(0..Weekday::ALL.len())];
            let rows = page.time_rows();
            match rng.random_range(0..5) {
                0 => {
                    let slot = rng.random_range(0..rows);
                    page.set_cell(teacher_id, day, slot, &format!("c{}", rng.random_range(0..9)));
                }
                1 | 2 => {
                    let start = rng.random_range(0..rows);
                    let end = rng.random_range(0..rows);
                    let before = page.schedules.clone();
                    match page.schedules.merge_range(teacher_id, day, start, end) {
                        Ok(group) => {
                            assert_eq!(group.start, start.min(end));
                            assert_eq!(group.end(), start.max(end));
                        }
                        Err(EditError::TooShort) => assert_eq!(start, end),
                        Err(EditError::Overlap) => {
                            assert!(page.schedules.has_overlap(
                                teacher_id,
                                day,
                                start.min(end),
                                start.max(end)
                            ));
                        }
                        Err(other) => panic!("unexpected merge error: {other}"),
                    }
                    if page.schedules != before {
                        assert!(page.schedules.group_at(teacher_id, day, start).is_some());
                    }
                }
                3 => {
                    let slot = rng.random_range(0..rows);
                    page.schedules.unmerge(teacher_id, day, slot);
                    assert!(page.schedules.group_at(teacher_id, day, slot).is_none());
                }
                _ => {
                    if rows > 2 {
                        let slot = rng.random_range(0..rows);
                        assert!(page.delete_time_row(slot).is_ok());
                        page.insert_time_row();
                    }
                }
            }
            assert_merge_invariants(&page);
        }
    }
}

#[test]
fn row_delete_reindexes_every_lane() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut page = page_with_teachers(2, 12);
    let mut expected: BTreeMap<CellKey, String> = BTreeMap::new();
    for _ in 0..60 {
        let teacher_id = page.teachers[rng.random_range(0..2)].id;
        let day = Weekday::ALL[rng.random_range(0..7)];
        let slot = rng.random_range(0..12);
        let text = format!("{teacher_id}-{day}-{slot}");
        page.set_cell(teacher_id, day, slot, &text);
        expected.insert(CellKey::new(teacher_id, day, slot), text);
    }

    let removed = 4;
    assert!(page.delete_time_row(removed).is_ok());
    assert_eq!(page.time_rows(), 11);

    for (key, text) in expected {
        match key.slot.cmp(&removed) {
            std::cmp::Ordering::Less => {
                assert_eq!(page.cell(key.teacher_id, key.day, key.slot), text)
            }
            std::cmp::Ordering::Equal => {}
            std::cmp::Ordering::Greater => {
                assert_eq!(page.cell(key.teacher_id, key.day, key.slot - 1), text)
            }
        }
    }
    assert!(page.schedules.iter().all(|(key, _)| key.slot < 11));
}

#[test]
fn merge_then_unmerge_through_the_day_grid() -> Result<(), EditError> {
    let mut page = page_with_teachers(1, 8);
    let teacher = page.teachers[0].id;
    page.set_cell(teacher, Weekday::Tue, 2, "Math");
    page.set_cell(teacher, Weekday::Tue, 3, "Algebra");

    let view = ScheduleView::Day(Weekday::Tue);
    // Grid rows 3..=5 show slots 2..=4.
    let selection = SelectionRange::new(CellPosition::new(3, 0), CellPosition::new(5, 0));
    let merged = page.toggle_merge(view, Some(selection))?;
    assert_eq!(
        merged,
        MergeToggle::Merged(GroupSpan {
            start: 2,
            rowspan: 3
        })
    );
    assert_eq!(page.cell(teacher, Weekday::Tue, 2), "Math");
    assert_eq!(page.cell(teacher, Weekday::Tue, 3), "");

    // Selecting any part of the group dissolves it.
    let inner = SelectionRange::single(CellPosition::new(4, 0));
    assert!(matches!(
        page.toggle_merge(view, Some(inner))?,
        MergeToggle::Unmerged(_)
    ));
    assert!(page.schedules.groups(teacher, Weekday::Tue).is_empty());
    assert_eq!(page.cell(teacher, Weekday::Tue, 2), "Math");

    let with_names = SelectionRange::new(CellPosition::new(0, 0), CellPosition::new(2, 0));
    assert_eq!(
        page.toggle_merge(view, Some(with_names)),
        Err(EditError::IncludesNameRow)
    );
    Ok(())
}
