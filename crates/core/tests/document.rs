//! Backend document shape and page-section invariants.

use academy_core::{
    intake::IntakeKind,
    models::{SchoolLevel, Weekday},
    pages::{CreateMode, Page, PageSection},
    payment::PaymentPage,
    AppDocument, EditError, Session,
};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;

fn backend_payload() -> serde_json::Value {
    json!({
        "elementary": {
            "classes": [
                { "tableId": 0, "currentLevel": 3, "className": "A반", "teacher": "김" }
            ],
            "nextId": 1,
            "studentsData": {
                "0": {
                    "students": [
                        { "studentId": 0, "idx": 1, "name": "홍길동", "school": "서울초", "grade": "3" }
                    ],
                    "nextStudentId": 1
                }
            }
        },
        "middle": { "classes": [], "nextId": 0, "studentsData": {} },
        "high": { "classes": [], "nextId": 0, "studentsData": {} },
        "schedule": {
            "pages": [{
                "pageId": 0,
                "pageName": "시간표1",
                "teachers": [{ "id": 0, "name": "Kim" }],
                "nextTeacherId": 1,
                "schedules": [
                    { "teacherId": 0, "day": "화", "timeSlot": 2, "content": "Math", "rowspan": 3 },
                    { "teacherId": 0, "day": "화", "timeSlot": 3, "content": "", "isMergedChild": true },
                    { "teacherId": 0, "day": "화", "timeSlot": 4, "content": "", "isMergedChild": true }
                ],
                "timeSettings": { "startHour": "오후 1", "startMinute": "00", "interval": "30", "timeRows": 8 },
                "dayDates": { "월": "", "화": "3/4", "수": "", "목": "", "금": "", "토": "", "일": "" }
            }],
            "currentPageId": 0,
            "nextPageId": 1
        },
        "payment": {
            "pages": [{
                "pageId": 0,
                "pageName": "입금명단1",
                "tables": {
                    "elementary": { "title": "", "rows": [], "nextRowId": 0 },
                    "middle": { "title": "", "rows": [], "nextRowId": 0 },
                    "high": { "title": "", "rows": [], "nextRowId": 0 }
                }
            }],
            "currentPageId": 0,
            "nextPageId": 1
        },
        "inout": {
            "tables": [{
                "id": 0,
                "month": "3월",
                "type": "중퇴",
                "rows": [{ "id": 0, "name": "이몽룡", "school": "", "grade": "", "reason": "이사" }],
                "nextRowId": 1
            }],
            "nextTableId": 1
        },
        "lastSaved": "2025-03-01T09:30:00Z"
    })
}

#[test]
fn backend_payload_decodes_and_reencodes() -> Result<()> {
    let payload = backend_payload();
    let document: AppDocument = serde_json::from_value(payload.clone())?;

    let page = document.schedule.current().map(Clone::clone);
    let Some(page) = page else {
        anyhow::bail!("schedule page missing");
    };
    assert_eq!(page.cell(0, Weekday::Tue, 2), "Math");
    assert_eq!(
        page.schedules.group_at(0, Weekday::Tue, 4).map(|g| g.start),
        Some(2)
    );
    assert_eq!(page.day_label(Weekday::Tue), "화(3/4)");
    assert_eq!(document.inout.tables[0].kind, IntakeKind::Withdrew);
    assert_eq!(
        document.roster(SchoolLevel::Elementary).students(0).len(),
        1
    );

    let encoded = serde_json::to_value(&document)?;
    assert_eq!(encoded["schedule"], payload["schedule"]);
    assert_eq!(encoded["inout"], payload["inout"]);
    assert_eq!(encoded["lastSaved"], json!("2025-03-01T09:30:00Z"));
    Ok(())
}

#[test]
fn sparse_payload_is_filled_with_defaults() -> Result<()> {
    let mut document: AppDocument = serde_json::from_value(json!({
        "schedule": { "pages": [], "currentPageId": 7 }
    }))?;
    document.normalize();
    assert_eq!(document.schedule.pages.len(), 1);
    assert!(document.schedule.current().is_some());
    assert_eq!(document.payment.pages.len(), 1);
    assert!(document.inout.tables.is_empty());
    Ok(())
}

/// At least one page, the current id names a page and the counter stays
/// ahead of every id.
fn assert_section_invariants<P: Page>(section: &PageSection<P>) {
    assert!(!section.pages.is_empty());
    assert!(section.page(section.current_page_id).is_some());
    assert!(section.pages.iter().all(|page| page.id() < section.next_page_id));
}

#[test]
fn random_page_operations_keep_section_consistent() {
    for seed in 0..24 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut section: PageSection<PaymentPage> = PageSection::default();
        for step in 0..150 {
            let ids: Vec<u32> = section.pages.iter().map(Page::id).collect();
            let some_id = ids[rng.random_range(0..ids.len())];
            match rng.random_range(0..6) {
                0 => {
                    let mode = if rng.random_bool(0.5) {
                        CreateMode::Copy
                    } else {
                        CreateMode::Empty
                    };
                    let before = section.next_page_id;
                    let created = section.create_page(&format!("p{step}"), mode);
                    assert_eq!(created, Ok(before));
                    assert_eq!(section.current_page_id, before);
                }
                1 => {
                    let result = section.delete_page(some_id);
                    if ids.len() == 1 {
                        assert_eq!(result, Err(EditError::LastPage));
                    } else {
                        assert!(result.is_ok());
                        assert!(section.page(some_id).is_none());
                    }
                }
                2 => {
                    assert_eq!(section.rename_page(some_id, "   "), Err(EditError::EmptyName));
                    assert!(section.rename_page(some_id, "renamed").is_ok());
                }
                3 => assert!(section.switch_page(some_id).is_ok()),
                4 => section.cycle_page(rng.random_range(-3i32..=3) as isize),
                _ => assert_eq!(
                    section.delete_page(u32::MAX),
                    if ids.len() == 1 {
                        Err(EditError::LastPage)
                    } else {
                        Err(EditError::UnknownPage(u32::MAX))
                    }
                ),
            }
            assert_section_invariants(&section);
        }
    }
}

#[test]
fn session_undo_restores_page_deletion() -> Result<()> {
    let mut session = Session::new(AppDocument::default(), 20);
    let id = session.try_edit(|doc| doc.schedule.create_page("보충", CreateMode::Copy))?;
    session.try_edit(|doc| doc.schedule.delete_page(id))?;
    assert!(session.document().schedule.page(id).is_none());

    assert!(session.undo());
    assert!(session.document().schedule.page(id).is_some());
    assert_section_invariants(&session.document().schedule);
    Ok(())
}
