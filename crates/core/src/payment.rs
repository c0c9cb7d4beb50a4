#![allow(missing_docs)]

//! Payment ledger pages.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::EditError,
    grid::CellPosition,
    models::SchoolLevel,
    pages::Page,
    roster::StudentRow,
    table::{self, RecordRow},
};

/// One ledger row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRow {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub payment_date: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub tuition: String,
    #[serde(default)]
    pub notes: String,
}

impl RecordRow for PaymentRow {
    const COLUMNS: &'static [&'static str] =
        &["이름", "학교", "학년", "결제일", "차량", "수업료", "비고"];

    fn row_id(&self) -> u32 {
        self.id
    }

    fn field(&self, col: usize) -> Option<&str> {
        let value = match col {
            0 => &self.name,
            1 => &self.school,
            2 => &self.grade,
            3 => &self.payment_date,
            4 => &self.vehicle,
            5 => &self.tuition,
            6 => &self.notes,
            _ => return None,
        };
        Some(value)
    }

    fn field_mut(&mut self, col: usize) -> Option<&mut String> {
        let value = match col {
            0 => &mut self.name,
            1 => &mut self.school,
            2 => &mut self.grade,
            3 => &mut self.payment_date,
            4 => &mut self.vehicle,
            5 => &mut self.tuition,
            6 => &mut self.notes,
            _ => return None,
        };
        Some(value)
    }
}

/// Titled list of ledger rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTable {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rows: Vec<PaymentRow>,
    #[serde(default)]
    pub next_row_id: u32,
}

impl PaymentTable {
    /// Append a blank row; returns its id.
    pub fn add_row(&mut self) -> u32 {
        let id = self.next_row_id;
        self.rows.push(PaymentRow {
            id,
            ..PaymentRow::default()
        });
        self.next_row_id += 1;
        id
    }

    /// Append copies of roster students, sorted by name, with fresh ids.
    fn append_students<'a>(&mut self, students: impl Iterator<Item = &'a StudentRow>) -> usize {
        let mut imported: Vec<&StudentRow> = students.collect();
        imported.sort_by(|a, b| name_order(&a.name, &b.name));
        for student in &imported {
            let id = self.next_row_id;
            self.rows.push(PaymentRow {
                id,
                name: student.name.clone(),
                school: student.school.clone(),
                grade: student.grade.clone(),
                ..PaymentRow::default()
            });
            self.next_row_id += 1;
        }
        imported.len()
    }
}

/// Roster name order for imports.
///
/// Hangul syllables compare by code point, which is Korean dictionary
/// order. Latin letters sort ahead of Hangul and ignore case, with the
/// lowercase spelling first on a tie.
fn name_order(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// The three per-level tables of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTables {
    #[serde(default)]
    pub elementary: PaymentTable,
    #[serde(default)]
    pub middle: PaymentTable,
    #[serde(default)]
    pub high: PaymentTable,
}

/// Number of rows imported per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub elementary: usize,
    pub middle: usize,
    pub high: usize,
}

impl ImportSummary {
    /// Total rows imported.
    pub fn total(&self) -> usize {
        self.elementary + self.middle + self.high
    }
}

/// One payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    pub page_id: u32,
    pub page_name: String,
    #[serde(default)]
    pub tables: PaymentTables,
}

impl Page for PaymentPage {
    const DEFAULT_NAME: &'static str = "입금명단";

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
            tables: PaymentTables::default(),
        }
    }
}

impl PaymentPage {
    /// Table for a school level.
    pub fn table(&self, level: SchoolLevel) -> &PaymentTable {
        match level {
            SchoolLevel::Elementary => &self.tables.elementary,
            SchoolLevel::Middle => &self.tables.middle,
            SchoolLevel::High => &self.tables.high,
        }
    }

    /// Mutable table for a school level.
    pub fn table_mut(&mut self, level: SchoolLevel) -> &mut PaymentTable {
        match level {
            SchoolLevel::Elementary => &mut self.tables.elementary,
            SchoolLevel::Middle => &mut self.tables.middle,
            SchoolLevel::High => &mut self.tables.high,
        }
    }

    pub fn add_row(&mut self, level: SchoolLevel) -> u32 {
        self.table_mut(level).add_row()
    }

    pub fn delete_row(&mut self, level: SchoolLevel, row_id: u32) -> Result<(), EditError> {
        table::remove_row(&mut self.table_mut(level).rows, row_id)?;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        level: SchoolLevel,
        row_id: u32,
        col: usize,
        value: &str,
    ) -> Result<(), EditError> {
        table::set_field(&mut self.table_mut(level).rows, row_id, col, value)
    }

    pub fn set_title(&mut self, level: SchoolLevel, title: &str) {
        self.table_mut(level).title = title.to_string();
    }

    pub fn clear_cells(&mut self, level: SchoolLevel, positions: &[CellPosition]) -> usize {
        table::clear_fields(&mut self.table_mut(level).rows, positions)
    }

    /// Append every roster student to the matching table.
    pub fn import_students<'a>(
        &mut self,
        elementary: impl Iterator<Item = &'a StudentRow>,
        middle: impl Iterator<Item = &'a StudentRow>,
        high: impl Iterator<Item = &'a StudentRow>,
    ) -> ImportSummary {
        let summary = ImportSummary {
            elementary: self.tables.elementary.append_students(elementary),
            middle: self.tables.middle.append_students(middle),
            high: self.tables.high.append_students(high),
        };
        info!(
            page_id = self.page_id,
            elementary = summary.elementary,
            middle = summary.middle,
            high = summary.high,
            "imported roster students"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::ClassSection;

    fn student(id: u32, name: &str) -> StudentRow {
        StudentRow {
            student_id: id,
            idx: id,
            name: name.into(),
            school: "s".into(),
            grade: "1".into(),
        }
    }

    #[test]
    fn blank_page_has_three_empty_tables() -> anyhow::Result<()> {
        let page = PaymentPage::blank(0, "입금명단1".into());
        let json = serde_json::to_value(&page)?;
        assert_eq!(
            json["tables"]["middle"],
            serde_json::json!({"title": "", "rows": [], "nextRowId": 0})
        );
        Ok(())
    }

    #[test]
    fn rows_are_edited_by_id() -> anyhow::Result<()> {
        let mut page = PaymentPage::blank(0, "p".into());
        let first = page.add_row(SchoolLevel::High);
        let second = page.add_row(SchoolLevel::High);
        page.set_field(SchoolLevel::High, second, 5, "300000")?;
        page.set_title(SchoolLevel::High, "3월 고등");
        assert_eq!(page.table(SchoolLevel::High).rows[1].tuition, "300000");

        page.delete_row(SchoolLevel::High, first)?;
        assert_eq!(page.add_row(SchoolLevel::High), 2);
        assert_eq!(
            page.delete_row(SchoolLevel::Middle, first),
            Err(EditError::UnknownRow(first))
        );
        assert_eq!(page.clear_cells(SchoolLevel::High, &[CellPosition::new(0, 5)]), 1);
        Ok(())
    }

    #[test]
    fn import_appends_sorted_students_with_fresh_ids() {
        let mut page = PaymentPage::blank(0, "p".into());
        page.add_row(SchoolLevel::Elementary);

        let elementary = [student(0, "하늘"), student(1, "가람")];
        let high = [student(0, "나래")];
        let summary = page.import_students(elementary.iter(), std::iter::empty(), high.iter());

        assert_eq!(summary, ImportSummary { elementary: 2, middle: 0, high: 1 });
        assert_eq!(summary.total(), 3);
        let rows = &page.table(SchoolLevel::Elementary).rows;
        assert_eq!(rows[1].name, "가람");
        assert_eq!(rows[1].id, 1);
        assert_eq!(rows[2].name, "하늘");
        assert_eq!(page.table(SchoolLevel::Elementary).next_row_id, 3);
    }

    #[test]
    fn import_orders_mixed_names_like_a_korean_roster() {
        let mut page = PaymentPage::blank(0, "p".into());
        let middle = [
            student(0, "하늘"),
            student(1, "bora"),
            student(2, "Alice"),
            student(3, "가람"),
            student(4, "alice"),
            student(5, "Chris"),
        ];
        page.import_students(std::iter::empty(), middle.iter(), std::iter::empty());

        let names: Vec<&str> = page
            .table(SchoolLevel::Middle)
            .rows
            .iter()
            .map(|row| row.name.as_str())
            .collect();
        assert_eq!(names, ["alice", "Alice", "bora", "Chris", "가람", "하늘"]);
    }

    #[test]
    fn import_reads_roster_sections() -> anyhow::Result<()> {
        let mut roster = ClassSection::default();
        let class = roster.add_class();
        let id = roster.add_student(class)?;
        roster.set_student_field(class, id, 0, "다온")?;

        let mut page = PaymentPage::blank(0, "p".into());
        let summary = page.import_students(roster.all_students(), std::iter::empty(), std::iter::empty());
        assert_eq!(summary.elementary, 1);
        assert_eq!(page.table(SchoolLevel::Elementary).rows[0].name, "다온");
        Ok(())
    }
}
