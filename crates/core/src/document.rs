//! The aggregate document exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    intake::InOutSection,
    models::SchoolLevel,
    pages::PageSection,
    payment::{ImportSummary, PaymentPage},
    roster::ClassSection,
    schedule::SchedulePage,
};

/// Every section of the academy data plus the last-saved timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDocument {
    /// Elementary class roster.
    #[serde(default)]
    pub elementary: ClassSection,
    /// Middle school class roster.
    #[serde(default)]
    pub middle: ClassSection,
    /// High school class roster.
    #[serde(default)]
    pub high: ClassSection,
    /// Weekly timetable pages.
    #[serde(default)]
    pub schedule: PageSection<SchedulePage>,
    /// Tuition payment pages.
    #[serde(default)]
    pub payment: PageSection<PaymentPage>,
    /// Intake and withdrawal records.
    #[serde(default)]
    pub inout: InOutSection,
    /// Time of the last successful save, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
}

impl AppDocument {
    /// Roster section for a school level.
    pub fn roster(&self, level: SchoolLevel) -> &ClassSection {
        match level {
            SchoolLevel::Elementary => &self.elementary,
            SchoolLevel::Middle => &self.middle,
            SchoolLevel::High => &self.high,
        }
    }

    /// Mutable roster section for a school level.
    pub fn roster_mut(&mut self, level: SchoolLevel) -> &mut ClassSection {
        match level {
            SchoolLevel::Elementary => &mut self.elementary,
            SchoolLevel::Middle => &mut self.middle,
            SchoolLevel::High => &mut self.high,
        }
    }

    /// Repair a freshly loaded document so every section invariant holds.
    pub fn normalize(&mut self) {
        self.schedule.normalize();
        self.payment.normalize();
        for page in &mut self.schedule.pages {
            page.time_settings.time_rows = page.time_settings.time_rows.max(1);
            let max_teacher = page.teachers.iter().map(|t| t.id + 1).max().unwrap_or(0);
            page.next_teacher_id = page.next_teacher_id.max(max_teacher);
        }
        for section in [&mut self.elementary, &mut self.middle, &mut self.high] {
            let max_class = section.classes.iter().map(|c| c.table_id + 1).max().unwrap_or(0);
            section.next_id = section.next_id.max(max_class);
        }
        let max_table = self.inout.tables.iter().map(|t| t.id + 1).max().unwrap_or(0);
        self.inout.next_table_id = self.inout.next_table_id.max(max_table);
    }

    /// Copy every roster student into the current payment page.
    pub fn import_students_into_payment(&mut self) -> Option<ImportSummary> {
        let Self {
            elementary,
            middle,
            high,
            payment,
            ..
        } = self;
        let page = payment.current_mut()?;
        Some(page.import_students(
            elementary.all_students(),
            middle.all_students(),
            high.all_students(),
        ))
    }
}
