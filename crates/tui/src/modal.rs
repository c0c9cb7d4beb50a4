//! Dialogs standing in for browser prompt/confirm/alert.

use academy_core::{
    models::{SchoolLevel, Weekday},
    pages::CreateMode,
};

use crate::editor::TextInput;

/// Which page section a page command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Schedule,
    Payment,
}

/// What a submitted prompt does with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPurpose {
    NewPage { kind: PageKind, mode: CreateMode },
    RenamePage { kind: PageKind, page_id: u32 },
    AddTeacher { page_id: u32 },
    RenameTeacher { page_id: u32, teacher_id: u32 },
    DayDate { page_id: u32, day: Weekday },
    StartHour { page_id: u32 },
    StartMinute { page_id: u32, hour: String },
    Interval { page_id: u32, hour: String, minute: String },
    ClassName { level: SchoolLevel, class_id: u32 },
    ClassTeacher { level: SchoolLevel, class_id: u32 },
    PaymentTitle { page_id: u32, level: SchoolLevel },
    Month { table_id: u32 },
}

/// Destructive actions that wait for a yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeletePage { kind: PageKind, page_id: u32 },
    DeleteTeacher { page_id: u32, teacher_id: u32 },
    DeleteTimeRow { page_id: u32, slot: u32 },
    DeleteClass { level: SchoolLevel, class_id: u32 },
    DeleteStudent { level: SchoolLevel, class_id: u32, student_id: u32 },
    DeletePaymentRow { page_id: u32, level: SchoolLevel, row_id: u32 },
    DeleteInOutTable { table_id: u32 },
    DeleteInOutRow { table_id: u32, row_id: u32 },
    ImportStudents,
    Quit,
}

/// Single-line text prompt.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub title: String,
    pub label: String,
    pub input: TextInput,
    pub purpose: PromptPurpose,
}

impl Prompt {
    pub fn new(
        title: impl Into<String>,
        label: impl Into<String>,
        initial: &str,
        purpose: PromptPurpose,
    ) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
            input: TextInput::new(initial),
            purpose,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Modal {
    Prompt(Prompt),
    Confirm {
        message: String,
        action: ConfirmAction,
    },
    Alert {
        title: String,
        message: String,
    },
}
