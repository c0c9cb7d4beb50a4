//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Day of the week, serialised with the backend's single-character tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Weekday {
    /// Monday.
    #[serde(rename = "월")]
    Mon,
    /// Tuesday.
    #[serde(rename = "화")]
    Tue,
    /// Wednesday.
    #[serde(rename = "수")]
    Wed,
    /// Thursday.
    #[serde(rename = "목")]
    Thu,
    /// Friday.
    #[serde(rename = "금")]
    Fri,
    /// Saturday.
    #[serde(rename = "토")]
    Sat,
    /// Sunday.
    #[serde(rename = "일")]
    Sun,
}

impl Weekday {
    /// Monday through Sunday, in display order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// The wire/display tag.
    pub fn tag(self) -> &'static str {
        match self {
            Weekday::Mon => "월",
            Weekday::Tue => "화",
            Weekday::Wed => "수",
            Weekday::Thu => "목",
            Weekday::Fri => "금",
            Weekday::Sat => "토",
            Weekday::Sun => "일",
        }
    }

    /// Zero-based position in [`Weekday::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Weekday::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// School level shared by the roster sections and payment tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolLevel {
    /// Elementary school (levels 1..=6).
    Elementary,
    /// Middle school (levels 1..=3).
    Middle,
    /// High school (levels 1..=3).
    High,
}

impl SchoolLevel {
    /// All levels in display order.
    pub const ALL: [SchoolLevel; 3] = [
        SchoolLevel::Elementary,
        SchoolLevel::Middle,
        SchoolLevel::High,
    ];

    /// Highest grade level a class can be set to.
    pub fn max_grade(self) -> u8 {
        match self {
            SchoolLevel::Elementary => 6,
            SchoolLevel::Middle | SchoolLevel::High => 3,
        }
    }

    /// Korean section label.
    pub fn label(self) -> &'static str {
        match self {
            SchoolLevel::Elementary => "초등",
            SchoolLevel::Middle => "중등",
            SchoolLevel::High => "고등",
        }
    }
}
