#![allow(missing_docs)]

//! Monthly intake / withdrawal log.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::EditError,
    grid::CellPosition,
    table::{self, RecordRow},
};

/// Whether a table lists new students or withdrawals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeKind {
    #[default]
    #[serde(rename = "신입")]
    Joined,
    #[serde(rename = "중퇴")]
    Withdrew,
}

impl IntakeKind {
    pub fn label(self) -> &'static str {
        match self {
            IntakeKind::Joined => "신입",
            IntakeKind::Withdrew => "중퇴",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            IntakeKind::Joined => IntakeKind::Withdrew,
            IntakeKind::Withdrew => IntakeKind::Joined,
        }
    }
}

/// One student entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InOutRow {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub reason: String,
}

impl RecordRow for InOutRow {
    const COLUMNS: &'static [&'static str] = &["이름", "학교", "학년", "사유"];

    fn row_id(&self) -> u32 {
        self.id
    }

    fn field(&self, col: usize) -> Option<&str> {
        match col {
            0 => Some(&self.name),
            1 => Some(&self.school),
            2 => Some(&self.grade),
            3 => Some(&self.reason),
            _ => None,
        }
    }

    fn field_mut(&mut self, col: usize) -> Option<&mut String> {
        match col {
            0 => Some(&mut self.name),
            1 => Some(&mut self.school),
            2 => Some(&mut self.grade),
            3 => Some(&mut self.reason),
            _ => None,
        }
    }
}

/// One month's table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InOutTable {
    pub id: u32,
    #[serde(default)]
    pub month: String,
    #[serde(rename = "type", default)]
    pub kind: IntakeKind,
    #[serde(default)]
    pub rows: Vec<InOutRow>,
    #[serde(default)]
    pub next_row_id: u32,
}

/// All intake tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InOutSection {
    #[serde(default)]
    pub tables: Vec<InOutTable>,
    #[serde(default)]
    pub next_table_id: u32,
}

impl InOutSection {
    pub fn table(&self, id: u32) -> Option<&InOutTable> {
        self.tables.iter().find(|table| table.id == id)
    }

    fn table_mut(&mut self, id: u32) -> Result<&mut InOutTable, EditError> {
        self.tables
            .iter_mut()
            .find(|table| table.id == id)
            .ok_or(EditError::UnknownTable(id))
    }

    /// Append an empty intake table; returns its id.
    pub fn add_table(&mut self) -> u32 {
        let id = self.next_table_id;
        self.tables.push(InOutTable {
            id,
            ..InOutTable::default()
        });
        self.next_table_id += 1;
        id
    }

    pub fn delete_table(&mut self, id: u32) -> Result<(), EditError> {
        let index = self
            .tables
            .iter()
            .position(|table| table.id == id)
            .ok_or(EditError::UnknownTable(id))?;
        self.tables.remove(index);
        info!(table_id = id, "deleted intake table");
        Ok(())
    }

    pub fn set_month(&mut self, id: u32, month: &str) -> Result<(), EditError> {
        self.table_mut(id)?.month = month.trim().to_string();
        Ok(())
    }

    pub fn set_kind(&mut self, id: u32, kind: IntakeKind) -> Result<(), EditError> {
        self.table_mut(id)?.kind = kind;
        Ok(())
    }

    pub fn add_row(&mut self, table_id: u32) -> Result<u32, EditError> {
        let table = self.table_mut(table_id)?;
        let id = table.next_row_id;
        table.rows.push(InOutRow {
            id,
            ..InOutRow::default()
        });
        table.next_row_id += 1;
        Ok(id)
    }

    pub fn delete_row(&mut self, table_id: u32, row_id: u32) -> Result<(), EditError> {
        table::remove_row(&mut self.table_mut(table_id)?.rows, row_id)?;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        table_id: u32,
        row_id: u32,
        col: usize,
        value: &str,
    ) -> Result<(), EditError> {
        table::set_field(&mut self.table_mut(table_id)?.rows, row_id, col, value)
    }

    pub fn clear_cells(
        &mut self,
        table_id: u32,
        positions: &[CellPosition],
    ) -> Result<usize, EditError> {
        Ok(table::clear_fields(
            &mut self.table_mut(table_id)?.rows,
            positions,
        ))
    }
}
