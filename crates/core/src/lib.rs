#![warn(clippy::all, missing_docs)]

//! Core domain logic for the academy administration tool.
//!
//! This crate hosts the document model (class rosters, weekly schedules,
//! payment ledgers and the intake log), the spreadsheet-style grid engine,
//! undo history, configuration and the persistence backends used by the
//! terminal UI.

pub mod config;
pub mod document;
pub mod error;
pub mod grid;
pub mod history;
pub mod intake;
pub mod models;
pub mod pages;
pub mod payment;
pub mod roster;
pub mod schedule;
pub mod session;
pub mod store;
pub mod table;

pub use config::AppConfig;
pub use document::AppDocument;
pub use error::{EditError, StoreError};
pub use grid::{GridCells, GridNavigator};
pub use models::{SchoolLevel, Weekday};
pub use pages::{CreateMode, Page, PageSection};
pub use session::Session;
pub use store::{DocumentStore, StoreEvent};
