//! Whole-document persistence.
//!
//! Every save transmits the full [`AppDocument`]; there is no partial update.

mod file;
mod http;

pub use file::FileStore;
pub use http::HttpStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{
    config::{AppConfig, BackendKind},
    document::AppDocument,
    error::StoreError,
};

/// Backend answer to a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// Whether the backend stored the document.
    pub success: bool,
    /// Server-side save time.
    pub last_saved: DateTime<Utc>,
}

/// Outcome of a background load or save.
#[derive(Debug)]
pub enum StoreEvent {
    /// The initial fetch finished.
    Loaded(Result<AppDocument, StoreError>),
    /// A save round-trip finished.
    Saved(Result<SaveReceipt, StoreError>),
}

/// Configured persistence backend.
#[derive(Debug, Clone)]
pub enum DocumentStore {
    /// JSON over HTTP.
    Http(HttpStore),
    /// Local JSON file.
    File(FileStore),
}

impl DocumentStore {
    /// Build the backend selected in the configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store = match config.backend {
            BackendKind::Http => DocumentStore::Http(HttpStore::new(
                &config.api_base_url,
                config.request_timeout(),
            )?),
            BackendKind::File => DocumentStore::File(FileStore::new(config.data_file.clone())),
        };
        Ok(store)
    }

    /// Short human-readable description of the backend.
    pub fn describe(&self) -> String {
        match self {
            DocumentStore::Http(store) => store.data_url(),
            DocumentStore::File(store) => store.path().display().to_string(),
        }
    }

    /// Fetch the whole document.
    pub async fn load(&self) -> Result<AppDocument, StoreError> {
        match self {
            DocumentStore::Http(store) => store.load().await,
            DocumentStore::File(store) => store.load().await,
        }
    }

    /// Store the whole document.
    pub async fn save(&self, document: &AppDocument) -> Result<SaveReceipt, StoreError> {
        match self {
            DocumentStore::Http(store) => store.save(document).await,
            DocumentStore::File(store) => store.save(document).await,
        }
    }

    /// Load in the background and report through `sender`.
    pub fn spawn_load(&self, sender: mpsc::Sender<StoreEvent>) {
        let store = self.clone();
        tokio::spawn(async move {
            let result = store.load().await;
            match &result {
                Ok(_) => info!(backend = %store.describe(), "document loaded"),
                Err(err) => error!(backend = %store.describe(), "document load failed: {err}"),
            }
            let _ = sender.send(StoreEvent::Loaded(result)).await;
        });
    }

    /// Save a snapshot in the background and report through `sender`.
    pub fn spawn_save(&self, document: AppDocument, sender: mpsc::Sender<StoreEvent>) {
        let store = self.clone();
        tokio::spawn(async move {
            let result = store.save(&document).await;
            match &result {
                Ok(receipt) => info!(last_saved = %receipt.last_saved, "document saved"),
                Err(err) => error!(backend = %store.describe(), "document save failed: {err}"),
            }
            let _ = sender.send(StoreEvent::Saved(result)).await;
        });
    }
}
