#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use super::SaveReceipt;
use crate::{document::AppDocument, error::StoreError};

/// Keeps the document in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as the default document.
    pub async fn load(&self) -> Result<AppDocument, StoreError> {
        if !fs::try_exists(&self.path).await? {
            info!(path = %self.path.display(), "no document on disk, starting fresh");
            return Ok(AppDocument::default());
        }
        let contents = fs::read_to_string(&self.path).await?;
        let document = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), bytes = contents.len(), "read document");
        Ok(document)
    }

    /// Write the document with a fresh `lastSaved`, creating parent
    /// directories as needed. The file is replaced via a temporary sibling.
    pub async fn save(&self, document: &AppDocument) -> Result<SaveReceipt, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let last_saved = Utc::now();
        let mut stamped = document.clone();
        stamped.last_saved = Some(last_saved);

        let serialized = serde_json::to_string_pretty(&stamped)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, serialized).await?;
        fs::rename(&temp, &self.path).await?;

        Ok(SaveReceipt {
            success: true,
            last_saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::models::Weekday;

    #[tokio::test]
    async fn missing_file_loads_default_document() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().await?, AppDocument::default());
        Ok(())
    }

    #[tokio::test]
    async fn saved_document_reloads_with_timestamp() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("nested").join("academy.json"));
        let mut document = AppDocument::default();
        if let Some(page) = document.schedule.current_mut() {
            page.set_cell(0, Weekday::Mon, 0, "국어");
        }

        let receipt = store.save(&document).await?;
        assert!(receipt.success);

        let loaded = store.load().await?;
        assert_eq!(loaded.last_saved, Some(receipt.last_saved));
        assert_eq!(
            loaded.schedule.current().map(|p| p.cell(0, Weekday::Mon, 0)),
            Some("국어")
        );
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json")?;
        let err = FileStore::new(path).load().await.err();
        assert!(matches!(err, Some(StoreError::Decode(_))));
        Ok(())
    }
}
