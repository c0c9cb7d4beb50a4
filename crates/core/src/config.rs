//! Application configuration: built-in defaults, an optional TOML file and
//! `ACADEMY_*` environment overrides, in that order.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config/data directories.
pub const APP_DIR: &str = "academy";

/// Default backend root.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";

const DEFAULT_CONFIG: &str = r#"# Academy admin configuration.
#
# backend: "http" talks to the academy server, "file" keeps the document in
# a local JSON file.
backend = "http"
api_base_url = "http://localhost:5001/api"
# data_file = "/path/to/academy.json"
request_timeout_secs = 10
history_limit = 100
"#;

/// Where the document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote JSON API.
    Http,
    /// Local JSON file.
    File,
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persistence backend.
    pub backend: BackendKind,
    /// Base URL of the HTTP API, without trailing `/data`.
    pub api_base_url: String,
    /// Document path for the file backend.
    pub data_file: PathBuf,
    /// HTTP request timeout.
    pub request_timeout_secs: u64,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Http,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_file: default_data_file(),
            request_timeout_secs: 10,
            history_limit: 100,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location plus environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Some(&config_path()))
    }

    /// Load with an explicit (optional) config file.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("backend", "http")?
            .set_default("api_base_url", defaults.api_base_url.clone())?
            .set_default("data_file", defaults.data_file.to_string_lossy().to_string())?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("history_limit", defaults.history_limit as u64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix("ACADEMY").try_parsing(true))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// `<config_dir>/academy/config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// `<data_dir>/academy/academy.json`.
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("academy.json")
}

/// Write the commented default config on first run.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(&config_path()).map(|_| ())
}

/// Write the default config to `path` unless it exists. Returns whether a
/// file was written.
pub fn ensure_default_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "backend = \"file\"\ndata_file = \"/tmp/academy-test.json\"\nhistory_limit = 5\n",
        )?;

        let config = AppConfig::load_from(Some(&path))?;
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.data_file, PathBuf::from("/tmp/academy-test.json"));
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.request_timeout_secs, 10);
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_loads() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        assert!(ensure_default_config_at(&path)?);
        assert!(!ensure_default_config_at(&path)?);

        let config = AppConfig::load_from(Some(&path))?;
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        Ok(())
    }
}
