// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use crate::publish::PublishOptions;

pub const CONFIG_PATH_ENV: &str = "FINSHEETS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "finsheets.yaml";

const DEFAULT_SPREADSHEET_ID: &str = "1ZjIpQtGYNwxOnP-f_DK7e36qBGIw37jkVYCMUK9xupM";

/// Settings for one export run. Every field has a default, so an absent or
/// partial `finsheets.yaml` is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub spreadsheet_id: String,
    /// Directory holding the calculator snapshots, one `.parquet` per sheet.
    pub tables_dir: PathBuf,
    pub model_config: PathBuf,
    pub credentials_path: PathBuf,
    /// Environment variable that may carry the service-account JSON inline.
    pub credentials_env: String,
    pub create_delay_ms: u64,
    pub write_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            tables_dir: PathBuf::from("tables"),
            model_config: PathBuf::from("config/model.yaml"),
            credentials_path: PathBuf::from("credentials/google_service_account.json"),
            credentials_env: "GOOGLE_CREDS_JSON".to_string(),
            create_delay_ms: 1000,
            write_delay_ms: 1000,
        }
    }
}

impl ExportConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing export configuration")
    }

    /// Read the file at `path` if it exists, otherwise start from defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no export config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading export configuration {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// File named by `FINSHEETS_CONFIG` (or `finsheets.yaml`), then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::from_file(Path::new(&path))?;
        cfg.apply_overrides(|k| env::var(k).ok());
        info!(
            spreadsheet = %cfg.spreadsheet_id,
            tables_dir = %cfg.tables_dir.display(),
            "loaded export configuration"
        );
        Ok(cfg)
    }

    /// Apply `SPREADSHEET_ID`, `FINSHEETS_TABLES_DIR` and `FINSHEETS_MODEL_CONFIG`.
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        if let Some(id) = get("SPREADSHEET_ID") {
            self.spreadsheet_id = id;
        }
        if let Some(dir) = get("FINSHEETS_TABLES_DIR") {
            self.tables_dir = dir.into();
        }
        if let Some(path) = get("FINSHEETS_MODEL_CONFIG") {
            self.model_config = path.into();
        }
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            create_delay: Duration::from_millis(self.create_delay_ms),
            write_delay: Duration::from_millis(self.write_delay_ms),
        }
    }
}
