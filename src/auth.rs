// src/auth.rs
//
// Service-account credentials: discovery, staging to a temporary file for the
// duration of a run, and the token source that authorises Sheets calls.

use anyhow::{anyhow, Context, Result};
use google_cloud_auth::{
    credentials::CredentialsFile, project::Config, token::DefaultTokenSourceProvider,
};
use google_cloud_token::{TokenSource, TokenSourceProvider};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const SHEETS_SCOPES: [&str; 1] = ["https://www.googleapis.com/auth/spreadsheets"];
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service-account JSON key that we use.
/// Unknown fields are kept so a staged copy round-trips unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Find a service-account key: inline JSON in `env_var` first, then the file
/// at `path`. `Ok(None)` means neither is present.
pub fn load_service_account(env_var: &str, path: &Path) -> Result<Option<ServiceAccountKey>> {
    resolve_service_account(env::var(env_var).ok(), path)
}

fn resolve_service_account(
    inline: Option<String>,
    path: &Path,
) -> Result<Option<ServiceAccountKey>> {
    if let Some(json) = inline.filter(|s| !s.trim().is_empty()) {
        debug!("using inline service account credentials");
        let key = serde_json::from_str(&json).context("parsing inline service account JSON")?;
        return Ok(Some(key));
    }
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "using service account file");
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let key = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(key))
}

/// A copy of the key on disk that lives only as long as the run.
///
/// Dropping it deletes the file too; [`StagedCredentials::remove`] does the
/// same but reports failures.
pub struct StagedCredentials {
    file: NamedTempFile,
}

impl StagedCredentials {
    pub fn stage(key: &ServiceAccountKey) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("finsheets_creds_")
            .suffix(".json")
            .tempfile()
            .context("creating temporary credentials file")?;
        serde_json::to_writer(&mut file, key).context("writing temporary credentials")?;
        file.flush()?;
        info!(path = %file.path().display(), "saved temporary credentials");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn remove(self) -> Result<()> {
        let path: PathBuf = self.file.path().to_path_buf();
        self.file
            .close()
            .with_context(|| format!("removing {}", path.display()))?;
        info!(path = %path.display(), "removed temporary credentials");
        Ok(())
    }
}

/// Hands out `Authorization` header values for the Sheets scope. Tokens are
/// cached and refreshed by the underlying source.
#[derive(Clone)]
pub struct Authorizer {
    source: Arc<dyn TokenSource>,
}

impl Authorizer {
    /// Build from a service-account key file, e.g. a [`StagedCredentials`] path.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let creds = CredentialsFile::new_from_file(path.to_string_lossy().into_owned())
            .await
            .with_context(|| format!("loading credentials from {}", path.display()))?;
        let config = Config::default().with_scopes(&SHEETS_SCOPES);
        let provider = DefaultTokenSourceProvider::new_with_credentials(config, Box::new(creds))
            .await
            .context("building token source")?;
        debug!(path = %path.display(), "token source ready");
        Ok(Self {
            source: provider.token_source(),
        })
    }

    pub fn from_source(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }

    /// `Bearer ...`, ready for the `Authorization` header.
    pub async fn header_value(&self) -> Result<String> {
        self.source
            .token()
            .await
            .map_err(|e| anyhow!("fetching access token: {}", e))
    }
}
