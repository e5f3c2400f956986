// src/export.rs
//
// One end-to-end run: credentials, model configuration, table assembly,
// publishing, cleanup.

use anyhow::anyhow;
use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::auth::{self, Authorizer, StagedCredentials};
use crate::config::ExportConfig;
use crate::layout;
use crate::model::ModelConfig;
use crate::publish::{PublishOptions, PublishReport, Publisher};
use crate::registry::TableRegistry;
use crate::sink::{Sink, SheetsClient};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no service account credentials: set {env} or provide {}", .path.display())]
    CredentialsUnavailable { env: String, path: PathBuf },
    #[error("invalid service account credentials: {0:#}")]
    Credentials(anyhow::Error),
    #[error("configuration error: {0:#}")]
    Config(anyhow::Error),
    #[error("assembling tables failed: {0:#}")]
    Assemble(anyhow::Error),
    #[error("published {succeeded} of {total} sheets before failing: {reason}")]
    Publish {
        succeeded: usize,
        total: usize,
        reason: String,
    },
}

impl ExportError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::CredentialsUnavailable { .. } => 2,
            _ => 1,
        }
    }
}

/// Load everything, publish the standard workbook, remove the staged key.
#[instrument(level = "info", skip_all, fields(spreadsheet = %cfg.spreadsheet_id))]
pub async fn run(cfg: &ExportConfig) -> Result<PublishReport, ExportError> {
    let key = auth::load_service_account(&cfg.credentials_env, &cfg.credentials_path)
        .map_err(ExportError::Credentials)?
        .ok_or_else(|| ExportError::CredentialsUnavailable {
            env: cfg.credentials_env.clone(),
            path: cfg.credentials_path.clone(),
        })?;
    info!(account = %key.client_email, "found service account");

    if cfg.spreadsheet_id.trim().is_empty() {
        return Err(ExportError::Config(anyhow!("spreadsheet id is empty")));
    }
    let model = ModelConfig::load(&cfg.model_config).map_err(ExportError::Config)?;
    let registry = layout::assemble(&layout::standard_layout(&cfg.tables_dir), &model)
        .map_err(ExportError::Assemble)?;

    let staged = StagedCredentials::stage(&key).map_err(ExportError::Credentials)?;
    let result = publish_with_credentials(staged.path(), cfg, &registry).await;
    if let Err(e) = staged.remove() {
        warn!(error = %format!("{:#}", e), "could not remove temporary credentials");
    }
    result
}

async fn publish_with_credentials(
    credentials: &Path,
    cfg: &ExportConfig,
    registry: &TableRegistry,
) -> Result<PublishReport, ExportError> {
    let auth = Authorizer::from_file(credentials)
        .await
        .map_err(ExportError::Credentials)?;
    let client = SheetsClient::new(Client::new(), auth).map_err(ExportError::Config)?;
    publish_registry(client, &cfg.spreadsheet_id, cfg.publish_options(), registry).await
}

/// Publish `registry` through `sink`; a failed report becomes [`ExportError::Publish`].
pub async fn publish_registry<S: Sink>(
    sink: S,
    spreadsheet_id: &str,
    options: PublishOptions,
    registry: &TableRegistry,
) -> Result<PublishReport, ExportError> {
    let mut publisher = Publisher::new(sink, spreadsheet_id, options);
    let report = publisher.publish(registry).await;
    if let Some(reason) = report.failure.clone() {
        return Err(ExportError::Publish {
            succeeded: report.succeeded(),
            total: report.total(),
            reason,
        });
    }
    Ok(report)
}
