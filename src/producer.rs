// src/producer.rs

use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::model::ModelConfig;
use crate::table::{arrow::table_from_batches, Table};

/// Something that yields one raw table per run.
pub trait TableProducer {
    /// Short label used in logs and errors.
    fn describe(&self) -> String;

    fn produce(&self, cfg: &ModelConfig) -> Result<Table>;
}

/// Reads a table snapshot written by the financial calculators.
pub struct ParquetProducer {
    path: PathBuf,
}

impl ParquetProducer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn read_parquet_table(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of `{}`", path.display()))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let batches = builder
        .with_batch_size(1024)
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("reading record batches of `{}`", path.display()))?;
    debug!(path = %path.display(), batches = batches.len(), "read parquet table");

    // a snapshot with no rows still carries its header
    if batches.is_empty() {
        return Ok(Table::new(columns, Vec::new())?);
    }
    table_from_batches(&batches).with_context(|| format!("converting `{}`", path.display()))
}

impl TableProducer for ParquetProducer {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn produce(&self, _cfg: &ModelConfig) -> Result<Table> {
        read_parquet_table(&self.path)
    }
}

/// Wraps an in-process function of the model configuration.
pub struct FnProducer<F> {
    label: String,
    f: F,
}

impl<F> FnProducer<F>
where
    F: Fn(&ModelConfig) -> Result<Table>,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> TableProducer for FnProducer<F>
where
    F: Fn(&ModelConfig) -> Result<Table>,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn produce(&self, cfg: &ModelConfig) -> Result<Table> {
        (self.f)(cfg)
    }
}
