// src/sink/mod.rs

pub mod google;
#[cfg(test)]
pub(crate) mod memory;

use anyhow::Result;
use serde_json::Value;

pub use google::SheetsClient;

/// Row-major cell values; the first row holds the headers.
pub type ValueGrid = Vec<Vec<Value>>;

/// How the sink interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputMode {
    /// Stored exactly as given, no formula or date parsing.
    Raw,
}

impl ValueInputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputMode::Raw => "RAW",
        }
    }
}

/// A named-sheet, grid-based spreadsheet store addressed by spreadsheet id.
///
/// Every call completes before the next one is issued; implementations do
/// not retry.
#[allow(async_fn_in_trait)]
pub trait Sink {
    /// Titles of the sheets that currently exist.
    async fn list_sheets(&mut self, spreadsheet_id: &str) -> Result<Vec<String>>;

    async fn create_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<()>;

    /// Empty every cell of an existing sheet, keeping the sheet itself.
    async fn clear_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<()>;

    /// Replace the sheet contents starting at `top_left` (e.g. `A1`) with `values`.
    async fn write_range(
        &mut self,
        spreadsheet_id: &str,
        sheet_title: &str,
        top_left: &str,
        values: &ValueGrid,
        mode: ValueInputMode,
    ) -> Result<()>;
}

/// A1 reference to a whole sheet: the title quoted, `'` doubled.
pub fn a1_sheet(sheet_title: &str) -> String {
    format!("'{}'", sheet_title.replace('\'', "''"))
}

/// A1 reference to a cell of a sheet.
pub fn a1_range(sheet_title: &str, cell: &str) -> String {
    format!("{}!{}", a1_sheet(sheet_title), cell)
}
