// src/sink/memory.rs
//
// In-memory sink that records every call, for publisher tests. Writes land
// over whatever the sheet already holds, as they do in Google Sheets, so
// only a clear removes cells outside the new grid.

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;

use serde_json::Value;

use super::{a1_range, a1_sheet, Sink, ValueGrid, ValueInputMode};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Create(String),
    Clear(String),
    Write {
        range: String,
        mode: ValueInputMode,
    },
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub calls: Vec<Call>,
    pub titles: Vec<String>,
    pub contents: HashMap<String, ValueGrid>,
    pub fail_list: bool,
    pub fail_create_on: Option<String>,
    pub fail_write_on: Option<String>,
}

impl MemorySink {
    pub fn with_sheets(titles: &[&str]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn creates(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Create(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write { range, .. } => Some(range.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Sink for MemorySink {
    async fn list_sheets(&mut self, _spreadsheet_id: &str) -> Result<Vec<String>> {
        self.calls.push(Call::List);
        if self.fail_list {
            bail!("listing sheets: 503 Service Unavailable");
        }
        Ok(self.titles.clone())
    }

    async fn create_sheet(&mut self, _spreadsheet_id: &str, title: &str) -> Result<()> {
        self.calls.push(Call::Create(title.to_string()));
        if self.fail_create_on.as_deref() == Some(title) {
            bail!("addSheet {}: 429 Too Many Requests", title);
        }
        if self.titles.iter().any(|t| t == title) {
            return Err(anyhow!("A sheet with the name \"{}\" already exists", title));
        }
        self.titles.push(title.to_string());
        Ok(())
    }

    async fn clear_sheet(&mut self, _spreadsheet_id: &str, title: &str) -> Result<()> {
        self.calls.push(Call::Clear(title.to_string()));
        if !self.titles.iter().any(|t| t == title) {
            bail!("Unable to parse range: {}", a1_sheet(title));
        }
        self.contents.remove(title);
        Ok(())
    }

    async fn write_range(
        &mut self,
        _spreadsheet_id: &str,
        sheet_title: &str,
        top_left: &str,
        values: &ValueGrid,
        mode: ValueInputMode,
    ) -> Result<()> {
        self.calls.push(Call::Write {
            range: a1_range(sheet_title, top_left),
            mode,
        });
        if self.fail_write_on.as_deref() == Some(sheet_title) {
            bail!("values.update {}: 500 Internal Server Error", sheet_title);
        }
        if !self.titles.iter().any(|t| t == sheet_title) {
            bail!("Unable to parse range: {}", a1_range(sheet_title, top_left));
        }
        let grid = self.contents.entry(sheet_title.to_string()).or_default();
        for (r, row) in values.iter().enumerate() {
            if grid.len() <= r {
                grid.push(Vec::new());
            }
            let target = &mut grid[r];
            for (c, value) in row.iter().enumerate() {
                if target.len() <= c {
                    target.resize(c + 1, Value::String(String::new()));
                }
                target[c] = value.clone();
            }
        }
        Ok(())
    }
}
