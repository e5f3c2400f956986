// src/table/mod.rs

pub mod arrow;

use serde_json::Value;
use thiserror::Error;

/// A single cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Render the cell as plain text, the way it reads when used as a header.
    ///
    /// Integral numbers drop their fractional part (`2024.0` → `"2024"`),
    /// missing cells render as the empty string.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }

    /// Value as sent to the sink. Missing cells (and non-finite numbers, which
    /// JSON cannot carry) become the empty string.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Number(n) if !n.is_finite() => Value::String(String::new()),
            Cell::Number(n) if is_integral(*n) => Value::from(*n as i64),
            Cell::Number(n) => Value::from(*n),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Missing => Value::String(String::new()),
        }
    }
}

const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53

fn is_integral(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < MAX_EXACT_INT
}

fn format_number(n: f64) -> String {
    if is_integral(n) {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        if n.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(n)
        }
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Missing)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Ordered named columns plus ordered rows. Column order is meaningful.
///
/// Tables are values: transformations take `&Table` and build a new one, so a
/// table handed out by a producer is never edited behind its back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table whose headers are the column positions `0, 1, 2, …`.
    /// Short rows are padded with [`Cell::Missing`].
    pub fn positional(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Missing);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True when the headers are exactly `0, 1, 2, …`, as built by
    /// [`Table::positional`].
    pub fn has_positional_columns(&self) -> bool {
        !self.columns.is_empty()
            && self
                .columns
                .iter()
                .enumerate()
                .all(|(i, c)| *c == i.to_string())
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Reassemble a table from parts taken out of a well-formed one.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}
