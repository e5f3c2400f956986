// src/annotate.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

use crate::canon::ITEM_COLUMN;
use crate::table::{Cell, Table};

pub const DESCRIPTION_COLUMN: &str = "Description";

/// Used for any item the lookup does not know.
pub const GENERIC_DESCRIPTION: &str = "Financial metric";

static STANDARD: Lazy<DescriptionLookup> = Lazy::new(|| {
    DescriptionLookup::from_pairs([
        ("Total Revenue", "Sum of all revenue streams"),
        ("Total Expenses", "Sum of all expenses"),
        ("Net Profit", "Profit after all expenses and taxes"),
        ("Operating Profit (EBIT)", "Earnings before interest and taxes"),
        ("Cash", "Cash and cash equivalents"),
        ("Total Assets", "Sum of all assets"),
    ])
});

#[derive(Debug, Error, PartialEq)]
pub enum AnnotateError {
    #[error("table is not canonical: first column is {0:?}, expected `Item`")]
    NotCanonical(Option<String>),
}

/// Item name → description. Exact, case-sensitive keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionLookup {
    entries: HashMap<String, String>,
}

impl DescriptionLookup {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Descriptions for the headline statement lines.
    pub fn standard() -> &'static DescriptionLookup {
        &STANDARD
    }

    pub fn get(&self, item: &str) -> Option<&str> {
        self.entries.get(item).map(String::as_str)
    }

    /// Description for `item`, falling back to [`GENERIC_DESCRIPTION`].
    pub fn describe(&self, item: &str) -> &str {
        self.get(item).unwrap_or(GENERIC_DESCRIPTION)
    }
}

/// Return a copy of a canonical table with `Description` inserted right after
/// `Item`. An existing `Description` column in that position is recomputed.
pub fn annotate(table: &Table, lookup: &DescriptionLookup) -> Result<Table, AnnotateError> {
    if table.columns().first().map(String::as_str) != Some(ITEM_COLUMN) {
        return Err(AnnotateError::NotCanonical(table.columns().first().cloned()));
    }
    let replace = table.columns().get(1).map(String::as_str) == Some(DESCRIPTION_COLUMN);

    let (mut columns, mut rows) = table.clone().into_parts();
    if !replace {
        columns.insert(1, DESCRIPTION_COLUMN.to_string());
    }
    for row in &mut rows {
        let text = lookup.describe(&row[0].label()).to_string();
        if replace {
            row[1] = Cell::Text(text);
        } else {
            row.insert(1, Cell::Text(text));
        }
    }
    Ok(Table::from_parts(columns, rows))
}
