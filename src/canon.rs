// src/canon.rs

use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::table::{Cell, Table, TableError};

/// Name of the leading label column of every canonical table.
pub const ITEM_COLUMN: &str = "Item";

/// Index column candidates, highest priority first. The first one present in
/// a table is pivoted into headers; if none is present the first column is.
pub const INDEX_CANDIDATES: &[&str] = &[
    "Year",
    "Item",
    "Variable",
    "Customer Segment",
    "Churn Factor",
    "Channel",
    "Retention Strategy",
    "Room",
    "Scenario",
    "Product",
];

#[derive(Debug, Error, PartialEq)]
pub enum CanonError {
    #[error("index column `{0}` not found in table")]
    MissingIndexColumn(String),

    #[error("index column `{column}` repeats value `{value}`")]
    DuplicateIndexValue { column: String, value: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// What to do when the index column holds the same value twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with [`CanonError::DuplicateIndexValue`].
    #[default]
    Reject,
    /// Keep every column, renaming repeats `v (2)`, `v (3)`, ...
    Suffix,
}

/// Pick the index column: first candidate present, else the first column.
/// Returns `None` only for a table without columns.
pub fn select_index_column(table: &Table) -> Option<&str> {
    INDEX_CANDIDATES
        .iter()
        .copied()
        .find(|c| table.has_column(c))
        .or_else(|| table.columns().first().map(String::as_str))
}

/// Pivot `table` so the index column's values become headers and every other
/// column becomes an `Item` row. Duplicate index values are rejected.
pub fn canonicalize(table: &Table, index: Option<&str>) -> Result<Table, CanonError> {
    canonicalize_with(table, index, DuplicatePolicy::Reject)
}

pub fn canonicalize_with(
    table: &Table,
    index: Option<&str>,
    policy: DuplicatePolicy,
) -> Result<Table, CanonError> {
    let index_name = match index {
        Some(name) => name,
        None => match select_index_column(table) {
            Some(name) => name,
            None => return Ok(Table::new(vec![ITEM_COLUMN.to_string()], Vec::new())?),
        },
    };
    let index_pos = table
        .column_index(index_name)
        .ok_or_else(|| CanonError::MissingIndexColumn(index_name.to_string()))?;
    debug!(index = index_name, rows = table.num_rows(), "canonicalizing");

    let labels = table.rows().iter().map(|r| r[index_pos].label());
    let headers = unique_headers(index_name, labels, policy)?;

    let mut columns = Vec::with_capacity(headers.len() + 1);
    columns.push(ITEM_COLUMN.to_string());
    columns.extend(headers);

    let rows = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_pos)
        .map(|(i, name)| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(Cell::Text(name.clone()));
            row.extend(table.rows().iter().map(|r| r[i].clone()));
            row
        })
        .collect();

    Ok(Table::new(columns, rows)?)
}

fn unique_headers(
    index_name: &str,
    labels: impl Iterator<Item = String>,
    policy: DuplicatePolicy,
) -> Result<Vec<String>, CanonError> {
    let labels: Vec<String> = labels.collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(labels.len());
    let mut out = Vec::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if taken.insert(label.clone()) {
            out.push(label.clone());
            continue;
        }
        if policy == DuplicatePolicy::Reject {
            return Err(CanonError::DuplicateIndexValue {
                column: index_name.to_string(),
                value: label.clone(),
            });
        }
        // skip names already used or still to come verbatim
        let mut k = 2;
        let renamed = loop {
            let candidate = format!("{} ({})", label, k);
            if !taken.contains(&candidate) && !labels[i + 1..].contains(&candidate) {
                break candidate;
            }
            k += 1;
        };
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    Ok(out)
}

/// Derive a copy of `table` with every cell of `column` passed through `f`.
/// A missing column yields an unchanged copy.
pub fn relabel_column<F>(table: &Table, column: &str, f: F) -> Table
where
    F: Fn(&Cell) -> Cell,
{
    let Some(idx) = table.column_index(column) else {
        return table.clone();
    };
    let (columns, mut rows) = table.clone().into_parts();
    for row in &mut rows {
        row[idx] = f(&row[idx]);
    }
    Table::from_parts(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn revenue() -> Table {
        Table::new(
            cols(&["Year", "Membership", "Retail"]),
            vec![
                vec![2024.into(), 100.0.into(), 5.0.into()],
                vec![2025.into(), 120.0.into(), Cell::Missing],
                vec![2026.into(), 150.0.into(), 9.5.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_year_fixture_shape() {
        let t = canonicalize(&revenue(), None).unwrap();
        assert_eq!(t.columns(), ["Item", "2024", "2025", "2026"]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(
            t.rows()[1],
            vec![
                Cell::Text("Retail".into()),
                Cell::Number(5.0),
                Cell::Missing,
                Cell::Number(9.5)
            ]
        );
    }

    #[test]
    fn test_cell_count_conserved() {
        let src = revenue();
        let t = canonicalize(&src, None).unwrap();
        let data_cells: usize = t.rows().iter().map(|r| r.len() - 1).sum();
        assert_eq!(data_cells + src.num_rows(), src.num_rows() * src.num_columns());
    }

    #[test]
    fn test_deterministic() {
        let src = revenue();
        assert_eq!(canonicalize(&src, None), canonicalize(&src, None));
        assert_eq!(
            canonicalize(&src, Some("Year")),
            canonicalize(&src, Some("Year"))
        );
    }

    #[test]
    fn test_priority_beats_position() {
        // `Channel` comes before `Product` in the candidate list, `Name` is first positionally
        let t = Table::new(
            cols(&["Name", "Product", "Channel", "Cost"]),
            vec![
                vec!["a".into(), "p1".into(), "Web".into(), 1.0.into()],
                vec!["b".into(), "p2".into(), "Store".into(), 2.0.into()],
            ],
        )
        .unwrap();
        assert_eq!(select_index_column(&t), Some("Channel"));
        let c = canonicalize(&t, None).unwrap();
        assert_eq!(c.columns(), ["Item", "Web", "Store"]);
        let items: Vec<String> = c.rows().iter().map(|r| r[0].label()).collect();
        assert_eq!(items, vec!["Name", "Product", "Cost"]);
    }

    #[test]
    fn test_year_beats_item() {
        let t = Table::new(cols(&["Item", "Year"]), vec![]).unwrap();
        assert_eq!(select_index_column(&t), Some("Year"));
    }

    #[test]
    fn test_fallback_to_first_column() {
        let t = Table::new(
            cols(&["Period", "Revenue"]),
            vec![vec!["Q1".into(), 1.0.into()], vec!["Q2".into(), 2.0.into()]],
        )
        .unwrap();
        assert_eq!(select_index_column(&t), Some("Period"));
        let c = canonicalize(&t, None).unwrap();
        assert_eq!(c.columns(), ["Item", "Q1", "Q2"]);
    }

    #[test]
    fn test_explicit_index() {
        let c = canonicalize(&revenue(), Some("Membership")).unwrap();
        assert_eq!(c.columns(), ["Item", "100", "120", "150"]);
        assert_eq!(
            canonicalize(&revenue(), Some("Quarter")),
            Err(CanonError::MissingIndexColumn("Quarter".into()))
        );
    }

    #[test]
    fn test_empty_tables() {
        let c = canonicalize(&Table::default(), None).unwrap();
        assert_eq!(c.columns(), ["Item"]);
        assert_eq!(c.num_rows(), 0);

        let no_rows = Table::new(cols(&["Year", "Revenue"]), vec![]).unwrap();
        let c = canonicalize(&no_rows, None).unwrap();
        assert_eq!(c.columns(), ["Item"]);
        assert_eq!(c.rows(), &[vec![Cell::Text("Revenue".into())]]);
    }

    #[test]
    fn test_duplicate_index_values() {
        let t = Table::new(
            cols(&["Year", "Revenue"]),
            vec![
                vec![2024.into(), 1.0.into()],
                vec![2024.into(), 2.0.into()],
                vec![2024.into(), 3.0.into()],
            ],
        )
        .unwrap();
        assert_eq!(
            canonicalize(&t, None),
            Err(CanonError::DuplicateIndexValue {
                column: "Year".into(),
                value: "2024".into()
            })
        );
        let c = canonicalize_with(&t, None, DuplicatePolicy::Suffix).unwrap();
        assert_eq!(c.columns(), ["Item", "2024", "2024 (2)", "2024 (3)"]);
    }

    #[test]
    fn test_suffix_avoids_existing_labels() {
        let t = Table::new(
            cols(&["Scenario", "Revenue"]),
            vec![
                vec!["Base".into(), 1.0.into()],
                vec!["Base".into(), 2.0.into()],
                vec!["Base (2)".into(), 3.0.into()],
            ],
        )
        .unwrap();
        let c = canonicalize_with(&t, None, DuplicatePolicy::Suffix).unwrap();
        assert_eq!(c.columns(), ["Item", "Base", "Base (3)", "Base (2)"]);
        let unique: HashSet<&String> = c.columns().iter().collect();
        assert_eq!(unique.len(), c.num_columns());
        assert_eq!(c.rows()[0][2], Cell::Number(2.0));
    }

    #[test]
    fn test_relabel_does_not_touch_source() {
        let src = revenue();
        let relabeled = relabel_column(&src, "Year", |c| Cell::Text(format!("Y{}", c.label())));
        assert_eq!(src.rows()[0][0], Cell::Number(2024.0));
        assert_eq!(relabeled.rows()[0][0], Cell::Text("Y2024".into()));
        assert_eq!(relabel_column(&src, "Nope", |c| c.clone()), src);
    }
}
