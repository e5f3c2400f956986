// src/layout.rs
//
// Which sheets a run publishes, in what order, and how each raw table is
// shaped before it lands in the registry.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::annotate::{annotate, DescriptionLookup};
use crate::canon::{canonicalize, relabel_column};
use crate::model::{self, ModelConfig};
use crate::producer::{FnProducer, ParquetProducer, TableProducer};
use crate::registry::TableRegistry;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptions {
    /// Headline statement lines get their own text, the rest the generic label.
    Standard,
    /// Every row gets the generic label.
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Publish the table as produced.
    AsIs,
    /// Pivot to `Item` rows and add a `Description` column.
    Canonical {
        index: Option<String>,
        descriptions: Descriptions,
        /// Rewrite year numbers `0..=model_years` in the index as `Y0`, `Y1`, ...
        year_labels: bool,
    },
}

impl Shape {
    fn canonical(descriptions: Descriptions) -> Self {
        Shape::Canonical {
            index: None,
            descriptions,
            year_labels: false,
        }
    }
}

pub struct SheetSpec {
    pub name: String,
    pub producer: Box<dyn TableProducer>,
    pub shape: Shape,
}

impl SheetSpec {
    pub fn new(
        name: impl Into<String>,
        producer: impl TableProducer + 'static,
        shape: Shape,
    ) -> Self {
        Self {
            name: name.into(),
            producer: Box::new(producer),
            shape,
        }
    }
}

fn year_label(cell: &Cell, model_years: u32) -> Cell {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(model_years) => {
            Cell::Text(format!("Y{}", *n as u32))
        }
        other => other.clone(),
    }
}

/// Apply `shape` to a raw producer table.
pub fn shape_table(table: &Table, shape: &Shape, cfg: &ModelConfig) -> Result<Table> {
    let Shape::Canonical {
        index,
        descriptions,
        year_labels,
    } = shape
    else {
        return Ok(table.clone());
    };

    let source = match (*year_labels, index.as_deref()) {
        (true, Some(col)) => relabel_column(table, col, |c| year_label(c, cfg.model_years)),
        _ => table.clone(),
    };
    let canonical = canonicalize(&source, index.as_deref())?;
    let generic = DescriptionLookup::default();
    let lookup = match descriptions {
        Descriptions::Standard => DescriptionLookup::standard(),
        Descriptions::Generic => &generic,
    };
    Ok(annotate(&canonical, lookup)?)
}

/// Run every producer in order and collect the shaped tables.
#[instrument(level = "info", skip_all, fields(sheets = specs.len()))]
pub fn assemble(specs: &[SheetSpec], cfg: &ModelConfig) -> Result<TableRegistry> {
    let mut registry = TableRegistry::new();
    for sheet in specs {
        debug!(sheet = %sheet.name, source = %sheet.producer.describe(), "producing table");
        let raw = sheet.producer.produce(cfg).with_context(|| {
            format!(
                "producing `{}` from {}",
                sheet.name,
                sheet.producer.describe()
            )
        })?;
        let shaped = shape_table(&raw, &sheet.shape, cfg)
            .with_context(|| format!("shaping `{}`", sheet.name))?;
        registry.insert(sheet.name.clone(), shaped)?;
    }
    info!(sheets = registry.len(), "assembled tables");
    Ok(registry)
}

/// `Break-even Analysis` → `break_even_analysis`.
pub fn snapshot_stem(sheet_name: &str) -> String {
    let mut out = String::with_capacity(sheet_name.len());
    for ch in sheet_name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

const STANDARD_SHEETS: &[(&str, SheetKind)] = &[
    ("Dashboard", SheetKind::Dashboard),
    ("Venue Characteristics", SheetKind::Venue),
    ("Pricing Table", SheetKind::Pricing),
    ("Income Statement", SheetKind::Statement),
    ("Balance Sheet", SheetKind::BalanceSheet),
    ("Cash Flow", SheetKind::Statement),
    ("Revenue Summary", SheetKind::Statement),
    ("Membership Revenue", SheetKind::Detail),
    ("Punch Pass Revenue", SheetKind::Detail),
    ("Additional Services", SheetKind::Detail),
    ("Marketing Revenue", SheetKind::Detail),
    ("Content Revenue", SheetKind::Detail),
    ("Sponsorship Revenue", SheetKind::Detail),
    ("Media Revenue", SheetKind::Detail),
    ("PR Value", SheetKind::Detail),
    ("Retail Revenue", SheetKind::Detail),
    ("Retail Inventory", SheetKind::Detail),
    ("Retail Space Analysis", SheetKind::Detail),
    ("Bestselling Products", SheetKind::Raw),
    ("Expense Summary", SheetKind::Statement),
    ("Teacher Expenses", SheetKind::Detail),
    ("Admin Expenses", SheetKind::Detail),
    ("Facility Expenses", SheetKind::Detail),
    ("Operating Expenses", SheetKind::Detail),
    ("Capital Expenditures", SheetKind::Detail),
    ("Loan Details", SheetKind::Detail),
    ("Customer Acquisition", SheetKind::Detail),
    ("Customer Segmentation", SheetKind::Raw),
    ("Churn Analysis", SheetKind::Raw),
    ("Customer Lifetime Value", SheetKind::Raw),
    ("Retention Strategies", SheetKind::Raw),
    ("Financial Ratios", SheetKind::Detail),
    ("Landlord Analysis", SheetKind::Detail),
    ("Break-even Analysis", SheetKind::Detail),
    ("Sensitivity Analysis", SheetKind::Raw),
    ("Occupancy Analysis", SheetKind::Raw),
    ("Scenario Analysis", SheetKind::Raw),
];

#[derive(Debug, Clone, Copy)]
enum SheetKind {
    Dashboard,
    Venue,
    Pricing,
    /// Financial statement: pivoted, standard descriptions.
    Statement,
    BalanceSheet,
    /// Supporting schedule: pivoted, generic descriptions.
    Detail,
    /// Already laid out for reading.
    Raw,
}

/// The full workbook: three parameter sheets built from the model
/// configuration, then every calculator table read from
/// `<tables_dir>/<snapshot_stem>.parquet`.
pub fn standard_layout(tables_dir: &Path) -> Vec<SheetSpec> {
    STANDARD_SHEETS
        .iter()
        .map(|&(name, kind)| {
            let snapshot = || {
                ParquetProducer::new(tables_dir.join(format!("{}.parquet", snapshot_stem(name))))
            };
            match kind {
                SheetKind::Dashboard => SheetSpec::new(
                    name,
                    FnProducer::new("dashboard", |cfg: &ModelConfig| Ok(model::dashboard(cfg))),
                    Shape::AsIs,
                ),
                SheetKind::Venue => SheetSpec::new(
                    name,
                    FnProducer::new("venue characteristics", |cfg: &ModelConfig| {
                        Ok(model::venue_characteristics(cfg))
                    }),
                    Shape::AsIs,
                ),
                SheetKind::Pricing => SheetSpec::new(
                    name,
                    FnProducer::new("pricing table", model::pricing_table),
                    Shape::AsIs,
                ),
                SheetKind::Statement => {
                    SheetSpec::new(name, snapshot(), Shape::canonical(Descriptions::Standard))
                }
                SheetKind::BalanceSheet => SheetSpec::new(
                    name,
                    snapshot(),
                    Shape::Canonical {
                        index: Some("Year".to_string()),
                        descriptions: Descriptions::Standard,
                        year_labels: true,
                    },
                ),
                SheetKind::Detail => {
                    SheetSpec::new(name, snapshot(), Shape::canonical(Descriptions::Generic))
                }
                SheetKind::Raw => SheetSpec::new(name, snapshot(), Shape::AsIs),
            }
        })
        .collect()
}
