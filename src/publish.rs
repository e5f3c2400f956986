// src/publish.rs

use anyhow::Result;
use std::{collections::HashSet, fmt, time::Duration};
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::registry::{SheetEntry, TableRegistry};
use crate::sink::{Sink, ValueGrid, ValueInputMode};
use crate::table::Table;

/// Cell the grid is written from.
pub const TOP_LEFT: &str = "A1";

/// Fixed pauses that keep the run under the sink's request-rate ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    /// After creating a sheet.
    pub create_delay: Duration,
    /// After writing a sheet.
    pub write_delay: Duration,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            create_delay: Duration::from_secs(1),
            write_delay: Duration::from_secs(1),
        }
    }
}

impl PublishOptions {
    pub fn no_delay() -> Self {
        Self {
            create_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetStatus {
    /// Sheet did not exist; created then written.
    Created,
    /// Sheet existed; contents overwritten.
    Updated,
    Failed(String),
    /// Not attempted because an earlier call failed.
    Skipped,
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::Created => write!(f, "created"),
            SheetStatus::Updated => write!(f, "updated"),
            SheetStatus::Failed(e) => write!(f, "failed: {}", e),
            SheetStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutcome {
    pub name: String,
    pub status: SheetStatus,
}

/// Per-sheet result of one publish run, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    pub outcomes: Vec<SheetOutcome>,
    /// The error that stopped the run, if any.
    pub failure: Option<String>,
}

impl PublishReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SheetStatus::Created | SheetStatus::Updated))
            .count()
    }

    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SheetStatus::Created)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Header row followed by data rows. Missing cells become `""`. Positional
/// headers (`0, 1, 2, …`) are written as numbers.
pub fn to_grid(table: &Table) -> ValueGrid {
    let numeric_header = table.has_positional_columns();
    let header = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if numeric_header {
                serde_json::Value::from(i)
            } else {
                serde_json::Value::String(c.clone())
            }
        })
        .collect();

    let mut grid = Vec::with_capacity(table.num_rows() + 1);
    grid.push(header);
    grid.extend(
        table
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| c.to_json()).collect()),
    );
    grid
}

/// Reconciles a [`TableRegistry`] against the sheets that exist in one
/// spreadsheet: creates what is missing, clears what exists, and writes
/// everything.
pub struct Publisher<S: Sink> {
    sink: S,
    spreadsheet_id: String,
    options: PublishOptions,
}

impl<S: Sink> Publisher<S> {
    pub fn new(sink: S, spreadsheet_id: impl Into<String>, options: PublishOptions) -> Self {
        Self {
            sink,
            spreadsheet_id: spreadsheet_id.into(),
            options,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Publish every entry in registry order, stopping at the first failure.
    /// Sheets written before a failure stay written.
    #[instrument(
        level = "info",
        skip_all,
        fields(spreadsheet = %self.spreadsheet_id, sheets = registry.len())
    )]
    pub async fn publish(&mut self, registry: &TableRegistry) -> PublishReport {
        let mut report = PublishReport::default();

        let mut ledger: HashSet<String> = match self.sink.list_sheets(&self.spreadsheet_id).await {
            Ok(titles) => titles.into_iter().collect(),
            Err(e) => {
                error!(error = %format!("{:#}", e), "could not list existing sheets");
                report.failure = Some(format!("{:#}", e));
                report.outcomes = registry
                    .iter()
                    .map(|entry| SheetOutcome {
                        name: entry.name.clone(),
                        status: SheetStatus::Skipped,
                    })
                    .collect();
                return report;
            }
        };
        info!(existing = ledger.len(), "loaded existing sheets");

        for entry in registry {
            let status = if report.failure.is_some() {
                SheetStatus::Skipped
            } else {
                match self.publish_entry(entry, &mut ledger).await {
                    Ok(status) => {
                        info!(sheet = %entry.name, %status, "sheet exported");
                        status
                    }
                    Err(e) => {
                        let msg = format!("{:#}", e);
                        error!(sheet = %entry.name, error = %msg, "sheet export failed");
                        report.failure = Some(msg.clone());
                        SheetStatus::Failed(msg)
                    }
                }
            };
            report.outcomes.push(SheetOutcome {
                name: entry.name.clone(),
                status,
            });
        }

        info!(
            succeeded = report.succeeded(),
            created = report.created(),
            total = report.total(),
            "publish finished"
        );
        report
    }

    async fn publish_entry(
        &mut self,
        entry: &SheetEntry,
        ledger: &mut HashSet<String>,
    ) -> Result<SheetStatus> {
        let grid = to_grid(&entry.table);

        let status = if ledger.contains(&entry.name) {
            info!(sheet = %entry.name, "updating existing sheet");
            self.sink
                .clear_sheet(&self.spreadsheet_id, &entry.name)
                .await?;
            SheetStatus::Updated
        } else {
            info!(sheet = %entry.name, "creating new sheet");
            self.sink
                .create_sheet(&self.spreadsheet_id, &entry.name)
                .await?;
            ledger.insert(entry.name.clone());
            sleep(self.options.create_delay).await;
            SheetStatus::Created
        };

        self.sink
            .write_range(
                &self.spreadsheet_id,
                &entry.name,
                TOP_LEFT,
                &grid,
                ValueInputMode::Raw,
            )
            .await?;
        sleep(self.options.write_delay).await;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::{Call, MemorySink};
    use crate::table::Cell;
    use serde_json::json;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,finsheets::publish=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn table(item: &str, value: Cell) -> Table {
        Table::new(
            vec!["Item".into(), "2024".into()],
            vec![vec![item.into(), value]],
        )
        .unwrap()
    }

    fn registry(names: &[&str]) -> TableRegistry {
        let mut reg = TableRegistry::new();
        for (i, name) in names.iter().enumerate() {
            reg.insert(*name, table(name, Cell::Number(i as f64))).unwrap();
        }
        reg
    }

    fn publisher(sink: MemorySink) -> Publisher<MemorySink> {
        Publisher::new(sink, "sheet-id", PublishOptions::no_delay())
    }

    #[test]
    fn test_grid_replaces_missing_values() {
        let t = Table::new(
            vec!["Item".into(), "2024".into(), "2025".into()],
            vec![vec!["Cash".into(), Cell::Missing, Cell::from(f64::NAN)]],
        )
        .unwrap();
        let grid = to_grid(&t);
        assert_eq!(grid[0], vec![json!("Item"), json!("2024"), json!("2025")]);
        assert_eq!(grid[1], vec![json!("Cash"), json!(""), json!("")]);
        let text = serde_json::to_string(&grid).unwrap();
        for token in ["None", "null", "NaN"] {
            assert!(!text.contains(token), "grid contains {}", token);
        }
    }

    #[test]
    fn test_positional_headers_are_numbers() {
        let t = Table::positional(vec![
            vec!["PRICING TABLE".into()],
            vec!["Basic".into(), 100.into()],
        ]);
        let grid = to_grid(&t);
        assert_eq!(grid[0], vec![json!(0), json!(1)]);
        assert_eq!(grid[1], vec![json!("PRICING TABLE"), json!("")]);
    }

    #[tokio::test]
    async fn test_calls_follow_registry_order() {
        init_test_logging();
        let mut p = publisher(MemorySink::with_sheets(&["B"]));
        let report = p.publish(&registry(&["A", "B", "C"])).await;

        assert!(report.is_success());
        assert_eq!(
            p.sink().calls,
            vec![
                Call::List,
                Call::Create("A".into()),
                Call::Write {
                    range: "'A'!A1".into(),
                    mode: ValueInputMode::Raw
                },
                Call::Clear("B".into()),
                Call::Write {
                    range: "'B'!A1".into(),
                    mode: ValueInputMode::Raw
                },
                Call::Create("C".into()),
                Call::Write {
                    range: "'C'!A1".into(),
                    mode: ValueInputMode::Raw
                },
            ]
        );
        let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![SheetStatus::Created, SheetStatus::Updated, SheetStatus::Created]
        );
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.created(), 2);
    }

    #[tokio::test]
    async fn test_republish_creates_nothing() {
        init_test_logging();
        let reg = registry(&["Income Statement", "Balance Sheet", "Cash Flow"]);

        let mut p = publisher(MemorySink::default());
        assert!(p.publish(&reg).await.is_success());
        let first = p.into_sink();
        assert_eq!(first.creates().len(), 3);

        let mut second =
            MemorySink::with_sheets(&["Income Statement", "Balance Sheet", "Cash Flow"]);
        second.contents = first.contents.clone();
        let mut p = publisher(second);
        let report = p.publish(&reg).await;
        assert!(report.is_success());
        assert_eq!(report.created(), 0);

        let second = p.into_sink();
        assert!(second.creates().is_empty());
        assert_eq!(second.writes().len(), 3);
        assert_eq!(second.contents, first.contents);
    }

    #[tokio::test]
    async fn test_shrunk_table_leaves_no_stale_cells() {
        init_test_logging();
        let wide = Table::new(
            vec!["Item".into(), "2024".into(), "2025".into()],
            vec![
                vec!["Rent".into(), 1.0.into(), 2.0.into()],
                vec!["Wages".into(), 3.0.into(), 4.0.into()],
            ],
        )
        .unwrap();
        let narrow = table("Rent", Cell::Number(9.0));

        let mut reg = TableRegistry::new();
        reg.insert("Admin Expenses", wide).unwrap();
        let mut p = publisher(MemorySink::default());
        assert!(p.publish(&reg).await.is_success());

        let mut reg = TableRegistry::new();
        reg.insert("Admin Expenses", narrow.clone()).unwrap();
        let mut p = publisher(p.into_sink());
        assert!(p.publish(&reg).await.is_success());

        assert_eq!(p.sink().contents["Admin Expenses"], to_grid(&narrow));
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_sheets() {
        init_test_logging();
        let sink = MemorySink {
            fail_write_on: Some("B".into()),
            ..MemorySink::default()
        };
        let mut p = publisher(sink);
        let report = p.publish(&registry(&["A", "B", "C"])).await;

        assert!(!report.is_success());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].status, SheetStatus::Created);
        assert!(matches!(report.outcomes[1].status, SheetStatus::Failed(_)));
        assert_eq!(report.outcomes[2].status, SheetStatus::Skipped);

        let sink = p.into_sink();
        assert!(sink.contents.contains_key("A"));
        assert!(!sink.contents.contains_key("B"));
        assert!(!sink.creates().contains(&"C"));
        assert!(!sink.writes().contains(&"'C'!A1"));
    }

    #[tokio::test]
    async fn test_failed_create_skips_write() {
        let sink = MemorySink {
            fail_create_on: Some("A".into()),
            ..MemorySink::default()
        };
        let mut p = publisher(sink);
        let report = p.publish(&registry(&["A", "B"])).await;
        assert!(!report.is_success());
        assert_eq!(report.succeeded(), 0);
        assert!(p.sink().writes().is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_writes_nothing() {
        let sink = MemorySink {
            fail_list: true,
            ..MemorySink::default()
        };
        let mut p = publisher(sink);
        let report = p.publish(&registry(&["A", "B"])).await;
        assert!(!report.is_success());
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.status == SheetStatus::Skipped));
        assert_eq!(p.sink().calls, vec![Call::List]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_courtesy_delays() {
        let mut p = Publisher::new(
            MemorySink::with_sheets(&["B"]),
            "sheet-id",
            PublishOptions::default(),
        );
        let start = tokio::time::Instant::now();
        assert!(p.publish(&registry(&["A", "B"])).await.is_success());
        // create + write for A, write for B
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
