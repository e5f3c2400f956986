use finsheets::{config::ExportConfig, export, publish::SheetStatus};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = match ExportConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("configuration: {:#}", e);
            return ExitCode::from(1);
        }
    };

    // ─── 3) assemble + publish ───────────────────────────────────────
    match export::run(&cfg).await {
        Ok(report) => {
            for outcome in &report.outcomes {
                match &outcome.status {
                    SheetStatus::Created | SheetStatus::Updated => {
                        info!(sheet = %outcome.name, status = %outcome.status, "exported")
                    }
                    _ => warn!(sheet = %outcome.name, status = %outcome.status, "not exported"),
                }
            }
            info!(
                sheets = report.succeeded(),
                created = report.created(),
                "all done: https://docs.google.com/spreadsheets/d/{}",
                cfg.spreadsheet_id
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("export failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
