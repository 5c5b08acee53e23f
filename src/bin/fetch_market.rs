use anyhow::Result;
use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;

use market_barometer::config::AppConfig;
use market_barometer::services::market::MARKET_SYMBOLS;
use market_barometer::services::runner::build_market_report;
use market_barometer::services::storage::{Layout, ReportWriter, MARKET_REPORT_FILE};
use market_barometer::services::summary::market_table;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Fetching market snapshots for {} symbols...", MARKET_SYMBOLS.len());

    let config = AppConfig::from_env()?;
    let source = config.chart_source()?;
    let writer = ReportWriter::new(&config.data_dir).await?;

    let report = tokio::select! {
        report = build_market_report(source, &MARKET_SYMBOLS) => report,
        Ok(()) = tokio::signal::ctrl_c() => {
            error!("Interrupted, no report written");
            return Ok(ExitCode::FAILURE);
        }
    };

    writer.save(MARKET_REPORT_FILE, &report, Layout::Compact).await?;
    println!("\n(Updated at {})\n{}", report.updated_at, market_table(&report));

    info!("Done: {}/{} symbols", report.success_count(), MARKET_SYMBOLS.len());
    if report.success_count() == 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
