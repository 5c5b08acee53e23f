// src/main.rs
use anyhow::Result;
use env_logger::Env;
use log::{error, info, warn};
use std::process::ExitCode;

use market_barometer::config::AppConfig;
use market_barometer::services::barometers::Symbols;
use market_barometer::services::runner::build_risk_report;
use market_barometer::services::storage::{Layout, ReportWriter, RISK_REPORT_FILE};
use market_barometer::services::summary::risk_table;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting crash-risk barometer run...");

    let config = AppConfig::from_env()?;
    let source = config.chart_source()?;
    let writer = ReportWriter::new(&config.data_dir).await?;

    let report = tokio::select! {
        report = build_risk_report(source, Symbols::default()) => report,
        Ok(()) = tokio::signal::ctrl_c() => {
            error!("Interrupted, no report written");
            return Ok(ExitCode::FAILURE);
        }
    };

    writer.save(RISK_REPORT_FILE, &report, Layout::Pretty).await?;
    println!("\n(Updated at {})\n{}", report.updated_at, risk_table(&report));

    let succeeded = report.success_count();
    if succeeded == 0 {
        error!("No barometer could be computed");
        return Ok(ExitCode::FAILURE);
    }
    if succeeded < report.barometers.len() {
        warn!("{}/{} barometers computed", succeeded, report.barometers.len());
    }
    Ok(ExitCode::SUCCESS)
}
