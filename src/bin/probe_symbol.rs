// Fetches one chart and prints what the parser made of it.
//
//   cargo run --bin probe_symbol -- ^VIX 3mo
use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

use market_barometer::config::AppConfig;
use market_barometer::services::market::snapshot_from_chart;
use market_barometer::services::yahoo::{ChartSource, Interval, Range, YahooClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "^GSPC".to_string());
    let range_token = args.next().unwrap_or_else(|| "1y".to_string());
    let range = Range::parse(&range_token).ok_or_else(|| anyhow!("unknown range {:?}", range_token))?;
    let interval = match range {
        Range::FiveDays => Interval::FifteenMinutes,
        _ => Interval::Daily,
    };

    let config = AppConfig::from_env()?;
    let client = YahooClient::new(&config.chart_url, config.timeout_secs).context("building HTTP client")?;

    info!("Probing {} ({} / {})", symbol, range.as_str(), interval.as_str());
    let chart = match client.chart(&symbol, range, interval).await {
        Ok(chart) => chart,
        Err(e) => {
            error!("ERROR: {}", e);
            return Err(e.into());
        }
    };

    info!("Meta: {:?}", chart.meta);
    info!("Snapshot view: {:?}", snapshot_from_chart(&chart));

    let series = chart.into_series()?;
    match (series.points().first(), series.points().last()) {
        (Some(first), Some(last)) => {
            info!("SUCCESS: {} closes", series.len());
            info!("First: {} @ {}", first.close, first.timestamp);
            info!("Last:  {} @ {}", last.close, last.timestamp);
        }
        _ => info!("Chart parsed but holds no closes"),
    }
    Ok(())
}
