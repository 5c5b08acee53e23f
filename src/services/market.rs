// src/services/market.rs
use log::info;

use super::yahoo::{Chart, ChartSource, FetchError, Interval, Range};
use crate::models::AssetSnapshot;

/// Instruments in `data/market.json`, in output order.
pub const MARKET_SYMBOLS: [&str; 9] = [
    "GC=F",     // Gold
    "SI=F",     // Silver
    "CL=F",     // Crude Oil
    "^GSPC",    // S&P 500
    "^IXIC",    // Nasdaq
    "^DJI",     // Dow Jones
    "BTC-USD",  // Bitcoin
    "ETH-USD",  // Ethereum
    "DX-Y.NYB", // USD Index
];

const SPARK_POINTS: usize = 48;

pub async fn fetch_snapshot<S: ChartSource + ?Sized>(source: &S, symbol: &str) -> Result<AssetSnapshot, FetchError> {
    let chart = source.chart(symbol, Range::FiveDays, Interval::FifteenMinutes).await?;
    let snapshot = snapshot_from_chart(&chart);
    info!("{}: {} ({:+.2}%)", symbol, price_label(snapshot.price), snapshot.daily_change_pct);
    Ok(snapshot)
}

/// `$2040.5` for progress lines, `-` when no price is known.
pub fn price_label(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${}", p),
        None => "-".to_string(),
    }
}

/// Zero counts as missing for price and previous close, as the dashboard expects.
pub fn snapshot_from_chart(chart: &Chart) -> AssetSnapshot {
    let closes = chart.present_closes();
    let meta = &chart.meta;

    let price = nonzero(meta.regular_market_price).or_else(|| closes.last().copied());
    let prev_close = nonzero(meta.chart_previous_close).or(meta.previous_close);

    let daily_change = match (nonzero(price), nonzero(prev_close)) {
        (Some(p), Some(prev)) => p - prev,
        _ => 0.0,
    };
    let daily_change_pct = match nonzero(prev_close) {
        Some(prev) => daily_change / prev * 100.0,
        None => 0.0,
    };

    let first_close = if closes.is_empty() { prev_close } else { closes.first().copied() };
    let week_change = match (nonzero(price), nonzero(first_close)) {
        (Some(p), Some(first)) => p - first,
        _ => 0.0,
    };
    let week_change_pct = match nonzero(first_close) {
        Some(first) => week_change / first * 100.0,
        None => 0.0,
    };

    let spark_start = closes.len().saturating_sub(SPARK_POINTS);
    let high = closes.iter().copied().reduce(f64::max);
    let low = closes.iter().copied().reduce(f64::min);

    AssetSnapshot {
        price: nonzero(price).map(|p| round_to(p, 4)),
        prev_close: nonzero(prev_close).map(|p| round_to(p, 4)),
        daily_change: round_to(daily_change, 4),
        daily_change_pct: round_to(daily_change_pct, 2),
        week_change_pct: round_to(week_change_pct, 2),
        spark_data: closes[spark_start..].iter().map(|c| round_to(*c, 2)).collect(),
        high: high.map(|h| round_to(h, 4)),
        low: low.map(|l| round_to(l, 4)),
        market_state: meta.market_state.clone().unwrap_or_else(|| "CLOSED".to_string()),
        volume: meta.regular_market_volume.unwrap_or(0),
        currency: meta.currency.clone().unwrap_or_else(|| "USD".to_string()),
    }
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
