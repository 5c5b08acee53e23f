// src/services/barometers/sp500.rs
use crate::models::{Barometer, PriceSeries};
use crate::services::aggregator::{aggregate, Recommendations};
use crate::services::signals::{
    change, latest, ma_deviation, settle, vix_level, Reading, SignalError, SignalSpec,
};
use crate::services::yahoo::{ChartSource, Range};

use super::Symbols;

pub const SIGNALS: [SignalSpec; 5] = [
    SignalSpec { name: "VIX Elevated", fallback_name: "VIX Level", max_points: 30 },
    SignalSpec { name: "Yield Curve", fallback_name: "Yield Curve", max_points: 25 },
    SignalSpec { name: "MA Overextension", fallback_name: "MA Deviation", max_points: 20 },
    SignalSpec { name: "Hedging Surge", fallback_name: "Put/Call Ratio", max_points: 15 },
    SignalSpec { name: "Market Breadth", fallback_name: "Market Breadth", max_points: 10 },
];

pub const RECOMMENDATIONS: Recommendations = Recommendations {
    low: "Normal market conditions. Continue systematic strategies.",
    caution: "Elevated risk. Consider tightening stops.",
    warning: "High risk environment. Reduce equity exposure.",
    danger: "Extreme risk. Consider significant hedging.",
};

const VIX_TRIGGER: f64 = 25.0;
const FLAT_CURVE_SPREAD: f64 = 0.2;
const MA_PERIOD: usize = 200;
const MA_TRIGGER_PCT: f64 = 8.0;
const VIX_LOOKBACK: usize = 7;
const VIX_SURGE_PCT: f64 = 30.0;
const BREADTH_LOOKBACK: usize = 30;
const BREADTH_TRIGGER_PCT: f64 = -3.0;

pub async fn evaluate<S: ChartSource + ?Sized>(source: &S, symbols: &Symbols, sp: &PriceSeries) -> Barometer {
    let vix = source
        .history(&symbols.vix, Range::ThreeMonths)
        .await
        .map_err(SignalError::from)
        .and_then(|vix| vix_elevated(&vix));

    let curve = yield_curve_outcome(source, symbols).await;

    let overextension = ma_overextension(sp);

    let hedging = source
        .history(&symbols.vix, Range::OneMonth)
        .await
        .map_err(SignalError::from)
        .and_then(|vix| hedging_surge(&vix));

    let breadth = source
        .history(&symbols.nasdaq, Range::OneMonth)
        .await
        .map_err(SignalError::from)
        .and_then(|nasdaq| market_breadth(sp, &nasdaq));

    let signals = vec![
        settle(&SIGNALS[0], vix),
        settle(&SIGNALS[1], curve),
        settle(&SIGNALS[2], overextension),
        settle(&SIGNALS[3], hedging),
        settle(&SIGNALS[4], breadth),
    ];
    aggregate(signals, &RECOMMENDATIONS)
}

async fn yield_curve_outcome<S: ChartSource + ?Sized>(source: &S, symbols: &Symbols) -> Result<Reading, SignalError> {
    let tnx = source.history(&symbols.ten_year_yield, Range::OneMonth).await?;
    let irx = source.history(&symbols.thirteen_week_yield, Range::OneMonth).await?;
    yield_curve(&tnx, &irx)
}

pub fn vix_elevated(vix: &PriceSeries) -> Result<Reading, SignalError> {
    let (triggered, current) = vix_level(vix, VIX_TRIGGER)?;
    Ok(Reading::new(triggered, format!("VIX at {:.1} (threshold: 25)", current)))
}

/// 10Y minus 13-week bill. Both tickers quote ten times the yield.
pub fn yield_curve(tnx: &PriceSeries, irx: &PriceSeries) -> Result<Reading, SignalError> {
    let long = latest(tnx)? / 10.0;
    let short = latest(irx)? / 10.0;
    let spread = long - short;

    Ok(Reading::new(
        spread < FLAT_CURVE_SPREAD,
        format!("10Y-2Y spread: {:.2}% {}", spread, if spread < 0.0 { "(inverted)" } else { "" }),
    ))
}

pub fn ma_overextension(sp: &PriceSeries) -> Result<Reading, SignalError> {
    let deviation = ma_deviation(sp, MA_PERIOD, "Insufficient history")?;
    Ok(Reading::new(
        deviation > MA_TRIGGER_PCT,
        format!("{:+.1}% vs 200-day MA", deviation),
    ))
}

/// A one-week VIX jump stands in for panic put buying.
pub fn hedging_surge(vix: &PriceSeries) -> Result<Reading, SignalError> {
    let current = latest(vix)?;
    let week_ago = vix.close_back(VIX_LOOKBACK).unwrap_or(current);
    let change_pct = change(week_ago, current)?;

    Ok(Reading::new(
        change_pct > VIX_SURGE_PCT,
        format!("VIX 1-week change: {:+.1}%", change_pct),
    ))
}

/// Nasdaq lagging the S&P over a month signals narrowing leadership.
pub fn market_breadth(sp: &PriceSeries, nasdaq: &PriceSeries) -> Result<Reading, SignalError> {
    let nasdaq_first = nasdaq
        .first_close()
        .ok_or(SignalError::Insufficient("Empty Nasdaq history"))?;
    let nasdaq_change = change(nasdaq_first, latest(nasdaq)?)?;

    let sp_change = match sp.close_back(BREADTH_LOOKBACK) {
        Some(month_ago) => change(month_ago, latest(sp)?)?,
        None => 0.0,
    };

    let divergence = nasdaq_change - sp_change;
    Ok(Reading::new(
        divergence < BREADTH_TRIGGER_PCT,
        format!("NDX-SPX divergence: {:+.1}%", divergence),
    ))
}
