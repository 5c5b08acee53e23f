// src/services/barometers/nasdaq.rs
//
// Same shape as the S&P barometer with higher-beta thresholds.
use crate::models::{Barometer, PriceSeries};
use crate::services::aggregator::{aggregate, Recommendations};
use crate::services::signals::{
    change, latest, ma_deviation, settle, tail_volatility, vix_level, Reading, SignalError, SignalSpec,
};
use crate::services::yahoo::{ChartSource, Range};

use super::Symbols;

pub const SIGNALS: [SignalSpec; 5] = [
    SignalSpec { name: "VIX Elevated", fallback_name: "VIX Level", max_points: 30 },
    SignalSpec { name: "MA Overextension", fallback_name: "MA Deviation", max_points: 25 },
    SignalSpec { name: "Rate Surge", fallback_name: "Rate Sensitivity", max_points: 20 },
    SignalSpec { name: "Momentum Reversal", fallback_name: "Momentum", max_points: 15 },
    SignalSpec { name: "Volatility Spike", fallback_name: "Volatility", max_points: 10 },
];

pub const RECOMMENDATIONS: Recommendations = Recommendations {
    low: "Normal conditions for growth/tech.",
    caution: "Elevated risk. Monitor rate-sensitive positions.",
    warning: "High risk. Consider rotating to defensive sectors.",
    danger: "Extreme risk for tech. Reduce exposure significantly.",
};

const VIX_TRIGGER: f64 = 25.0;
const MA_PERIOD: usize = 200;
const MA_TRIGGER_PCT: f64 = 12.0;
const YIELD_LOOKBACK: usize = 28;
const RATE_SURGE_BPS: f64 = 40.0;
const MOMENTUM_FAR: usize = 60;
const MOMENTUM_NEAR: usize = 30;
const PRIOR_RALLY_PCT: f64 = 5.0;
const RECENT_SLIDE_PCT: f64 = -2.0;
const VOL_WINDOW: usize = 20;
const VOL_TRIGGER_PCT: f64 = 2.5;

pub async fn evaluate<S: ChartSource + ?Sized>(source: &S, symbols: &Symbols, nasdaq: &PriceSeries) -> Barometer {
    let vix = source
        .history(&symbols.vix, Range::ThreeMonths)
        .await
        .map_err(SignalError::from)
        .and_then(|vix| vix_elevated(&vix));

    let overextension = ma_overextension(nasdaq);

    let rates = source
        .history(&symbols.ten_year_yield, Range::ThreeMonths)
        .await
        .map_err(SignalError::from)
        .and_then(|tnx| rate_surge(&tnx));

    let reversal = momentum_reversal(nasdaq);
    let volatility = volatility_spike(nasdaq);

    let signals = vec![
        settle(&SIGNALS[0], vix),
        settle(&SIGNALS[1], overextension),
        settle(&SIGNALS[2], rates),
        settle(&SIGNALS[3], reversal),
        settle(&SIGNALS[4], volatility),
    ];
    aggregate(signals, &RECOMMENDATIONS)
}

pub fn vix_elevated(vix: &PriceSeries) -> Result<Reading, SignalError> {
    let (triggered, current) = vix_level(vix, VIX_TRIGGER)?;
    Ok(Reading::new(triggered, format!("VIX at {:.1}", current)))
}

pub fn ma_overextension(nasdaq: &PriceSeries) -> Result<Reading, SignalError> {
    let deviation = ma_deviation(nasdaq, MA_PERIOD, "Insufficient history")?;
    Ok(Reading::new(
        deviation > MA_TRIGGER_PCT,
        format!("{:+.1}% vs 200-day MA", deviation),
    ))
}

/// Four-week 10Y move in bps; a short series compares the latest yield with itself.
pub fn rate_surge(tnx: &PriceSeries) -> Result<Reading, SignalError> {
    let current = latest(tnx)? / 10.0;
    let month_ago = tnx
        .close_back(YIELD_LOOKBACK)
        .map(|close| close / 10.0)
        .unwrap_or(current);
    let change_bps = (current - month_ago) * 100.0;

    Ok(Reading::new(
        change_bps > RATE_SURGE_BPS,
        format!("4-week yield change: {:+.0}bps", change_bps),
    ))
}

/// A rally from 60 to 30 days ago followed by a slide since.
pub fn momentum_reversal(nasdaq: &PriceSeries) -> Result<Reading, SignalError> {
    const INSUFFICIENT: SignalError = SignalError::Insufficient("Insufficient history");
    if nasdaq.len() < MOMENTUM_FAR {
        return Err(INSUFFICIENT);
    }
    let current = latest(nasdaq)?;
    let far = nasdaq.close_back(MOMENTUM_FAR).ok_or(INSUFFICIENT)?;
    let near = nasdaq.close_back(MOMENTUM_NEAR).ok_or(INSUFFICIENT)?;

    let prior = change(far, near)?;
    let recent = change(near, current)?;

    Ok(Reading::new(
        prior > PRIOR_RALLY_PCT && recent < RECENT_SLIDE_PCT,
        format!("60d: {:+.1}%, 30d: {:+.1}%", prior, recent),
    ))
}

pub fn volatility_spike(nasdaq: &PriceSeries) -> Result<Reading, SignalError> {
    let volatility = tail_volatility(nasdaq, VOL_WINDOW)?;
    Ok(Reading::new(
        volatility > VOL_TRIGGER_PCT,
        format!("20-day vol: {:.2}%", volatility),
    ))
}
