// src/services/barometers/bitcoin.rs
use crate::models::{Barometer, PriceSeries};
use crate::services::aggregator::{aggregate, Recommendations};
use crate::services::signals::{
    change, latest, ma_deviation, settle, tail_volatility, Reading, SignalError, SignalSpec,
};
use crate::services::yahoo::{ChartSource, Range};

use super::Symbols;

pub const SIGNALS: [SignalSpec; 5] = [
    SignalSpec { name: "MA Overextension", fallback_name: "MA Deviation", max_points: 30 },
    SignalSpec { name: "Volatility Extreme", fallback_name: "Volatility", max_points: 25 },
    SignalSpec { name: "Momentum Exhaustion", fallback_name: "Momentum", max_points: 20 },
    SignalSpec { name: "Risk-Off Correlation", fallback_name: "Correlation", max_points: 15 },
    SignalSpec { name: "Drawdown from ATH", fallback_name: "Drawdown", max_points: 10 },
];

pub const RECOMMENDATIONS: Recommendations = Recommendations {
    low: "Normal crypto conditions. Maintain positions.",
    caution: "Elevated risk. Consider taking profits on leveraged positions.",
    warning: "High risk. Reduce exposure, avoid leverage.",
    danger: "Extreme risk. Significant correction likely.",
};

const MA_PERIOD: usize = 200;
const MA_TRIGGER_PCT: f64 = 25.0;
const VOL_WINDOW: usize = 30;
const VOL_TRIGGER_PCT: f64 = 8.0;
const MOMENTUM_START: usize = 90;
const MOMENTUM_PIVOT: usize = 30;
const STRONG_RUN_PCT: f64 = 30.0;
const STALLED_RUN_PCT: f64 = 10.0;
const CORRELATION_WINDOW: usize = 60;
const RISK_OFF_PCT: f64 = -10.0;
const DRAWDOWN_TRIGGER_PCT: f64 = -30.0;

pub async fn evaluate<S: ChartSource + ?Sized>(source: &S, symbols: &Symbols, btc: &PriceSeries) -> Barometer {
    let overextension = ma_overextension(btc);
    let volatility = volatility_extreme(btc);
    let exhaustion = momentum_exhaustion(btc);

    let correlation = source
        .history(&symbols.nasdaq, Range::ThreeMonths)
        .await
        .map_err(SignalError::from)
        .and_then(|nasdaq| risk_off_correlation(btc, &nasdaq));

    let drawdown = drawdown_from_ath(btc);

    let signals = vec![
        settle(&SIGNALS[0], overextension),
        settle(&SIGNALS[1], volatility),
        settle(&SIGNALS[2], exhaustion),
        settle(&SIGNALS[3], correlation),
        settle(&SIGNALS[4], drawdown),
    ];
    aggregate(signals, &RECOMMENDATIONS)
}

pub fn ma_overextension(btc: &PriceSeries) -> Result<Reading, SignalError> {
    let deviation = ma_deviation(btc, MA_PERIOD, "Insufficient history")?;
    Ok(Reading::new(
        deviation > MA_TRIGGER_PCT,
        format!("{:+.1}% vs 200-day MA", deviation),
    ))
}

pub fn volatility_extreme(btc: &PriceSeries) -> Result<Reading, SignalError> {
    let volatility = tail_volatility(btc, VOL_WINDOW)?;
    Ok(Reading::new(
        volatility > VOL_TRIGGER_PCT,
        format!("30-day volatility: {:.2}%", volatility),
    ))
}

/// Strong gain from 90 to 30 days ago that has stalled over the last 30.
pub fn momentum_exhaustion(btc: &PriceSeries) -> Result<Reading, SignalError> {
    const INSUFFICIENT: SignalError = SignalError::Insufficient("Insufficient history");
    if btc.len() < MOMENTUM_START {
        return Err(INSUFFICIENT);
    }
    let current = latest(btc)?;
    let start = btc.close_back(MOMENTUM_START).ok_or(INSUFFICIENT)?;
    let pivot = btc.close_back(MOMENTUM_PIVOT).ok_or(INSUFFICIENT)?;

    let first_leg = change(start, pivot)?;
    let last_leg = change(pivot, current)?;

    Ok(Reading::new(
        first_leg > STRONG_RUN_PCT && last_leg < STALLED_RUN_PCT,
        format!("60d gain: {:+.1}%, 30d: {:+.1}%", first_leg, last_leg),
    ))
}

/// Bitcoin and Nasdaq both down more than 10% over their last 60 closes.
pub fn risk_off_correlation(btc: &PriceSeries, nasdaq: &PriceSeries) -> Result<Reading, SignalError> {
    let btc_recent = btc.tail_closes(CORRELATION_WINDOW);
    let nasdaq_recent = nasdaq.tail_closes(CORRELATION_WINDOW);
    if btc_recent.len() < CORRELATION_WINDOW || nasdaq_recent.len() < CORRELATION_WINDOW {
        return Err(SignalError::Insufficient("Insufficient data"));
    }

    let btc_change = window_change(&btc_recent)?;
    let nasdaq_change = window_change(&nasdaq_recent)?;

    Ok(Reading::new(
        btc_change < RISK_OFF_PCT && nasdaq_change < RISK_OFF_PCT,
        format!("BTC: {:+.1}%, NDX: {:+.1}%", btc_change, nasdaq_change),
    ))
}

fn window_change(closes: &[f64]) -> Result<f64, SignalError> {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) => change(first, last),
        _ => Err(SignalError::Insufficient("Insufficient data")),
    }
}

pub fn drawdown_from_ath(btc: &PriceSeries) -> Result<Reading, SignalError> {
    let current = latest(btc)?;
    let all_time_high = btc.max_close().ok_or(SignalError::Insufficient("Empty price history"))?;
    let drawdown = change(all_time_high, current)?;

    Ok(Reading::new(
        drawdown < DRAWDOWN_TRIGGER_PCT,
        format!("{:.1}% from all-time high", drawdown),
    ))
}
