// src/services/barometers/gold.rs
use crate::models::{Barometer, PriceSeries};
use crate::services::aggregator::{aggregate, Recommendations};
use crate::services::calculations::{every_nth, moving_average, percentile_rank};
use crate::services::signals::{
    change, latest, ma_deviation, settle, tail_volatility, Reading, SignalError, SignalSpec,
};
use crate::services::yahoo::{ChartSource, Range};

use super::Symbols;

pub const SIGNALS: [SignalSpec; 5] = [
    SignalSpec { name: "COT Positioning (Proxy)", fallback_name: "COT Positioning", max_points: 30 },
    SignalSpec { name: "Real Yields Surge", fallback_name: "Real Yields", max_points: 25 },
    SignalSpec { name: "MA Overextension", fallback_name: "MA Deviation", max_points: 15 },
    SignalSpec { name: "DXY Breakout", fallback_name: "DXY Breakout", max_points: 15 },
    SignalSpec { name: "Volatility Extreme", fallback_name: "Sentiment", max_points: 15 },
];

pub const RECOMMENDATIONS: Recommendations = Recommendations {
    low: "Normal conditions. Maintain trend-following positions.",
    caution: "Elevated risk. Monitor closely, prepare hedges.",
    warning: "High risk. Consider reducing exposure by 25-50%.",
    danger: "Extreme risk. Hedge aggressively or reduce to 25% position.",
};

const PERCENTILE_TRIGGER: f64 = 85.0;
// every 7th daily close, regardless of weekday
const WEEKLY_STRIDE: usize = 7;

const YIELD_LOOKBACK: usize = 28;
const YIELD_SURGE_BPS: f64 = 50.0;

const MA_PERIOD: usize = 50;
const MA_TRIGGER_PCT: f64 = 10.0;

const DXY_MA_PERIOD: usize = 200;
const DXY_LOOKBACK: usize = 7;

const VOL_WINDOW: usize = 20;
const VOL_TRIGGER_PCT: f64 = 3.0;

pub async fn evaluate<S: ChartSource + ?Sized>(source: &S, symbols: &Symbols, gold: &PriceSeries) -> Barometer {
    let cot = source
        .history(&symbols.gold, Range::FiveYears)
        .await
        .map_err(SignalError::from)
        .and_then(|five_year| cot_proxy(gold, &five_year));

    let yields = source
        .history(&symbols.ten_year_yield, Range::ThreeMonths)
        .await
        .map_err(SignalError::from)
        .and_then(|tnx| real_yields(&tnx));

    let overextension = ma_overextension(gold);

    let dxy = source
        .history(&symbols.dollar_index, Range::OneYear)
        .await
        .map_err(SignalError::from)
        .and_then(|dxy| dxy_breakout(&dxy));

    let volatility = volatility_extreme(gold);

    let signals = vec![
        settle(&SIGNALS[0], cot),
        settle(&SIGNALS[1], yields),
        settle(&SIGNALS[2], overextension),
        settle(&SIGNALS[3], dxy),
        settle(&SIGNALS[4], volatility),
    ];
    aggregate(signals, &RECOMMENDATIONS)
}

/// Positioning proxy: where today's price sits among five years of weekly samples.
pub fn cot_proxy(gold: &PriceSeries, five_year: &PriceSeries) -> Result<Reading, SignalError> {
    let current = latest(gold)?;
    let weekly = every_nth(&five_year.closes(), WEEKLY_STRIDE);

    match percentile_rank(current, &weekly) {
        Some(pct) if pct != 0.0 => Ok(Reading::new(
            pct > PERCENTILE_TRIGGER,
            format!("Price at {:.0}th percentile (5yr)", pct),
        )),
        _ => Ok(Reading::new(false, "Unavailable")),
    }
}

/// 10Y yield move over four weeks, in basis points. `^TNX` quotes ten times the yield.
pub fn real_yields(tnx: &PriceSeries) -> Result<Reading, SignalError> {
    const INSUFFICIENT: SignalError = SignalError::Insufficient("Insufficient yield data");
    if tnx.len() < YIELD_LOOKBACK {
        return Err(INSUFFICIENT);
    }
    let current = tnx.close_back(1).ok_or(INSUFFICIENT)? / 10.0;
    let month_ago = tnx.close_back(YIELD_LOOKBACK).ok_or(INSUFFICIENT)? / 10.0;
    let change_bps = (current - month_ago) * 100.0;

    Ok(Reading::new(
        change_bps > YIELD_SURGE_BPS,
        format!("4-week change: {:+.0}bps (current: {:.2}%)", change_bps, current),
    ))
}

pub fn ma_overextension(gold: &PriceSeries) -> Result<Reading, SignalError> {
    let deviation = ma_deviation(gold, MA_PERIOD, "Insufficient history for MA")?;
    Ok(Reading::new(
        deviation > MA_TRIGGER_PCT,
        format!("{:+.1}% above 50-day MA", deviation),
    ))
}

/// Dollar strength: above its 200-day MA and higher than a week ago.
pub fn dxy_breakout(dxy: &PriceSeries) -> Result<Reading, SignalError> {
    let current = latest(dxy)?;
    let ma = moving_average(dxy, DXY_MA_PERIOD)
        .filter(|ma| *ma != 0.0)
        .ok_or(SignalError::Insufficient("Insufficient DXY history"))?;

    let week_ago = dxy.close_back(DXY_LOOKBACK).unwrap_or(current);
    let rising = current > week_ago;
    let above_ma = current > ma;
    let ma_diff = change(ma, current)?;

    Ok(Reading::new(
        above_ma && rising,
        format!("{:+.1}% vs 200-MA, {}", ma_diff, if rising { "rising" } else { "falling" }),
    ))
}

/// Price volatility standing in for sentiment extremes.
pub fn volatility_extreme(gold: &PriceSeries) -> Result<Reading, SignalError> {
    if gold.len() < VOL_WINDOW {
        return Err(SignalError::Insufficient("Insufficient data"));
    }
    let volatility = tail_volatility(gold, VOL_WINDOW)?;
    Ok(Reading::new(
        volatility > VOL_TRIGGER_PCT,
        format!("20-day volatility: {:.2}%", volatility),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::services::testing::{flat, series, StubSource};

    fn spiked_gold() -> Vec<f64> {
        let mut closes = flat(299, 2000.0);
        closes.push(2300.0);
        closes
    }

    #[test]
    fn test_final_day_spike_triggers_ma_overextension() {
        let reading = ma_overextension(&series(&spiked_gold())).unwrap();
        assert!(reading.triggered);
        assert_eq!(reading.detail, "+14.7% above 50-day MA");

        let result = settle(&SIGNALS[2], Ok(reading));
        assert_eq!(result.points, 15);
    }

    #[test]
    fn test_ma_overextension_needs_50_days() {
        let err = ma_overextension(&series(&flat(49, 2000.0))).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient history for MA");
    }

    #[test]
    fn test_cot_proxy_percentile() {
        let five_year: Vec<f64> = (0..700).map(|i| 1000.0 + i as f64).collect();
        // weekly samples are 1000, 1007, ..., 1693 (100 values)
        let high = cot_proxy(&series(&[1690.0]), &series(&five_year)).unwrap();
        assert!(high.triggered);
        assert_eq!(high.detail, "Price at 99th percentile (5yr)");

        let mid = cot_proxy(&series(&[1350.0]), &series(&five_year)).unwrap();
        assert!(!mid.triggered);
        assert_eq!(mid.detail, "Price at 50th percentile (5yr)");
    }

    #[test]
    fn test_cot_proxy_at_minimum_is_unavailable() {
        let reading = cot_proxy(&series(&[900.0]), &series(&flat(100, 1000.0))).unwrap();
        assert!(!reading.triggered);
        assert_eq!(reading.detail, "Unavailable");
    }

    #[test]
    fn test_real_yields_surge() {
        let mut tnx = flat(40, 40.0);
        tnx.push(46.0);
        let reading = real_yields(&series(&tnx)).unwrap();
        assert!(reading.triggered);
        assert_eq!(reading.detail, "4-week change: +60bps (current: 4.60%)");

        let err = real_yields(&series(&flat(27, 40.0))).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient yield data");
    }

    #[test]
    fn test_dxy_breakout_requires_rising_above_ma() {
        let mut rising = flat(210, 100.0);
        rising.extend([101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0]);
        let reading = dxy_breakout(&series(&rising)).unwrap();
        assert!(reading.triggered);
        assert!(reading.detail.ends_with("rising"));

        let mut fading = flat(210, 100.0);
        fading.extend([107.0, 106.0, 105.0, 104.0, 103.0, 102.0, 101.0]);
        let reading = dxy_breakout(&series(&fading)).unwrap();
        assert!(!reading.triggered);
        assert!(reading.detail.ends_with("falling"));

        let err = dxy_breakout(&series(&flat(150, 100.0))).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient DXY history");
    }

    #[test]
    fn test_volatility_extreme() {
        let calm = volatility_extreme(&series(&flat(30, 2000.0))).unwrap();
        assert!(!calm.triggered);
        assert_eq!(calm.detail, "20-day volatility: 0.00%");

        let choppy: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1900.0 } else { 2100.0 }).collect();
        assert!(volatility_extreme(&series(&choppy)).unwrap().triggered);

        assert!(volatility_extreme(&series(&flat(19, 2000.0))).is_err());
    }

    #[tokio::test]
    async fn test_evaluate_degrades_missing_auxiliary_series() {
        let symbols = Symbols::default();
        let gold = series(&spiked_gold());
        // only the 5y series is served; TNX and DXY answer 404
        let source = StubSource::new().with("GC=F", Range::FiveYears, &flat(1200, 1800.0));

        let barometer = evaluate(&source, &symbols, &gold).await;

        assert_eq!(barometer.signals.len(), 5);
        assert_eq!(barometer.signals[1].name, "Real Yields");
        assert_eq!(barometer.signals[1].detail, "Data unavailable: HTTP Error 404");
        assert_eq!(barometer.signals[3].name, "DXY Breakout");
        assert!(!barometer.signals[3].triggered);
        // percentile 100 (30) + MA spike (15) + spike volatility (15)
        assert_eq!(barometer.score, 60);
        assert_eq!(barometer.level, RiskLevel::Warning);
        assert_eq!(barometer.recommendation, RECOMMENDATIONS.warning);
    }
}
