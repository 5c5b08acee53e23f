// src/services/calculations.rs
use statrs::statistics::Statistics;

use crate::models::PriceSeries;

/// Arithmetic mean of the last `period` closes, or `None` when the series is too short.
pub fn moving_average(series: &PriceSeries, period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    mean(&series.tail_closes(period))
}

/// Plain sum over count, so thresholds see the textbook average.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Share of `population` strictly below `value`, scaled to 0-100.
/// Ties are not counted as below.
pub fn percentile_rank(value: f64, population: &[f64]) -> Option<f64> {
    if population.is_empty() {
        return None;
    }
    let below = population.iter().filter(|&&v| v < value).count();
    Some(below as f64 / population.len() as f64 * 100.0)
}

/// Sample standard deviation over mean, as a percentage.
pub fn relative_volatility(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    // constant input has no dispersion; skip the accumulated rounding
    if values.iter().all(|&v| v == values[0]) {
        return if values[0] == 0.0 { None } else { Some(0.0) };
    }

    let average = mean(values).filter(|m| *m != 0.0)?;
    Some(values.std_dev() / average * 100.0)
}

/// Percent move from `from` to `to`; `None` for a zero reference.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}

/// Positional sampling: indices 0, n, 2n, ...
pub fn every_nth(values: &[f64], n: usize) -> Vec<f64> {
    values.iter().step_by(n.max(1)).copied().collect()
}
