// src/services/signals.rs
//
// Shared plumbing for the per-asset signal evaluators.
//
// An evaluator returns `Result<Reading, SignalError>`. `settle` turns that into the
// `SignalResult` written to the report, so one failing signal only ever costs its own
// points.

use log::warn;
use thiserror::Error;

use super::calculations::{moving_average, pct_change, relative_volatility};
use super::yahoo::FetchError;
use crate::models::{PriceSeries, SignalResult};

/// Longest failure cause kept in a signal's detail string.
pub const DETAIL_CAUSE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub name: &'static str,
    /// Name reported when the signal could not be computed.
    pub fallback_name: &'static str,
    pub max_points: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub triggered: bool,
    pub detail: String,
}

impl Reading {
    pub fn new(triggered: bool, detail: impl Into<String>) -> Self {
        Self {
            triggered,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Insufficient(&'static str),

    #[error("division by zero reference")]
    ZeroReference,
}

pub fn settle(spec: &SignalSpec, outcome: Result<Reading, SignalError>) -> SignalResult {
    match outcome {
        Ok(reading) => SignalResult {
            name: spec.name.to_string(),
            triggered: reading.triggered,
            points: if reading.triggered { spec.max_points } else { 0 },
            max_points: spec.max_points,
            detail: reading.detail,
        },
        Err(e) => {
            warn!("Signal '{}' unavailable: {}", spec.name, e);
            SignalResult {
                name: spec.fallback_name.to_string(),
                triggered: false,
                points: 0,
                max_points: spec.max_points,
                detail: format!("Data unavailable: {}", truncate_chars(&e.to_string(), DETAIL_CAUSE_LIMIT)),
            }
        }
    }
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

pub fn max_points_total(specs: &[SignalSpec]) -> u32 {
    specs.iter().map(|s| s.max_points).sum()
}

// Building blocks shared by several asset classes.

pub fn latest(series: &PriceSeries) -> Result<f64, SignalError> {
    series.last_close().ok_or(SignalError::Insufficient("Empty price history"))
}

pub fn change(from: f64, to: f64) -> Result<f64, SignalError> {
    pct_change(from, to).ok_or(SignalError::ZeroReference)
}

/// Percent deviation of the latest close from its `period`-day moving average.
pub fn ma_deviation(series: &PriceSeries, period: usize, missing: &'static str) -> Result<f64, SignalError> {
    let current = latest(series)?;
    let ma = moving_average(series, period)
        .filter(|ma| *ma != 0.0)
        .ok_or(SignalError::Insufficient(missing))?;
    change(ma, current)
}

pub fn tail_volatility(series: &PriceSeries, window: usize) -> Result<f64, SignalError> {
    relative_volatility(&series.tail_closes(window)).ok_or(SignalError::Insufficient("Not enough variance data"))
}

/// Threshold check shared by the VIX level signals.
pub fn vix_level(vix: &PriceSeries, threshold: f64) -> Result<(bool, f64), SignalError> {
    let current = latest(vix)?;
    Ok((current > threshold, current))
}
