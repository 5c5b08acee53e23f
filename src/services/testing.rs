// src/services/testing.rs
//
// In-memory chart source for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;

use super::yahoo::{Chart, ChartSource, FetchError, Interval, Range};
use crate::models::{PricePoint, PriceSeries};

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: 1_700_000_000 + i as i64 * 86_400,
                close,
            })
            .collect(),
    )
}

pub fn flat(len: usize, price: f64) -> Vec<f64> {
    vec![price; len]
}

/// Closes rising by a fixed percentage each day.
pub fn compounding(len: usize, start: f64, daily_pct: f64) -> Vec<f64> {
    (0..len)
        .map(|i| start * (1.0 + daily_pct / 100.0).powi(i as i32))
        .collect()
}

pub fn chart_of(closes: &[f64]) -> Chart {
    Chart {
        timestamps: Some((0..closes.len() as i64).map(|i| 1_700_000_000 + i * 86_400).collect()),
        closes: closes.iter().copied().map(Some).collect(),
        ..Chart::default()
    }
}

/// Serves registered charts; anything unregistered answers with HTTP 404.
#[derive(Default)]
pub struct StubSource {
    charts: HashMap<(String, Range), Chart>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, range: Range, closes: &[f64]) -> Self {
        self.charts.insert((symbol.to_string(), range), chart_of(closes));
        self
    }

    pub fn with_chart(mut self, symbol: &str, range: Range, chart: Chart) -> Self {
        self.charts.insert((symbol.to_string(), range), chart);
        self
    }
}

#[async_trait]
impl ChartSource for StubSource {
    async fn chart(&self, symbol: &str, range: Range, _interval: Interval) -> Result<Chart, FetchError> {
        self.charts
            .get(&(symbol.to_string(), range))
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}
