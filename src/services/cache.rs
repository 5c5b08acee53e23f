// src/services/cache.rs
use async_trait::async_trait;
use log::info;
use std::collections::HashMap;
use std::sync::Mutex;

use super::yahoo::{Chart, ChartSource, FetchError, Interval, Range};

type ChartKey = (String, Range, Interval);

/// Run-scoped memo over a `ChartSource`. Only successful charts are kept, so a
/// failed request is tried again the next time a signal asks for it.
pub struct MemoizedSource<S> {
    inner: S,
    charts: Mutex<HashMap<ChartKey, Chart>>,
}

impl<S: ChartSource> MemoizedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            charts: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.charts.lock().map(|charts| charts.len()).unwrap_or(0)
    }

    fn lookup(&self, key: &ChartKey) -> Option<Chart> {
        self.charts.lock().ok().and_then(|charts| charts.get(key).cloned())
    }

    fn remember(&self, key: ChartKey, chart: &Chart) {
        if let Ok(mut charts) = self.charts.lock() {
            charts.insert(key, chart.clone());
        }
    }
}

#[async_trait]
impl<S: ChartSource> ChartSource for MemoizedSource<S> {
    async fn chart(&self, symbol: &str, range: Range, interval: Interval) -> Result<Chart, FetchError> {
        let key = (symbol.to_string(), range, interval);
        if let Some(chart) = self.lookup(&key) {
            info!("Reusing {} {} chart from this run", symbol, range.as_str());
            return Ok(chart);
        }

        let chart = self.inner.chart(symbol, range, interval).await?;
        self.remember(key, &chart);
        Ok(chart)
    }
}
