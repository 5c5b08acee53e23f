// src/services/runner.rs
use log::{error, warn};
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;

use super::barometers::{self, Symbols};
use super::market;
use super::storage::now_timestamp;
use super::yahoo::ChartSource;
use crate::models::{AssetClass, BarometerOutcome, MarketReport, RiskReport, SnapshotOutcome};

/// Scores every asset class in fixed order. Each class runs on its own task and is
/// awaited before the next starts; a panic becomes that class's error entry.
pub async fn build_risk_report<S>(source: Arc<S>, symbols: Symbols) -> RiskReport
where
    S: ChartSource + ?Sized + 'static,
{
    let symbols = Arc::new(symbols);
    let mut entries = Vec::with_capacity(AssetClass::ALL.len());

    for asset in AssetClass::ALL {
        let source = Arc::clone(&source);
        let symbols = Arc::clone(&symbols);
        let task = tokio::spawn(async move { barometers::evaluate(asset, &*source, &symbols).await });

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = join_failure(e);
                error!("{}: {}", asset.key(), message);
                BarometerOutcome::failed(message)
            }
        };
        entries.push((asset, outcome));
    }

    RiskReport {
        updated_at: now_timestamp(),
        barometers: entries,
    }
}

/// Snapshots each symbol in order; failures are recorded as `{"error": true}`.
pub async fn build_market_report<S>(source: Arc<S>, symbols: &[&str]) -> MarketReport
where
    S: ChartSource + ?Sized + 'static,
{
    let mut entries = Vec::with_capacity(symbols.len());

    for &symbol in symbols {
        let source = Arc::clone(&source);
        let owned = symbol.to_string();
        let task = tokio::spawn(async move { market::fetch_snapshot(&*source, &owned).await });

        let outcome = match task.await {
            Ok(Ok(snapshot)) => SnapshotOutcome::Quoted(snapshot),
            Ok(Err(e)) => {
                warn!("{}: {}", symbol, e);
                SnapshotOutcome::failed()
            }
            Err(e) => {
                error!("{}: {}", symbol, join_failure(e));
                SnapshotOutcome::failed()
            }
        };
        entries.push((symbol.to_string(), outcome));
    }

    MarketReport {
        updated_at: now_timestamp(),
        assets: entries,
    }
}

fn join_failure(e: JoinError) -> String {
    if e.is_panic() {
        format!("Evaluation panicked: {}", panic_message(e.into_panic()))
    } else {
        "Evaluation cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{flat, StubSource};
    use crate::services::yahoo::{Chart, FetchError, Interval, Range};
    use async_trait::async_trait;

    struct PanickingOn {
        symbol: &'static str,
        inner: StubSource,
    }

    #[async_trait]
    impl ChartSource for PanickingOn {
        async fn chart(&self, symbol: &str, range: Range, interval: Interval) -> Result<Chart, FetchError> {
            if symbol == self.symbol {
                panic!("feed exploded");
            }
            self.inner.chart(symbol, range, interval).await
        }
    }

    #[tokio::test]
    async fn test_risk_report_keeps_order_when_everything_fails() {
        let report = build_risk_report(Arc::new(StubSource::new()), Symbols::default()).await;

        let keys: Vec<&str> = report.barometers.iter().map(|(a, _)| a.key()).collect();
        assert_eq!(keys, ["gold", "sp500", "nasdaq", "bitcoin"]);
        assert_eq!(report.success_count(), 0);
        assert_eq!(
            report.barometers[1].1,
            BarometerOutcome::failed("Failed to fetch S&P 500 data: HTTP Error 404")
        );
    }

    #[tokio::test]
    async fn test_panic_is_isolated_to_one_class() {
        let source = PanickingOn {
            symbol: "^IXIC",
            inner: StubSource::new().with("GC=F", Range::OneYear, &flat(300, 2000.0)),
        };
        let report = build_risk_report(Arc::new(source), Symbols::default()).await;

        assert!(report.barometers[0].1.barometer().is_some());
        match &report.barometers[2].1 {
            BarometerOutcome::Failed { error } => assert_eq!(error, "Evaluation panicked: feed exploded"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(report.success_count(), 1);
    }

    #[tokio::test]
    async fn test_market_report_marks_failures() {
        let source = StubSource::new().with("GC=F", Range::FiveDays, &[2000.0, 2010.0]);
        let report = build_market_report(Arc::new(source), &["GC=F", "SI=F"]).await;

        assert_eq!(report.success_count(), 1);
        assert_eq!(report.assets[1], ("SI=F".to_string(), SnapshotOutcome::failed()));
    }
}
