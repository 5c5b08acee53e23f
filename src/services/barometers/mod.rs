// src/services/barometers/mod.rs
//
// Crash-risk barometers, one module per asset class.
//
// Each module bundles its signal table, thresholds and recommendations with pure
// evaluator functions; `evaluate` fetches the series they need, in order, one request
// at a time.

pub mod bitcoin;
pub mod gold;
pub mod nasdaq;
pub mod sp500;

use log::{error, info};

use super::aggregator::Recommendations;
use super::signals::SignalSpec;
use super::yahoo::{ChartSource, Range};
use crate::models::{AssetClass, BarometerOutcome, PriceSeries};

/// Tickers the barometers read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbols {
    pub gold: String,
    pub dollar_index: String,
    pub ten_year_yield: String,
    pub thirteen_week_yield: String,
    pub vix: String,
    pub sp500: String,
    pub nasdaq: String,
    pub bitcoin: String,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            gold: "GC=F".to_string(),
            dollar_index: "DX-Y.NYB".to_string(),
            ten_year_yield: "^TNX".to_string(),
            thirteen_week_yield: "^IRX".to_string(),
            vix: "^VIX".to_string(),
            sp500: "^GSPC".to_string(),
            nasdaq: "^IXIC".to_string(),
            bitcoin: "BTC-USD".to_string(),
        }
    }
}

impl Symbols {
    pub fn base_symbol(&self, asset: AssetClass) -> &str {
        match asset {
            AssetClass::Gold => &self.gold,
            AssetClass::Sp500 => &self.sp500,
            AssetClass::Nasdaq => &self.nasdaq,
            AssetClass::Bitcoin => &self.bitcoin,
        }
    }
}

/// Signal table for an asset class, in report order.
pub fn signal_specs(asset: AssetClass) -> &'static [SignalSpec; 5] {
    match asset {
        AssetClass::Gold => &gold::SIGNALS,
        AssetClass::Sp500 => &sp500::SIGNALS,
        AssetClass::Nasdaq => &nasdaq::SIGNALS,
        AssetClass::Bitcoin => &bitcoin::SIGNALS,
    }
}

pub fn recommendations(asset: AssetClass) -> &'static Recommendations {
    match asset {
        AssetClass::Gold => &gold::RECOMMENDATIONS,
        AssetClass::Sp500 => &sp500::RECOMMENDATIONS,
        AssetClass::Nasdaq => &nasdaq::RECOMMENDATIONS,
        AssetClass::Bitcoin => &bitcoin::RECOMMENDATIONS,
    }
}

pub async fn evaluate<S: ChartSource + ?Sized>(
    asset: AssetClass,
    source: &S,
    symbols: &Symbols,
) -> BarometerOutcome {
    info!("Analyzing {}...", asset.key().to_uppercase());

    let base = match fetch_base(asset, source, symbols).await {
        Ok(series) => series,
        Err(message) => {
            error!("{}", message);
            return BarometerOutcome::failed(message);
        }
    };

    let barometer = match asset {
        AssetClass::Gold => gold::evaluate(source, symbols, &base).await,
        AssetClass::Sp500 => sp500::evaluate(source, symbols, &base).await,
        AssetClass::Nasdaq => nasdaq::evaluate(source, symbols, &base).await,
        AssetClass::Bitcoin => bitcoin::evaluate(source, symbols, &base).await,
    };

    info!(
        "{}: score {}/100 | level {} | signals {}/5",
        asset.key().to_uppercase(),
        barometer.score,
        barometer.level.as_str(),
        barometer.triggered_count()
    );
    BarometerOutcome::Scored(barometer)
}

/// The class's own one-year daily series. Without it there is nothing to score.
async fn fetch_base<S: ChartSource + ?Sized>(
    asset: AssetClass,
    source: &S,
    symbols: &Symbols,
) -> Result<PriceSeries, String> {
    let failure = |cause: String| format!("Failed to fetch {} data: {}", asset.label(), cause);

    let series = source
        .history(symbols.base_symbol(asset), Range::OneYear)
        .await
        .map_err(|e| failure(e.to_string()))?;

    if series.is_empty() {
        return Err(failure("empty price history".to_string()));
    }
    Ok(series)
}
