// src/models.rs
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: i64,
    pub close: f64,
}

/// Daily closes in the order the chart endpoint delivered them (ascending).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn from_closes(timestamps: &[i64], closes: &[Option<f64>]) -> Self {
        let points = timestamps
            .iter()
            .zip(closes.iter())
            .filter_map(|(&timestamp, close)| close.map(|close| PricePoint { timestamp, close }))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn first_close(&self) -> Option<f64> {
        self.points.first().map(|p| p.close)
    }

    /// Close `n` positions from the end, so `close_back(1)` is the latest close.
    pub fn close_back(&self, n: usize) -> Option<f64> {
        if n == 0 || n > self.points.len() {
            return None;
        }
        Some(self.points[self.points.len() - n].close)
    }

    /// The most recent `n` closes (all of them when the series is shorter).
    pub fn tail_closes(&self, n: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(n);
        self.points[start..].iter().map(|p| p.close).collect()
    }

    pub fn max_close(&self) -> Option<f64> {
        self.points.iter().map(|p| p.close).reduce(f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Caution,
    Warning,
    Danger,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=30 => RiskLevel::Low,
            31..=50 => RiskLevel::Caution,
            51..=70 => RiskLevel::Warning,
            _ => RiskLevel::Danger,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Caution => "CAUTION",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Danger => "DANGER",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Caution => "🟡",
            RiskLevel::Warning => "🟠",
            RiskLevel::Danger => "🔴",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub name: String,
    pub triggered: bool,
    pub points: u32,
    pub max_points: u32,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barometer {
    pub score: u32,
    pub level: RiskLevel,
    pub signals: Vec<SignalResult>,
    pub recommendation: String,
}

impl Barometer {
    pub fn triggered_count(&self) -> usize {
        self.signals.iter().filter(|s| s.triggered).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarometerOutcome {
    Scored(Barometer),
    Failed { error: String },
}

impl BarometerOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        BarometerOutcome::Failed { error: error.into() }
    }

    pub fn barometer(&self) -> Option<&Barometer> {
        match self {
            BarometerOutcome::Scored(b) => Some(b),
            BarometerOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Gold,
    Sp500,
    Nasdaq,
    Bitcoin,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Gold,
        AssetClass::Sp500,
        AssetClass::Nasdaq,
        AssetClass::Bitcoin,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AssetClass::Gold => "gold",
            AssetClass::Sp500 => "sp500",
            AssetClass::Nasdaq => "nasdaq",
            AssetClass::Bitcoin => "bitcoin",
        }
    }

    /// Label used in "Failed to fetch <label> data" messages.
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Gold => "gold",
            AssetClass::Sp500 => "S&P 500",
            AssetClass::Nasdaq => "Nasdaq",
            AssetClass::Bitcoin => "Bitcoin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub daily_change: f64,
    pub daily_change_pct: f64,
    pub week_change_pct: f64,
    pub spark_data: Vec<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub market_state: String,
    pub volume: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotOutcome {
    Quoted(AssetSnapshot),
    Failed { error: bool },
}

impl SnapshotOutcome {
    pub fn failed() -> Self {
        SnapshotOutcome::Failed { error: true }
    }

    pub fn snapshot(&self) -> Option<&AssetSnapshot> {
        match self {
            SnapshotOutcome::Quoted(s) => Some(s),
            SnapshotOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    pub updated_at: String,
    #[serde(serialize_with = "ordered_map")]
    pub barometers: Vec<(AssetClass, BarometerOutcome)>,
}

impl RiskReport {
    pub fn success_count(&self) -> usize {
        self.barometers
            .iter()
            .filter(|(_, outcome)| outcome.barometer().is_some())
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub updated_at: String,
    #[serde(serialize_with = "ordered_map")]
    pub assets: Vec<(String, SnapshotOutcome)>,
}

impl MarketReport {
    pub fn success_count(&self) -> usize {
        self.assets
            .iter()
            .filter(|(_, outcome)| outcome.snapshot().is_some())
            .count()
    }
}

// Report mappings keep evaluation order in the written JSON.
fn ordered_map<S, K, V>(entries: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Serialize,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}
