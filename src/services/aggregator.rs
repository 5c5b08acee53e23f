// src/services/aggregator.rs
use crate::models::{Barometer, RiskLevel, SignalResult};

/// One canned recommendation per risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendations {
    pub low: &'static str,
    pub caution: &'static str,
    pub warning: &'static str,
    pub danger: &'static str,
}

impl Recommendations {
    pub fn for_level(&self, level: RiskLevel) -> &'static str {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Caution => self.caution,
            RiskLevel::Warning => self.warning,
            RiskLevel::Danger => self.danger,
        }
    }
}

pub fn aggregate(signals: Vec<SignalResult>, recommendations: &Recommendations) -> Barometer {
    let score: u32 = signals.iter().map(|s| s.points).sum();
    let level = RiskLevel::from_score(score);

    Barometer {
        score,
        level,
        signals,
        recommendation: recommendations.for_level(level).to_string(),
    }
}
