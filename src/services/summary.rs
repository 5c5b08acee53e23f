// src/services/summary.rs
//
// End-of-run console tables.
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_BORDERS_ONLY, Attribute, Cell, CellAlignment,
    Color, ContentArrangement, Table,
};

use crate::models::{BarometerOutcome, MarketReport, RiskLevel, RiskReport, SnapshotOutcome};

fn level_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Caution => Color::Yellow,
        RiskLevel::Warning => Color::DarkYellow,
        RiskLevel::Danger => Color::Red,
    }
}

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn risk_table(report: &RiskReport) -> Table {
    let mut table = base_table(&["Asset", "Score", "Level", "Signals", "Recommendation"]);

    for (asset, outcome) in &report.barometers {
        let row = match outcome {
            BarometerOutcome::Scored(b) => vec![
                Cell::new(asset.key().to_uppercase()),
                Cell::new(format!("{}/100", b.score)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{} {}", b.level.badge(), b.level.as_str())).fg(level_color(b.level)),
                Cell::new(format!("{}/{}", b.triggered_count(), b.signals.len())),
                Cell::new(b.recommendation.as_str()),
            ],
            BarometerOutcome::Failed { error } => vec![
                Cell::new(asset.key().to_uppercase()),
                Cell::new("-").set_alignment(CellAlignment::Right),
                Cell::new("ERROR").fg(Color::Red),
                Cell::new("-"),
                Cell::new(error.as_str()).fg(Color::DarkGrey),
            ],
        };
        table.add_row(row);
    }
    table
}

pub fn market_table(report: &MarketReport) -> Table {
    let mut table = base_table(&["Symbol", "Price", "Day", "Week", "State"]);

    for (symbol, outcome) in &report.assets {
        let row = match outcome {
            SnapshotOutcome::Quoted(s) => {
                let price = s.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string());
                let day_color = if s.daily_change_pct < 0.0 { Color::Red } else { Color::Green };
                vec![
                    Cell::new(symbol),
                    Cell::new(price).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:+.2}%", s.daily_change_pct))
                        .fg(day_color)
                        .set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:+.2}%", s.week_change_pct)).set_alignment(CellAlignment::Right),
                    Cell::new(&s.market_state).fg(Color::DarkGrey),
                ]
            }
            SnapshotOutcome::Failed { .. } => vec![
                Cell::new(symbol),
                Cell::new("-").set_alignment(CellAlignment::Right),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("ERROR").fg(Color::Red),
            ],
        };
        table.add_row(row);
    }
    table
}
