// src/services/storage.rs
use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const RISK_REPORT_FILE: &str = "risk-barometer.json";
pub const MARKET_REPORT_FILE: &str = "market.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Pretty,
    Compact,
}

/// Writes report documents under the data directory.
pub struct ReportWriter {
    pub data_dir: PathBuf,
}

impl ReportWriter {
    /// Creates the data directory up front so `save` never has to.
    pub async fn new<P: AsRef<Path>>(data_dir: P) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .await
                .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        }
        Ok(Self { data_dir })
    }

    /// Serializes to `<file_name>.tmp`, then renames over the target so readers
    /// never see a half-written report.
    pub async fn save<T: Serialize>(&self, file_name: &str, data: &T, layout: Layout) -> anyhow::Result<PathBuf> {
        let final_path = self.data_dir.join(file_name);
        let tmp_path = self.data_dir.join(format!("{}.tmp", file_name));

        let json_bytes = match layout {
            Layout::Pretty => serde_json::to_vec_pretty(data)?,
            Layout::Compact => serde_json::to_vec(data)?,
        };

        fs::write(&tmp_path, json_bytes)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path)
            .await
            .with_context(|| format!("replacing {}", final_path.display()))?;

        info!("Saved to {}", final_path.display());
        Ok(final_path)
    }
}

/// `updatedAt` stamp: UTC, second precision, `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}
