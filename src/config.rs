// src/config.rs
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::services::cache::MemoizedSource;
use crate::services::yahoo::{ChartSource, YahooClient, DEFAULT_CHART_URL};

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub chart_url: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
    pub memoize: bool,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                warn!("${} not set, defaulting to {}", key, default);
                default.to_string()
            })
        };

        let chart_url = setting("YAHOO_CHART_URL", DEFAULT_CHART_URL);

        let timeout_secs: u64 = setting("FETCH_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .trim()
            .parse()
            .context("FETCH_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than zero");
        }

        let data_dir = PathBuf::from(setting("DATA_DIR", DEFAULT_DATA_DIR));
        let memoize = parse_flag(&setting("MEMOIZE_REQUESTS", "true"))
            .context("MEMOIZE_REQUESTS must be true or false")?;

        let config = Self {
            chart_url,
            timeout_secs,
            data_dir,
            memoize,
        };
        info!("Using config: {:?}", config);
        Ok(config)
    }

    /// The Yahoo client, memoized for the run unless disabled.
    pub fn chart_source(&self) -> Result<Arc<dyn ChartSource>> {
        let client = YahooClient::new(&self.chart_url, self.timeout_secs)
            .with_context(|| format!("building HTTP client for {}", self.chart_url))?;
        if self.memoize {
            Ok(Arc::new(MemoizedSource::new(client)))
        } else {
            Ok(Arc::new(client))
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.chart_url, DEFAULT_CHART_URL);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.memoize);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("YAHOO_CHART_URL", "http://localhost:9000/chart"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("DATA_DIR", "/tmp/out"),
            ("MEMOIZE_REQUESTS", "off"),
        ]))
        .unwrap();
        assert_eq!(config.chart_url, "http://localhost:9000/chart");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/out"));
        assert!(!config.memoize);
    }

    #[test]
    fn test_malformed_values_are_fatal() {
        assert!(AppConfig::from_lookup(lookup(&[("FETCH_TIMEOUT_SECS", "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("FETCH_TIMEOUT_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("MEMOIZE_REQUESTS", "maybe")])).is_err());
    }
}
