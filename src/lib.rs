// src/lib.rs
pub mod config;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use services::yahoo::{ChartSource, YahooClient};
