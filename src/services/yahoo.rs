// src/services/yahoo.rs
//
// Yahoo Finance v8 chart client. Every call is a single GET with no retry; callers
// decide what a failure means.

use async_trait::async_trait;
use log::info;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::form_urlencoded::byte_serialize;

use crate::models::PriceSeries;

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) \
Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP Error {0}")]
    Status(u16),

    #[error("malformed chart response: {0}")]
    Parse(String),

    #[error("API error [{code}]: {description}")]
    Api { code: String, description: String },

    #[error("no chart data returned")]
    NoData,

    #[error("invalid chart URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Range {
    FiveDays,
    OneMonth,
    ThreeMonths,
    OneYear,
    FiveYears,
}

impl Range {
    pub fn as_str(&self) -> &'static str {
        match self {
            Range::FiveDays => "5d",
            Range::OneMonth => "1mo",
            Range::ThreeMonths => "3mo",
            Range::OneYear => "1y",
            Range::FiveYears => "5y",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "5d" => Some(Range::FiveDays),
            "1mo" => Some(Range::OneMonth),
            "3mo" => Some(Range::ThreeMonths),
            "1y" => Some(Range::OneYear),
            "5y" => Some(Range::FiveYears),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
    FifteenMinutes,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::FifteenMinutes => "15m",
        }
    }
}

/// Fields of the chart `meta` block used by the snapshot pipeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_state: Option<String>,
    pub regular_market_volume: Option<u64>,
    pub currency: Option<String>,
}

/// One parsed chart result: meta, timestamps (if present) and the raw close column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub meta: ChartMeta,
    pub timestamps: Option<Vec<i64>>,
    pub closes: Vec<Option<f64>>,
}

impl Chart {
    pub fn into_series(self) -> Result<PriceSeries, FetchError> {
        let timestamps = self
            .timestamps
            .ok_or_else(|| FetchError::Parse("missing timestamp array".to_string()))?;
        Ok(PriceSeries::from_closes(&timestamps, &self.closes))
    }

    /// Non-null closes in order.
    pub fn present_closes(&self) -> Vec<f64> {
        self.closes.iter().flatten().copied().collect()
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<RawResult>>,
    error: Option<RawApiError>,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: RawIndicators,
}

#[derive(Debug, Deserialize)]
struct RawIndicators {
    quote: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    close: Option<Vec<Option<f64>>>,
}

pub fn parse_chart(body: &str) -> Result<Chart, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if let Some(error) = envelope.chart.error {
        return Err(FetchError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(FetchError::NoData)?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse("empty quote indicator".to_string()))?;

    Ok(Chart {
        meta: result.meta,
        timestamps: result.timestamp,
        closes: quote.close.unwrap_or_default(),
    })
}

#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn chart(&self, symbol: &str, range: Range, interval: Interval) -> Result<Chart, FetchError>;

    /// Daily closes for `symbol` over `range`.
    async fn history(&self, symbol: &str, range: Range) -> Result<PriceSeries, FetchError> {
        self.chart(symbol, range, Interval::Daily).await?.into_series()
    }
}

#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// `{base}/{symbol}?range=..&interval=..` with every reserved character of the
    /// symbol escaped (`^VIX` becomes `%5EVIX`, `GC=F` becomes `GC%3DF`).
    fn build_url(&self, symbol: &str, range: Range, interval: Interval) -> Result<Url, FetchError> {
        let escaped: String = byte_serialize(symbol.as_bytes()).collect();
        let mut url = Url::parse(&format!("{}/{}", self.base_url, escaped))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("range", range.as_str())
            .append_pair("interval", interval.as_str());
        Ok(url)
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ChartSource for YahooClient {
    async fn chart(&self, symbol: &str, range: Range, interval: Interval) -> Result<Chart, FetchError> {
        let url = self.build_url(symbol, range, interval)?;
        info!("Fetching chart from URL: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        parse_chart(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[test]
    fn test_parse_chart_drops_null_closes() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"timestamp":[1,2,3],"indicators":{"quote":[{"close":[10.0,null,12.5]}]}}],"error":null}}"#;
        let series = parse_chart(json).unwrap().into_series().unwrap();
        assert_eq!(series.closes(), vec![10.0, 12.5]);
        assert_eq!(series.points()[1].timestamp, 3);
    }

    #[test]
    fn test_parse_chart_reads_meta() {
        let json = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":2031.4,"chartPreviousClose":2020.0,"marketState":"REGULAR","regularMarketVolume":1200},"indicators":{"quote":[{}]}}]}}"#;
        let chart = parse_chart(json).unwrap();
        assert_eq!(chart.meta.regular_market_price, Some(2031.4));
        assert_eq!(chart.meta.market_state.as_deref(), Some("REGULAR"));
        assert_eq!(chart.meta.regular_market_volume, Some(1200));
        assert!(chart.closes.is_empty());
    }

    #[test]
    fn test_missing_timestamps_is_parse_error() {
        let json = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{"close":[1.0]}]}}]}}"#;
        let err = parse_chart(json).unwrap().into_series().unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_api_error_surfaces() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(json).unwrap_err();
        assert!(matches!(err, FetchError::Api { .. }));
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_empty_result_is_no_data() {
        let json = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_chart(json), Err(FetchError::NoData)));
    }

    #[test]
    fn test_missing_quote_is_parse_error() {
        let json = r#"{"chart":{"result":[{"timestamp":[1],"indicators":{"quote":[]}}]}}"#;
        assert!(matches!(parse_chart(json), Err(FetchError::Parse(_))));
        assert!(matches!(parse_chart("<html>"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_build_url_escapes_symbol() {
        let client = YahooClient::new(DEFAULT_CHART_URL, 15).unwrap();
        let url = client.build_url("GC=F", Range::FiveYears, Interval::Daily).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/GC%3DF?range=5y&interval=1d"
        );

        let url = client.build_url("^VIX", Range::OneMonth, Interval::Daily).unwrap();
        assert!(url.as_str().contains("/chart/%5EVIX?range=1mo&interval=1d"));

        let url = client.build_url("DX-Y.NYB", Range::FiveDays, Interval::FifteenMinutes).unwrap();
        assert!(url.as_str().contains("/chart/DX-Y.NYB?range=5d&interval=15m"));
    }

    // ===== HTTP client against a local socket =====

    /// Answers one request with `response` after `delay`; the handle yields the raw request.
    async fn serve_once(response: String, delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v8/finance/chart", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });
        (base, handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_chart_sends_escaped_symbol_query_and_user_agent() {
        let body = r#"{"chart":{"result":[{"meta":{},"timestamp":[1,2],"indicators":{"quote":[{"close":[17.5,18.25]}]}}],"error":null}}"#;
        let (base, server) = serve_once(http_response("200 OK", body), Duration::ZERO).await;
        let client = YahooClient::new(&base, 5).unwrap();

        let series = client.history("^VIX", Range::OneMonth).await.unwrap();
        assert_eq!(series.closes(), vec![17.5, 18.25]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v8/finance/chart/%5EVIX?range=1mo&interval=1d HTTP/1.1"));
        assert!(request.to_lowercase().contains(&format!("user-agent: {}", USER_AGENT.to_lowercase())));
    }

    #[tokio::test]
    async fn test_chart_maps_non_success_status() {
        let (base, _server) = serve_once(http_response("503 Service Unavailable", "busy"), Duration::ZERO).await;
        let client = YahooClient::new(&base, 5).unwrap();

        let err = client.chart("GC=F", Range::FiveDays, Interval::FifteenMinutes).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
        assert_eq!(err.to_string(), "HTTP Error 503");
    }

    #[tokio::test]
    async fn test_chart_times_out() {
        let (base, server) = serve_once(http_response("200 OK", "{}"), Duration::from_secs(3)).await;
        let client = YahooClient::new(&base, 1).unwrap();

        let err = client.chart("^TNX", Range::ThreeMonths, Interval::Daily).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(1)));
        assert_eq!(err.to_string(), "timed out after 1s");
        server.abort();
    }

    #[test]
    fn test_range_tokens() {
        for range in [Range::FiveDays, Range::OneMonth, Range::ThreeMonths, Range::OneYear, Range::FiveYears] {
            assert_eq!(Range::parse(range.as_str()), Some(range));
        }
        assert_eq!(Range::parse("10y"), None);
    }
}
