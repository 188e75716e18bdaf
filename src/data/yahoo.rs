//! Yahoo Finance chart API client
//!
//! Fetches close series and the latest market price for FX symbols such as
//! `USDIDR=X` from the public v8 chart endpoint.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Interval, Quote};

/// Base URL for the Yahoo Finance query API
const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Delay added per failed attempt before retrying
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Errors that can occur when fetching quotes
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned status {0}")]
    Status(StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Provider returned no usable data for the symbol
    #[error("No data for {0}")]
    NoData(String),

    /// The fetch did not complete in time
    #[error("Upstream request timed out")]
    Timeout,
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    fn is_transient(&self) -> bool {
        match self {
            FetchError::RequestFailed(_) | FetchError::Timeout => true,
            FetchError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::ParseError(_) | FetchError::NoData(_) => false,
        }
    }
}

/// Source of historical and latest quotes for a symbol
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Close series for `symbol` from `start` until now at `interval`
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        interval: Interval,
    ) -> Result<Vec<Quote>, FetchError>;

    /// Latest regular-market price for `symbol`
    async fn latest_quote(&self, symbol: &str) -> Result<f64, FetchError>;
}

/// Client for the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    /// Create a new YahooClient with default settings
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new YahooClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: YAHOO_BASE_URL.to_string(),
            max_attempts: 2,
        }
    }

    /// Point the client at a different host (used for mirrors and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Total attempts per call, including the first one
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    /// Issues a chart request, retrying transient failures
    async fn get_chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_chart_once(symbol, query).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    debug!(symbol, attempt, error = %e, "retrying chart request");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_chart_once(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult, FetchError> {
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(query)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let text = response.text().await?;
        let api_response: ChartResponse = serde_json::from_str(&text)?;
        parse_chart(symbol, api_response)
    }
}

#[async_trait]
impl QuoteFetcher for YahooClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        interval: Interval,
    ) -> Result<Vec<Quote>, FetchError> {
        debug!(
            symbol,
            start = %start.format("%Y-%m-%d"),
            interval = interval.as_param(),
            "fetching chart history"
        );

        let query = [
            ("period1", start.timestamp().to_string()),
            ("period2", Utc::now().timestamp().to_string()),
            ("interval", interval.as_param().to_string()),
        ];
        let result = self.get_chart(symbol, &query).await?;
        let quotes = extract_quotes(&result);

        if quotes.is_empty() {
            warn!(symbol, "chart history returned no usable closes");
            return Err(FetchError::NoData(symbol.to_string()));
        }
        Ok(quotes)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<f64, FetchError> {
        let query = [
            ("range", "1d".to_string()),
            ("interval", "1d".to_string()),
        ];
        let result = self.get_chart(symbol, &query).await?;

        result
            .meta
            .and_then(|m| m.regular_market_price)
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| FetchError::NoData(symbol.to_string()))
    }
}

/// Unwraps the first chart result or the provider's error description
fn parse_chart(symbol: &str, response: ChartResponse) -> Result<ChartResult, FetchError> {
    if let Some(error) = response.chart.error {
        return Err(FetchError::NoData(format!(
            "{}: {}",
            symbol,
            error.description.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))
}

/// Pairs timestamps with closes, dropping missing or zero closes
fn extract_quotes(result: &ChartResult) -> Vec<Quote> {
    let closes = result
        .indicators
        .as_ref()
        .and_then(|i| i.quote.first())
        .map(|q| q.close.as_slice())
        .unwrap_or_default();

    result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = (*close)?;
            if !close.is_finite() || close == 0.0 {
                return None;
            }
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(Quote { timestamp, close })
        })
        .collect()
}

/// Chart API response structure
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
