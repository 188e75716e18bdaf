//! Market data models and upstream clients
//!
//! This module contains the rate types shared by the cache and the API layer,
//! plus clients for the quote provider and the prediction service.

pub mod prediction;
pub mod yahoo;

pub use prediction::{PredictionClient, PredictionError};
pub use yahoo::{FetchError, QuoteFetcher, YahooClient};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single point of an exchange-rate series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    /// `YYYY-MM-DD` for daily series, a full UTC timestamp for hourly ones
    pub date: String,
    /// Closing exchange rate
    pub rate: f64,
}

impl RatePoint {
    pub fn new(date: impl Into<String>, rate: f64) -> Self {
        Self {
            date: date.into(),
            rate,
        }
    }
}

/// A raw closing quote from the upstream provider
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Upstream sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
    Hourly,
}

impl Interval {
    /// Interval token understood by the chart API
    pub fn as_param(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
        }
    }

    /// Formats a timestamp at this interval's granularity
    pub fn format_date(&self, timestamp: DateTime<Utc>) -> String {
        match self {
            Interval::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Interval::Hourly => timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }
}

/// Builds the provider symbol for a currency pair, e.g. `USDIDR=X`
pub fn fx_symbol(from: &str, to: &str) -> String {
    format!("{}{}=X", from.to_uppercase(), to.to_uppercase())
}

/// Whether `code` looks like a currency code we can put in a symbol
pub fn is_valid_currency_code(code: &str) -> bool {
    (2..=10).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Whether `symbol` is a plausible provider symbol (`USDIDR=X`, `BTC-USD`, `^JKSE`)
pub fn is_valid_symbol(symbol: &str) -> bool {
    (1..=20).contains(&symbol.len())
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '=' | '-' | '.' | '^'))
        && !symbol.contains("..")
}

/// Converts upstream quotes into rate points, oldest first
pub fn normalize_quotes(mut quotes: Vec<Quote>, interval: Interval) -> Vec<RatePoint> {
    quotes.sort_by_key(|q| q.timestamp);
    quotes
        .into_iter()
        .map(|q| RatePoint::new(interval.format_date(q.timestamp), q.close))
        .collect()
}
