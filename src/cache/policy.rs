//! Cache key derivation and time-to-live policy
//!
//! A history request is either a calendar `range` query or an explicit
//! sampling `mode` query. The two shapes derive disjoint cache keys and
//! carry their own TTL and query window.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::data::Interval;

/// Range used when the request omits one or names an unknown value
pub const DEFAULT_RANGE: Range = Range::OneMonth;

/// TTL for long calendar ranges
const LONG_TTL_HOURS: i64 = 12;

/// TTL for short ranges and every mode query
const SHORT_TTL_HOURS: i64 = 1;

/// Window sizes for the sampling modes, in days
const DAILY_MODE_WINDOW_DAYS: i64 = 120;
const HOURLY_MODE_WINDOW_DAYS: i64 = 60;

/// Error for an unsupported sampling mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid mode: '{0}'. Valid modes: daily, hourly")]
pub struct InvalidMode(pub String);

/// Calendar range of a history query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Range {
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Range {
    /// Parses a range token, falling back to [`DEFAULT_RANGE`] for anything unknown
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::from_token).unwrap_or(DEFAULT_RANGE)
    }

    /// Parses a range token such as `1mo` or `ytd`
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "1w" => Some(Range::OneWeek),
            "1mo" => Some(Range::OneMonth),
            "3mo" => Some(Range::ThreeMonths),
            "6mo" => Some(Range::SixMonths),
            "1y" => Some(Range::OneYear),
            "2y" => Some(Range::TwoYears),
            "5y" => Some(Range::FiveYears),
            "10y" => Some(Range::TenYears),
            "ytd" => Some(Range::YearToDate),
            "max" => Some(Range::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Range::OneWeek => "1w",
            Range::OneMonth => "1mo",
            Range::ThreeMonths => "3mo",
            Range::SixMonths => "6mo",
            Range::OneYear => "1y",
            Range::TwoYears => "2y",
            Range::FiveYears => "5y",
            Range::TenYears => "10y",
            Range::YearToDate => "ytd",
            Range::Max => "max",
        }
    }

    /// Whether this range belongs to the long-TTL bucket
    pub fn is_long(&self) -> bool {
        !matches!(self, Range::OneWeek | Range::OneMonth)
    }

    /// Number of days the query window reaches back from `today`
    pub fn window_days(&self, today: NaiveDate) -> i64 {
        match self {
            Range::OneWeek => 7,
            Range::OneMonth => 30,
            Range::ThreeMonths => 90,
            Range::SixMonths => 180,
            Range::OneYear => 365,
            Range::TwoYears => 730,
            Range::FiveYears => 1825,
            Range::TenYears => 3650,
            Range::YearToDate => i64::from(today.ordinal0()).max(1),
            Range::Max => 7300,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit sampling mode used by the prediction-alignment charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Daily,
    Hourly,
}

impl Mode {
    /// Parses a mode string; only `daily` and `hourly` are accepted
    pub fn parse(s: &str) -> Result<Self, InvalidMode> {
        match s {
            "daily" => Ok(Mode::Daily),
            "hourly" => Ok(Mode::Hourly),
            other => Err(InvalidMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Daily => "daily",
            Mode::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of a history query: a calendar range or a sampling mode, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryShape {
    Range(Range),
    Mode(Mode),
}

impl QueryShape {
    /// Builds the shape from raw query parameters.
    ///
    /// A non-empty `mode` wins over `range` and must be valid; without one
    /// the range falls back to [`DEFAULT_RANGE`].
    pub fn from_params(range: Option<&str>, mode: Option<&str>) -> Result<Self, InvalidMode> {
        match mode.filter(|m| !m.is_empty()) {
            Some(m) => Mode::parse(m).map(QueryShape::Mode),
            None => Ok(QueryShape::Range(Range::parse_or_default(range))),
        }
    }

    /// Time-to-live for entries cached under this shape
    pub fn ttl(&self) -> Duration {
        match self {
            QueryShape::Range(range) if range.is_long() => Duration::hours(LONG_TTL_HOURS),
            _ => Duration::hours(SHORT_TTL_HOURS),
        }
    }

    /// Sampling interval requested from the upstream provider
    pub fn interval(&self) -> Interval {
        match self {
            QueryShape::Mode(Mode::Hourly) => Interval::Hourly,
            _ => Interval::Daily,
        }
    }

    /// Start of the upstream query window relative to `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            QueryShape::Range(range) => range.window_days(now.date_naive()),
            QueryShape::Mode(Mode::Daily) => DAILY_MODE_WINDOW_DAYS,
            QueryShape::Mode(Mode::Hourly) => HOURLY_MODE_WINDOW_DAYS,
        };
        now - Duration::days(days)
    }
}

/// Identifies one (symbol, query shape) pair in both cache layers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// `{symbol}_mode_{mode}` for mode queries, `{symbol}_{range}` otherwise
    pub fn derive(symbol: &str, shape: &QueryShape) -> Self {
        match shape {
            QueryShape::Mode(mode) => Self(format!("{}_mode_{}", symbol, mode)),
            QueryShape::Range(range) => Self(format!("{}_{}", symbol, range)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
