use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::history::currency_pair;
use super::{ApiError, ApiResult, AppState};
use crate::data::{fx_symbol, FetchError};

/// How long a looked-up rate is reused
const RATE_TTL_SECONDS: i64 = 60;

/// Latest rate per symbol, reused for [`RATE_TTL_SECONDS`]
#[derive(Debug, Default)]
pub struct RateCache {
    rates: RwLock<HashMap<String, (f64, DateTime<Utc>)>>,
}

impl RateCache {
    pub fn get_fresh(&self, symbol: &str, now: DateTime<Utc>) -> Option<f64> {
        let rates = self.rates.read().unwrap_or_else(|e| e.into_inner());
        rates
            .get(symbol)
            .filter(|(_, at)| now.signed_duration_since(*at) < Duration::seconds(RATE_TTL_SECONDS))
            .map(|(rate, _)| *rate)
    }

    pub fn insert(&self, symbol: &str, rate: f64, at: DateTime<Utc>) {
        let mut rates = self.rates.write().unwrap_or_else(|e| e.into_inner());
        rates.insert(symbol.to_string(), (rate, at));
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversionParams {
    from: Option<String>,
    to: Option<String>,
    amount: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    from: String,
    to: String,
    amount: f64,
    rate: f64,
    converted_amount: f64,
    timestamp: String,
}

fn parse_amount(raw: Option<&str>) -> ApiResult<f64> {
    raw.unwrap_or("1")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| ApiError::BadRequest("Invalid 'amount' parameter".to_string()))
}

pub async fn get_conversion(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConversionParams>,
) -> ApiResult<Json<ConversionResponse>> {
    let (from, to) = currency_pair(params.from.as_deref(), params.to.as_deref())?;
    let amount = parse_amount(params.amount.as_deref())?;
    let symbol = fx_symbol(&from, &to);

    let now = Utc::now();
    let rate = match state.rates.get_fresh(&symbol, now) {
        Some(rate) => {
            debug!(symbol = %symbol, "conversion rate cache hit");
            rate
        }
        None => {
            let rate = tokio::time::timeout(state.upstream_timeout, state.fetcher.latest_quote(&symbol))
                .await
                .unwrap_or(Err(FetchError::Timeout))
                .map_err(|e| {
                    error!(symbol = %symbol, error = %e, "currency conversion failed");
                    ApiError::Upstream {
                        error: "Failed to fetch exchange rate".to_string(),
                        details: e.to_string(),
                    }
                })?;
            state.rates.insert(&symbol, rate, now);
            rate
        }
    };

    Ok(Json(ConversionResponse {
        from,
        to,
        amount,
        rate,
        converted_amount: amount * rate,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
