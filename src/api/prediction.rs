use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, ApiResult, AppState};
use crate::cache::Mode;
use crate::data::{is_valid_symbol, FetchError};
use crate::simulation::{self, ForecastPoint, DEFAULT_FORECAST_BASELINE};

const DEFAULT_SYMBOL: &str = "USDIDR=X";

const MOCK_SOURCE: &str = "simulation (ml backend unavailable)";

#[derive(Debug, Deserialize)]
pub struct PredictionParams {
    symbol: Option<String>,
    mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct MockPrediction {
    symbol: String,
    mode: Mode,
    data: Vec<ForecastPoint>,
    source: &'static str,
}

pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PredictionParams>,
) -> ApiResult<Json<Value>> {
    let symbol = params.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    if !is_valid_symbol(&symbol) {
        return Err(ApiError::BadRequest(format!("Invalid symbol: '{}'", symbol)));
    }
    let mode = Mode::parse(params.mode.as_deref().unwrap_or("daily"))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match state.predictions.predict(&symbol, mode).await {
        Ok(body) => return Ok(Json(body)),
        Err(e) => warn!(symbol = %symbol, error = %e, "prediction backend unavailable, returning mock"),
    }

    let baseline = match tokio::time::timeout(state.upstream_timeout, state.fetcher.latest_quote(&symbol))
        .await
        .unwrap_or(Err(FetchError::Timeout))
    {
        Ok(price) => price,
        Err(e) => {
            debug!(symbol = %symbol, error = %e, "latest quote unavailable for mock forecast");
            DEFAULT_FORECAST_BASELINE
        }
    };

    let data = simulation::mock_forecast(baseline, Utc::now().date_naive(), &mut rand::thread_rng());
    let mock = MockPrediction {
        symbol,
        mode,
        data,
        source: MOCK_SOURCE,
    };
    serde_json::to_value(mock)
        .map(Json)
        .map_err(|e| ApiError::Upstream {
            error: "Failed to build prediction".to_string(),
            details: e.to_string(),
        })
}
