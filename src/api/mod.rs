//! HTTP routes
//!
//! `/api/history` and `/api/prediction` sit behind the auth gate;
//! `/api/conversion` and `/health` are public.

mod conversion;
mod error;
mod history;
mod prediction;

pub use conversion::RateCache;
pub use error::{ApiError, ApiResult};

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, AuthConfig};
use crate::data::{PredictionClient, QuoteFetcher};
use crate::history::HistoryService;

/// Shared state handed to every handler
pub struct AppState {
    pub history: HistoryService,
    pub fetcher: Arc<dyn QuoteFetcher>,
    pub predictions: PredictionClient,
    pub rates: RateCache,
    pub auth: AuthConfig,
    /// Bound on quote lookups made directly by handlers
    pub upstream_timeout: Duration,
}

impl AppState {
    pub fn new(
        history: HistoryService,
        fetcher: Arc<dyn QuoteFetcher>,
        predictions: PredictionClient,
        auth: AuthConfig,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            history,
            fetcher,
            predictions,
            rates: RateCache::default(),
            auth,
            upstream_timeout,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/api/history", get(history::get_history))
        .route("/api/prediction", get(prediction::get_prediction))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(gated)
        .route("/api/conversion", get(conversion::get_conversion))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
