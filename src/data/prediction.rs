//! Client for the external exchange-rate prediction service
//!
//! The service exposes `GET /predict/{mode}?symbol=...` and answers with an
//! opaque JSON document that is passed through to callers unchanged.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::cache::Mode;

/// Default host of the prediction service
pub const DEFAULT_ML_API_URL: &str = "https://mfaishalif-finsight-prediction-api.hf.space";

/// Errors that can occur when calling the prediction service
#[derive(Debug, Error)]
pub enum PredictionError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Prediction service returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Client for the prediction service
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a new PredictionClient with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn predict_url(&self, mode: Mode) -> String {
        format!("{}/predict/{}", self.base_url, mode)
    }

    /// Fetch the forecast document for `symbol` in the given mode
    pub async fn predict(&self, symbol: &str, mode: Mode) -> Result<Value, PredictionError> {
        let response = self
            .client
            .get(self.predict_url(mode))
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Status(status));
        }

        Ok(response.json().await?)
    }
}
