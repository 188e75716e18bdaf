use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, AppState};
use crate::data::{fx_symbol, is_valid_currency_code, RatePoint};
use crate::history::Source;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    from: Option<String>,
    to: Option<String>,
    range: Option<String>,
    mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    symbol: String,
    data: Vec<RatePoint>,
    source: Source,
}

/// Resolve the currency pair in a request, rejecting missing or malformed codes
pub(super) fn currency_pair(from: Option<&str>, to: Option<&str>) -> ApiResult<(String, String)> {
    let (Some(from), Some(to)) = (from.filter(|s| !s.is_empty()), to.filter(|s| !s.is_empty())) else {
        return Err(ApiError::BadRequest(
            "Missing required parameters: 'from' and 'to'".to_string(),
        ));
    };

    for code in [from, to] {
        if !is_valid_currency_code(code) {
            return Err(ApiError::BadRequest(format!("Invalid currency code: '{}'", code)));
        }
    }
    Ok((from.to_uppercase(), to.to_uppercase()))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<HistoryResponse>> {
    let (from, to) = currency_pair(params.from.as_deref(), params.to.as_deref())?;
    let symbol = fx_symbol(&from, &to);

    let history = state
        .history
        .fetch(&symbol, params.range.as_deref(), params.mode.as_deref())
        .await?;

    Ok(Json(HistoryResponse {
        symbol,
        data: history.data,
        source: history.source,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_pair_uppercases() {
        let (from, to) = currency_pair(Some("usd"), Some("idr")).unwrap();
        assert_eq!((from.as_str(), to.as_str()), ("USD", "IDR"));
    }

    #[test]
    fn test_currency_pair_requires_both_codes() {
        for (from, to) in [(None, Some("IDR")), (Some("USD"), None), (Some(""), Some("IDR"))] {
            match currency_pair(from, to) {
                Err(ApiError::BadRequest(msg)) => assert!(msg.contains("'from' and 'to'")),
                other => panic!("Expected BadRequest, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_currency_pair_rejects_path_characters() {
        assert!(matches!(
            currency_pair(Some("../x"), Some("IDR")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
