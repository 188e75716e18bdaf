//! Request gate for the protected API routes
//!
//! Browser requests from the site itself pass on their `Origin`/`Referer`;
//! external callers must present the shared API key, either as `x-api-key`
//! or as `Authorization: Bearer <key>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::{ApiError, AppState};

const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: Invalid or missing API Key.";

/// Credentials accepted by the gate
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for external callers
    pub api_key: String,
    /// Public URL of the site; same-site requests skip the key check
    pub app_url: String,
}

impl AuthConfig {
    /// Whether the request headers satisfy the gate
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if self.is_internal(headers) {
            return true;
        }

        let provided = header_str(headers, "x-api-key")
            .filter(|k| !k.is_empty())
            .or_else(|| {
                header_str(headers, header::AUTHORIZATION.as_str())
                    .and_then(|v| v.strip_prefix("Bearer "))
            });

        matches!(provided, Some(key) if !self.api_key.is_empty() && key == self.api_key)
    }

    fn is_internal(&self, headers: &HeaderMap) -> bool {
        if self.app_url.is_empty() {
            return false;
        }
        [header::ORIGIN, header::REFERER]
            .iter()
            .filter_map(|name| header_str(headers, name.as_str()))
            .any(|value| value.starts_with(&self.app_url))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Middleware rejecting requests that fail [`AuthConfig::is_authorized`]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.auth.is_authorized(request.headers()) {
        debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthConfig {
        AuthConfig {
            api_key: "secret".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(!config().is_authorized(&HeaderMap::new()));
    }

    #[test]
    fn test_same_site_origin_accepted() {
        let h = headers(&[("origin", "http://localhost:3000")]);
        assert!(config().is_authorized(&h));
    }

    #[test]
    fn test_same_site_referer_accepted() {
        let h = headers(&[("referer", "http://localhost:3000/konversi")]);
        assert!(config().is_authorized(&h));
    }

    #[test]
    fn test_foreign_origin_rejected() {
        let h = headers(&[("origin", "https://evil.example")]);
        assert!(!config().is_authorized(&h));
    }

    #[test]
    fn test_api_key_header_accepted() {
        assert!(config().is_authorized(&headers(&[("x-api-key", "secret")])));
        assert!(!config().is_authorized(&headers(&[("x-api-key", "wrong")])));
    }

    #[test]
    fn test_bearer_token_accepted() {
        assert!(config().is_authorized(&headers(&[("authorization", "Bearer secret")])));
        assert!(!config().is_authorized(&headers(&[("authorization", "Basic secret")])));
    }

    #[test]
    fn test_empty_api_key_header_falls_back_to_bearer() {
        let h = headers(&[("x-api-key", ""), ("authorization", "Bearer secret")]);
        assert!(config().is_authorized(&h));
        assert!(!config().is_authorized(&headers(&[("x-api-key", "")])));
    }

    #[test]
    fn test_empty_secret_never_matches() {
        let cfg = AuthConfig {
            api_key: String::new(),
            app_url: String::new(),
        };
        assert!(!cfg.is_authorized(&headers(&[("x-api-key", "")])));
        assert!(!cfg.is_authorized(&headers(&[("origin", "http://anything")])));
    }
}
