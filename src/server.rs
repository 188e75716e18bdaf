//! Process bootstrap: logging and shared state

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::AppState;
use crate::cache::{FileDiskStore, InMemoryStore};
use crate::cli::{LogFormat, ServerConfig};
use crate::data::{PredictionClient, QuoteFetcher, YahooClient};
use crate::history::{HistoryService, HistorySettings};

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// Share of the upstream budget given to each quote-provider attempt
fn attempt_timeout(total: Duration, attempts: u32) -> Duration {
    total / attempts.max(1)
}

/// Wires the stores, upstream clients and services together
pub fn build_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()?;
    let quote_http = reqwest::Client::builder()
        .timeout(attempt_timeout(config.upstream_timeout, config.fetch_attempts))
        .build()?;

    let fetcher: Arc<dyn QuoteFetcher> = Arc::new(
        YahooClient::with_client(quote_http).with_max_attempts(config.fetch_attempts),
    );
    let disk = FileDiskStore::with_dir(&config.cache_dir);
    tracing::info!("History cache directory: {}", disk.cache_dir().display());

    let history = HistoryService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(disk),
        Arc::clone(&fetcher),
        HistorySettings {
            upstream_timeout: config.upstream_timeout,
            ..Default::default()
        },
    );

    Ok(Arc::new(AppState::new(
        history,
        fetcher,
        PredictionClient::with_client(http, &config.ml_api_url),
        config.auth.clone(),
        config.upstream_timeout,
    )))
}
