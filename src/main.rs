//! FinSight - currency rates, history and predictions over HTTP
//!
//! Serves the historical-rate API backed by a memory + disk cache, the
//! conversion endpoint and the prediction proxy.

use clap::Parser;
use tokio::net::TcpListener;

use finsight::api::app_router;
use finsight::cli::{Cli, ServerConfig};
use finsight::server::{build_state, init_tracing};

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli)?;
    init_tracing(config.log_format);

    let state = build_state(&config)?;
    let router = app_router(state);

    tracing::info!("Listening on {}", config.listen);
    let listener = TcpListener::bind(config.listen).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
