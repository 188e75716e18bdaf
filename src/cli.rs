//! Command-line interface parsing for the FinSight server
//!
//! Every flag can also be supplied through its environment variable, and a
//! `.env` file in the working directory is loaded before parsing.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthConfig;
use crate::cache::FileDiskStore;
use crate::data::prediction::DEFAULT_ML_API_URL;

/// Error types for CLI configuration
#[derive(Debug, Error)]
pub enum CliError {
    /// No `--cache-dir` was given and no home directory could be found
    #[error("Could not determine a cache directory; pass --cache-dir or set FINSIGHT_CACHE_DIR")]
    NoCacheDir,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// FinSight - currency rates, history and predictions over HTTP
#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(about = "Currency rate service with a tiered historical-rate cache")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "FINSIGHT_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Directory for the on-disk history cache (defaults to the XDG cache dir)
    #[arg(long, env = "FINSIGHT_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds before an upstream request is abandoned
    #[arg(
        long,
        env = "FINSIGHT_UPSTREAM_TIMEOUT_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub upstream_timeout_secs: u64,

    /// Attempts per quote-provider call, including the first
    #[arg(
        long,
        env = "FINSIGHT_FETCH_ATTEMPTS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub fetch_attempts: u32,

    /// Base URL of the prediction service
    #[arg(long, env = "ML_API_URL", default_value = DEFAULT_ML_API_URL)]
    pub ml_api_url: String,

    /// Shared secret for external API callers
    #[arg(
        long,
        env = "API_SECRET_KEY",
        default_value = "finsight-secret-123",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub api_key: String,

    /// Public URL of the site; requests originating from it skip the key check
    #[arg(long, env = "NEXT_PUBLIC_APP_URL", default_value = "http://localhost:3000")]
    pub app_url: String,

    /// Log output format
    #[arg(long, env = "FINSIGHT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Server configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub cache_dir: PathBuf,
    pub upstream_timeout: Duration,
    pub fetch_attempts: u32,
    pub ml_api_url: String,
    pub auth: AuthConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with the cache directory resolved
    /// * `Err(CliError::NoCacheDir)` if no cache directory is available
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_dir = match &cli.cache_dir {
            Some(dir) => dir.clone(),
            None => FileDiskStore::new()
                .map(|store| store.cache_dir().to_path_buf())
                .ok_or(CliError::NoCacheDir)?,
        };

        Ok(ServerConfig {
            listen: cli.listen,
            cache_dir,
            upstream_timeout: Duration::from_secs(cli.upstream_timeout_secs),
            fetch_attempts: cli.fetch_attempts,
            ml_api_url: cli.ml_api_url.clone(),
            auth: AuthConfig {
                api_key: cli.api_key.clone(),
                app_url: cli.app_url.clone(),
            },
            log_format: cli.log_format,
        })
    }
}
