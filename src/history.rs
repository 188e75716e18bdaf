//! Historical rate lookup with tiered caching
//!
//! [`HistoryService::fetch`] resolves a series through, in order: the memory
//! tier, the disk tier, the upstream provider, a stale memory entry and
//! finally a simulated random walk. Only request validation can fail.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, DiskStore, InvalidMode, MemoryStore, QueryShape};
use crate::data::{normalize_quotes, FetchError, QuoteFetcher, RatePoint};
use crate::simulation::{self, DEFAULT_HISTORY_BASELINE};

/// Where a served series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    CacheMemory,
    CacheDisk,
    Api,
    CacheMemoryStale,
    Simulation,
}

/// A resolved series and its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub data: Vec<RatePoint>,
    pub source: Source,
}

/// Errors surfaced to the caller of [`HistoryService::fetch`]
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    InvalidMode(#[from] InvalidMode),
}

/// Tunables for the history service
#[derive(Debug, Clone)]
pub struct HistorySettings {
    /// Upper bound on one upstream history fetch
    pub upstream_timeout: Duration,
    /// Baseline for the simulated series when no latest quote is available
    pub default_baseline: f64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(5),
            default_baseline: DEFAULT_HISTORY_BASELINE,
        }
    }
}

/// Resolves historical rate series through the cache tiers and the provider
pub struct HistoryService {
    memory: Arc<dyn MemoryStore>,
    disk: Arc<dyn DiskStore>,
    fetcher: Arc<dyn QuoteFetcher>,
    settings: HistorySettings,
}

impl HistoryService {
    pub fn new(
        memory: Arc<dyn MemoryStore>,
        disk: Arc<dyn DiskStore>,
        fetcher: Arc<dyn QuoteFetcher>,
        settings: HistorySettings,
    ) -> Self {
        Self {
            memory,
            disk,
            fetcher,
            settings,
        }
    }

    /// Returns the series for `symbol` shaped by the raw `range` / `mode` parameters.
    ///
    /// An invalid `mode` is rejected before any cache or upstream access.
    pub async fn fetch(
        &self,
        symbol: &str,
        range: Option<&str>,
        mode: Option<&str>,
    ) -> Result<History, HistoryError> {
        let shape = QueryShape::from_params(range, mode)?;
        Ok(self.fetch_shape(symbol, shape).await)
    }

    /// Resolves an already validated query
    pub async fn fetch_shape(&self, symbol: &str, shape: QueryShape) -> History {
        let key = CacheKey::derive(symbol, &shape);
        let ttl = shape.ttl();

        if let Some(entry) = self.memory.get(&key).filter(|e| e.is_fresh(ttl)) {
            debug!(key = %key, "memory cache hit");
            return History {
                data: entry.data,
                source: Source::CacheMemory,
            };
        }

        if let Some(entry) = self.disk.read(&key, ttl).await {
            debug!(key = %key, "disk cache hit");
            self.memory.set(&key, entry.clone());
            return History {
                data: entry.data,
                source: Source::CacheDisk,
            };
        }

        let interval = shape.interval();
        let start = shape.window_start(Utc::now());
        let fetched = tokio::time::timeout(
            self.settings.upstream_timeout,
            self.fetcher.fetch_history(symbol, start, interval),
        )
        .await
        .unwrap_or(Err(FetchError::Timeout));

        match fetched {
            Ok(quotes) if !quotes.is_empty() => {
                let data = normalize_quotes(quotes, interval);
                info!(key = %key, points = data.len(), "fetched history from provider");
                let entry = CacheEntry::new(data.clone());
                self.memory.set(&key, entry.clone());
                self.spawn_disk_write(key, entry);
                History {
                    data,
                    source: Source::Api,
                }
            }
            Ok(_) => {
                warn!(key = %key, "provider returned an empty series");
                self.degrade(symbol, &key).await
            }
            Err(e) => {
                warn!(key = %key, error = %e, "history fetch failed");
                self.degrade(symbol, &key).await
            }
        }
    }

    /// Persists an entry without holding up the response
    fn spawn_disk_write(&self, key: CacheKey, entry: CacheEntry) {
        let disk = Arc::clone(&self.disk);
        tokio::spawn(async move {
            if let Err(e) = disk.write(&key, &entry).await {
                debug!(key = %key, error = %e, "disk cache write failed");
            }
        });
    }

    /// Fallbacks once the provider could not deliver
    async fn degrade(&self, symbol: &str, key: &CacheKey) -> History {
        if let Some(entry) = self.memory.get(key) {
            info!(key = %key, "serving stale memory entry");
            return History {
                data: entry.data,
                source: Source::CacheMemoryStale,
            };
        }

        let baseline = match tokio::time::timeout(
            self.settings.upstream_timeout,
            self.fetcher.latest_quote(symbol),
        )
        .await
        {
            Ok(Ok(price)) => price,
            Ok(Err(e)) => {
                debug!(symbol, error = %e, "latest quote unavailable for simulation baseline");
                self.settings.default_baseline
            }
            Err(_) => self.settings.default_baseline,
        };

        warn!(key = %key, baseline, "serving simulated history");
        let data = simulation::random_walk(baseline, Utc::now().date_naive(), &mut rand::thread_rng());
        History {
            data,
            source: Source::Simulation,
        }
    }
}
