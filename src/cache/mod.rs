//! Two-tier cache for historical rate series
//!
//! The memory tier is a process-lifetime map and the authoritative fast path.
//! The disk tier persists one JSON file per cache key and survives restarts.
//! Both tiers hold independent copies of a [`CacheEntry`]; the history
//! service decides when to consult and repopulate each one.

mod disk;
mod memory;
mod policy;

pub use disk::FileDiskStore;
pub use memory::InMemoryStore;
pub use policy::{CacheKey, InvalidMode, Mode, QueryShape, Range, DEFAULT_RANGE};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::RatePoint;

/// A cached rate series and the instant it was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized rate points, oldest first
    pub data: Vec<RatePoint>,
    /// Creation time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time
    pub fn new(data: Vec<RatePoint>) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    /// Whether the entry is younger than `ttl` at `now`
    pub fn is_fresh_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < ttl
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.is_fresh_at(ttl, Utc::now())
    }
}

/// Process-wide key to entry map
pub trait MemoryStore: Send + Sync {
    /// Returns a copy of the entry regardless of its age
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores `entry`, replacing any previous one (last writer wins)
    fn set(&self, key: &CacheKey, entry: CacheEntry);
}

/// Persistent key to entry storage
#[async_trait]
pub trait DiskStore: Send + Sync {
    /// Reads a fresh entry.
    ///
    /// Missing files, unreadable files, corrupt JSON and entries whose age is
    /// at least `ttl` all read as `None`.
    async fn read(&self, key: &CacheKey, ttl: Duration) -> Option<CacheEntry>;

    /// Writes `entry`, overwriting whatever was stored for `key`
    async fn write(&self, key: &CacheKey, entry: &CacheEntry) -> std::io::Result<()>;
}
