//! File-backed disk tier
//!
//! Stores each [`CacheEntry`] as `{key}.json` in a cache directory
//! (`~/.cache/finsight/history/` on Linux by default). Reads never fail:
//! anything that cannot be read, parsed or is past its TTL is a miss.

use async_trait::async_trait;
use chrono::Duration;
use directories::ProjectDirs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{CacheEntry, CacheKey, DiskStore};

/// Subdirectory of the project cache dir holding history entries
const HISTORY_SUBDIR: &str = "history";

/// Disk tier storing one JSON file per cache key
#[derive(Debug, Clone)]
pub struct FileDiskStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileDiskStore {
    /// Creates a store in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "finsight")?;
        let cache_dir = project_dirs.cache_dir().join(HISTORY_SUBDIR);
        Some(Self { cache_dir })
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }

    async fn read_entry(&self, key: &CacheKey) -> io::Result<CacheEntry> {
        let content = fs::read(self.cache_path(key)).await?;
        serde_json::from_slice(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[async_trait]
impl DiskStore for FileDiskStore {
    async fn read(&self, key: &CacheKey, ttl: Duration) -> Option<CacheEntry> {
        let entry = match self.read_entry(key).await {
            Ok(entry) => entry,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(key = %key, error = %e, "discarding unreadable cache file");
                }
                return None;
            }
        };

        entry.is_fresh(ttl).then_some(entry)
    }

    async fn write(&self, key: &CacheKey, entry: &CacheEntry) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;

        let json = serde_json::to_vec(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Write beside the target and rename so readers never see half a file
        let path = self.cache_path(key);
        let tmp = path.with_extension(format!("json.{:016x}.tmp", rand::random::<u64>()));
        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

/// Maps a cache key onto a safe file name
fn file_stem(key: &CacheKey) -> String {
    key.as_str()
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' | '=' | '.' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Mode, QueryShape, Range};
    use crate::data::RatePoint;
    use chrono::Utc;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn create_test_store() -> (FileDiskStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileDiskStore::with_dir(temp_dir.path());
        (store, temp_dir)
    }

    fn month_key() -> CacheKey {
        CacheKey::derive("USDIDR=X", &QueryShape::Range(Range::OneMonth))
    }

    fn sample_entry() -> CacheEntry {
        CacheEntry::new(vec![
            RatePoint::new("2026-10-17", 16398.123456),
            RatePoint::new("2026-10-18", 16412.5),
            RatePoint::new("2026-10-19", 16420.000001),
        ])
    }

    #[tokio::test]
    async fn test_write_creates_file_in_cache_directory() {
        let (store, temp_dir) = create_test_store();

        store
            .write(&month_key(), &sample_entry())
            .await
            .expect("Write should succeed");

        let expected_path = temp_dir.path().join("USDIDR=X_1mo.json");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = std_fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"data\""));
        assert!(content.contains("\"timestamp\""));
        assert!(content.contains("\"rate\""));
    }

    #[tokio::test]
    async fn test_read_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let result = store.read(&month_key(), Duration::hours(1)).await;

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_data_exactly() {
        let (store, _temp_dir) = create_test_store();
        let entry = sample_entry();

        store.write(&month_key(), &entry).await.unwrap();
        let read = store
            .read(&month_key(), Duration::hours(1))
            .await
            .expect("Fresh entry should be readable");

        assert_eq!(read.data, entry.data);
        assert_eq!(
            read.timestamp.timestamp_millis(),
            entry.timestamp.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_read_treats_expired_entry_as_absent() {
        let (store, _temp_dir) = create_test_store();
        let entry = CacheEntry {
            data: sample_entry().data,
            timestamp: Utc::now() - Duration::hours(2),
        };

        store.write(&month_key(), &entry).await.unwrap();

        assert!(store.read(&month_key(), Duration::hours(1)).await.is_none());
        assert!(store.read(&month_key(), Duration::hours(12)).await.is_some());
    }

    #[tokio::test]
    async fn test_read_treats_corrupt_json_as_absent() {
        let (store, temp_dir) = create_test_store();
        std_fs::write(temp_dir.path().join("USDIDR=X_1mo.json"), "{ not json").unwrap();

        assert!(store.read(&month_key(), Duration::hours(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let store = FileDiskStore::with_dir(&nested_path);

        store.write(&month_key(), &sample_entry()).await.unwrap();

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("USDIDR=X_1mo.json").exists());
    }

    #[tokio::test]
    async fn test_overwrite_existing_entry() {
        let (store, temp_dir) = create_test_store();
        let first = CacheEntry::new(vec![RatePoint::new("2026-10-18", 1.0)]);
        let second = CacheEntry::new(vec![RatePoint::new("2026-10-19", 2.0)]);

        store.write(&month_key(), &first).await.unwrap();
        store.write(&month_key(), &second).await.unwrap();

        let read = store.read(&month_key(), Duration::hours(1)).await.unwrap();
        assert_eq!(read.data, second.data);

        let leftovers: Vec<_> = std_fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "Temporary files should be renamed away");
    }

    #[tokio::test]
    async fn test_mode_and_range_keys_use_separate_files() {
        let (store, temp_dir) = create_test_store();
        let mode_key = CacheKey::derive("USDIDR=X", &QueryShape::Mode(Mode::Daily));

        store.write(&month_key(), &sample_entry()).await.unwrap();
        store.write(&mode_key, &sample_entry()).await.unwrap();

        assert!(temp_dir.path().join("USDIDR=X_1mo.json").exists());
        assert!(temp_dir.path().join("USDIDR=X_mode_daily.json").exists());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileDiskStore::new() {
            let path_str = store.cache_dir.to_string_lossy();
            assert!(path_str.contains("finsight"), "Cache path should contain project name");
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_file_stem_replaces_path_separators() {
        let key = CacheKey::derive("../etc/passwd", &QueryShape::Range(Range::OneWeek));
        assert_eq!(file_stem(&key), ".._etc_passwd_1w");
    }
}
