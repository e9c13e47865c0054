//! Persistent TTL cache mapping URLs to resolved titles.
//!
//! The cache is a single JSON document loaded once at pipeline start,
//! mutated in memory during the run, and persisted once at the end with
//! expired entries stripped. The write is whole-file replace (temp file
//! plus rename), so a crash mid-run loses only the run's new entries and
//! never corrupts existing ones.
//!
//! Concurrent invocations of the tool against the same cache file are not
//! coordinated; the last writer wins. Known limitation, acceptable for a
//! single-user tool that reads once at start and writes once at end.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

const CACHE_DIR_NAME: &str = "hollowbeak";
const CACHE_FILE_NAME: &str = "data.json";

/// A single cached title with its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Disk-persisted URL-to-title cache with per-entry expiration.
#[derive(Debug)]
pub struct TitleCache {
    path: PathBuf,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl TitleCache {
    /// Open a cache backed by the given file.
    ///
    /// A missing file yields an empty cache. A file that exists but does
    /// not parse fails with [`Error::CacheCorrupt`].
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self, Error> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::CacheCorrupt { path: path.clone(), reason: e.to_string() })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "cache file not found, starting with empty cache");
                HashMap::new()
            }
            Err(e) => return Err(Error::CacheIo { path, reason: e.to_string() }),
        };

        tracing::debug!(entries = entries.len(), "cache loaded");
        Ok(Self { path, ttl, entries })
    }

    /// Open the cache at its platform-standard location,
    /// `<config-dir>/hollowbeak/data.json`.
    pub fn open_default(ttl: Duration) -> Result<Self, Error> {
        Self::open(Self::default_path()?, ttl)
    }

    /// Resolve the platform-standard cache file path.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| Error::CacheIo {
            path: PathBuf::from(CACHE_DIR_NAME).join(CACHE_FILE_NAME),
            reason: "could not determine the user configuration directory".to_string(),
        })?;
        Ok(config_dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries currently held in memory, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a title. An expired entry is treated identically to an
    /// absent one and is evicted from memory on the spot.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if Utc::now() > entry.expires_at {
            tracing::trace!(key, "cache entry expired");
            self.entries.remove(key);
            return None;
        }
        tracing::trace!(key, "cache hit");
        Some(entry.value.clone())
    }

    /// Store a title with expiry = now + TTL, overwriting any prior entry.
    pub fn set(&mut self, key: &str, value: &str) {
        tracing::trace!(key, "cache set");
        self.entries
            .insert(key.to_string(), CacheEntry { value: value.to_string(), expires_at: Utc::now() + self.ttl });
    }

    /// Purge expired entries, then persist the full mapping to the backing
    /// file as indented JSON.
    ///
    /// The document is written to a temp file in the same directory and
    /// renamed over the old file, so readers never observe a partial write.
    /// The parent directory is created with owner-only permissions if it
    /// does not exist yet.
    pub fn cleanup_and_save(&mut self) -> Result<(), Error> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = self.entries.len(), "purged expired cache entries");
        }

        let parent = self.path.parent().ok_or_else(|| Error::CacheIo {
            path: self.path.clone(),
            reason: "cache path has no parent directory".to_string(),
        })?;
        create_private_dir(parent).map_err(|e| Error::CacheIo { path: parent.to_path_buf(), reason: e.to_string() })?;

        let json = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| Error::CacheIo { path: self.path.clone(), reason: e.to_string() })?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| Error::CacheIo { path: parent.to_path_buf(), reason: e.to_string() })?;
        tmp.write_all(&json)
            .map_err(|e| Error::CacheIo { path: self.path.clone(), reason: e.to_string() })?;
        tmp.persist(&self.path)
            .map_err(|e| Error::CacheIo { path: self.path.clone(), reason: e.to_string() })?;

        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "cache saved");
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(ttl: Duration) -> (tempfile::TempDir, TitleCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = TitleCache::open(dir.path().join("data.json"), ttl).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_missing_file_yields_empty_cache() {
        let (_dir, cache) = temp_cache(Duration::days(180));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_path_reports_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let cache = TitleCache::open(&path, Duration::days(180)).unwrap();
        assert_eq!(cache.path(), path);
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, mut cache) = temp_cache(Duration::days(180));
        cache.set("https://example.com", "Example Domain");
        assert_eq!(cache.get("https://example.com").as_deref(), Some("Example Domain"));
    }

    #[test]
    fn test_get_absent_key() {
        let (_dir, mut cache) = temp_cache(Duration::days(180));
        assert_eq!(cache.get("https://example.com"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let (_dir, mut cache) = temp_cache(Duration::days(180));
        cache.set("https://example.com", "Old Title");
        cache.set("https://example.com", "New Title");
        assert_eq!(cache.get("https://example.com").as_deref(), Some("New Title"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_evicted() {
        let (_dir, mut cache) = temp_cache(Duration::days(180));
        cache.entries.insert(
            "https://example.com".to_string(),
            CacheEntry { value: "Stale".to_string(), expires_at: Utc::now() - Duration::seconds(1) },
        );
        assert_eq!(cache.get("https://example.com"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_then_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut cache = TitleCache::open(&path, Duration::days(180)).unwrap();
        cache.set("https://a.example", "A");
        cache.set("https://b.example", "B");
        cache.cleanup_and_save().unwrap();

        let mut reloaded = TitleCache::open(&path, Duration::days(180)).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("https://a.example").as_deref(), Some("A"));
        assert_eq!(reloaded.get("https://b.example").as_deref(), Some("B"));
    }

    #[test]
    fn test_cleanup_strips_expired_before_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut cache = TitleCache::open(&path, Duration::days(180)).unwrap();
        cache.set("https://fresh.example", "Fresh");
        cache.entries.insert(
            "https://stale.example".to_string(),
            CacheEntry { value: "Stale".to_string(), expires_at: Utc::now() - Duration::days(1) },
        );
        cache.cleanup_and_save().unwrap();

        let reloaded = TitleCache::open(&path, Duration::days(180)).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_corrupt_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let result = TitleCache::open(&path, Duration::days(180));
        assert!(matches!(result, Err(Error::CacheCorrupt { .. })));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let mut cache = TitleCache::open(&path, Duration::days(180)).unwrap();
        cache.set("https://example.com", "Example Domain");
        cache.cleanup_and_save().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_serialized_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut cache = TitleCache::open(&path, Duration::days(180)).unwrap();
        cache.set("https://example.com", "Example Domain");
        cache.cleanup_and_save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &doc["https://example.com"];
        assert_eq!(entry["value"], "Example Domain");
        assert!(entry["expiresAt"].is_string());
    }
}
