//! TTL-expiring search-result cache.
//!
//! External collaborator, separate from the CDP core (which never touches
//! it): maps a hashed key of `(query, count, freshness)` to a cached result
//! with a store timestamp, persisted as a single JSON file. Entries expire
//! after 48 hours.
//!
//! # Example
//!
//! ```no_run
//! use chrome_cdp::cache::{SearchCache, SearchParams};
//! use serde_json::json;
//!
//! let cache = SearchCache::new(".search-cache.json");
//! let params = SearchParams::new("rust async runtime");
//!
//! if cache.get(&params).is_none() {
//!     let results = json!([{"title": "tokio"}]);
//!     cache.put(&params, results).expect("store");
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as Base64Standard;
use base64::Engine;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Entry time-to-live (48 hours).
pub const CACHE_TTL: Duration = Duration::from_secs(48 * 60 * 60);

/// Maximum length of a cache key.
const KEY_MAX_LEN: usize = 64;

// ============================================================================
// SearchParams
// ============================================================================

/// Parameters identifying a cached search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Search query string.
    pub query: String,
    /// Requested result count.
    pub count: u32,
    /// Freshness window, e.g. `"all"`, `"week"`.
    pub freshness: String,
}

impl SearchParams {
    /// Creates params with default count (5) and freshness (`"all"`).
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 5,
            freshness: "all".to_string(),
        }
    }

    /// Sets the result count.
    #[inline]
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Sets the freshness window.
    #[inline]
    #[must_use]
    pub fn with_freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = freshness.into();
        self
    }

    /// Derives the cache key: base64 of `query_count_freshness`, truncated
    /// to 64 characters.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let raw = format!("{}_{}_{}", self.query, self.count, self.freshness);
        let mut key = Base64Standard.encode(raw);
        key.truncate(KEY_MAX_LEN);
        key
    }
}

// ============================================================================
// CacheEntry
// ============================================================================

/// A stored search result with its store timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached result payload.
    pub results: Value,
    /// Store time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Original query, kept for inspection.
    pub query: String,
    /// Original freshness window.
    pub freshness: String,
}

impl CacheEntry {
    /// Returns `true` if the entry is within the TTL at `now_ms`.
    #[inline]
    #[must_use]
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) < CACHE_TTL.as_millis() as u64
    }
}

// ============================================================================
// CacheStats
// ============================================================================

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total stored entries.
    pub total: usize,
    /// Entries still within the TTL.
    pub fresh: usize,
    /// Entries past the TTL, not yet cleaned.
    pub expired: usize,
    /// Configured TTL in hours.
    pub ttl_hours: u64,
}

// ============================================================================
// SearchCache
// ============================================================================

/// JSON-file backed cache with TTL expiry.
///
/// Every operation loads the file, mutating ones write it back; there is no
/// in-memory state between calls, so concurrent processes see each other's
/// writes (last writer wins).
#[derive(Debug, Clone)]
pub struct SearchCache {
    path: PathBuf,
}

impl SearchCache {
    /// Creates a cache backed by the given file path.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a fresh cached result.
    ///
    /// Returns `None` on miss or if the entry is past the TTL.
    #[must_use]
    pub fn get(&self, params: &SearchParams) -> Option<Value> {
        let cache = self.load();
        let entry = cache.get(&params.cache_key())?;

        let now = now_ms();
        if !entry.is_fresh(now) {
            debug!(query = %params.query, "Cache MISS (expired)");
            return None;
        }

        let age_hours = now.saturating_sub(entry.timestamp) / (60 * 60 * 1000);
        debug!(query = %params.query, age_hours, "Cache HIT");
        Some(entry.results.clone())
    }

    /// Stores a search result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] or [`crate::Error::Json`] if persisting
    /// the cache file fails.
    pub fn put(&self, params: &SearchParams, results: Value) -> Result<()> {
        let mut cache = self.load();

        cache.insert(
            params.cache_key(),
            CacheEntry {
                results,
                timestamp: now_ms(),
                query: params.query.clone(),
                freshness: params.freshness.clone(),
            },
        );

        self.save(&cache)?;
        debug!(query = %params.query, "Cache STORED");
        Ok(())
    }

    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed; the file is rewritten only
    /// when something was actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] or [`crate::Error::Json`] if persisting
    /// the cache file fails.
    pub fn clean(&self) -> Result<usize> {
        let mut cache = self.load();
        let now = now_ms();

        let before = cache.len();
        cache.retain(|_, entry| entry.is_fresh(now));
        let cleaned = before - cache.len();

        if cleaned > 0 {
            self.save(&cache)?;
            debug!(cleaned, "Cleaned expired cache entries");
        }

        Ok(cleaned)
    }

    /// Computes aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let cache = self.load();
        let now = now_ms();

        let fresh = cache.values().filter(|e| e.is_fresh(now)).count();
        CacheStats {
            total: cache.len(),
            fresh,
            expired: cache.len() - fresh,
            ttl_hours: CACHE_TTL.as_secs() / 3600,
        }
    }

    /// Loads the cache file; missing or corrupt files yield an empty map.
    fn load(&self) -> FxHashMap<String, CacheEntry> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return FxHashMap::default(),
        };

        match serde_json::from_str(&data) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse cache file");
                FxHashMap::default()
            }
        }
    }

    /// Writes the cache file, pretty-printed.
    fn save(&self, cache: &FxHashMap<String, CacheEntry>) -> Result<()> {
        let data = serde_json::to_string_pretty(cache)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Current time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::tempdir;

    fn cache_in(dir: &tempfile::TempDir) -> SearchCache {
        SearchCache::new(dir.path().join("cache.json"))
    }

    #[test]
    fn test_key_is_deterministic_and_bounded() {
        let params = SearchParams::new("a very long query ".repeat(20))
            .with_count(10)
            .with_freshness("week");

        let key = params.cache_key();
        assert_eq!(key, params.cache_key());
        assert_eq!(key.len(), KEY_MAX_LEN);

        // Different params, different key.
        let other = SearchParams::new("short");
        assert_ne!(key, other.cache_key());
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempdir().expect("tempdir");
        let cache = cache_in(&dir);

        let params = SearchParams::new("rust async");
        assert_eq!(cache.get(&params), None);

        cache.put(&params, json!([{"title": "tokio"}])).expect("put");
        assert_eq!(cache.get(&params), Some(json!([{"title": "tokio"}])));

        // Different count misses.
        assert_eq!(cache.get(&params.clone().with_count(10)), None);
    }

    #[test]
    fn test_expired_entry_misses_and_cleans() {
        let dir = tempdir().expect("tempdir");
        let cache = cache_in(&dir);

        let fresh = SearchParams::new("fresh");
        let stale = SearchParams::new("stale");
        cache.put(&fresh, json!(1)).expect("put");
        cache.put(&stale, json!(2)).expect("put");

        // Backdate the stale entry past the TTL.
        let mut map = cache.load();
        let key = stale.cache_key();
        map.get_mut(&key).expect("entry").timestamp =
            now_ms() - CACHE_TTL.as_millis() as u64 - 1;
        cache.save(&map).expect("save");

        assert_eq!(cache.get(&stale), None);
        assert_eq!(cache.get(&fresh), Some(json!(1)));

        let stats = cache.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.ttl_hours, 48);

        assert_eq!(cache.clean().expect("clean"), 1);
        assert_eq!(cache.stats().total, 1);
    }

    #[test]
    fn test_clean_without_expired_is_noop() {
        let dir = tempdir().expect("tempdir");
        let cache = cache_in(&dir);

        cache.put(&SearchParams::new("q"), json!(1)).expect("put");
        assert_eq!(cache.clean().expect("clean"), 0);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").expect("write");

        let cache = SearchCache::new(&path);
        assert_eq!(cache.get(&SearchParams::new("q")), None);
        assert_eq!(cache.stats().total, 0);

        // A put over the corrupt file recovers it.
        cache.put(&SearchParams::new("q"), json!(true)).expect("put");
        assert_eq!(cache.get(&SearchParams::new("q")), Some(json!(true)));
    }
}
