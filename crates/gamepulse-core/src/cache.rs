//! In-memory upstream response caching with moka.
//!
//! [`CachedFetcher`] memoizes upstream calls. Each entry stores serialized
//! JSON plus its own TTL, so one cache instance serves every endpoint class.
//!
//! ## Cache Key Strategy
//!
//! Keys are derived by the caller (see [`crate::key`]):
//! - Endpoint name (e.g., "trending-games", "genres-stats")
//! - Canonicalized query parameters for parameterized endpoints
//!
//! ## TTL Guidelines
//!
//! | Data Type | TTL | Examples |
//! |-----------|-----|----------|
//! | Live | 30s | top streams, streams per game |
//! | Lists | 5 min | trending games |
//! | Search | 10 min | game search |
//! | Aggregates | 15 min | genre/platform distribution |
//! | Stable data | 60 min | game detail, genre/platform lists |
//!
//! ## Failure semantics
//!
//! A failing producer leaves the cache untouched and its error is returned
//! as-is. An expired entry is never served, even when the refresh fails.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Default cache capacity (number of entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Cached response with metadata.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Serialized JSON response.
    pub json: Arc<str>,
    /// When this entry was cached.
    pub cached_at: chrono::DateTime<chrono::Utc>,
    /// Lifetime requested by the caller that stored it.
    pub ttl: Duration,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(json: String, ttl: Duration) -> Self {
        Self {
            json: json.into(),
            cached_at: chrono::Utc::now(),
            ttl,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Whether the entry's TTL has elapsed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Expires every entry after its own TTL.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Generic memoization layer in front of upstream calls.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct CachedFetcher {
    cache: Cache<String, CacheEntry>,
}

impl Default for CachedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CachedFetcher {
    /// Create a fetcher holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }

    /// Get a cached value or produce and cache it.
    ///
    /// 1. If a fresh entry exists for `key`, deserialize and return it
    /// 2. Otherwise call `producer`
    /// 3. On success, store the value for `ttl` and return it
    /// 4. On failure, store nothing and return the producer's error
    ///
    /// Concurrent misses on the same key each run their producer; the last
    /// one to finish wins the cache write.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let games = fetcher
    ///     .fetch(key::TRENDING_GAMES, ttl::LISTS, || async {
    ///         rawg.trending().await
    ///     })
    ///     .await?;
    /// ```
    pub async fn fetch<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(entry) = self.lookup(key).await {
            match serde_json::from_str(&entry.json) {
                Ok(value) => {
                    tracing::debug!(key = %key, cached_at = %entry.cached_at, "cache hit");
                    metrics::counter!("cache_hits_total").increment(1);
                    return Ok(value);
                }
                Err(e) => {
                    // Corrupted cache entry - log and continue to recompute
                    tracing::warn!(key = %key, error = %e, "failed to deserialize cached entry");
                }
            }
        }

        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache miss, fetching");
        metrics::counter!("cache_misses_total").increment(1);

        let value = producer().await.inspect_err(|e| {
            metrics::counter!("cache_producer_errors_total").increment(1);
            tracing::warn!(key = %key, error = %e, "producer failed, nothing cached");
        })?;

        match serde_json::to_string(&value) {
            Ok(json) => {
                self.cache
                    .insert(key.to_string(), CacheEntry::new(json, ttl))
                    .await;
            }
            Err(e) => {
                // Failed to serialize - log but still return the value
                tracing::warn!(key = %key, error = %e, "failed to serialize for cache");
            }
        }

        Ok(value)
    }

    /// Whether a fresh entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.lookup(key).await.is_some()
    }

    /// Drop the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Fresh entry for `key`; expired entries are removed and reported absent.
    async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await?;
        if entry.is_expired() {
            self.cache.invalidate(key).await;
            return None;
        }
        Some(entry)
    }
}

/// TTL values per endpoint class.
pub mod ttl {
    use std::time::Duration;

    /// Live data (streams) - 30 seconds
    pub const LIVE: Duration = Duration::from_secs(30);

    /// Trending/list snapshots - 5 minutes
    pub const LISTS: Duration = Duration::from_secs(300);

    /// Search results - 10 minutes
    pub const SEARCH: Duration = Duration::from_secs(600);

    /// Aggregate statistics - 15 minutes
    pub const AGGREGATES: Duration = Duration::from_secs(900);

    /// Single-entity detail and reference lists - 1 hour
    pub const STABLE: Duration = Duration::from_secs(3600);
}
