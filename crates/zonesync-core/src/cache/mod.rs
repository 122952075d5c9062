// # Zone Cache
//
// Shared, time-bounded read-through cache of raw provider responses.
//
// ## Purpose
//
// A resource's Create commonly calls Read right after writing, and many
// resources usually live in the same zone. Caching the zone listing for a
// short TTL avoids refetching it for every resource in a reconciliation pass.
//
// ## Consistency
//
// - Entries expire `ttl` after they were fetched and are evicted lazily on
//   the next read past expiry
// - Every successful write invalidates its own zone immediately
// - Fetches run without holding the lock; two concurrent misses for one zone
//   both fetch and the later store wins
// - A reader that fetched before a concurrent writer's invalidation may store
//   stale data until the TTL elapses
// - Fetch errors are returned to the caller and never stored

mod client;

pub use client::CachedClient;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;

/// Default lifetime of a cached zone listing
pub const DEFAULT_ZONE_CACHE_TTL: Duration = Duration::from_secs(30);

/// A cached zone listing
#[derive(Debug, Clone)]
pub struct ZoneCacheEntry {
    /// Zone the listing belongs to
    pub zone: String,
    /// Raw provider response
    pub data: Arc<[u8]>,
    /// When the listing was stored
    pub fetched_at: Instant,
    /// How long the listing stays valid
    pub ttl: Duration,
}

impl ZoneCacheEntry {
    /// Whether the entry is still valid at `now`
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) <= self.ttl
    }
}

/// In-memory zone cache
///
/// Cloning is cheap; clones share the same entries.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::cache::ZoneCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = ZoneCache::new();
///     cache.set("example.com", b"{}".to_vec()).await;
///     assert!(cache.get("example.com").await.is_some());
///
///     cache.invalidate("example.com").await;
///     assert!(cache.get("example.com").await.is_none());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ZoneCache {
    inner: Arc<RwLock<HashMap<String, ZoneCacheEntry>>>,
    ttl: Duration,
}

impl ZoneCache {
    /// Create an empty cache with the default 30 second TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_ZONE_CACHE_TTL)
    }

    /// Create an empty cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// TTL applied to new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a zone
    ///
    /// # Returns
    ///
    /// - `Some(data)`: a fresh entry exists
    /// - `None`: no entry, or the entry expired (it is evicted)
    pub async fn get(&self, zone: &str) -> Option<Arc<[u8]>> {
        let now = Instant::now();
        {
            let guard = self.inner.read().await;
            match guard.get(zone) {
                None => return None,
                Some(entry) if entry.is_fresh(now) => return Some(Arc::clone(&entry.data)),
                Some(_) => {}
            }
        }

        let mut guard = self.inner.write().await;
        // Another task may have stored a fresh listing between the two locks.
        if guard.get(zone).is_some_and(|e| !e.is_fresh(now)) {
            debug!(zone, "Evicting expired zone listing");
            guard.remove(zone);
        }
        None
    }

    /// Store a listing for a zone, replacing any existing entry
    pub async fn set(&self, zone: &str, data: impl Into<Arc<[u8]>>) {
        let entry = ZoneCacheEntry {
            zone: zone.to_string(),
            data: data.into(),
            fetched_at: Instant::now(),
            ttl: self.ttl,
        };
        let mut guard = self.inner.write().await;
        guard.insert(zone.to_string(), entry);
    }

    /// Return the cached listing or fetch and store a new one
    ///
    /// `fetch` runs with no lock held. Its error is returned unchanged and
    /// nothing is stored.
    pub async fn get_or_fetch<F, Fut>(&self, zone: &str, fetch: F) -> Result<Arc<[u8]>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if let Some(data) = self.get(zone).await {
            debug!(zone, "Zone cache hit");
            return Ok(data);
        }

        debug!(zone, "Zone cache miss, fetching");
        let data: Arc<[u8]> = fetch().await?.into();
        self.set(zone, Arc::clone(&data)).await;
        Ok(data)
    }

    /// Drop the entry for a zone
    pub async fn invalidate(&self, zone: &str) {
        let mut guard = self.inner.write().await;
        if guard.remove(zone).is_some() {
            debug!(zone, "Invalidated zone cache entry");
        }
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.clear();
    }

    /// Get the number of stored entries (fresh or not yet evicted)
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for ZoneCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cache_basic() {
        let cache = ZoneCache::new();

        assert!(cache.is_empty().await);
        assert!(cache.get("example.com").await.is_none());

        cache.set("example.com", b"data".to_vec()).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("example.com").await.as_deref(), Some(&b"data"[..]));

        cache.invalidate("example.com").await;
        assert!(cache.get("example.com").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let cache = ZoneCache::new();
        cache.set("example.com", b"data".to_vec()).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get("example.com").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("example.com").await.is_none());
        assert_eq!(cache.len().await, 0, "expired entry is evicted on read");
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ZoneCache::new();
        cache.set("a.com", b"a".to_vec()).await;
        cache.set("b.com", b"b".to_vec()).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_or_fetch_hits_after_first_fetch() {
        let cache = ZoneCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let data = cache
                .get_or_fetch("example.com", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(b"zone".to_vec())
                })
                .await
                .unwrap();
            assert_eq!(&data[..], b"zone");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_does_not_cache_errors() {
        let cache = ZoneCache::new();

        let err = cache
            .get_or_fetch("example.com", || async {
                Err(Error::transport("get_records", "connection refused"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(cache.is_empty().await);

        let data = cache
            .get_or_fetch("example.com", || async { Ok(b"ok".to_vec()) })
            .await
            .unwrap();
        assert_eq!(&data[..], b"ok");
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ZoneCache::new();
        let other = cache.clone();

        cache.set("example.com", b"data".to_vec()).await;
        assert!(other.get("example.com").await.is_some());

        other.invalidate("example.com").await;
        assert!(cache.get("example.com").await.is_none());
    }
}
