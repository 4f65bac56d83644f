//! Presence cache traits.
//!
//! The cache is a string key-value store reached through a shared
//! connection pool. Callers check a connection out with
//! [`PresenceCache::acquire`] and the connection goes back to the pool when
//! the returned box is dropped, on every exit path.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use guestbook_core::GuestbookResult;

/// One checked-out cache connection.
///
/// Dropping the value releases it back to its pool.
#[async_trait]
pub trait CacheConnection: Send {
    /// Look up a key. `Ok(None)` means the key is absent.
    async fn get(&mut self, key: &str) -> GuestbookResult<Option<String>>;

    /// Store a value under a key, overwriting any previous value.
    async fn set(&mut self, key: &str, value: &str) -> GuestbookResult<()>;
}

/// Pooled presence cache.
///
/// Implementations must support concurrent checkout from many requests.
#[async_trait]
pub trait PresenceCache: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Check a connection out of the pool.
    async fn acquire(&self) -> GuestbookResult<Box<dyn CacheConnection>>;

    /// Reachability check: takes a connection out and releases it.
    async fn ping(&self) -> GuestbookResult<()> {
        let _conn = self.acquire().await?;
        Ok(())
    }

    /// Current pool occupancy.
    fn status(&self) -> PoolStatus;

    /// Lookup and write counters since startup.
    fn stats(&self) -> CacheStats;
}

/// Pool occupancy snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatus {
    /// Maximum number of connections the pool will hand out.
    pub max_size: usize,
    /// Connections currently open.
    pub size: usize,
    /// Open connections idle in the pool.
    pub available: usize,
}

impl PoolStatus {
    /// Connections currently checked out.
    pub fn in_use(&self) -> usize {
        self.size.saturating_sub(self.available)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Successful writes.
    pub sets: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Atomic counters shared between a cache and its connections.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_lookup(&self, found: bool) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }
}
