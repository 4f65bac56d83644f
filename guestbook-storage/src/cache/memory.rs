//! In-memory presence cache with a bounded connection budget.
//!
//! Behaves like a pooled client: connections are counted while checked
//! out and handed back on drop, so tests can assert that every request
//! path releases what it acquired.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use guestbook_core::{CacheError, GuestbookResult};

use super::traits::{CacheConnection, CacheCounters, CacheStats, PoolStatus, PresenceCache};

/// Default connection budget, matching the Redis pool default.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

#[derive(Debug)]
struct Shared {
    entries: RwLock<HashMap<String, String>>,
    checked_out: AtomicUsize,
    max_connections: usize,
    counters: CacheCounters,
}

/// In-memory presence cache.
#[derive(Debug, Clone)]
pub struct InMemoryPresenceCache {
    shared: Arc<Shared>,
}

impl Default for InMemoryPresenceCache {
    fn default() -> Self {
        Self::with_max_connections(DEFAULT_MAX_CONNECTIONS)
    }
}

impl InMemoryPresenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that refuses checkouts beyond `max_connections`.
    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                checked_out: AtomicUsize::new(0),
                max_connections,
                counters: CacheCounters::default(),
            }),
        }
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.shared
            .entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Value stored under a key.
    pub fn value(&self, key: &str) -> Option<String> {
        self.shared
            .entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.shared.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed a key without going through a connection.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<String>) -> GuestbookResult<()> {
        self.shared
            .entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Connections currently checked out.
    pub fn checked_out(&self) -> usize {
        self.shared.checked_out.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceCache for InMemoryPresenceCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn acquire(&self) -> GuestbookResult<Box<dyn CacheConnection>> {
        let max = self.shared.max_connections;
        self.shared
            .checked_out
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .map_err(|_| CacheError::PoolExhausted {
                backend: self.backend_name().to_string(),
            })?;

        Ok(Box::new(InMemoryConnection {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn status(&self) -> PoolStatus {
        let in_use = self.checked_out();
        PoolStatus {
            max_size: self.shared.max_connections,
            size: in_use,
            available: 0,
        }
    }

    fn stats(&self) -> CacheStats {
        self.shared.counters.snapshot()
    }
}

struct InMemoryConnection {
    shared: Arc<Shared>,
}

#[async_trait]
impl CacheConnection for InMemoryConnection {
    async fn get(&mut self, key: &str) -> GuestbookResult<Option<String>> {
        let value = self
            .shared
            .entries
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .get(key)
            .cloned();
        self.shared.counters.record_lookup(value.is_some());
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &str) -> GuestbookResult<()> {
        self.shared
            .entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .insert(key.to_string(), value.to_string());
        self.shared.counters.record_set();
        Ok(())
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.shared.checked_out.fetch_sub(1, Ordering::SeqCst);
    }
}
