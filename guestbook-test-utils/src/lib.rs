//! Guestbook Test Utilities
//!
//! Shared test infrastructure for the guestbook workspace:
//! - Fault-injecting visitor stores and presence caches
//! - Proptest generators for visitor names and stored records
//! - Test fixtures for common scenarios
//! - Custom assertions for guestbook error variants

pub use guestbook_storage::{
    CacheConnection, CacheStats, InMemoryPresenceCache, InMemoryVisitorStore, PoolStatus,
    PresenceCache, VisitorStore,
};

pub use guestbook_core::{
    CacheError, GuestbookError, GuestbookResult, StoreError, ValidationError, Visitor,
    VisitorRecord, PRESENCE_MARKER,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

// ============================================================================
// FAULT-INJECTING STORE
// ============================================================================

/// Visitor store that fails selected operations.
///
/// Operations that are not set to fail are delegated to an
/// [`InMemoryVisitorStore`], so the records written so far stay observable.
#[derive(Debug, Clone, Default)]
pub struct FailingVisitorStore {
    inner: InMemoryVisitorStore,
    fail_list: bool,
    fail_persist: bool,
    fail_ping: bool,
}

impl FailingVisitorStore {
    /// A store that fails nothing until told to.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where every operation fails.
    pub fn unreachable() -> Self {
        Self::new().failing_list().failing_persist().failing_ping()
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// The backing in-memory store.
    pub fn inner(&self) -> &InMemoryVisitorStore {
        &self.inner
    }
}

fn store_down() -> StoreError {
    StoreError::Unavailable {
        backend: "failing".to_string(),
        reason: "injected failure".to_string(),
    }
}

#[async_trait]
impl VisitorStore for FailingVisitorStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn list(&self) -> GuestbookResult<Vec<VisitorRecord>> {
        if self.fail_list {
            return Err(store_down().into());
        }
        self.inner.list().await
    }

    async fn persist(&self, visitor: &Visitor) -> GuestbookResult<VisitorRecord> {
        if self.fail_persist {
            return Err(StoreError::WriteFailed {
                backend: "failing".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.persist(visitor).await
    }

    async fn ping(&self) -> GuestbookResult<()> {
        if self.fail_ping {
            return Err(store_down().into());
        }
        Ok(())
    }
}

// ============================================================================
// FAULT-INJECTING CACHES
// ============================================================================

/// Presence cache whose checkouts always fail.
#[derive(Debug, Clone, Default)]
pub struct UnreachablePresenceCache {
    attempts: Arc<AtomicU64>,
}

impl UnreachablePresenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checkout attempts so far.
    pub fn acquire_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceCache for UnreachablePresenceCache {
    fn backend_name(&self) -> &'static str {
        "unreachable"
    }

    async fn acquire(&self) -> GuestbookResult<Box<dyn CacheConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable {
            backend: "unreachable".to_string(),
            reason: "connection refused".to_string(),
        }
        .into())
    }

    fn status(&self) -> PoolStatus {
        PoolStatus::default()
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Presence cache whose connections check out fine but whose commands fail.
///
/// Checkouts go through an [`InMemoryPresenceCache`], so
/// [`checked_out`](Self::checked_out) shows whether connections were
/// released.
#[derive(Debug, Clone, Default)]
pub struct BrokenPresenceCache {
    inner: InMemoryPresenceCache,
    fail_get: bool,
    fail_set: bool,
}

impl BrokenPresenceCache {
    /// Lookups fail; writes succeed.
    pub fn failing_get() -> Self {
        Self {
            fail_get: true,
            ..Default::default()
        }
    }

    /// Lookups succeed; writes fail.
    pub fn failing_set() -> Self {
        Self {
            fail_set: true,
            ..Default::default()
        }
    }

    /// The backing in-memory cache.
    pub fn inner(&self) -> &InMemoryPresenceCache {
        &self.inner
    }

    /// Connections currently checked out.
    pub fn checked_out(&self) -> usize {
        self.inner.checked_out()
    }
}

fn command_failed(command: &str) -> CacheError {
    CacheError::CommandFailed {
        backend: "broken".to_string(),
        command: command.to_string(),
        reason: "injected failure".to_string(),
    }
}

#[async_trait]
impl PresenceCache for BrokenPresenceCache {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn acquire(&self) -> GuestbookResult<Box<dyn CacheConnection>> {
        let conn = self.inner.acquire().await?;
        Ok(Box::new(BrokenConnection {
            conn,
            fail_get: self.fail_get,
            fail_set: self.fail_set,
        }))
    }

    fn status(&self) -> PoolStatus {
        self.inner.status()
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

struct BrokenConnection {
    conn: Box<dyn CacheConnection>,
    fail_get: bool,
    fail_set: bool,
}

#[async_trait]
impl CacheConnection for BrokenConnection {
    async fn get(&mut self, key: &str) -> GuestbookResult<Option<String>> {
        if self.fail_get {
            return Err(command_failed("GET").into());
        }
        self.conn.get(key).await
    }

    async fn set(&mut self, key: &str, value: &str) -> GuestbookResult<()> {
        if self.fail_set {
            return Err(command_failed("SET").into());
        }
        self.conn.set(key, value).await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for visitor data.

    use super::*;
    use chrono::{TimeZone, Utc};
    use guestbook_core::new_visitor_id;
    use proptest::collection::{hash_set, vec};
    use proptest::prelude::*;

    /// Generate a non-blank visitor name.
    pub fn arb_visitor_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 .'-]{0,24}"
    }

    /// Generate a set of distinct non-blank names.
    pub fn arb_distinct_names(max: usize) -> impl Strategy<Value = Vec<String>> {
        hash_set(arb_visitor_name(), 1..=max).prop_map(|names| names.into_iter().collect())
    }

    /// Generate the name column of a stored record: present, empty or missing.
    pub fn arb_stored_name() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            3 => arb_visitor_name().prop_map(Some),
            1 => Just(Some(String::new())),
            1 => Just(None),
        ]
    }

    /// Generate a stored record as another client might have written it.
    pub fn arb_visitor_record() -> impl Strategy<Value = VisitorRecord> {
        (arb_stored_name(), 0i64..4_000_000_000).prop_map(|(name, secs)| VisitorRecord {
            id: new_visitor_id(),
            name,
            created_at: Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now),
        })
    }

    /// Generate a store's worth of records.
    pub fn arb_visitor_records(max: usize) -> impl Strategy<Value = Vec<VisitorRecord>> {
        vec(arb_visitor_record(), 0..=max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use chrono::Utc;
    use guestbook_core::new_visitor_id;

    /// A stored record with the given name column.
    pub fn record(name: Option<&str>) -> VisitorRecord {
        VisitorRecord {
            id: new_visitor_id(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    /// A store holding named, empty and unnamed rows, in that order.
    pub fn store_with_legacy_rows(names: &[&str]) -> InMemoryVisitorStore {
        let mut records: Vec<VisitorRecord> = names.iter().map(|n| record(Some(n))).collect();
        records.push(record(Some("")));
        records.push(record(None));
        InMemoryVisitorStore::with_records(records)
    }

    /// A cache that already holds a marker for each name.
    pub fn cache_with_markers(names: &[&str]) -> GuestbookResult<InMemoryPresenceCache> {
        let cache = InMemoryPresenceCache::new();
        for name in names {
            cache.seed(*name, PRESENCE_MARKER)?;
        }
        Ok(cache)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for guestbook error variants.

    use super::*;

    /// Assert that a result is a store error.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &GuestbookResult<T>) {
        match result {
            Err(GuestbookError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }

    /// Assert that a result is a cache error.
    #[track_caller]
    pub fn assert_cache_error<T: std::fmt::Debug>(result: &GuestbookResult<T>) {
        match result {
            Err(GuestbookError::Cache(_)) => {}
            other => panic!("Expected Cache error, got: {:?}", other),
        }
    }
}
