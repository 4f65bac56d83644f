//! Visitor store contract and in-memory implementation.
//!
//! The store is the source of truth for visitors. The service only needs
//! two operations from it (list everything, persist one); ids and
//! timestamps are assigned here, never by callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use guestbook_core::{
    new_visitor_id, GuestbookResult, StoreError, Visitor, VisitorRecord,
};

/// Async persistence contract for visitor records.
///
/// Implementations must be safe for concurrent use by many requests; the
/// service adds no locking of its own.
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// List every stored record in the store's natural order.
    ///
    /// Fails with [`StoreError::Unavailable`] when the store cannot be read.
    async fn list(&self) -> GuestbookResult<Vec<VisitorRecord>>;

    /// Persist one visitor and return the stored record.
    ///
    /// Duplicate names are allowed; deduplication is the caller's concern.
    async fn persist(&self, visitor: &Visitor) -> GuestbookResult<VisitorRecord>;

    /// Cheap reachability check used by readiness.
    async fn ping(&self) -> GuestbookResult<()> {
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory visitor store for local runs and tests.
///
/// Records are kept in insertion order, which is also the listing order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVisitorStore {
    records: Arc<RwLock<Vec<VisitorRecord>>>,
    persist_calls: Arc<AtomicU64>,
}

impl InMemoryVisitorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records, e.g. legacy rows without names.
    pub fn with_records(records: Vec<VisitorRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            persist_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored records carrying exactly this name.
    pub fn count_named(&self, name: &str) -> usize {
        self.records
            .read()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.name.as_deref() == Some(name))
                    .count()
            })
            .unwrap_or(0)
    }

    /// How many times `persist` has been called.
    pub fn persist_count(&self) -> u64 {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Copy of all stored records.
    pub fn snapshot(&self) -> Vec<VisitorRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Remove every record.
    pub fn clear(&self) -> GuestbookResult<()> {
        self.records
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl VisitorStore for InMemoryVisitorStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> GuestbookResult<Vec<VisitorRecord>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.clone())
    }

    async fn persist(&self, visitor: &Visitor) -> GuestbookResult<VisitorRecord> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);

        let record = VisitorRecord {
            id: new_visitor_id(),
            name: visitor.name.clone(),
            created_at: Utc::now(),
        };

        self.records
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .push(record.clone());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_then_list_keeps_order() -> GuestbookResult<()> {
        let store = InMemoryVisitorStore::new();
        store.persist(&Visitor::named("Bob")).await?;
        store.persist(&Visitor::named("Jane")).await?;

        let names: Vec<_> = store
            .list()
            .await?
            .into_iter()
            .filter_map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Bob".to_string(), "Jane".to_string()]);
        assert_eq!(store.persist_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_persist_assigns_ids() -> GuestbookResult<()> {
        let store = InMemoryVisitorStore::new();
        let first = store.persist(&Visitor::named("Bob")).await?;
        let second = store.persist(&Visitor::named("Bob")).await?;

        assert_ne!(first.id, second.id);
        assert_eq!(store.count_named("Bob"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_with_records_and_clear() -> GuestbookResult<()> {
        let store = InMemoryVisitorStore::with_records(vec![VisitorRecord {
            id: new_visitor_id(),
            name: None,
            created_at: Utc::now(),
        }]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.persist_count(), 0);

        store.clear()?;
        assert!(store.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_clones_share_records() -> GuestbookResult<()> {
        let store = InMemoryVisitorStore::new();
        let handle = store.clone();
        handle.persist(&Visitor::named("Ann")).await?;
        assert_eq!(store.count_named("Ann"), 1);
        Ok(())
    }
}
