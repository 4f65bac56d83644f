//! Visitor Service
//!
//! Listing and the cache-assisted create path. The store is the source of
//! truth; the presence cache only short-circuits repeat writes of a name.
//!
//! Ordering within one create is cache lookup, then store write, then
//! marker write. Concurrent creates of the same name are not serialized, so
//! two of them may both miss the cache and both persist.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use guestbook_core::{
    GuestbookError, GuestbookResult, Greeting, NamePolicy, Visitor, VisitorRecord,
    PRESENCE_MARKER,
};
use guestbook_storage::{CacheConnection, PresenceCache, VisitorStore};

use crate::error::ApiResult;
use crate::telemetry::metrics::with_metrics;

/// Which collaborators the service runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Store and cache.
    Persistent,
    /// Store only; every create persists.
    PersistentUncached,
    /// No store; greetings only.
    NoPersistence,
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceMode::Persistent => "persistent",
            ServiceMode::PersistentUncached => "persistent-uncached",
            ServiceMode::NoPersistence => "no-persistence",
        })
    }
}

/// Visitor operations over an optional store and an optional cache.
#[derive(Clone)]
pub struct VisitorService {
    store: Option<Arc<dyn VisitorStore>>,
    cache: Option<Arc<dyn PresenceCache>>,
    name_policy: NamePolicy,
}

impl VisitorService {
    /// Create a service with the default name policy.
    pub fn new(
        store: Option<Arc<dyn VisitorStore>>,
        cache: Option<Arc<dyn PresenceCache>>,
    ) -> Self {
        Self {
            store,
            cache,
            name_policy: NamePolicy::default(),
        }
    }

    pub fn with_name_policy(mut self, name_policy: NamePolicy) -> Self {
        self.name_policy = name_policy;
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn VisitorStore>> {
        self.store.as_ref()
    }

    pub fn cache(&self) -> Option<&Arc<dyn PresenceCache>> {
        self.cache.as_ref()
    }

    pub fn name_policy(&self) -> NamePolicy {
        self.name_policy
    }

    pub fn mode(&self) -> ServiceMode {
        match (&self.store, &self.cache) {
            (Some(_), Some(_)) => ServiceMode::Persistent,
            (Some(_), None) => ServiceMode::PersistentUncached,
            (None, _) => ServiceMode::NoPersistence,
        }
    }

    /// Names of all stored visitors, in store order.
    ///
    /// Records with a missing or empty name are skipped. Without a store the
    /// list is empty.
    pub async fn list_names(&self) -> ApiResult<Vec<String>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };

        let records = observe_store(store.as_ref(), "list", store.list()).await?;
        Ok(records
            .into_iter()
            .filter_map(VisitorRecord::into_listed_name)
            .collect())
    }

    /// Register a visitor and report what happened.
    ///
    /// Store failures are returned; cache failures are logged and bypassed.
    pub async fn create(&self, visitor: Visitor) -> ApiResult<Greeting> {
        let name = self
            .name_policy
            .resolve(visitor.name())
            .map_err(GuestbookError::from)?;

        let greeting = match &self.store {
            // The cache is never consulted without a store behind it.
            None => Greeting::Hello(name),
            Some(store) => self.create_persistent(store.as_ref(), name).await?,
        };

        tracing::debug!(
            outcome = greeting.outcome(),
            name = greeting.name(),
            "Visitor create completed"
        );
        with_metrics(|m| m.record_visitor_create(greeting.outcome()));
        Ok(greeting)
    }

    async fn create_persistent(&self, store: &dyn VisitorStore, name: String) -> ApiResult<Greeting> {
        let mut conn = self.checkout().await;

        let lookup = match conn.as_mut() {
            Some(cache_conn) => Some(cache_conn.get(&name).await),
            None => None,
        };
        match lookup {
            Some(Ok(Some(_))) => return Ok(Greeting::Returning(name)),
            Some(Err(e)) => {
                fail_open("lookup", &e);
                // Release the connection now; it is not reused for the marker.
                conn = None;
            }
            Some(Ok(None)) | None => {}
        }

        let visitor = Visitor::named(name.clone());
        let record = observe_store(store, "persist", store.persist(&visitor)).await?;
        tracing::info!(visitor_id = %record.id, backend = store.backend_name(), "Visitor persisted");

        if let Some(cache_conn) = conn.as_mut() {
            if let Err(e) = cache_conn.set(&name, PRESENCE_MARKER).await {
                fail_open("mark", &e);
            }
        }

        Ok(Greeting::Added(name))
    }

    /// Check a cache connection out, or `None` to continue without one.
    async fn checkout(&self) -> Option<Box<dyn CacheConnection>> {
        let cache = self.cache.as_ref()?;
        match cache.acquire().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                fail_open("acquire", &e);
                None
            }
        }
    }
}

fn fail_open(stage: &'static str, err: &GuestbookError) {
    tracing::warn!(stage, error = %err, "Presence cache unavailable, continuing without it");
    with_metrics(|m| m.record_cache_fail_open(stage));
}

async fn observe_store<T, F>(store: &dyn VisitorStore, operation: &str, fut: F) -> GuestbookResult<T>
where
    F: Future<Output = GuestbookResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_secs_f64();
    with_metrics(|m| m.record_store_operation(store.backend_name(), operation, result.is_ok(), elapsed));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use guestbook_test_utils::{
        fixtures, BrokenPresenceCache, FailingVisitorStore, InMemoryPresenceCache,
        InMemoryVisitorStore, UnreachablePresenceCache,
    };

    fn service(
        store: &InMemoryVisitorStore,
        cache: &InMemoryPresenceCache,
    ) -> VisitorService {
        VisitorService::new(
            Some(Arc::new(store.clone())),
            Some(Arc::new(cache.clone())),
        )
    }

    #[tokio::test]
    async fn test_first_create_persists_and_marks() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = InMemoryPresenceCache::new();
        let service = service(&store, &cache);

        let greeting = service.create(Visitor::named("Bob")).await?;

        assert_eq!(greeting.to_string(), "Hello Bob! I've added you to the database.");
        assert_eq!(store.count_named("Bob"), 1);
        assert_eq!(cache.value("Bob").as_deref(), Some(PRESENCE_MARKER));
        assert_eq!(cache.checked_out(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeat_create_skips_store() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = InMemoryPresenceCache::new();
        let service = service(&store, &cache);

        service.create(Visitor::named("Bob")).await?;
        let greeting = service.create(Visitor::named("Bob")).await?;

        assert_eq!(greeting.to_string(), "Hello Bob! It's nice to see you again.");
        assert_eq!(store.persist_count(), 1);
        assert_eq!(cache.checked_out(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_after_create() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = InMemoryPresenceCache::new();
        let service = service(&store, &cache);

        service.create(Visitor::named("Bob")).await?;
        assert_eq!(service.list_names().await?, vec!["Bob".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_skips_unnamed_records() -> ApiResult<()> {
        let store = fixtures::store_with_legacy_rows(&["Bob", "Jane"]);
        let service = VisitorService::new(Some(Arc::new(store)), None);

        assert_eq!(
            service.list_names().await?,
            vec!["Bob".to_string(), "Jane".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_no_store_never_touches_cache() -> ApiResult<()> {
        let cache = UnreachablePresenceCache::new();
        let service = VisitorService::new(None, Some(Arc::new(cache.clone())));

        assert_eq!(service.mode(), ServiceMode::NoPersistence);
        assert!(service.list_names().await?.is_empty());
        assert_eq!(service.create(Visitor::named("Bob")).await?.to_string(), "Hello Bob!");
        assert_eq!(cache.acquire_attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_uncached_mode_always_persists() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let service = VisitorService::new(Some(Arc::new(store.clone())), None);

        assert_eq!(service.mode(), ServiceMode::PersistentUncached);
        service.create(Visitor::named("Bob")).await?;
        let greeting = service.create(Visitor::named("Bob")).await?;

        assert!(greeting.persisted());
        assert_eq!(store.count_named("Bob"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_cache_fails_open() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let service = VisitorService::new(
            Some(Arc::new(store.clone())),
            Some(Arc::new(UnreachablePresenceCache::new())),
        );

        let greeting = service.create(Visitor::named("Bob")).await?;
        assert_eq!(greeting, Greeting::Added("Bob".to_string()));
        assert_eq!(store.count_named("Bob"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_lookup_fails_open_and_releases() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = BrokenPresenceCache::failing_get();
        let service = VisitorService::new(
            Some(Arc::new(store.clone())),
            Some(Arc::new(cache.clone())),
        );

        let greeting = service.create(Visitor::named("Bob")).await?;
        assert!(greeting.persisted());
        assert_eq!(store.count_named("Bob"), 1);
        assert_eq!(cache.checked_out(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_marker_write_still_succeeds() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = BrokenPresenceCache::failing_set();
        let service = VisitorService::new(
            Some(Arc::new(store.clone())),
            Some(Arc::new(cache.clone())),
        );

        let greeting = service.create(Visitor::named("Bob")).await?;
        assert!(greeting.persisted());
        assert!(!cache.inner().contains("Bob"));
        assert_eq!(cache.checked_out(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_write_failure_is_unavailable_and_unmarked() {
        let store = FailingVisitorStore::new().failing_persist();
        let cache = InMemoryPresenceCache::new();
        let service = VisitorService::new(Some(Arc::new(store)), Some(Arc::new(cache.clone())));

        let err = service.create(Visitor::named("Bob")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(!cache.contains("Bob"));
        assert_eq!(cache.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_store_read_failure_is_unavailable() {
        let service = VisitorService::new(
            Some(Arc::new(FailingVisitorStore::new().failing_list())),
            None,
        );
        let err = service.list_names().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_blank_name_rejected_before_collaborators() {
        let store = InMemoryVisitorStore::new();
        let cache = InMemoryPresenceCache::new();
        let service = service(&store, &cache);

        for visitor in [Visitor::default(), Visitor::named(""), Visitor::named("  ")] {
            let err = service.create(visitor).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::MissingField);
        }
        assert_eq!(store.persist_count(), 0);
        assert_eq!(cache.stats().misses, 0);
    }

    #[tokio::test]
    async fn test_accept_policy_stores_empty_name() -> ApiResult<()> {
        let store = InMemoryVisitorStore::new();
        let cache = InMemoryPresenceCache::new();
        let service = service(&store, &cache).with_name_policy(NamePolicy::Accept);

        let greeting = service.create(Visitor::default()).await?;
        assert_eq!(greeting.to_string(), "Hello ! I've added you to the database.");
        assert_eq!(store.count_named(""), 1);
        assert!(cache.contains(""));
        assert!(service.list_names().await?.is_empty());
        Ok(())
    }
}
