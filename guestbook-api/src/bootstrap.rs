//! Service Bootstrap
//!
//! Turns [`ApiConfig`] into a ready [`VisitorService`]. A dependency that is
//! not configured, or cannot be set up, leaves the service in a degraded
//! mode instead of aborting startup.

use std::sync::Arc;

use guestbook_storage::{
    InMemoryPresenceCache, InMemoryVisitorStore, PresenceCache, RedisCacheConfig,
    RedisPresenceCache, VisitorStore,
};

use crate::config::{ApiConfig, CacheBackend, StoreBackend};
use crate::db::{DbConfig, PostgresVisitorStore};
use crate::services::VisitorService;

/// Build the visitor store selected by the configuration.
pub async fn build_store(backend: StoreBackend, db_config: &DbConfig) -> Option<Arc<dyn VisitorStore>> {
    match backend {
        StoreBackend::None => None,
        StoreBackend::Memory => Some(Arc::new(InMemoryVisitorStore::new())),
        StoreBackend::Postgres => {
            let store = match PostgresVisitorStore::from_config(db_config) {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!(error = %e, "Could not create database pool, running without a store");
                    return None;
                }
            };
            // A failure here is retried by the first request that needs the table.
            if let Err(e) = store.ensure_schema().await {
                tracing::warn!(error = %e, "Could not ensure visitor schema at startup");
            }
            Some(Arc::new(store))
        }
    }
}

/// Build the presence cache selected by the configuration.
pub fn build_cache(
    backend: CacheBackend,
    redis_config: Option<&RedisCacheConfig>,
) -> Option<Arc<dyn PresenceCache>> {
    match backend {
        CacheBackend::None => None,
        CacheBackend::Memory => Some(Arc::new(InMemoryPresenceCache::new())),
        CacheBackend::Redis => {
            let Some(redis_config) = redis_config else {
                tracing::warn!("Redis cache selected but no Redis URI was found, running without a cache");
                return None;
            };
            match RedisPresenceCache::from_config(redis_config) {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    tracing::error!(error = %e, "Could not create Redis pool, running without a cache");
                    None
                }
            }
        }
    }
}

/// Build the visitor service and log the mode it runs in.
pub async fn build_service(config: &ApiConfig) -> VisitorService {
    let store = build_store(config.store, &config.db).await;
    let cache = build_cache(config.cache, config.redis.as_ref());

    let service = VisitorService::new(store, cache).with_name_policy(config.name_policy);
    tracing::info!(
        mode = %service.mode(),
        store = service.store().map(|s| s.backend_name()).unwrap_or("none"),
        cache = service.cache().map(|c| c.backend_name()).unwrap_or("none"),
        name_policy = ?service.name_policy(),
        "Visitor service configured"
    );
    service
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceMode;
    use guestbook_core::NamePolicy;

    #[tokio::test]
    async fn test_memory_backends() {
        let config = ApiConfig {
            store: StoreBackend::Memory,
            cache: CacheBackend::Memory,
            name_policy: NamePolicy::Accept,
            ..Default::default()
        };
        let service = build_service(&config).await;
        assert_eq!(service.mode(), ServiceMode::Persistent);
        assert_eq!(service.name_policy(), NamePolicy::Accept);
    }

    #[tokio::test]
    async fn test_no_backends() {
        let service = build_service(&ApiConfig::default()).await;
        assert_eq!(service.mode(), ServiceMode::NoPersistence);
        assert!(service.cache().is_none());
    }

    #[tokio::test]
    async fn test_redis_without_uri_runs_uncached() {
        let config = ApiConfig {
            store: StoreBackend::Memory,
            cache: CacheBackend::Redis,
            ..Default::default()
        };
        let service = build_service(&config).await;
        assert_eq!(service.mode(), ServiceMode::PersistentUncached);
    }

    #[tokio::test]
    async fn test_redis_with_uri_builds_lazily() {
        let redis = RedisCacheConfig::new("redis://127.0.0.1:1");
        let cache = build_cache(CacheBackend::Redis, Some(&redis));
        assert_eq!(cache.map(|c| c.backend_name()), Some("redis"));
    }

    #[tokio::test]
    async fn test_unreachable_database_keeps_store() {
        let db = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: std::time::Duration::from_secs(1),
            ..Default::default()
        };
        let store = build_store(StoreBackend::Postgres, &db).await;
        assert_eq!(store.map(|s| s.backend_name()), Some("postgres"));
    }
}
