//! Redis-backed presence cache.
//!
//! Uses a deadpool-redis pool shared process-wide. Each checkout wraps a
//! pooled connection; dropping the wrapper returns the connection to the
//! pool, so early returns and `?` cannot leak it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, PoolConfig, PoolError, Runtime, Timeouts};
use guestbook_core::{CacheError, CredentialEnv, GuestbookResult, ServiceLookup};

use super::traits::{CacheConnection, CacheCounters, CacheStats, PoolStatus, PresenceCache};

const BACKEND: &str = "redis";

/// Redis connection pool configuration.
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis URI, e.g. `redis://:password@host:6379/0`.
    pub url: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait, create and recycle timeout
    pub timeout: Duration,
}

impl RedisCacheConfig {
    /// Create a configuration for the given URI with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 16,
            timeout: Duration::from_secs(5),
        }
    }

    /// Create configuration from the environment.
    ///
    /// Returns `None` when no Redis URI can be discovered, which callers
    /// treat as "run without a cache".
    ///
    /// Environment variables:
    /// - `VCAP_SERVICES` / `REDISURI` / `redis.properties`: see [`CredentialEnv::discover`]
    /// - `GUESTBOOK_REDIS_POOL_SIZE`: Maximum pooled connections (default: 16)
    /// - `GUESTBOOK_REDIS_TIMEOUT`: Pool timeout in seconds (default: 5)
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), &CredentialEnv::from_env())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source and
    /// credential snapshot.
    pub fn from_lookup<F>(var: F, credentials: &CredentialEnv) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = credentials.discover(&ServiceLookup::REDIS)?;

        let mut config = Self::new(uri.as_str());
        if let Some(max_size) = var("GUESTBOOK_REDIS_POOL_SIZE").and_then(|s| s.parse().ok()) {
            config.max_size = max_size;
        }
        if let Some(secs) = var("GUESTBOOK_REDIS_TIMEOUT").and_then(|s| s.parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first checkout connects.
    pub fn create_pool(&self) -> GuestbookResult<Pool> {
        let mut cfg = Config::from_url(self.url.clone());
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                create: Some(self.timeout),
                recycle: Some(self.timeout),
            },
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Unavailable {
                backend: BACKEND.to_string(),
                reason: format!("Failed to create pool: {}", e),
            })?;

        Ok(pool)
    }
}

/// Presence cache backed by a Redis connection pool.
#[derive(Clone)]
pub struct RedisPresenceCache {
    pool: Pool,
    counters: Arc<CacheCounters>,
}

impl RedisPresenceCache {
    /// Wrap an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Build the pool from configuration.
    pub fn from_config(config: &RedisCacheConfig) -> GuestbookResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }
}

fn pool_error(err: PoolError) -> CacheError {
    tracing::error!("Redis pool error: {:?}", err);
    match err {
        PoolError::Timeout(_) => CacheError::PoolExhausted {
            backend: BACKEND.to_string(),
        },
        other => CacheError::Unavailable {
            backend: BACKEND.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl PresenceCache for RedisPresenceCache {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn acquire(&self) -> GuestbookResult<Box<dyn CacheConnection>> {
        let conn = self.pool.get().await.map_err(pool_error)?;
        Ok(Box::new(RedisConnection {
            conn,
            counters: Arc::clone(&self.counters),
        }))
    }

    fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
        }
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

struct RedisConnection {
    conn: deadpool_redis::Connection,
    counters: Arc<CacheCounters>,
}

fn command_error(command: &str, err: deadpool_redis::redis::RedisError) -> CacheError {
    CacheError::CommandFailed {
        backend: BACKEND.to_string(),
        command: command.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl CacheConnection for RedisConnection {
    async fn get(&mut self, key: &str) -> GuestbookResult<Option<String>> {
        let value = self
            .conn
            .get::<_, Option<String>>(key)
            .await
            .map_err(|e| command_error("GET", e))?;
        self.counters.record_lookup(value.is_some());
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &str) -> GuestbookResult<()> {
        self.conn
            .set::<_, _, ()>(key, value)
            .await
            .map_err(|e| command_error("SET", e))?;
        self.counters.record_set();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RedisCacheConfig::new("redis://localhost:6379");
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_no_credentials_means_no_config() {
        let credentials = CredentialEnv {
            vcap_services: Some("{}".to_string()),
            ..Default::default()
        };
        assert!(RedisCacheConfig::from_lookup(|_| None, &credentials).is_none());
    }

    #[test]
    fn test_pool_settings_from_lookup() {
        let credentials = CredentialEnv {
            overrides: vec![("REDISURI".to_string(), "redis://cache.internal:6379".to_string())],
            properties_dir: std::env::temp_dir().join("guestbook-redis-test-missing"),
            ..Default::default()
        };
        let config = RedisCacheConfig::from_lookup(
            |key| match key {
                "GUESTBOOK_REDIS_POOL_SIZE" => Some("3".to_string()),
                "GUESTBOOK_REDIS_TIMEOUT" => Some("9".to_string()),
                _ => None,
            },
            &credentials,
        );
        let config = config.map(|c| (c.url, c.max_size, c.timeout));
        assert_eq!(
            config,
            Some((
                "redis://cache.internal:6379".to_string(),
                3,
                Duration::from_secs(9)
            ))
        );
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() -> GuestbookResult<()> {
        // Nothing listens on this port; building the pool must still succeed.
        let cache = RedisPresenceCache::from_config(&RedisCacheConfig::new("redis://127.0.0.1:1"))?;
        assert_eq!(cache.status().size, 0);
        assert_eq!(cache.backend_name(), "redis");
        Ok(())
    }

    #[tokio::test]
    #[cfg(feature = "redis-tests")]
    async fn test_live_get_set() -> GuestbookResult<()> {
        use guestbook_core::PRESENCE_MARKER;

        let config = RedisCacheConfig::from_env().ok_or_else(|| CacheError::Unavailable {
            backend: BACKEND.to_string(),
            reason: "set REDISURI to run live cache tests".to_string(),
        })?;
        let cache = RedisPresenceCache::from_config(&config)?;
        let key = format!("guestbook-test-{}", guestbook_core::new_visitor_id());

        let mut conn = cache.acquire().await?;
        assert_eq!(conn.get(&key).await?, None);
        conn.set(&key, PRESENCE_MARKER).await?;
        assert_eq!(conn.get(&key).await?, Some(PRESENCE_MARKER.to_string()));
        Ok(())
    }
}
