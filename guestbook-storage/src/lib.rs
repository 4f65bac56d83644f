//! Guestbook Storage - Store and Cache Contracts
//!
//! Defines the two collaborators the visitor service depends on: the
//! visitor store (source of truth) and the presence cache (remembers which
//! names are already stored). In-memory implementations back local runs
//! and tests; the Redis cache lives here, the PostgreSQL store lives with
//! the API's database client.

pub mod cache;
pub mod store;

pub use cache::{
    CacheConnection, CacheStats, InMemoryPresenceCache, PoolStatus, PresenceCache,
    RedisCacheConfig, RedisPresenceCache,
};
pub use store::{InMemoryVisitorStore, VisitorStore};
