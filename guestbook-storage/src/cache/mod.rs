//! Presence cache: pooled string key-value lookups.
//!
//! The cache only remembers which visitor names have already been stored.
//! There is no eviction, expiry or invalidation; a marker, once written,
//! stays until the backing cache drops it.
//!
//! # Scoped checkout
//!
//! ```ignore
//! let mut conn = cache.acquire().await?;
//! if conn.get(&name).await?.is_none() {
//!     store.persist(&visitor).await?;
//!     conn.set(&name, PRESENCE_MARKER).await?;
//! }
//! // `conn` is returned to the pool here, or at any earlier `?`.
//! ```

pub mod memory;
pub mod redis_backend;
pub mod traits;

pub use memory::InMemoryPresenceCache;
pub use redis_backend::{RedisCacheConfig, RedisPresenceCache};
pub use traits::{CacheConnection, CacheStats, PoolStatus, PresenceCache};
