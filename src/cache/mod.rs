//! Cache capability: a TTL-bearing string key/value store plus a
//! read-only view of the precomputed suggestion ranking structure.
//!
//! Callers on the search path treat every error from this capability as
//! a cache miss; only the direct dataset operations surface them.

pub mod memory;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for cache store operations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value, `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value under a TTL
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a key, returning whether anything was deleted
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Top `limit` terms of an externally maintained score-ordered term
    /// collection, best first. Population of that structure is out of
    /// scope; this capability only reads it.
    async fn top_terms(&self, key: &str, limit: usize) -> Result<Vec<String>>;
}
