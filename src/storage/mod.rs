//! Persistent cache capability.
//!
//! The aggregator stores its merged item list under one well-known key.
//! [`FeedCache`] is the seam; [`Database`] (SQLite) is the persistent
//! implementation and [`MemoryCache`] the process-local one.

mod cache;
mod memory;
mod schema;
mod types;

use async_trait::async_trait;
use std::time::Duration;

pub use memory::MemoryCache;
pub use schema::Database;
pub use types::{CacheEntry, CacheError, DatabaseError};

/// String-keyed store with TTL semantics.
///
/// `get` reports entries together with their expiry and leaves the staleness
/// decision to the caller. Every failure is a `CacheError`; callers that
/// treat the cache as best-effort match on it explicitly.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}
