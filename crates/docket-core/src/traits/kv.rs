use async_trait::async_trait;
use std::time::Duration;

use crate::errors::DocketResult;

/// Ephemeral key-value store backing sessions and the query-result cache.
/// Keys are always built with [`crate::guard::scoped_key`]. `set` with no
/// `ttl` means "store indefinitely until evicted by capacity pressure"
/// under an LRU-backed cache layer.
#[async_trait]
pub trait KV: Send + Sync {
    async fn get(&self, key: &str) -> DocketResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> DocketResult<()>;
    async fn delete(&self, key: &str) -> DocketResult<()>;
    /// Delete every key with the given prefix. Used for matter-scoped bulk
    /// invalidation (e.g. a new document upload invalidating query-result
    /// cache entries for that matter).
    async fn delete_prefix(&self, prefix: &str) -> DocketResult<u64>;
}
