use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for cached query results, in seconds.
    pub query_result_ttl_secs: u64,
    /// Max cached query results retained per matter before oldest-entry
    /// eviction.
    pub query_result_capacity_per_matter: usize,
    /// Timeline/entity-graph caches are considered stale after this many
    /// seconds regardless of version, forcing a rebuild on next access.
    pub derived_cache_max_age_secs: u64,
    /// TTL for an idle (matter, user) session before the KV store evicts
    /// it. Sessions are ephemeral by design; nothing here is authoritative.
    pub session_ttl_secs: u64,
    /// Max query history entries returned by a capped-retrieval list call
    /// when the caller doesn't specify a limit.
    pub query_history_default_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_result_ttl_secs: 3600,
            query_result_capacity_per_matter: 200,
            derived_cache_max_age_secs: 86_400,
            session_ttl_secs: 1800,
            query_history_default_limit: 50,
        }
    }
}
