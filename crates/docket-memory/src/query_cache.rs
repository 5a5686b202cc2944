//! Query-result cache (C14). Keys are `cache:query:{matter_id}:{hash}`
//! where `hash` is a 64-hex SHA-256 digest of the normalized query plus
//! any salient parameters — matter isolation is structural, since no key
//! can be constructed without a `matter_id` (see [`docket_core::guard`]).

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use docket_core::config::CacheConfig;
use docket_core::errors::DocketResult;
use docket_core::guard::scoped_key;
use docket_core::ids::MatterId;
use docket_core::models::CachedQueryResult;
use docket_core::traits::KV;

/// 64-char lowercase hex SHA-256 of the normalized query and any salient
/// parameters, joined with `\0` so no parameter-boundary ambiguity can
/// cause a hash collision between distinct inputs.
pub fn query_hash(normalized_query: &str, params: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_query.as_bytes());
    for param in params {
        hasher.update(b"\0");
        hasher.update(param.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn key(matter_id: MatterId, hash: &str) -> String {
    scoped_key("cache:query", matter_id, &[hash])
}

/// Looks up a cached result. Corrupt JSON is treated as a miss: the bad
/// entry is deleted and `Ok(None)` returned rather than surfacing a
/// deserialization error to the caller. A KV backing-store error still
/// propagates: a caller should see a real storage fault rather than have
/// it silently masked as a cache miss.
pub async fn get(kv: &dyn KV, matter_id: MatterId, hash: &str) -> DocketResult<Option<CachedQueryResult>> {
    let k = key(matter_id, hash);
    let Some(bytes) = kv.get(&k).await? else {
        return Ok(None);
    };

    match serde_json::from_slice::<CachedQueryResult>(&bytes) {
        Ok(result) if !result.is_expired(Utc::now()) => Ok(Some(result)),
        Ok(_) => {
            kv.delete(&k).await?;
            Ok(None)
        }
        Err(_) => {
            kv.delete(&k).await?;
            Ok(None)
        }
    }
}

pub async fn put(kv: &dyn KV, result: &CachedQueryResult, config: &CacheConfig) -> DocketResult<()> {
    let bytes = serde_json::to_vec(result)?;
    let ttl = std::time::Duration::from_secs(config.query_result_ttl_secs);
    kv.set(&key(result.matter_id, &result.query_hash), bytes, Some(ttl)).await
}

/// Builds a fresh [`CachedQueryResult`] with `expires_at` set from
/// `config.query_result_ttl_secs`.
pub fn build_result(
    matter_id: MatterId,
    original_query: String,
    normalized_query: String,
    result_summary: String,
    engine_used: String,
    findings_count: u32,
    confidence: f64,
    response_data: serde_json::Value,
    config: &CacheConfig,
) -> CachedQueryResult {
    let now = Utc::now();
    CachedQueryResult {
        query_hash: query_hash(&normalized_query, &[]),
        matter_id,
        original_query,
        normalized_query,
        cached_at: now,
        expires_at: now + Duration::seconds(config.query_result_ttl_secs as i64),
        result_summary,
        engine_used,
        findings_count,
        confidence,
        response_data,
    }
}

/// Bulk-invalidates every cached result for a matter. The KV trait's
/// `delete_prefix` is the cursor-paging boundary: an in-memory backend
/// (see `docket-storage::InMemoryKv`) deletes eagerly, while a networked
/// backend (Redis, etc.) is expected to page internally via its own scan
/// cursor — callers here only ever see the aggregate count removed.
pub async fn invalidate_matter(kv: &dyn KV, matter_id: MatterId) -> DocketResult<u64> {
    kv.delete_prefix(&scoped_key("cache:query", matter_id, &[])).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_storage::InMemoryKv;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let kv = InMemoryKv::default();
        let config = CacheConfig::default();
        let matter_id = MatterId::new();
        let result = build_result(
            matter_id,
            "What is the termination clause?".into(),
            "what is the termination clause".into(),
            "summary".into(),
            "hybrid".into(),
            2,
            85.0,
            serde_json::json!({"hits": []}),
            &config,
        );

        put(&kv, &result, &config).await.unwrap();
        let fetched = get(&kv, matter_id, &result.query_hash).await.unwrap().unwrap();
        assert_eq!(fetched.normalized_query, result.normalized_query);
    }

    #[tokio::test]
    async fn query_hash_is_64_hex_chars() {
        let hash = query_hash("what is the governing law", &[]);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn corrupt_json_is_treated_as_a_miss_and_deleted() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let hash = query_hash("q", &[]);
        kv.set(&key(matter_id, &hash), b"not json".to_vec(), None).await.unwrap();

        let result = get(&kv, matter_id, &hash).await.unwrap();
        assert!(result.is_none());
        assert!(kv.get(&key(matter_id, &hash)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_matter_removes_only_that_matters_entries() {
        let kv = InMemoryKv::default();
        let config = CacheConfig::default();
        let matter_a = MatterId::new();
        let matter_b = MatterId::new();
        let result_a = build_result(matter_a, "q".into(), "q".into(), "s".into(), "hybrid".into(), 0, 50.0, serde_json::json!({}), &config);
        let result_b = build_result(matter_b, "q".into(), "q".into(), "s".into(), "hybrid".into(), 0, 50.0, serde_json::json!({}), &config);
        put(&kv, &result_a, &config).await.unwrap();
        put(&kv, &result_b, &config).await.unwrap();

        let removed = invalidate_matter(&kv, matter_a).await.unwrap();
        assert_eq!(removed, 1);
        assert!(get(&kv, matter_b, &result_b.query_hash).await.unwrap().is_some());
    }
}
