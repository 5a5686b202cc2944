//! Query history (C13): an append-only per-matter log, stored as a single
//! JSON-encoded list under one KV key. Capped retrieval trims at read time
//! — the stored list itself is never truncated, since the log is
//! append-only.

use docket_core::config::CacheConfig;
use docket_core::errors::DocketResult;
use docket_core::guard::scoped_key;
use docket_core::ids::MatterId;
use docket_core::models::QueryHistoryEntry;
use docket_core::traits::KV;

fn history_key(matter_id: MatterId) -> String {
    scoped_key("query_history", matter_id, &[])
}

async fn load(kv: &dyn KV, matter_id: MatterId) -> DocketResult<Vec<QueryHistoryEntry>> {
    match kv.get(&history_key(matter_id)).await? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
        None => Ok(Vec::new()),
    }
}

async fn save(kv: &dyn KV, matter_id: MatterId, entries: &[QueryHistoryEntry]) -> DocketResult<()> {
    let bytes = serde_json::to_vec(entries)?;
    kv.set(&history_key(matter_id), bytes, None).await
}

/// Appends `entry` to the matter's query history.
pub async fn append(kv: &dyn KV, matter_id: MatterId, entry: QueryHistoryEntry) -> DocketResult<()> {
    let mut entries = load(kv, matter_id).await?;
    entries.push(entry);
    save(kv, matter_id, &entries).await
}

/// Returns the most recent `limit` entries (default from
/// [`CacheConfig::query_history_default_limit`]), most recent last —
/// matching the append order.
pub async fn list(kv: &dyn KV, matter_id: MatterId, limit: Option<usize>, config: &CacheConfig) -> DocketResult<Vec<QueryHistoryEntry>> {
    let limit = limit.unwrap_or(config.query_history_default_limit);
    let entries = load(kv, matter_id).await?;
    let start = entries.len().saturating_sub(limit);
    Ok(entries[start..].to_vec())
}

/// Read-modify-write: marks the most recent entry whose `query` matches
/// `query_text` as attorney-verified. Returns `false` with no write if no
/// matching entry exists.
pub async fn mark_query_verified(kv: &dyn KV, matter_id: MatterId, query_text: &str) -> DocketResult<bool> {
    let mut entries = load(kv, matter_id).await?;
    match entries.iter_mut().rev().find(|e| e.query == query_text) {
        Some(entry) => {
            entry.attorney_verified = true;
            save(kv, matter_id, &entries).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docket_storage::InMemoryKv;

    fn entry(matter_id: MatterId, query: &str) -> QueryHistoryEntry {
        QueryHistoryEntry {
            matter_id,
            query: query.to_string(),
            engines_used: vec!["hybrid".to_string()],
            confidence: 80.0,
            prompt_tokens: 100,
            completion_tokens: 50,
            attorney_verified: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_and_list_round_trip() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        append(&kv, matter_id, entry(matter_id, "what is the termination clause")).await.unwrap();
        append(&kv, matter_id, entry(matter_id, "who are the parties")).await.unwrap();

        let history = list(&kv, matter_id, None, &CacheConfig::default()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].query, "who are the parties");
    }

    #[tokio::test]
    async fn list_caps_to_limit() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        for i in 0..5 {
            append(&kv, matter_id, entry(matter_id, &format!("query {i}"))).await.unwrap();
        }
        let history = list(&kv, matter_id, Some(2), &CacheConfig::default()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].query, "query 4");
    }

    #[tokio::test]
    async fn mark_query_verified_updates_matching_entry() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        append(&kv, matter_id, entry(matter_id, "what is the governing law")).await.unwrap();

        let marked = mark_query_verified(&kv, matter_id, "what is the governing law").await.unwrap();
        assert!(marked);

        let history = list(&kv, matter_id, None, &CacheConfig::default()).await.unwrap();
        assert!(history[0].attorney_verified);
    }

    #[tokio::test]
    async fn mark_query_verified_missing_query_is_a_noop() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let marked = mark_query_verified(&kv, matter_id, "never asked").await.unwrap();
        assert!(!marked);
    }
}
