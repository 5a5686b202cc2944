use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::MatterId;
use crate::models::entity::{Entity, EntityRelationship};
use crate::models::timeline::TimelineEvent;

/// `{cached_at, version, events, counts}`. Staleness predicate:
/// `last_document_upload > cached_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineCache {
    pub matter_id: MatterId,
    pub cached_at: DateTime<Utc>,
    pub version: u64,
    /// Sorted ascending by date.
    pub events: Vec<TimelineEvent>,
    pub event_count: usize,
}

impl TimelineCache {
    pub fn is_stale(&self, last_document_upload: DateTime<Utc>) -> bool {
        last_document_upload > self.cached_at
    }
}

/// `{cached_at, version, entities, relationships, counts}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityGraphCache {
    pub matter_id: MatterId,
    pub cached_at: DateTime<Utc>,
    pub version: u64,
    pub entities: HashMap<String, Entity>,
    pub relationships: Vec<EntityRelationship>,
    pub entity_count: usize,
    pub relationship_count: usize,
}

impl EntityGraphCache {
    pub fn is_stale(&self, last_document_upload: DateTime<Utc>) -> bool {
        last_document_upload > self.cached_at
    }
}

/// `{query_hash (64-hex), matter_id, original_query, normalized_query,
/// cached_at, expires_at, result_summary, engine_used, findings_count,
/// confidence, response_data}` with TTL = 1 hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedQueryResult {
    pub query_hash: String,
    pub matter_id: MatterId,
    pub original_query: String,
    pub normalized_query: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub result_summary: String,
    pub engine_used: String,
    pub findings_count: u32,
    pub confidence: f64,
    pub response_data: Value,
}

impl CachedQueryResult {
    pub const TTL_SECONDS: i64 = 3600;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
