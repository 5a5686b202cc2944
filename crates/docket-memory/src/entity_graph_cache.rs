//! Entity-graph cache (C13): same `get_or_build`/staleness/version pattern
//! as [`crate::timeline_cache`], over entities + relationships instead of
//! timeline events.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};

use docket_core::errors::DocketResult;
use docket_core::guard::scoped_key;
use docket_core::ids::MatterId;
use docket_core::models::{Entity, EntityGraphCache, EntityRelationship};
use docket_core::traits::KV;

fn cache_key(matter_id: MatterId) -> String {
    scoped_key("cache:entity_graph", matter_id, &[])
}

async fn load(kv: &dyn KV, matter_id: MatterId) -> DocketResult<Option<EntityGraphCache>> {
    match kv.get(&cache_key(matter_id)).await? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
        None => Ok(None),
    }
}

async fn save(kv: &dyn KV, cache: &EntityGraphCache) -> DocketResult<()> {
    let bytes = serde_json::to_vec(cache)?;
    kv.set(&cache_key(cache.matter_id), bytes, None).await
}

pub async fn get_or_build<F, Fut>(
    kv: &dyn KV,
    matter_id: MatterId,
    last_document_upload: DateTime<Utc>,
    builder: Option<F>,
) -> DocketResult<Option<EntityGraphCache>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DocketResult<(HashMap<String, Entity>, Vec<EntityRelationship>)>>,
{
    let existing = load(kv, matter_id).await?;
    if let Some(cache) = &existing {
        if !cache.is_stale(last_document_upload) {
            return Ok(Some(cache.clone()));
        }
    }

    let Some(builder) = builder else {
        return Ok(None);
    };

    let (entities, relationships) = builder().await?;
    let version = existing.map(|c| c.version + 1).unwrap_or(1);

    let cache = EntityGraphCache {
        matter_id,
        cached_at: Utc::now(),
        version,
        entity_count: entities.len(),
        relationship_count: relationships.len(),
        entities,
        relationships,
    };
    save(kv, &cache).await?;
    Ok(Some(cache))
}

pub async fn invalidate(kv: &dyn KV, matter_id: MatterId) -> DocketResult<()> {
    kv.delete(&cache_key(matter_id)).await
}

/// Invalidates both the timeline and entity-graph caches for a matter —
/// called after ingestion changes per §4.13.
pub async fn invalidate_matter_caches(kv: &dyn KV, matter_id: MatterId) -> DocketResult<()> {
    crate::timeline_cache::invalidate(kv, matter_id).await?;
    invalidate(kv, matter_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::ids::EntityId;
    use docket_core::models::EntityType;
    use docket_storage::InMemoryKv;

    fn entity(matter_id: MatterId, name: &str) -> Entity {
        Entity {
            id: EntityId::new(),
            matter_id,
            canonical_name: name.to_string(),
            entity_type: EntityType::Person,
            aliases: Vec::new(),
            metadata: serde_json::json!({}),
            mention_count: 1,
        }
    }

    #[tokio::test]
    async fn builds_and_persists_counts() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let e = entity(matter_id, "Jane Doe");
        let mut entities = HashMap::new();
        entities.insert(e.canonical_name.clone(), e);

        let cache = get_or_build(&kv, matter_id, Utc::now(), Some(|| async move { Ok((entities, Vec::new())) }))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cache.entity_count, 1);
        assert_eq!(cache.version, 1);
    }

    #[tokio::test]
    async fn invalidate_matter_caches_clears_both() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        get_or_build(&kv, matter_id, Utc::now(), Some(|| async { Ok((HashMap::new(), Vec::new())) }))
            .await
            .unwrap();
        crate::timeline_cache::get_or_build(&kv, matter_id, Utc::now(), Some(|| async { Ok(Vec::new()) }))
            .await
            .unwrap();

        invalidate_matter_caches(&kv, matter_id).await.unwrap();

        assert!(load(&kv, matter_id).await.unwrap().is_none());
        assert!(crate::timeline_cache::get_or_build::<fn() -> std::future::Ready<DocketResult<Vec<docket_core::models::TimelineEvent>>>, _>(&kv, matter_id, Utc::now(), None)
            .await
            .unwrap()
            .is_none());
    }
}
