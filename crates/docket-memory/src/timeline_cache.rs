//! Timeline cache (C13): a derived, matter-scoped snapshot of timeline
//! events with `get_or_build` semantics — reuse a fresh cache if one
//! exists, otherwise (optionally) rebuild and bump the version.

use std::future::Future;

use chrono::{DateTime, Utc};

use docket_core::errors::DocketResult;
use docket_core::guard::scoped_key;
use docket_core::ids::MatterId;
use docket_core::models::{TimelineCache, TimelineEvent};
use docket_core::traits::KV;

fn cache_key(matter_id: MatterId) -> String {
    scoped_key("cache:timeline", matter_id, &[])
}

async fn load(kv: &dyn KV, matter_id: MatterId) -> DocketResult<Option<TimelineCache>> {
    match kv.get(&cache_key(matter_id)).await? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
        None => Ok(None),
    }
}

async fn save(kv: &dyn KV, cache: &TimelineCache) -> DocketResult<()> {
    let bytes = serde_json::to_vec(cache)?;
    kv.set(&cache_key(cache.matter_id), bytes, None).await
}

/// If a cache exists and isn't stale against `last_document_upload`,
/// returns it. Otherwise, if `builder` is supplied, calls it, sorts the
/// returned events ascending by date, bumps `version`, persists, and
/// returns the new cache. With no cache and no builder, returns `None`.
pub async fn get_or_build<F, Fut>(
    kv: &dyn KV,
    matter_id: MatterId,
    last_document_upload: DateTime<Utc>,
    builder: Option<F>,
) -> DocketResult<Option<TimelineCache>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DocketResult<Vec<TimelineEvent>>>,
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

    let mut events = builder().await?;
    events.sort_by_key(|e| e.event_date);
    let version = existing.map(|c| c.version + 1).unwrap_or(1);

    let cache = TimelineCache {
        matter_id,
        cached_at: Utc::now(),
        version,
        event_count: events.len(),
        events,
    };
    save(kv, &cache).await?;
    Ok(Some(cache))
}

pub async fn invalidate(kv: &dyn KV, matter_id: MatterId) -> DocketResult<()> {
    kv.delete(&cache_key(matter_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use docket_core::ids::TimelineEventId;
    use docket_core::models::DatePrecision;
    use docket_storage::InMemoryKv;

    fn event(date: NaiveDate) -> TimelineEvent {
        TimelineEvent {
            id: TimelineEventId::new(),
            matter_id: MatterId::new(),
            event_date: date,
            event_date_precision: DatePrecision::Day,
            event_date_text: date.to_string(),
            event_type: "filing".to_string(),
            description: "event".to_string(),
            confidence: 90,
            source_page: None,
            source_bbox_ids: Vec::new(),
            is_manual: false,
            is_ambiguous: false,
            ambiguity_reason: None,
            entities_involved: Vec::new(),
        }
    }

    #[tokio::test]
    async fn builds_and_sorts_events_ascending() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let upload_time = Utc::now() - Duration::hours(1);

        let events = vec![
            event(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            event(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ];
        let cache = get_or_build(&kv, matter_id, upload_time, Some(|| async move { Ok(events) }))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cache.version, 1);
        assert!(cache.events[0].event_date < cache.events[1].event_date);
    }

    #[tokio::test]
    async fn returns_fresh_cache_without_rebuilding() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let upload_time = Utc::now() - Duration::hours(2);

        get_or_build(&kv, matter_id, upload_time, Some(|| async { Ok(vec![event(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())]) }))
            .await
            .unwrap();

        let later_upload = upload_time - Duration::hours(1);
        let cache = get_or_build::<fn() -> std::future::Ready<DocketResult<Vec<TimelineEvent>>>, _>(&kv, matter_id, later_upload, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cache.version, 1);
    }

    #[tokio::test]
    async fn stale_cache_with_no_builder_returns_none() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let stale_upload = Utc::now() + Duration::hours(1);

        let cache = get_or_build::<fn() -> std::future::Ready<DocketResult<Vec<TimelineEvent>>>, _>(&kv, matter_id, stale_upload, None)
            .await
            .unwrap();
        assert!(cache.is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_cache() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        get_or_build(&kv, matter_id, Utc::now(), Some(|| async { Ok(Vec::new()) })).await.unwrap();
        invalidate(&kv, matter_id).await.unwrap();
        assert!(load(&kv, matter_id).await.unwrap().is_none());
    }
}
