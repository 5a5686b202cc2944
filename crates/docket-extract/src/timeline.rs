//! Timeline extractor (C8): LLM extraction of dated events with ambiguity
//! tagging, plus a later entity-linking pass that resolves each event's
//! mentioned names to entity ids over a bounded worker pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Semaphore;

use docket_core::errors::DocketResult;
use docket_core::ids::{EntityId, MatterId, TimelineEventId};
use docket_core::models::timeline::encode_ambiguity;
use docket_core::models::{DatePrecision, TimelineEvent};
use docket_core::traits::{Llm, LlmRequest};

/// One dated event as the LLM reports it, before ambiguity encoding and
/// entity linking.
#[derive(Debug, Clone)]
pub struct ExtractedDate {
    pub event_date: NaiveDate,
    pub precision: DatePrecision,
    pub event_date_text: String,
    pub event_type: String,
    pub description: String,
    /// 0-100.
    pub confidence: u8,
    pub context_before: String,
    pub context_after: String,
    pub is_ambiguous: bool,
    pub ambiguity_reason: Option<String>,
    pub mentioned_names: Vec<String>,
}

/// Extracts dated events from one chunk's text. `source_page` is the
/// absolute page the chunk covers, attached to every event produced.
pub async fn extract_timeline_events(
    llm: &dyn Llm,
    matter_id: MatterId,
    text: &str,
    source_page: Option<u32>,
) -> DocketResult<Vec<TimelineEvent>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let prompt = format!(
        "Extract every dated event from the following legal text. For each, report \
         event_date (YYYY-MM-DD), precision (day|month|year|unknown), event_date_text \
         (as written), event_type, description, confidence (0-100), and is_ambiguous \
         (true when the written date could plausibly be read as either DD/MM or MM/DD) \
         with an ambiguity_reason when so. Respond as a JSON array.\n\nTEXT:\n{text}"
    );
    let response = llm.complete(LlmRequest::new(prompt)).await?;
    let drafts = parse_response(&response.text);

    Ok(drafts
        .into_iter()
        .map(|d| {
            let description = encode_ambiguity(&d.description, d.is_ambiguous, d.ambiguity_reason.as_deref());
            TimelineEvent {
                id: TimelineEventId::new(),
                matter_id,
                event_date: d.event_date,
                event_date_precision: d.precision,
                event_date_text: d.event_date_text,
                event_type: d.event_type,
                description,
                confidence: d.confidence,
                source_page,
                source_bbox_ids: Vec::new(),
                is_manual: false,
                is_ambiguous: d.is_ambiguous,
                ambiguity_reason: d.ambiguity_reason,
                entities_involved: Vec::new(),
            }
        })
        .collect())
}

fn parse_response(raw: &str) -> Vec<ExtractedDate> {
    let trimmed = raw.trim();
    let json_text = if trimmed.starts_with("```") {
        trimmed.lines().filter(|l| !l.trim_start().starts_with("```")).collect::<Vec<_>>().join("\n")
    } else {
        trimmed.to_string()
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_text) else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let event_date = item.get("event_date")?.as_str().and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;
            let precision = match item.get("precision").and_then(|v| v.as_str()).unwrap_or("unknown") {
                "day" => DatePrecision::Day,
                "month" => DatePrecision::Month,
                "year" => DatePrecision::Year,
                _ => DatePrecision::Unknown,
            };
            Some(ExtractedDate {
                event_date,
                precision,
                event_date_text: item.get("event_date_text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                event_type: item.get("event_type").and_then(|v| v.as_str()).unwrap_or("unspecified").to_string(),
                description: item.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                confidence: item.get("confidence").and_then(|v| v.as_u64()).unwrap_or(50).min(100) as u8,
                context_before: item.get("context_before").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                context_after: item.get("context_after").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                is_ambiguous: item.get("is_ambiguous").and_then(|v| v.as_bool()).unwrap_or(false),
                ambiguity_reason: item.get("ambiguity_reason").and_then(|v| v.as_str()).map(str::to_string),
                mentioned_names: item
                    .get("mentioned_names")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Resolves a mentioned name to a known entity in the matter. Implemented
/// against whatever index the caller already has in hand (C7's
/// `name_index`, or a `MetaStore` lookup); kept as a narrow trait so this
/// crate stays free of a storage dependency.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, matter_id: MatterId, name: &str) -> Option<EntityId>;
}

/// Resolves `entities_involved` for a batch of timeline events over a
/// bounded worker pool (default 10). Each event's mentioned names (carried
/// alongside it, not persisted) are resolved concurrently; events
/// themselves are processed concurrently subject to the same bound.
pub async fn link_entities(
    matter_id: MatterId,
    events: Vec<TimelineEvent>,
    mentioned_names: Vec<Vec<String>>,
    resolver: Arc<dyn EntityResolver>,
    worker_pool_size: usize,
) -> Vec<TimelineEvent> {
    let semaphore = Arc::new(Semaphore::new(worker_pool_size.max(1)));
    let tasks = events.into_iter().zip(mentioned_names.into_iter()).map(|(mut event, names)| {
        let semaphore = Arc::clone(&semaphore);
        let resolver = Arc::clone(&resolver);
        let matter_id = matter_id;
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore not closed");
            let mut resolved = Vec::new();
            for name in &names {
                if let Some(id) = resolver.resolve(matter_id, name).await {
                    if !resolved.contains(&id) {
                        resolved.push(id);
                    }
                }
            }
            event.entities_involved = resolved;
            event
        }
    });

    futures::future::join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::models::timeline::decode_ambiguity;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedResolver(HashMap<String, EntityId>);

    #[async_trait]
    impl EntityResolver for FixedResolver {
        async fn resolve(&self, _matter_id: MatterId, name: &str) -> Option<EntityId> {
            self.0.get(&name.to_lowercase()).copied()
        }
    }

    fn sample_event(matter_id: MatterId, ambiguous: bool) -> TimelineEvent {
        let description = encode_ambiguity("Contract signed", ambiguous, ambiguous.then_some("DD/MM vs MM/DD"));
        TimelineEvent {
            id: TimelineEventId::new(),
            matter_id,
            event_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            event_date_precision: DatePrecision::Day,
            event_date_text: "01/02/2024".into(),
            event_type: "contract_signed".into(),
            description,
            confidence: 80,
            source_page: Some(3),
            source_bbox_ids: Vec::new(),
            is_manual: false,
            is_ambiguous: ambiguous,
            ambiguity_reason: ambiguous.then(|| "DD/MM vs MM/DD".to_string()),
            entities_involved: Vec::new(),
        }
    }

    #[test]
    fn ambiguity_is_encoded_into_description_and_round_trips() {
        let event = sample_event(MatterId::new(), true);
        assert!(event.description.starts_with("[AMBIGUOUS: DD/MM vs MM/DD]"));
        let (ambiguous, reason, desc) = decode_ambiguity(&event.description);
        assert!(ambiguous);
        assert_eq!(reason.as_deref(), Some("DD/MM vs MM/DD"));
        assert_eq!(desc, "Contract signed");
    }

    #[tokio::test]
    async fn link_entities_resolves_names_concurrently_under_bounded_pool() {
        let matter_id = MatterId::new();
        let alice_id = EntityId::new();
        let resolver = Arc::new(FixedResolver(HashMap::from([("alice".to_string(), alice_id)])));
        let events = vec![sample_event(matter_id, false), sample_event(matter_id, false)];
        let names = vec![vec!["Alice".to_string()], vec!["Bob".to_string()]];

        let linked = link_entities(matter_id, events, names, resolver, 10).await;
        assert_eq!(linked[0].entities_involved, vec![alice_id]);
        assert!(linked[1].entities_involved.is_empty());
    }

    #[tokio::test]
    async fn link_entities_never_exceeds_worker_pool_concurrency() {
        struct CountingResolver {
            current: Mutex<usize>,
            max_seen: Mutex<usize>,
        }

        #[async_trait]
        impl EntityResolver for CountingResolver {
            async fn resolve(&self, _matter_id: MatterId, _name: &str) -> Option<EntityId> {
                {
                    let mut current = self.current.lock().unwrap();
                    *current += 1;
                    let mut max_seen = self.max_seen.lock().unwrap();
                    *max_seen = (*max_seen).max(*current);
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                *self.current.lock().unwrap() -= 1;
                None
            }
        }

        let matter_id = MatterId::new();
        let resolver = Arc::new(CountingResolver { current: Mutex::new(0), max_seen: Mutex::new(0) });
        let events: Vec<_> = (0..20).map(|_| sample_event(matter_id, false)).collect();
        let names: Vec<_> = (0..20).map(|_| vec!["Someone".to_string()]).collect();

        link_entities(matter_id, events, names, resolver.clone(), 3).await;
        assert!(*resolver.max_seen.lock().unwrap() <= 3);
    }
}
