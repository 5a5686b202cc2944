//! Batch verification task run when a cited act's statute document is
//! uploaded: flips that act's `act_unavailable` citations to `pending`,
//! verifies each in turn, and broadcasts progress over the matter's event
//! channel.

use std::future::Future;
use std::time::Duration;

use docket_core::config::OrchestratorConfig;
use docket_core::errors::DocketResult;
use docket_core::ids::MatterId;
use docket_core::models::VerificationStatus;
use docket_core::traits::{Broker, BrokerMessage, MetaStore};

use crate::verify::verify_citation;

/// Per-act terminal counts, `VERIFICATION_COMPLETE`'s payload.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct VerificationBatchSummary {
    pub verified: u32,
    pub mismatch: u32,
    pub not_found: u32,
    pub errors: u32,
}

impl VerificationBatchSummary {
    pub fn total(&self) -> u32 {
        self.verified + self.mismatch + self.not_found + self.errors
    }
}

fn event_topic(matter_id: MatterId) -> String {
    format!("matter:{matter_id}:events")
}

/// Runs the act-upload verification batch for every citation currently
/// `act_unavailable` against `act_name_normalized`. Runs entirely on the
/// caller's task — no per-citation spawn — per the "single cooperative
/// scheduling context" requirement: a storm of per-citation tasks would
/// starve the rest of the scheduler on a large act.
pub async fn verify_act_citations(
    meta: &dyn MetaStore,
    broker: &dyn Broker,
    matter_id: MatterId,
    act_name_normalized: &str,
    config: &OrchestratorConfig,
) -> DocketResult<VerificationBatchSummary> {
    let act_document_id = meta
        .get_act_resolution(matter_id, act_name_normalized)
        .await?
        .and_then(|r| r.act_document_id);

    let statute_bboxes = match act_document_id {
        Some(doc_id) => meta.list_bounding_boxes(doc_id).await?,
        None => Vec::new(),
    };

    let pending = meta.list_pending_by_act(matter_id, act_name_normalized).await?;
    let total = pending.len();
    let mut summary = VerificationBatchSummary::default();

    for (i, mut citation) in pending.into_iter().enumerate() {
        let outcome = verify_citation(&citation, &statute_bboxes);

        citation.verification_status = outcome.status;
        if let Some(page) = outcome.target_page {
            citation.page_number = Some(page);
        }

        let persisted = with_backoff(config, || async {
            meta.update_citation_status(matter_id, citation.id, citation.clone()).await
        })
        .await;

        match persisted {
            Ok(()) => {
                match outcome.status {
                    VerificationStatus::Verified => summary.verified += 1,
                    VerificationStatus::Mismatch => summary.mismatch += 1,
                    VerificationStatus::SectionNotFound => summary.not_found += 1,
                    _ => summary.errors += 1,
                }

                broker
                    .publish(BrokerMessage {
                        topic: event_topic(matter_id),
                        payload: serde_json::json!({
                            "event": "CITATION_VERIFIED",
                            "citation_id": citation.id,
                            "status": outcome.status,
                            "similarity_score": outcome.similarity_score,
                        }),
                    })
                    .await?;
            }
            Err(e) => {
                tracing::error!(citation_id = %citation.id, error = %e, "citation verification persist failed, recording error status");
                summary.errors += 1;
                citation.verification_status = VerificationStatus::Error;
                // Best-effort: an error persisting the error status itself
                // doesn't abort the batch.
                let _ = meta.update_citation_status(matter_id, citation.id, citation.clone()).await;

                // Every counted outcome gets a CITATION_VERIFIED event, this
                // path included, so VERIFICATION_COMPLETE's counts always
                // equal the number of CITATION_VERIFIED events emitted.
                broker
                    .publish(BrokerMessage {
                        topic: event_topic(matter_id),
                        payload: serde_json::json!({
                            "event": "CITATION_VERIFIED",
                            "citation_id": citation.id,
                            "status": VerificationStatus::Error,
                            "similarity_score": outcome.similarity_score,
                        }),
                    })
                    .await?;
            }
        }

        broker
            .publish(BrokerMessage {
                topic: event_topic(matter_id),
                payload: serde_json::json!({
                    "event": "PROGRESS",
                    "completed": i + 1,
                    "total": total,
                }),
            })
            .await?;
    }

    broker
        .publish(BrokerMessage {
            topic: event_topic(matter_id),
            payload: serde_json::json!({
                "event": "VERIFICATION_COMPLETE",
                "verified": summary.verified,
                "mismatch": summary.mismatch,
                "not_found": summary.not_found,
                "errors": summary.errors,
            }),
        })
        .await?;

    Ok(summary)
}

/// Retries `op` with the configured backoff schedule while its error is
/// [`DocketError::retryable`](docket_core::errors::DocketError::retryable),
/// up to `verification_max_attempts` total tries. Sleeps in place rather
/// than spawning, keeping the whole batch on one scheduling context.
async fn with_backoff<F, Fut, T>(config: &OrchestratorConfig, mut op: F) -> DocketResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DocketResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.retryable() && attempt + 1 < config.verification_max_attempts => {
                let delay = config
                    .verification_backoff_secs
                    .get(attempt as usize)
                    .copied()
                    .unwrap_or_else(|| config.verification_backoff_secs.last().copied().unwrap_or(30));
                tracing::warn!(attempt, delay_secs = delay, error = %e, "citation verification step failed, retrying");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::ids::DocumentId;
    use docket_core::models::{ActResolution, ActResolutionStatus, ActUserAction, BoundingBox, TimelineEvent};
    use docket_storage::StorageEngine;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn unavailable_citation(source_document_id: DocumentId, act_name: &str, quoted: &str) -> docket_core::models::ExtractedCitation {
        let mut citation = test_fixtures::citation(source_document_id);
        citation.act_name = act_name.to_string();
        citation.canonical_act_name = Some(act_name.to_string());
        citation.section = "138".to_string();
        citation.raw_text = "Section 138".to_string();
        citation.quoted_text = Some(quoted.to_string());
        citation.verification_status = VerificationStatus::ActUnavailable;
        citation
    }

    fn bbox(document_id: DocumentId, page: u32, text: &str) -> BoundingBox {
        BoundingBox {
            id: docket_core::ids::BoundingBoxId::new(),
            document_id,
            page_number: page,
            text: text.to_string(),
            confidence: 0.95,
            reading_order_index: 0,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    #[tokio::test]
    async fn batch_flips_act_unavailable_citations_and_reports_counts() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let case_document = test_fixtures::document(matter_id);
        let case_doc = case_document.id;
        let act_document = test_fixtures::act_document(matter_id, "negotiable-instruments-act");
        let act_doc = act_document.id;

        meta.insert_document(&case_document).await.unwrap();
        meta.insert_document(&act_document).await.unwrap();
        meta.replace_bounding_boxes(
            act_doc,
            vec![bbox(act_doc, 12, "where any cheque is returned by the bank unpaid dishonour of cheque")],
        )
        .await
        .unwrap();
        meta.upsert_act_resolution(
            matter_id,
            &ActResolution {
                act_name_normalized: "negotiable instruments act".into(),
                act_name_display: "Negotiable Instruments Act".into(),
                act_document_id: Some(act_doc),
                resolution_status: ActResolutionStatus::Available,
                user_action: ActUserAction::Uploaded,
                citation_count: 2,
            },
        )
        .await
        .unwrap();

        let matched = unavailable_citation(case_doc, "Negotiable Instruments Act", "cheque is returned by the bank unpaid dishonour of cheque");
        let unmatched = unavailable_citation(case_doc, "Negotiable Instruments Act", "wholly unrelated quoted text about land records");
        meta.insert_citations(matter_id, vec![matched, unmatched]).await.unwrap();

        let broker = docket_storage::InMemoryBroker::new();
        let config = OrchestratorConfig::default();

        let summary = verify_act_citations(&meta, &broker, matter_id, "negotiable instruments act", &config).await.unwrap();

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.verified, 1);
        assert_eq!(summary.not_found, 1);

        let events = broker.poll(&event_topic(matter_id), 10).await.unwrap();
        let complete_events = events.iter().filter(|m| m.payload["event"] == "VERIFICATION_COMPLETE").count();
        let verified_events = events.iter().filter(|m| m.payload["event"] == "CITATION_VERIFIED").count();
        assert_eq!(complete_events, 1);
        assert_eq!(verified_events, 2);
    }

    #[tokio::test]
    async fn with_backoff_retries_retryable_errors_up_to_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = OrchestratorConfig {
            verification_backoff_secs: vec![0, 0, 0],
            verification_max_attempts: 3,
            ..OrchestratorConfig::default()
        };

        tokio::time::pause();

        let calls_clone = calls.clone();
        let result: DocketResult<()> = with_backoff(&config, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(docket_core::errors::DocketError::SearchFailed { message: "transient".into() })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_backoff_does_not_retry_non_retryable_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = OrchestratorConfig::default();

        let calls_clone = calls.clone();
        let result: DocketResult<()> = with_backoff(&config, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(docket_core::errors::DocketError::ItemNotFound)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Forwards every read to the wrapped [`StorageEngine`] but fails
    /// `update_citation_status` unconditionally, simulating a persist
    /// failure that exhausts retries.
    struct FailingPersistMetaStore {
        inner: StorageEngine,
    }

    #[async_trait::async_trait]
    impl MetaStore for FailingPersistMetaStore {
        async fn is_member(&self, matter_id: MatterId, user_id: docket_core::ids::UserId) -> DocketResult<bool> {
            self.inner.is_member(matter_id, user_id).await
        }
        async fn matter_members(&self, matter_id: MatterId) -> DocketResult<Vec<docket_core::models::MatterMember>> {
            self.inner.matter_members(matter_id).await
        }
        async fn list_matters_for_user(&self, user_id: docket_core::ids::UserId) -> DocketResult<Vec<docket_core::models::Matter>> {
            self.inner.list_matters_for_user(user_id).await
        }
        async fn upsert_matter(&self, matter: &docket_core::models::Matter) -> DocketResult<()> {
            self.inner.upsert_matter(matter).await
        }
        async fn add_matter_member(&self, member: &docket_core::models::MatterMember) -> DocketResult<()> {
            self.inner.add_matter_member(member).await
        }
        async fn insert_document(&self, document: &docket_core::models::Document) -> DocketResult<()> {
            self.inner.insert_document(document).await
        }
        async fn get_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Option<docket_core::models::Document>> {
            self.inner.get_document(matter_id, document_id).await
        }
        async fn list_documents(&self, matter_id: MatterId) -> DocketResult<Vec<docket_core::models::Document>> {
            self.inner.list_documents(matter_id).await
        }
        async fn soft_delete_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<()> {
            self.inner.soft_delete_document(matter_id, document_id).await
        }
        async fn replace_bounding_boxes(&self, document_id: DocumentId, bboxes: Vec<BoundingBox>) -> DocketResult<()> {
            self.inner.replace_bounding_boxes(document_id, bboxes).await
        }
        async fn list_bounding_boxes(&self, document_id: DocumentId) -> DocketResult<Vec<BoundingBox>> {
            self.inner.list_bounding_boxes(document_id).await
        }
        async fn replace_chunks(&self, matter_id: MatterId, document_id: DocumentId, chunks: Vec<docket_core::models::Chunk>) -> DocketResult<()> {
            self.inner.replace_chunks(matter_id, document_id, chunks).await
        }
        async fn get_chunk(&self, matter_id: MatterId, chunk_id: docket_core::ids::ChunkId) -> DocketResult<Option<docket_core::models::Chunk>> {
            self.inner.get_chunk(matter_id, chunk_id).await
        }
        async fn list_chunks(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Vec<docket_core::models::Chunk>> {
            self.inner.list_chunks(matter_id, document_id).await
        }
        async fn fts_search(&self, matter_id: MatterId, query: &str, limit: usize) -> DocketResult<Vec<(docket_core::ids::ChunkId, f64)>> {
            self.inner.fts_search(matter_id, query, limit).await
        }
        async fn insert_citations(&self, matter_id: MatterId, citations: Vec<docket_core::models::ExtractedCitation>) -> DocketResult<()> {
            self.inner.insert_citations(matter_id, citations).await
        }
        async fn get_citation(&self, matter_id: MatterId, citation_id: docket_core::ids::CitationId) -> DocketResult<Option<docket_core::models::ExtractedCitation>> {
            self.inner.get_citation(matter_id, citation_id).await
        }
        async fn list_citations(&self, matter_id: MatterId, document_id: Option<DocumentId>) -> DocketResult<Vec<docket_core::models::ExtractedCitation>> {
            self.inner.list_citations(matter_id, document_id).await
        }
        async fn update_citation_status(&self, _matter_id: MatterId, _citation_id: docket_core::ids::CitationId, _citation: docket_core::models::ExtractedCitation) -> DocketResult<()> {
            Err(docket_core::errors::DocketError::DatabaseNotConfigured { message: "simulated persist failure".to_string() })
        }
        async fn list_pending_by_act(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Vec<docket_core::models::ExtractedCitation>> {
            self.inner.list_pending_by_act(matter_id, act_name_normalized).await
        }
        async fn upsert_act_resolution(&self, matter_id: MatterId, resolution: &ActResolution) -> DocketResult<()> {
            self.inner.upsert_act_resolution(matter_id, resolution).await
        }
        async fn get_act_resolution(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Option<ActResolution>> {
            self.inner.get_act_resolution(matter_id, act_name_normalized).await
        }
        async fn list_act_resolutions(&self, matter_id: MatterId) -> DocketResult<Vec<ActResolution>> {
            self.inner.list_act_resolutions(matter_id).await
        }
        async fn upsert_entity(&self, entity: &docket_core::models::Entity) -> DocketResult<docket_core::ids::EntityId> {
            self.inner.upsert_entity(entity).await
        }
        async fn get_entity(&self, matter_id: MatterId, entity_id: docket_core::ids::EntityId) -> DocketResult<Option<docket_core::models::Entity>> {
            self.inner.get_entity(matter_id, entity_id).await
        }
        async fn list_entities(&self, matter_id: MatterId) -> DocketResult<Vec<docket_core::models::Entity>> {
            self.inner.list_entities(matter_id).await
        }
        async fn insert_relationship(&self, relationship: &docket_core::models::EntityRelationship) -> DocketResult<()> {
            self.inner.insert_relationship(relationship).await
        }
        async fn list_relationships(&self, matter_id: MatterId) -> DocketResult<Vec<docket_core::models::EntityRelationship>> {
            self.inner.list_relationships(matter_id).await
        }
        async fn insert_timeline_events(&self, matter_id: MatterId, events: Vec<TimelineEvent>) -> DocketResult<()> {
            self.inner.insert_timeline_events(matter_id, events).await
        }
        async fn list_timeline_events(&self, matter_id: MatterId) -> DocketResult<Vec<TimelineEvent>> {
            self.inner.list_timeline_events(matter_id).await
        }
        async fn create_job(&self, job: &docket_core::models::Job) -> DocketResult<()> {
            self.inner.create_job(job).await
        }
        async fn get_job(&self, matter_id: MatterId, job_id: docket_core::ids::JobId) -> DocketResult<Option<docket_core::models::Job>> {
            self.inner.get_job(matter_id, job_id).await
        }
        async fn update_job(&self, job: &docket_core::models::Job) -> DocketResult<()> {
            self.inner.update_job(job).await
        }
        async fn append_stage_history(&self, entry: &docket_core::models::StageHistoryEntry) -> DocketResult<()> {
            self.inner.append_stage_history(entry).await
        }
        async fn list_stage_history(&self, matter_id: MatterId, job_id: docket_core::ids::JobId) -> DocketResult<Vec<docket_core::models::StageHistoryEntry>> {
            self.inner.list_stage_history(matter_id, job_id).await
        }
        async fn upsert_finding_verification(&self, record: &docket_core::models::FindingVerification) -> DocketResult<()> {
            self.inner.upsert_finding_verification(record).await
        }
        async fn get_finding_verification(&self, matter_id: MatterId, finding_id: docket_core::ids::FindingId) -> DocketResult<Option<docket_core::models::FindingVerification>> {
            self.inner.get_finding_verification(matter_id, finding_id).await
        }
        async fn list_finding_verifications(&self, matter_id: MatterId) -> DocketResult<Vec<docket_core::models::FindingVerification>> {
            self.inner.list_finding_verifications(matter_id).await
        }
    }

    /// Spec §8 invariant 5: the sum of `VERIFICATION_COMPLETE`'s counts
    /// equals the number of `CITATION_VERIFIED` events emitted, even when
    /// every citation's status persist fails and retries are exhausted.
    #[tokio::test]
    async fn persist_failure_still_emits_a_citation_verified_event_per_citation() {
        let inner = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let case_document = test_fixtures::document(matter_id);
        let case_doc = case_document.id;
        let act_document = test_fixtures::act_document(matter_id, "negotiable-instruments-act");
        let act_doc = act_document.id;

        inner.insert_document(&case_document).await.unwrap();
        inner.insert_document(&act_document).await.unwrap();
        inner
            .replace_bounding_boxes(act_doc, vec![bbox(act_doc, 12, "where any cheque is returned by the bank unpaid")])
            .await
            .unwrap();
        inner
            .upsert_act_resolution(
                matter_id,
                &ActResolution {
                    act_name_normalized: "negotiable instruments act".into(),
                    act_name_display: "Negotiable Instruments Act".into(),
                    act_document_id: Some(act_doc),
                    resolution_status: ActResolutionStatus::Available,
                    user_action: ActUserAction::Uploaded,
                    citation_count: 2,
                },
            )
            .await
            .unwrap();

        let matched = unavailable_citation(case_doc, "Negotiable Instruments Act", "cheque is returned by the bank unpaid");
        let unmatched = unavailable_citation(case_doc, "Negotiable Instruments Act", "wholly unrelated quoted text about land records");
        inner.insert_citations(matter_id, vec![matched, unmatched]).await.unwrap();

        let meta = FailingPersistMetaStore { inner };
        let broker = docket_storage::InMemoryBroker::new();
        let config = OrchestratorConfig {
            verification_backoff_secs: vec![0],
            verification_max_attempts: 1,
            ..OrchestratorConfig::default()
        };

        let summary = verify_act_citations(&meta, &broker, matter_id, "negotiable instruments act", &config).await.unwrap();
        assert_eq!(summary.errors, 2);

        let events = broker.poll(&event_topic(matter_id), 10).await.unwrap();
        let complete_events: Vec<_> = events.iter().filter(|m| m.payload["event"] == "VERIFICATION_COMPLETE").collect();
        let verified_events = events.iter().filter(|m| m.payload["event"] == "CITATION_VERIFIED").count();

        assert_eq!(complete_events.len(), 1);
        let counted_total = complete_events[0].payload["verified"].as_u64().unwrap()
            + complete_events[0].payload["mismatch"].as_u64().unwrap()
            + complete_events[0].payload["not_found"].as_u64().unwrap()
            + complete_events[0].payload["errors"].as_u64().unwrap();
        assert_eq!(counted_total, verified_events as u64);
        assert_eq!(verified_events, 2);
    }
}
