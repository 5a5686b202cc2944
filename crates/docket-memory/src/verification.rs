//! Finding verification workflow (C16). Wraps `MetaStore`'s
//! `FindingVerification` persistence with the workflow-level operations:
//! creation (tier derived automatically from `confidence_before`),
//! decision recording, a sorted pending queue, aggregate stats, and a
//! size-bounded bulk update.

use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{FindingId, MatterId};
use docket_core::models::{
    aggregate_stats, FindingType, FindingVerification, VerificationDecision, VerificationStats,
};
use docket_core::traits::MetaStore;

pub async fn create(
    meta: &dyn MetaStore,
    finding_id: FindingId,
    matter_id: MatterId,
    finding_type: FindingType,
    finding_summary: String,
    confidence_before: f64,
) -> DocketResult<FindingVerification> {
    let record = FindingVerification::new(finding_id, matter_id, finding_type, finding_summary, confidence_before);
    meta.upsert_finding_verification(&record).await?;
    Ok(record)
}

pub struct Decision {
    pub decision: VerificationDecision,
    pub confidence_after: Option<f64>,
    pub notes: Option<String>,
    pub verified_by: Option<docket_core::ids::UserId>,
}

/// Records a reviewer's decision on a finding. Returns `ItemNotFound` if
/// no verification record exists for `finding_id` in `matter_id`.
pub async fn record_decision(
    meta: &dyn MetaStore,
    matter_id: MatterId,
    finding_id: FindingId,
    decision: Decision,
) -> DocketResult<FindingVerification> {
    let mut record = meta
        .get_finding_verification(matter_id, finding_id)
        .await?
        .ok_or(DocketError::ItemNotFound)?;

    record.decision = decision.decision;
    record.confidence_after = decision.confidence_after;
    record.notes = decision.notes;
    record.verified_by = decision.verified_by;
    record.verified_at = Some(chrono::Utc::now());

    meta.upsert_finding_verification(&record).await?;
    Ok(record)
}

/// Pending verifications, sorted ascending by confidence then
/// `created_at` — the lowest-confidence, oldest findings surface first.
pub async fn list_pending(meta: &dyn MetaStore, matter_id: MatterId) -> DocketResult<Vec<FindingVerification>> {
    let mut records: Vec<FindingVerification> = meta
        .list_finding_verifications(matter_id)
        .await?
        .into_iter()
        .filter(|r| r.decision == VerificationDecision::Pending)
        .collect();
    records.sort_by(|a, b| {
        a.confidence_before
            .total_cmp(&b.confidence_before)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    Ok(records)
}

pub async fn stats(meta: &dyn MetaStore, matter_id: MatterId) -> DocketResult<VerificationStats> {
    let records = meta.list_finding_verifications(matter_id).await?;
    Ok(aggregate_stats(&records))
}

/// Applies `decision` to every id in `finding_ids`. Rejects the whole
/// batch with `BulkLimitExceeded` if it exceeds `max_items` (the 100-item
/// cap from `OrchestratorConfig::bulk_verification_limit`) rather than
/// partially applying and reporting which ones succeeded.
pub async fn bulk_update(
    meta: &dyn MetaStore,
    matter_id: MatterId,
    finding_ids: &[FindingId],
    decision: VerificationDecision,
    max_items: usize,
) -> DocketResult<Vec<FindingVerification>> {
    if finding_ids.len() > max_items {
        return Err(DocketError::BulkLimitExceeded { requested: finding_ids.len(), max: max_items });
    }

    let mut updated = Vec::with_capacity(finding_ids.len());
    for &finding_id in finding_ids {
        let record = record_decision(
            meta,
            matter_id,
            finding_id,
            Decision { decision, confidence_after: None, notes: None, verified_by: None },
        )
        .await?;
        updated.push(record);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::errors::ErrorKind;
    use docket_core::ids::FindingId;
    use docket_storage::StorageEngine;

    #[tokio::test]
    async fn create_and_record_decision_round_trip() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let finding_id = FindingId::new();

        let record = create(&meta, finding_id, matter_id, FindingType::Contradiction, "a vs b".into(), 60.0).await.unwrap();
        assert_eq!(record.requirement(), docket_core::models::RequirementTier::Required);

        let updated = record_decision(
            &meta,
            matter_id,
            finding_id,
            Decision { decision: VerificationDecision::Approved, confidence_after: Some(95.0), notes: Some("confirmed".into()), verified_by: None },
        )
        .await
        .unwrap();

        assert_eq!(updated.decision, VerificationDecision::Approved);
        assert_eq!(updated.confidence_after, Some(95.0));
    }

    #[tokio::test]
    async fn record_decision_missing_finding_is_item_not_found() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let err = record_decision(
            &meta,
            MatterId::new(),
            FindingId::new(),
            Decision { decision: VerificationDecision::Rejected, confidence_after: None, notes: None, verified_by: None },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ItemNotFound);
    }

    #[tokio::test]
    async fn list_pending_sorts_by_confidence_then_created_at() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        create(&meta, FindingId::new(), matter_id, FindingType::TimelineGap, "gap".into(), 80.0).await.unwrap();
        create(&meta, FindingId::new(), matter_id, FindingType::CitationMismatch, "mismatch".into(), 40.0).await.unwrap();

        let pending = list_pending(&meta, matter_id).await.unwrap();
        assert_eq!(pending[0].confidence_before, 40.0);
        assert_eq!(pending[1].confidence_before, 80.0);
    }

    #[tokio::test]
    async fn bulk_update_rejects_over_limit() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let ids: Vec<FindingId> = (0..5).map(|_| FindingId::new()).collect();

        let err = bulk_update(&meta, matter_id, &ids, VerificationDecision::Approved, 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BulkLimitExceeded);
    }

    #[tokio::test]
    async fn bulk_update_applies_decision_to_every_id() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let mut ids = Vec::new();
        for i in 0..3 {
            let finding_id = FindingId::new();
            create(&meta, finding_id, matter_id, FindingType::TimelineGap, format!("gap {i}"), 50.0).await.unwrap();
            ids.push(finding_id);
        }

        let updated = bulk_update(&meta, matter_id, &ids, VerificationDecision::Flagged, 100).await.unwrap();
        assert_eq!(updated.len(), 3);
        assert!(updated.iter().all(|r| r.decision == VerificationDecision::Flagged));
    }

    #[tokio::test]
    async fn stats_reports_export_blocked_when_required_pending() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        create(&meta, FindingId::new(), matter_id, FindingType::TimelineGap, "gap".into(), 50.0).await.unwrap();

        let stats = stats(&meta, matter_id).await.unwrap();
        assert!(stats.export_blocked);
    }
}
