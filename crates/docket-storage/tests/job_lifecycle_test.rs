//! Job state machine and citation act-resolution workflows against the
//! real storage engine (not mocked) — the cheapest way to catch a schema
//! mismatch between a model struct and its table.

use docket_core::models::{ActResolution, ActResolutionStatus, ActUserAction, JobStatus, VerificationStatus};
use docket_core::traits::MetaStore;
use docket_storage::StorageEngine;

#[tokio::test]
async fn job_create_update_and_stage_history_round_trip() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let matter = test_fixtures::matter_id();
    let mut job = test_fixtures::job(matter, "document_processing");
    storage.create_job(&job).await.unwrap();

    job.status = JobStatus::Processing;
    job.completed_stages = 1;
    storage.update_job(&job).await.unwrap();

    let fetched = storage.get_job(matter, job.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, JobStatus::Processing);
    assert_eq!(fetched.completed_stages, 1);

    let entry = docket_core::models::StageHistoryEntry {
        job_id: job.id,
        stage: "ocr".to_string(),
        status: JobStatus::Processing,
        recorded_at: chrono::Utc::now(),
        detail: Some("split into 3 chunks".to_string()),
    };
    storage.append_stage_history(&entry).await.unwrap();

    let history = storage.list_stage_history(matter, job.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].stage, "ocr");
}

#[tokio::test]
async fn act_resolution_upsert_transitions_citations_to_pending() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let matter = test_fixtures::matter_id();
    let document = test_fixtures::document(matter);
    storage.insert_document(&document).await.unwrap();

    let mut citation = test_fixtures::citation(document.id);
    citation.verification_status = VerificationStatus::ActUnavailable;
    citation.act_name = "Contract Act 1872".to_string();
    storage.insert_citations(matter, vec![citation.clone()]).await.unwrap();

    let pending = storage.list_pending_by_act(matter, "contract act 1872").await.unwrap();
    assert_eq!(pending.len(), 1);

    let act_doc = test_fixtures::act_document(matter, "Contract Act 1872");
    storage.insert_document(&act_doc).await.unwrap();

    storage
        .upsert_act_resolution(
            matter,
            &ActResolution {
                act_name_normalized: "contract act 1872".to_string(),
                act_name_display: "Contract Act 1872".to_string(),
                act_document_id: Some(act_doc.id),
                resolution_status: ActResolutionStatus::Available,
                user_action: ActUserAction::Uploaded,
                citation_count: 1,
            },
        )
        .await
        .unwrap();

    let mut updated = citation;
    updated.verification_status = VerificationStatus::Pending;
    storage.update_citation_status(matter, updated.id, updated).await.unwrap();

    let still_pending = storage.list_pending_by_act(matter, "contract act 1872").await.unwrap();
    assert!(still_pending.is_empty());

    let resolution = storage.get_act_resolution(matter, "contract act 1872").await.unwrap().unwrap();
    assert_eq!(resolution.resolution_status, ActResolutionStatus::Available);
}
