//! Job tracker (C18): wraps the `Job` state machine validated in
//! `docket_core::models::job` with persistence and re-enqueue side
//! effects. The model layer only answers "is this transition legal"; this
//! module is what actually walks a job through `retry`/`skip`/`cancel` and
//! records the append-only stage history.

use chrono::Utc;

use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{JobId, MatterId};
use docket_core::models::{validate_transition, Job, JobStatus, JobTransition, StageHistoryEntry};
use docket_core::traits::{Broker, BrokerMessage, MetaStore};

fn job_topic(job_type: &str) -> String {
    format!("job:{job_type}")
}

async fn load_job(meta: &dyn MetaStore, matter_id: MatterId, job_id: JobId) -> DocketResult<Job> {
    meta.get_job(matter_id, job_id).await?.ok_or(DocketError::ItemNotFound)
}

async fn apply_transition(
    meta: &dyn MetaStore,
    job: &mut Job,
    transition: JobTransition,
    new_status: JobStatus,
    detail: Option<String>,
) -> DocketResult<()> {
    if !validate_transition(job.status, transition) {
        return Err(DocketError::InvalidJobStatus {
            from: format!("{:?}", job.status),
            to: format!("{:?}", new_status),
        });
    }

    job.status = new_status;
    job.updated_at = Utc::now();
    meta.update_job(job).await?;

    meta.append_stage_history(&StageHistoryEntry {
        job_id: job.id,
        stage: job.current_stage.clone(),
        status: new_status,
        recorded_at: job.updated_at,
        detail,
    })
    .await
}

/// Retries a `FAILED` job: resets its retry counter's bookkeeping fields,
/// transitions it back to `QUEUED`, and re-enqueues it on the broker so
/// the original worker pool picks it up again.
pub async fn retry(meta: &dyn MetaStore, broker: &dyn Broker, matter_id: MatterId, job_id: JobId) -> DocketResult<Job> {
    let mut job = load_job(meta, matter_id, job_id).await?;
    apply_transition(meta, &mut job, JobTransition::Retry, JobStatus::Queued, Some("retry requested".into())).await?;
    job.retry_count += 1;
    job.error_message = None;
    meta.update_job(&job).await?;

    broker
        .publish(BrokerMessage {
            topic: job_topic(&job.job_type),
            payload: serde_json::json!({ "job_id": job.id, "matter_id": job.matter_id, "retry_count": job.retry_count }),
        })
        .await?;

    Ok(job)
}

/// Marks a `FAILED` job `SKIPPED`, with no re-enqueue.
pub async fn skip(meta: &dyn MetaStore, matter_id: MatterId, job_id: JobId) -> DocketResult<Job> {
    let mut job = load_job(meta, matter_id, job_id).await?;
    apply_transition(meta, &mut job, JobTransition::Skip, JobStatus::Skipped, Some("skipped by caller".into())).await?;
    Ok(job)
}

/// Cancels a `QUEUED` or `PROCESSING` job.
pub async fn cancel(meta: &dyn MetaStore, matter_id: MatterId, job_id: JobId) -> DocketResult<Job> {
    let mut job = load_job(meta, matter_id, job_id).await?;
    apply_transition(meta, &mut job, JobTransition::Cancel, JobStatus::Cancelled, Some("cancelled by caller".into())).await?;
    Ok(job)
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct JobStats {
    pub queued: u32,
    pub processing: u32,
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
    pub skipped: u32,
}

/// Aggregate counts of a matter's jobs by status.
pub fn stats(jobs: &[Job]) -> JobStats {
    let mut s = JobStats { queued: 0, processing: 0, completed: 0, failed: 0, cancelled: 0, skipped: 0 };
    for job in jobs {
        match job.status {
            JobStatus::Queued => s.queued += 1,
            JobStatus::Processing => s.processing += 1,
            JobStatus::Completed => s.completed += 1,
            JobStatus::Failed => s.failed += 1,
            JobStatus::Cancelled => s.cancelled += 1,
            JobStatus::Skipped => s.skipped += 1,
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::errors::ErrorKind;
    use docket_storage::{InMemoryBroker, StorageEngine};

    fn new_job(matter_id: MatterId, status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id: JobId::new(),
            matter_id,
            job_type: "ocr".to_string(),
            status,
            current_stage: "split".to_string(),
            total_stages: 4,
            completed_stages: 1,
            retry_count: 0,
            max_retries: 3,
            error_message: Some("boom".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn retry_from_failed_requeues_and_clears_error() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let broker = InMemoryBroker::new();
        let matter_id = MatterId::new();
        let job = new_job(matter_id, JobStatus::Failed);
        let job_id = job.id;
        meta.create_job(&job).await.unwrap();

        let retried = retry(&meta, &broker, matter_id, job_id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Queued);
        assert_eq!(retried.retry_count, 1);
        assert!(retried.error_message.is_none());

        let messages = broker.poll(&format!("job:{}", "ocr"), 10).await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn retry_from_non_failed_is_invalid() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let broker = InMemoryBroker::new();
        let matter_id = MatterId::new();
        let job = new_job(matter_id, JobStatus::Completed);
        let job_id = job.id;
        meta.create_job(&job).await.unwrap();

        let err = retry(&meta, &broker, matter_id, job_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJobStatus);
    }

    #[tokio::test]
    async fn skip_only_from_failed() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let job = new_job(matter_id, JobStatus::Queued);
        let job_id = job.id;
        meta.create_job(&job).await.unwrap();

        let err = skip(&meta, matter_id, job_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJobStatus);
    }

    #[tokio::test]
    async fn cancel_from_queued_or_processing() {
        let meta = StorageEngine::open_in_memory().unwrap();
        let matter_id = MatterId::new();
        let job = new_job(matter_id, JobStatus::Processing);
        let job_id = job.id;
        meta.create_job(&job).await.unwrap();

        let cancelled = cancel(&meta, matter_id, job_id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
    }

    #[test]
    fn stats_tallies_by_status() {
        let matter_id = MatterId::new();
        let jobs = vec![
            new_job(matter_id, JobStatus::Queued),
            new_job(matter_id, JobStatus::Failed),
            new_job(matter_id, JobStatus::Failed),
            new_job(matter_id, JobStatus::Completed),
        ];
        let s = stats(&jobs);
        assert_eq!(s.queued, 1);
        assert_eq!(s.failed, 2);
        assert_eq!(s.completed, 1);
    }
}
