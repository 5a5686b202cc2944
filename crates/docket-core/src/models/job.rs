use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, MatterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Skipped,
}

/// `{type, status, current_stage, total_stages, completed_stages,
/// progress_pct, retry_count, max_retries, error_message?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub matter_id: MatterId,
    pub job_type: String,
    pub status: JobStatus,
    pub current_stage: String,
    pub total_stages: u32,
    pub completed_stages: u32,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn progress_pct(&self) -> f64 {
        if self.total_stages == 0 {
            0.0
        } else {
            (self.completed_stages as f64 / self.total_stages as f64) * 100.0
        }
    }
}

/// Append-only record of a single stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub job_id: JobId,
    pub stage: String,
    pub status: JobStatus,
    pub recorded_at: DateTime<Utc>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTransition {
    Retry,
    Skip,
    Cancel,
}

/// Validate a job-status transition against the state machine in
/// `[MODULE C18]`. `retry`/`skip` are only valid from `FAILED`; `cancel`
/// only from `QUEUED`/`PROCESSING`. Any other combination is
/// `INVALID_JOB_STATUS`.
pub fn validate_transition(from: JobStatus, transition: JobTransition) -> bool {
    match transition {
        JobTransition::Retry => from == JobStatus::Failed,
        JobTransition::Skip => from == JobStatus::Failed,
        JobTransition::Cancel => matches!(from, JobStatus::Queued | JobStatus::Processing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_only_from_failed() {
        assert!(validate_transition(JobStatus::Failed, JobTransition::Retry));
        assert!(!validate_transition(JobStatus::Queued, JobTransition::Retry));
        assert!(!validate_transition(JobStatus::Completed, JobTransition::Retry));
    }

    #[test]
    fn cancel_only_from_queued_or_processing() {
        assert!(validate_transition(JobStatus::Queued, JobTransition::Cancel));
        assert!(validate_transition(JobStatus::Processing, JobTransition::Cancel));
        assert!(!validate_transition(JobStatus::Completed, JobTransition::Cancel));
        assert!(!validate_transition(JobStatus::Failed, JobTransition::Cancel));
    }
}
