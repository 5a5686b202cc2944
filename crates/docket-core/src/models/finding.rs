use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{FindingId, MatterId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    Contradiction,
    CitationMismatch,
    TimelineGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

/// Function of `confidence_before`: `OPTIONAL >= 90 > SUGGESTED >= 70 >
/// REQUIRED`. Boundary values map to the higher tier (`>=`, not `>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementTier {
    Optional,
    Suggested,
    Required,
}

/// Pure function of `confidence_before`, per `[MODULE C16]`: `>= 90 ->
/// OPTIONAL; >= 70 -> SUGGESTED; < 70 -> REQUIRED`.
pub fn requirement_tier(confidence_before: f64) -> RequirementTier {
    if confidence_before >= 90.0 {
        RequirementTier::Optional
    } else if confidence_before >= 70.0 {
        RequirementTier::Suggested
    } else {
        RequirementTier::Required
    }
}

/// A verification record holding `{finding_id, finding_type,
/// finding_summary (<=500 chars), confidence_before, decision, verified_by?,
/// verified_at?, confidence_after?, notes?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingVerification {
    pub finding_id: FindingId,
    pub matter_id: MatterId,
    pub finding_type: FindingType,
    pub finding_summary: String,
    pub confidence_before: f64,
    pub decision: VerificationDecision,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub confidence_after: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FindingVerification {
    pub const MAX_SUMMARY_LEN: usize = 500;

    pub fn new(
        finding_id: FindingId,
        matter_id: MatterId,
        finding_type: FindingType,
        finding_summary: String,
        confidence_before: f64,
    ) -> Self {
        let mut summary = finding_summary;
        // MAX_SUMMARY_LEN counts chars, not bytes; truncate on a char
        // boundary so a >500-byte multibyte summary doesn't panic.
        if let Some((byte_idx, _)) = summary.char_indices().nth(Self::MAX_SUMMARY_LEN) {
            summary.truncate(byte_idx);
        }
        Self {
            finding_id,
            matter_id,
            finding_type,
            finding_summary: summary,
            confidence_before,
            decision: VerificationDecision::Pending,
            verified_by: None,
            verified_at: None,
            confidence_after: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn requirement(&self) -> RequirementTier {
        requirement_tier(self.confidence_before)
    }

    /// Export is blocked iff any REQUIRED verification is still pending.
    pub fn blocks_export(&self) -> bool {
        self.decision == VerificationDecision::Pending
            && self.requirement() == RequirementTier::Required
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VerificationStats {
    pub pending_required: u32,
    pub pending_suggested: u32,
    pub pending_optional: u32,
    pub approved: u32,
    pub rejected: u32,
    pub flagged: u32,
    pub export_blocked: bool,
}

pub fn aggregate_stats(records: &[FindingVerification]) -> VerificationStats {
    let mut stats = VerificationStats::default();
    for record in records {
        match record.decision {
            VerificationDecision::Pending => match record.requirement() {
                RequirementTier::Required => stats.pending_required += 1,
                RequirementTier::Suggested => stats.pending_suggested += 1,
                RequirementTier::Optional => stats.pending_optional += 1,
            },
            VerificationDecision::Approved => stats.approved += 1,
            VerificationDecision::Rejected => stats.rejected += 1,
            VerificationDecision::Flagged => stats.flagged += 1,
        }
    }
    stats.export_blocked = stats.pending_required > 0;
    stats
}
