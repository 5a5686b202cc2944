//! Tier 3: human review queue for words below the human-review threshold.
//! Submission is matter-scoped and opaque on mismatch — the same IDOR
//! posture as the rest of the core's item-lookup operations.

use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{BoundingBoxId, DocumentId, MatterId};

use super::LowConfidenceWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct HumanReviewItem {
    pub bbox_id: BoundingBoxId,
    pub document_id: DocumentId,
    pub matter_id: MatterId,
    pub original_text: String,
    pub context_before: String,
    pub context_after: String,
    pub page_number: u32,
    pub status: ReviewStatus,
}

pub fn enqueue(matter_id: MatterId, document_id: DocumentId, words: &[LowConfidenceWord]) -> Vec<HumanReviewItem> {
    words
        .iter()
        .map(|w| HumanReviewItem {
            bbox_id: w.bbox_id,
            document_id,
            matter_id,
            original_text: w.text.clone(),
            context_before: w.context_before.clone(),
            context_after: w.context_after.clone(),
            page_number: w.page,
            status: ReviewStatus::Pending,
        })
        .collect()
}

/// Applies an approved human correction. The caller's authorized matter
/// must match the item's matter — on mismatch this returns `ItemNotFound`,
/// never a forbidden/exists-elsewhere signal.
pub fn approve(item: &mut HumanReviewItem, authorized_matter_id: MatterId, corrected_text: String) -> DocketResult<(String, f64)> {
    if item.matter_id != authorized_matter_id {
        return Err(DocketError::ItemNotFound);
    }
    item.status = ReviewStatus::Completed;
    Ok((corrected_text, 1.0))
}

pub fn skip(item: &mut HumanReviewItem, authorized_matter_id: MatterId) -> DocketResult<()> {
    if item.matter_id != authorized_matter_id {
        return Err(DocketError::ItemNotFound);
    }
    item.status = ReviewStatus::Skipped;
    Ok(())
}
