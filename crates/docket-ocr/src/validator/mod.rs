//! Confidence-tiered OCR validation (C4): pattern correction, batched LLM
//! validation, and a human-review queue for what's left.

pub mod human_queue;
pub mod llm_tier;
pub mod pattern;

use docket_core::config::OcrConfig;
use docket_core::ids::{BoundingBoxId, DocumentId, MatterId};
use docket_core::traits::Llm;

/// A word (or short span) recognized below full confidence, carrying just
/// enough context for a human or an LLM to judge the correction.
#[derive(Debug, Clone)]
pub struct LowConfidenceWord {
    pub bbox_id: BoundingBoxId,
    pub text: String,
    pub confidence: f64,
    pub page: u32,
    pub context_before: String,
    pub context_after: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionType {
    Pattern,
    Llm,
    Human,
}

/// Outcome of validating one word through whichever tier handled it.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub bbox_id: BoundingBoxId,
    pub original: String,
    pub corrected: String,
    pub old_confidence: f64,
    pub new_confidence: f64,
    pub correction_type: Option<CorrectionType>,
    pub reasoning: Option<String>,
    pub was_corrected: bool,
}

impl ValidationResult {
    fn unchanged(word: &LowConfidenceWord) -> Self {
        Self {
            bbox_id: word.bbox_id,
            original: word.text.clone(),
            corrected: word.text.clone(),
            old_confidence: word.confidence,
            new_confidence: word.confidence,
            correction_type: None,
            reasoning: None,
            was_corrected: false,
        }
    }
}

/// Runs the full tiered pipeline over a document's low-confidence words:
/// pattern correction first, then a batched LLM pass over what's left
/// above the human-review threshold, then enqueues everything still below
/// it for human review.
pub async fn validate_document(
    matter_id: MatterId,
    document_id: DocumentId,
    words: &[LowConfidenceWord],
    llm: &dyn Llm,
    config: &OcrConfig,
) -> (Vec<ValidationResult>, Vec<human_queue::HumanReviewItem>) {
    let mut results = Vec::with_capacity(words.len());
    let mut still_low = Vec::new();

    for word in words {
        let (result, _corrections) = pattern::apply(word);
        if result.was_corrected && result.new_confidence >= config.llm_validation_threshold {
            results.push(result);
        } else {
            still_low.push(LowConfidenceWord {
                bbox_id: word.bbox_id,
                text: result.corrected.clone(),
                confidence: result.new_confidence,
                page: word.page,
                context_before: word.context_before.clone(),
                context_after: word.context_after.clone(),
            });
        }
    }

    let llm_results = llm_tier::validate_all(llm, &still_low, config).await;
    let mut human_words = Vec::new();
    let mut by_bbox: std::collections::HashMap<BoundingBoxId, ValidationResult> =
        llm_results.into_iter().map(|r| (r.bbox_id, r)).collect();

    for word in &still_low {
        match by_bbox.remove(&word.bbox_id) {
            Some(result) if result.new_confidence < config.human_review_threshold => {
                human_words.push(LowConfidenceWord {
                    bbox_id: word.bbox_id,
                    text: result.corrected.clone(),
                    confidence: result.new_confidence,
                    page: word.page,
                    context_before: word.context_before.clone(),
                    context_after: word.context_after.clone(),
                });
                results.push(result);
            }
            Some(result) => results.push(result),
            None => {}
        }
    }

    let human_items = human_queue::enqueue(matter_id, document_id, &human_words);
    (results, human_items)
}
