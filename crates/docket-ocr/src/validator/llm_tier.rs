//! Tier 2: batched LLM validation for words the pattern tier didn't fix
//! and that are still below the configured validation threshold.

use docket_core::config::OcrConfig;
use docket_core::traits::{Llm, LlmRequest};

use super::{CorrectionType, LowConfidenceWord, ValidationResult};

/// Selects words in `[human_review_threshold, llm_validation_threshold)` —
/// below that range they go straight to the human queue, at or above it
/// they're already trusted.
pub fn select_for_llm_tier<'a>(words: &'a [LowConfidenceWord], config: &OcrConfig) -> Vec<&'a LowConfidenceWord> {
    words
        .iter()
        .filter(|w| w.confidence >= config.human_review_threshold && w.confidence < config.llm_validation_threshold)
        .collect()
}

/// Runs one batch (<= `config.llm_batch_size` words) through the LLM and
/// parses its response permissively. A parse failure is not an error —
/// per the OCR Tier 2 policy it returns every word unchanged.
pub async fn validate_batch(llm: &dyn Llm, words: &[LowConfidenceWord]) -> Vec<ValidationResult> {
    if words.is_empty() {
        return Vec::new();
    }

    let prompt = build_prompt(words);
    let request = LlmRequest::new(prompt);

    match llm.complete(request).await {
        Ok(response) => parse_response(&response.text, words),
        Err(e) => {
            tracing::warn!(error = %e, word_count = words.len(), "ocr tier2 llm call failed, returning words unchanged");
            fallback_results(words)
        }
    }
}

/// Runs every selected batch concurrently on one scheduling context — a
/// single `join_all` over the batch futures, not a per-batch task spawn.
pub async fn validate_all(llm: &dyn Llm, words: &[LowConfidenceWord], config: &OcrConfig) -> Vec<ValidationResult> {
    let selected = select_for_llm_tier(words, config);
    let batches: Vec<Vec<LowConfidenceWord>> = selected
        .chunks(config.llm_batch_size.max(1))
        .map(|chunk| chunk.iter().map(|w| (*w).clone()).collect())
        .collect();

    let futures = batches.iter().map(|batch| validate_batch(llm, batch));
    let results = futures::future::join_all(futures).await;
    results.into_iter().flatten().collect()
}

fn build_prompt(words: &[LowConfidenceWord]) -> String {
    let words_json: Vec<serde_json::Value> = words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            serde_json::json!({
                "index": i,
                "text": w.text,
                "confidence": w.confidence,
                "context_before": w.context_before,
                "context_after": w.context_after,
                "page": w.page,
            })
        })
        .collect();

    format!(
        "Validate and correct the following low-confidence OCR words given their \
         surrounding context. Respond with a JSON array of objects \
         {{index, corrected, confidence, reasoning}}.\n\n{}",
        serde_json::to_string_pretty(&words_json).unwrap_or_default()
    )
}

/// Extracts a JSON array from the model's response, tolerating
/// markdown-fenced blocks, and maps results back onto the original words
/// by index. Any word missing from the response, or any parse failure,
/// falls back to an unchanged result for that word rather than an error.
fn parse_response(response_text: &str, words: &[LowConfidenceWord]) -> Vec<ValidationResult> {
    let json_text = strip_markdown_fence(response_text);

    let parsed: serde_json::Value = match serde_json::from_str(&json_text) {
        Ok(v) => v,
        Err(_) => return fallback_results(words),
    };

    let Some(items) = parsed.as_array() else {
        return fallback_results(words);
    };

    let mut by_index = std::collections::HashMap::new();
    for item in items {
        if let Some(index) = item.get("index").and_then(|v| v.as_u64()) {
            by_index.insert(index as usize, item);
        }
    }

    words
        .iter()
        .enumerate()
        .map(|(i, word)| match by_index.get(&i) {
            Some(item) => {
                let corrected = item.get("corrected").and_then(|v| v.as_str()).unwrap_or(&word.text).to_string();
                let confidence = item.get("confidence").and_then(|v| v.as_f64()).unwrap_or(word.confidence);
                let reasoning = item.get("reasoning").and_then(|v| v.as_str()).map(str::to_string);
                let was_corrected = corrected != word.text;

                ValidationResult {
                    bbox_id: word.bbox_id,
                    original: word.text.clone(),
                    corrected,
                    old_confidence: word.confidence,
                    new_confidence: confidence,
                    correction_type: was_corrected.then_some(CorrectionType::Llm),
                    reasoning: was_corrected.then_some(reasoning).flatten(),
                    was_corrected,
                }
            }
            None => ValidationResult {
                bbox_id: word.bbox_id,
                original: word.text.clone(),
                corrected: word.text.clone(),
                old_confidence: word.confidence,
                new_confidence: word.confidence,
                correction_type: None,
                reasoning: None,
                was_corrected: false,
            },
        })
        .collect()
}

fn strip_markdown_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fallback_results(words: &[LowConfidenceWord]) -> Vec<ValidationResult> {
    words.iter().map(ValidationResult::unchanged).collect()
}
