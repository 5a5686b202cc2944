use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Default chunk size, in pages. Never exceeds `max_chunk_pages`.
    pub default_chunk_pages: u32,
    /// Hard ceiling imposed by downstream OCR limits.
    pub max_chunk_pages: u32,
    /// PDFs at or below this page count are returned as a single chunk.
    pub single_chunk_threshold_pages: u32,
    /// In-memory mode memory budget, in bytes.
    pub memory_budget_bytes: u64,
    /// Fraction of the budget at which the watchdog warns.
    pub memory_warn_fraction: f64,
    /// Cooperative split timeout, in seconds.
    pub split_timeout_secs: u64,
    /// Tier 2 "Gemini threshold": words at/above this confidence skip LLM
    /// validation.
    pub llm_validation_threshold: f64,
    /// Tier 3 "human threshold": words below this go to the human queue.
    pub human_review_threshold: f64,
    /// Max words per Tier 2 LLM validation batch.
    pub llm_batch_size: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            default_chunk_pages: 15,
            max_chunk_pages: 30,
            single_chunk_threshold_pages: 30,
            memory_budget_bytes: 50 * 1024 * 1024,
            memory_warn_fraction: 0.75,
            split_timeout_secs: 30,
            llm_validation_threshold: 0.85,
            human_review_threshold: 0.50,
            llm_batch_size: 20,
        }
    }
}
