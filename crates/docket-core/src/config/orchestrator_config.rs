use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Delay between emitted token batches during streaming, in
    /// milliseconds.
    pub token_batch_delay_ms: u64,
    /// Characters per emitted token batch.
    pub token_batch_chars: usize,
    /// Bounded event channel capacity for a single streaming query.
    pub event_channel_capacity: usize,
    /// Max items accepted in a single bulk verification request.
    pub bulk_verification_limit: usize,
    /// Backoff schedule (seconds) for citation verification retries.
    pub verification_backoff_secs: Vec<u64>,
    /// Max verification attempts before a citation is marked failed.
    pub verification_max_attempts: u32,
    /// Default worker pool size for entity-linking during timeline
    /// extraction.
    pub entity_linking_workers: usize,
    /// Minimum query length (in `char`s, after trimming) to run the query
    /// pipeline. Shorter queries short-circuit to an empty response without
    /// touching session/cache/engine I/O.
    pub min_query_len: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            token_batch_delay_ms: 5,
            token_batch_chars: 3,
            event_channel_capacity: 256,
            bulk_verification_limit: 100,
            verification_backoff_secs: vec![30, 60, 120],
            verification_max_attempts: 3,
            entity_linking_workers: 10,
            min_query_len: 2,
        }
    }
}
