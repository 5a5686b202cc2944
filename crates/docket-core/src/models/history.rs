use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MatterId;

/// Append-only per-matter log of queries with engines used, confidence,
/// cost/token counters, and an attorney verification flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    pub matter_id: MatterId,
    pub query: String,
    pub engines_used: Vec<String>,
    pub confidence: f64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub attorney_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl QueryHistoryEntry {
    pub const DEFAULT_LIMIT: usize = 50;
}
