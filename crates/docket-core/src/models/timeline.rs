use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{BoundingBoxId, EntityId, MatterId, TimelineEventId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    Day,
    Month,
    Year,
    Unknown,
}

/// `{event_date, event_date_precision, event_date_text, event_type,
/// description, confidence, source_page?, source_bbox_ids[], is_manual,
/// is_ambiguous?, ambiguity_reason?, entities_involved[]}`. Ambiguity is a
/// first-class attribute (e.g. `01/02/2024` flagged DD/MM vs MM/DD) but is
/// persisted durably by encoding it into `description` — see
/// [`encode_ambiguity`]/[`decode_ambiguity`] — because the storage schema
/// has no dedicated ambiguity column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: TimelineEventId,
    pub matter_id: MatterId,
    pub event_date: NaiveDate,
    pub event_date_precision: DatePrecision,
    pub event_date_text: String,
    pub event_type: String,
    pub description: String,
    /// 0-100.
    pub confidence: u8,
    pub source_page: Option<u32>,
    pub source_bbox_ids: Vec<BoundingBoxId>,
    pub is_manual: bool,
    pub is_ambiguous: bool,
    pub ambiguity_reason: Option<String>,
    pub entities_involved: Vec<EntityId>,
}

/// Encode `is_ambiguous`/`ambiguity_reason` into a `[AMBIGUOUS: reason]` or
/// `[AMBIGUOUS]` prefix on `description`, for durable persistence in a
/// column that doesn't carry those fields natively.
pub fn encode_ambiguity(description: &str, is_ambiguous: bool, reason: Option<&str>) -> String {
    if !is_ambiguous {
        return description.to_string();
    }
    match reason {
        Some(r) if !r.trim().is_empty() => format!("[AMBIGUOUS: {r}] {description}"),
        _ => format!("[AMBIGUOUS] {description}"),
    }
}

/// Recover `(is_ambiguous, ambiguity_reason, plain_description)` from a
/// description previously produced by [`encode_ambiguity`]. Round-trips
/// exactly: applying `decode_ambiguity(&encode_ambiguity(d, a, r))` returns
/// `(a, r, d)` for any `d` that does not itself start with `[AMBIGUOUS`.
pub fn decode_ambiguity(stored: &str) -> (bool, Option<String>, String) {
    if let Some(rest) = stored.strip_prefix("[AMBIGUOUS: ") {
        if let Some(end) = rest.find("] ") {
            let reason = rest[..end].to_string();
            let description = rest[end + 2..].to_string();
            return (true, Some(reason), description);
        }
    }
    if let Some(rest) = stored.strip_prefix("[AMBIGUOUS] ") {
        return (true, None, rest.to_string());
    }
    (false, None, stored.to_string())
}


/// Optional entity-linked assertion extracted from a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: String,
    pub matter_id: MatterId,
    pub entity_id: Option<EntityId>,
    pub subject: String,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionSeverity {
    Low,
    Medium,
    High,
}

/// Pairs of statements with overlapping subject/date/amount flagged as a
/// contradiction with severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub matter_id: MatterId,
    pub statement_a: String,
    pub statement_b: String,
    pub severity: ContradictionSeverity,
    pub explanation: String,
}
