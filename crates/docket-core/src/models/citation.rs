use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, CitationId, DocumentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Mismatch,
    SectionNotFound,
    ActUnavailable,
    Error,
}

/// `{act_name, canonical_act_name?, section, subsection?, clause?, raw_text,
/// quoted_text?, confidence, verification_status, source_document_id,
/// source_chunk_id?, page_number?}`. Status lifecycle:
/// `pending -> (verified | mismatch | section_not_found | act_unavailable |
/// error)`. When the cited act is uploaded, all citations for that act
/// transition `act_unavailable -> pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCitation {
    pub id: CitationId,
    pub act_name: String,
    pub canonical_act_name: Option<String>,
    pub section: String,
    pub subsection: Option<String>,
    pub clause: Option<String>,
    pub raw_text: String,
    pub quoted_text: Option<String>,
    /// 0-100.
    pub confidence: u8,
    pub verification_status: VerificationStatus,
    pub source_document_id: DocumentId,
    pub source_chunk_id: Option<ChunkId>,
    pub page_number: Option<u32>,
}

impl ExtractedCitation {
    /// Identity used for cross-pass dedup: normalized act + section.
    pub fn dedup_key(&self) -> (String, String) {
        (
            normalize_act_name_for_dedup(&self.act_name),
            self.section.trim().to_lowercase(),
        )
    }
}

fn normalize_act_name_for_dedup(name: &str) -> String {
    name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActResolutionStatus {
    Missing,
    Available,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActUserAction {
    Pending,
    Uploaded,
    Skipped,
}

/// Per-matter record tracking whether a cited act's statute document has
/// been uploaded yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActResolution {
    pub act_name_normalized: String,
    pub act_name_display: String,
    pub act_document_id: Option<DocumentId>,
    pub resolution_status: ActResolutionStatus,
    pub user_action: ActUserAction,
    pub citation_count: u32,
}
