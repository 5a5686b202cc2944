use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DocumentId, MatterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CaseFile,
    Act,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Belongs to a matter; typed `case_file | act | other`; `is_reference_material`
/// is true for acts. Soft-deletable via `deleted_at`; never mutated in place —
/// re-processing deletes and reinserts chunks rather than patching content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub matter_id: MatterId,
    pub document_type: DocumentType,
    pub is_reference_material: bool,
    pub status: DocumentStatus,
    pub filename: String,
    pub blob_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
