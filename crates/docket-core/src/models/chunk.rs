use serde::{Deserialize, Serialize};

use crate::ids::{BoundingBoxId, ChunkId, DocumentId, MatterId};

/// Two-level hierarchy per document: each parent chunk has >= 1 child.
/// A child's `parent_chunk_id` must reference a parent in the same document
/// and matter — inserting a child without its parent violates referential
/// integrity. Re-processing a document deletes all its chunks then
/// reinserts (children before parents, per the document-deletion ordering
/// described in `[MODULE C13]`'s ownership notes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub matter_id: MatterId,
    pub document_id: DocumentId,
    pub tier: ChunkTier,
    pub parent_chunk_id: Option<ChunkId>,
    /// Dense sequence within document and tier.
    pub chunk_index: u32,
    pub content: String,
    pub token_count: u32,
    pub page_number: Option<u32>,
    pub bbox_ids: Vec<BoundingBoxId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkTier {
    Parent,
    Child,
}

impl Chunk {
    /// A child chunk must reference a parent chunk belonging to the same
    /// document and matter. Returns false for parent chunks (vacuously ok
    /// to insert without a parent reference).
    pub fn has_valid_parent_ref(&self, parent: Option<&Chunk>) -> bool {
        match self.tier {
            ChunkTier::Parent => self.parent_chunk_id.is_none(),
            ChunkTier::Child => match (self.parent_chunk_id, parent) {
                (Some(_), Some(p)) => {
                    p.tier == ChunkTier::Parent
                        && p.document_id == self.document_id
                        && p.matter_id == self.matter_id
                }
                _ => false,
            },
        }
    }
}

/// Per-page rectangle with text, OCR confidence, and a monotonic
/// per-page reading order. Owned by the document; page numbers are
/// absolute across the original PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: BoundingBoxId,
    pub document_id: DocumentId,
    /// Absolute page number, 1-based.
    pub page_number: u32,
    pub text: String,
    /// OCR confidence in [0, 1].
    pub confidence: f64,
    pub reading_order_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
