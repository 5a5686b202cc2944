use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DocketResult;

/// A single word or span recognized within a PDF chunk, with a page number
/// relative to that chunk (not the source document — C3 reconciles the
/// offset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeBoundingBox {
    pub page: u32,
    pub text: String,
    /// OCR confidence in [0, 1].
    pub confidence: f64,
    pub reading_order_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Raw output of running OCR over one PDF chunk, before C3 reconciles
/// chunk-relative page numbers into document-absolute ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrChunkOutput {
    pub bounding_boxes: Vec<RelativeBoundingBox>,
    pub full_text: String,
    /// Overall OCR confidence for the chunk in [0, 1].
    pub confidence: f64,
}

/// OCR model inference is an explicit non-goal of the core; this is the
/// seam the per-chunk OCR fan-out calls through.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, pdf_chunk_bytes: &[u8]) -> DocketResult<OcrChunkOutput>;
}
