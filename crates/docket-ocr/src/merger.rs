//! Chunk-relative to document-absolute OCR result reconciliation (C3).

use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{BoundingBoxId, DocumentId};
use docket_core::models::BoundingBox;
use docket_core::traits::RelativeBoundingBox;

/// One chunk's raw OCR output plus the page range it covers, as recorded
/// by the splitter (C2). `checksum` is the optional
/// `sha256(f"{index}:{start}:{end}:{bbox_count}")[:16]` recomputed by
/// [`compute_chunk_checksum`] at storage time.
#[derive(Debug, Clone)]
pub struct ChunkOcrResult {
    pub chunk_index: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub bounding_boxes: Vec<RelativeBoundingBox>,
    pub full_text: String,
    pub overall_confidence: f64,
    pub page_count: u32,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MergedOcrResult {
    pub document_id: DocumentId,
    pub bounding_boxes: Vec<BoundingBox>,
    pub full_text: String,
    pub overall_confidence: f64,
    pub page_count: u32,
    pub chunk_count: usize,
    pub total_bboxes: usize,
}

/// `sha256(f"{chunk_index}:{page_start}:{page_end}:{bbox_count}")`, first
/// 16 hex chars. Computed at storage time so a later merge can detect
/// corruption introduced between storing a chunk result and merging it.
pub fn compute_chunk_checksum(chunk_index: u32, page_start: u32, page_end: u32, bbox_count: usize) -> String {
    use sha2::{Digest, Sha256};
    let data = format!("{chunk_index}:{page_start}:{page_end}:{bbox_count}");
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Merges chunk-ordered OCR results into a document-absolute result.
/// Chunks need not arrive in `chunk_index` order — they're sorted first,
/// making the merge independent of per-chunk completion order.
pub fn merge_results(document_id: DocumentId, chunk_results: Vec<ChunkOcrResult>) -> DocketResult<MergedOcrResult> {
    if chunk_results.is_empty() {
        return Err(DocketError::PageRangeInvalid {
            message: "no chunk results to merge".to_string(),
        });
    }

    let mut sorted = chunk_results;
    sorted.sort_by_key(|c| c.chunk_index);

    validate_page_ranges(&sorted)?;
    for chunk in &sorted {
        if let Some(expected) = &chunk.checksum {
            validate_checksum(chunk, expected)?;
        }
    }

    let mut merged_bboxes = Vec::new();
    let mut page_offset = 0u32;
    for chunk in &sorted {
        for bbox in &chunk.bounding_boxes {
            merged_bboxes.push(BoundingBox {
                id: BoundingBoxId::new(),
                document_id,
                page_number: bbox.page + page_offset,
                text: bbox.text.clone(),
                confidence: bbox.confidence,
                reading_order_index: bbox.reading_order_index,
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
            });
        }
        page_offset += chunk.page_count;
    }

    let full_text = sorted
        .iter()
        .map(|c| c.full_text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let total_pages: u32 = sorted.iter().map(|c| c.page_count).sum();
    let weighted_confidence = if total_pages > 0 {
        sorted.iter().map(|c| c.overall_confidence * c.page_count as f64).sum::<f64>() / total_pages as f64
    } else {
        0.0
    };

    let result = MergedOcrResult {
        document_id,
        total_bboxes: merged_bboxes.len(),
        bounding_boxes: merged_bboxes,
        full_text,
        overall_confidence: weighted_confidence,
        page_count: total_pages,
        chunk_count: sorted.len(),
    };

    validate_merged_result(&result, &sorted)?;
    Ok(result)
}

fn validate_page_ranges(sorted: &[ChunkOcrResult]) -> DocketResult<()> {
    let mut errors = Vec::new();

    let first = &sorted[0];
    if first.page_start != 1 {
        errors.push(format!("first chunk starts at page {}, expected 1", first.page_start));
    }

    for (i, chunk) in sorted.iter().enumerate() {
        if chunk.chunk_index != i as u32 {
            errors.push(format!("chunk at position {i} has chunk_index {}, expected {i}", chunk.chunk_index));
        }
        if chunk.page_start > chunk.page_end {
            errors.push(format!(
                "chunk {}: page_start ({}) > page_end ({})",
                chunk.chunk_index, chunk.page_start, chunk.page_end
            ));
        }
        if chunk.page_start < 1 || chunk.page_end < 1 {
            errors.push(format!(
                "chunk {}: invalid page numbers ({}-{})",
                chunk.chunk_index, chunk.page_start, chunk.page_end
            ));
        }
        if i > 0 {
            let prev = &sorted[i - 1];
            let expected_start = prev.page_end + 1;
            if chunk.page_start != expected_start {
                errors.push(format!(
                    "chunk {} starts at page {}, expected {expected_start} (after chunk {} ending at {})",
                    chunk.chunk_index, chunk.page_start, prev.chunk_index, prev.page_end
                ));
            }
        }
    }

    if !errors.is_empty() {
        return Err(DocketError::PageRangeInvalid { message: errors.join("; ") });
    }
    Ok(())
}

fn validate_checksum(chunk: &ChunkOcrResult, expected: &str) -> DocketResult<()> {
    let computed = compute_chunk_checksum(chunk.chunk_index, chunk.page_start, chunk.page_end, chunk.bounding_boxes.len());
    if computed != expected {
        return Err(DocketError::ChecksumMismatch {
            expected: expected.to_string(),
            actual: computed,
        });
    }
    Ok(())
}

fn validate_merged_result(result: &MergedOcrResult, sorted: &[ChunkOcrResult]) -> DocketResult<()> {
    let expected_bboxes: usize = sorted.iter().map(|c| c.bounding_boxes.len()).sum();
    if result.total_bboxes != expected_bboxes {
        return Err(DocketError::BboxCountMismatch {
            expected: expected_bboxes,
            actual: result.total_bboxes,
        });
    }

    let mut pages_seen = std::collections::HashSet::new();
    for bbox in &result.bounding_boxes {
        pages_seen.insert(bbox.page_number);
    }
    if !pages_seen.is_empty() {
        let missing = (1..=result.page_count).filter(|p| !pages_seen.contains(p)).count();
        if missing as f64 > result.page_count as f64 * 0.1 {
            tracing::warn!(missing_count = missing, total_pages = result.page_count, "merge: many pages missing bboxes");
        }
    }

    let mut page_indices: std::collections::HashMap<u32, std::collections::HashSet<u32>> = std::collections::HashMap::new();
    for bbox in &result.bounding_boxes {
        let seen = page_indices.entry(bbox.page_number).or_default();
        if !seen.insert(bbox.reading_order_index) {
            tracing::warn!(page = bbox.page_number, reading_order_index = bbox.reading_order_index, "duplicate reading_order_index on page");
        }
    }

    Ok(())
}
