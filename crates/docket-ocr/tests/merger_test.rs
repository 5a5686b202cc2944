use docket_core::ids::DocumentId;
use docket_core::traits::RelativeBoundingBox;
use docket_ocr::{compute_chunk_checksum, merge_results, ChunkOcrResult};

fn bbox(page: u32) -> RelativeBoundingBox {
    RelativeBoundingBox {
        page,
        text: "word".to_string(),
        confidence: 0.9,
        reading_order_index: 0,
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    }
}

fn chunk(index: u32, page_start: u32, page_end: u32, bboxes: Vec<RelativeBoundingBox>) -> ChunkOcrResult {
    let page_count = page_end - page_start + 1;
    ChunkOcrResult {
        chunk_index: index,
        page_start,
        page_end,
        bounding_boxes: bboxes,
        full_text: format!("chunk {index} text"),
        overall_confidence: 0.9,
        page_count,
        checksum: None,
    }
}

#[tokio::test]
async fn boundary_page_offsets_reconcile_to_absolute_pages() {
    let document_id = DocumentId::new();
    let chunks = vec![
        chunk(0, 1, 25, vec![bbox(5)]),
        chunk(1, 26, 50, vec![bbox(1)]),
        chunk(2, 51, 75, vec![]),
    ];

    let merged = merge_results(document_id, chunks).unwrap();

    assert_eq!(merged.page_count, 75);
    assert_eq!(merged.chunk_count, 3);
    assert_eq!(merged.total_bboxes, 2);
    assert_eq!(merged.bounding_boxes[0].page_number, 30);
    assert_eq!(merged.bounding_boxes[1].page_number, 51);
}

#[tokio::test]
async fn non_contiguous_chunks_are_rejected() {
    let document_id = DocumentId::new();
    let chunks = vec![chunk(0, 1, 25, vec![]), chunk(1, 27, 50, vec![])];

    let result = merge_results(document_id, chunks);
    assert!(result.is_err());
}

#[tokio::test]
async fn checksum_mismatch_is_detected() {
    let document_id = DocumentId::new();
    let mut c = chunk(0, 1, 30, vec![bbox(1)]);
    c.checksum = Some("deadbeefdeadbeef".to_string());

    let result = merge_results(document_id, vec![c]);
    assert!(result.is_err());
}

#[tokio::test]
async fn matching_checksum_passes() {
    let document_id = DocumentId::new();
    let mut c = chunk(0, 1, 30, vec![bbox(1)]);
    c.checksum = Some(compute_chunk_checksum(0, 1, 30, 1));

    let merged = merge_results(document_id, vec![c]).unwrap();
    assert_eq!(merged.page_count, 30);
}

#[tokio::test]
async fn weighted_confidence_accounts_for_chunk_page_counts() {
    let document_id = DocumentId::new();
    let mut small = chunk(0, 1, 10, vec![]);
    small.overall_confidence = 1.0;
    let mut large = chunk(1, 11, 100, vec![]);
    large.overall_confidence = 0.5;

    let merged = merge_results(document_id, vec![small, large]).unwrap();
    let expected = (1.0 * 10.0 + 0.5 * 90.0) / 100.0;
    assert!((merged.overall_confidence - expected).abs() < 1e-9);
}
