//! Single-citation verification: matches a citation's quoted text against
//! an uploaded statute document's OCR content.

use std::collections::HashSet;

use docket_core::ids::BoundingBoxId;
use docket_core::models::{BoundingBox, ExtractedCitation, VerificationStatus};

/// Similarity score at/above which a match counts as verified.
pub const VERIFIED_THRESHOLD: f64 = 0.70;
/// Similarity score at/above which a match counts as a (weaker) mismatch
/// rather than "section not found" — the section exists in the statute but
/// the quoted text diverges meaningfully from it.
pub const MISMATCH_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone)]
pub struct CitationVerificationOutcome {
    pub status: VerificationStatus,
    pub target_page: Option<u32>,
    pub target_bbox_ids: Vec<BoundingBoxId>,
    pub similarity_score: f64,
}

/// Verifies one citation against the statute document's bounding boxes.
/// Picks the page whose concatenated text best matches the citation's
/// `quoted_text` (falling back to `raw_text` when no quote was captured)
/// by word-set Jaccard similarity, then classifies the page's best score
/// into a [`VerificationStatus`].
pub fn verify_citation(citation: &ExtractedCitation, statute_bboxes: &[BoundingBox]) -> CitationVerificationOutcome {
    let query_text = citation.quoted_text.as_deref().unwrap_or(&citation.raw_text);
    if query_text.trim().is_empty() || statute_bboxes.is_empty() {
        return CitationVerificationOutcome {
            status: VerificationStatus::SectionNotFound,
            target_page: None,
            target_bbox_ids: Vec::new(),
            similarity_score: 0.0,
        };
    }

    let query_tokens = tokenize(query_text);

    let mut pages: std::collections::BTreeMap<u32, Vec<&BoundingBox>> = std::collections::BTreeMap::new();
    for bbox in statute_bboxes {
        pages.entry(bbox.page_number).or_default().push(bbox);
    }

    let mut best_page = None;
    let mut best_score = 0.0;
    let mut best_bboxes: Vec<&BoundingBox> = Vec::new();

    for (page, bboxes) in &pages {
        let page_text = bboxes.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join(" ");
        let page_tokens = tokenize(&page_text);
        let score = jaccard(&query_tokens, &page_tokens);
        if score > best_score {
            best_score = score;
            best_page = Some(*page);
            best_bboxes = bboxes.clone();
        }
    }

    let status = if best_score >= VERIFIED_THRESHOLD {
        VerificationStatus::Verified
    } else if best_score >= MISMATCH_THRESHOLD {
        VerificationStatus::Mismatch
    } else {
        VerificationStatus::SectionNotFound
    };

    let target_bbox_ids = if matches!(status, VerificationStatus::Verified | VerificationStatus::Mismatch) {
        best_bboxes.iter().map(|b| b.id).collect()
    } else {
        Vec::new()
    };

    CitationVerificationOutcome {
        status,
        target_page: if target_bbox_ids.is_empty() { None } else { best_page },
        target_bbox_ids,
        similarity_score: best_score,
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::ids::DocumentId;

    fn bbox(document_id: DocumentId, page: u32, text: &str, order: u32) -> BoundingBox {
        BoundingBox {
            id: BoundingBoxId::new(),
            document_id,
            page_number: page,
            text: text.to_string(),
            confidence: 0.95,
            reading_order_index: order,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    fn citation_with_quote(quoted_text: &str) -> ExtractedCitation {
        ExtractedCitation {
            id: docket_core::ids::CitationId::new(),
            act_name: "Negotiable Instruments Act".into(),
            canonical_act_name: Some("Negotiable Instruments Act".into()),
            section: "138".into(),
            subsection: None,
            clause: None,
            raw_text: "Section 138".into(),
            quoted_text: Some(quoted_text.to_string()),
            confidence: 80,
            verification_status: VerificationStatus::Pending,
            source_document_id: DocumentId::new(),
            source_chunk_id: None,
            page_number: None,
        }
    }

    #[test]
    fn matching_text_verifies_on_the_right_page() {
        let act_doc = DocumentId::new();
        let bboxes = vec![
            bbox(act_doc, 1, "preamble text not relevant", 0),
            bbox(act_doc, 12, "where any cheque is returned by the bank unpaid dishonour of cheque", 0),
        ];
        let citation = citation_with_quote("cheque is returned by the bank unpaid dishonour of cheque");
        let outcome = verify_citation(&citation, &bboxes);
        assert_eq!(outcome.status, VerificationStatus::Verified);
        assert_eq!(outcome.target_page, Some(12));
        assert!(outcome.similarity_score >= VERIFIED_THRESHOLD);
    }

    #[test]
    fn no_statute_content_yields_section_not_found() {
        let citation = citation_with_quote("cheque is returned by the bank unpaid");
        let outcome = verify_citation(&citation, &[]);
        assert_eq!(outcome.status, VerificationStatus::SectionNotFound);
        assert!(outcome.target_bbox_ids.is_empty());
    }

    #[test]
    fn weakly_related_text_is_a_mismatch_not_verified() {
        let act_doc = DocumentId::new();
        let bboxes = vec![bbox(act_doc, 5, "cheque bank returned unrelated matter entirely about land records", 0)];
        let citation = citation_with_quote("cheque is returned by the bank unpaid dishonour penalty imprisonment fine");
        let outcome = verify_citation(&citation, &bboxes);
        assert_ne!(outcome.status, VerificationStatus::Verified);
    }
}
