use async_trait::async_trait;

use crate::errors::DocketResult;

/// PDF byte decoding is an explicit non-goal of the core; this is the seam
/// the PDF splitter (C2) calls through instead of parsing PDF structure
/// itself. Page numbers are 1-based inclusive on both sides of the
/// interface, matching the splitter's external page-numbering contract.
#[async_trait]
pub trait PdfPageSource: Send + Sync {
    /// Total page count of the source document.
    async fn page_count(&self, pdf_bytes: &[u8]) -> DocketResult<u32>;

    /// A new, independently valid PDF containing only `page_start..=page_end`.
    async fn extract_range(&self, pdf_bytes: &[u8], page_start: u32, page_end: u32) -> DocketResult<Vec<u8>>;
}
