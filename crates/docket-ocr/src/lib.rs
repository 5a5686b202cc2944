//! PDF splitting (C2), OCR result merging (C3), and tiered OCR validation
//! (C4). PDF byte decoding and OCR model inference are non-goals of the
//! core — both are reached through [`docket_core::traits::PdfPageSource`]
//! and [`docket_core::traits::OcrProvider`] respectively.

pub mod merger;
pub mod splitter;
pub mod validator;

pub use merger::{compute_chunk_checksum, merge_results, ChunkOcrResult, MergedOcrResult};
pub use splitter::{PdfChunk, PdfSplitter, StreamingSplitResult};
pub use validator::{validate_document, CorrectionType, LowConfidenceWord, ValidationResult};
