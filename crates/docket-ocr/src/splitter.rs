//! Memory-safe page-range splitting (C2). PDF byte decoding itself is a
//! non-goal of the core — both modes call through [`PdfPageSource`] for the
//! actual page counting and extraction.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use docket_core::errors::{DocketError, DocketResult};
use docket_core::traits::PdfPageSource;
use uuid::Uuid;

/// A single contiguous page-range chunk produced by the in-memory mode.
/// Page numbers are 1-based inclusive, matching the splitter's external
/// contract.
#[derive(Debug, Clone)]
pub struct PdfChunk {
    pub chunk_index: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub bytes: Vec<u8>,
}

/// Tracks cumulative bytes produced against the configured memory budget.
/// A true RSS/heap sample would require a platform-specific crate the
/// teacher's stack doesn't carry; cumulative output size is the closest
/// proxy available without one, and is conservative (it never
/// under-counts).
struct MemoryWatchdog {
    produced_bytes: AtomicU64,
    budget_bytes: u64,
    warn_fraction: f64,
    warned: std::sync::atomic::AtomicBool,
}

impl MemoryWatchdog {
    fn new(budget_bytes: u64, warn_fraction: f64) -> Self {
        Self {
            produced_bytes: AtomicU64::new(0),
            budget_bytes,
            warn_fraction,
            warned: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn record(&self, len: usize) -> DocketResult<()> {
        let total = self.produced_bytes.fetch_add(len as u64, Ordering::SeqCst) + len as u64;
        let warn_at = (self.budget_bytes as f64 * self.warn_fraction) as u64;

        if total > warn_at && !self.warned.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                produced_bytes = total,
                budget_bytes = self.budget_bytes,
                "pdf split approaching memory budget"
            );
        }

        if total > self.budget_bytes {
            return Err(DocketError::MemoryLimitExceeded {
                used_bytes: total,
                limit_bytes: self.budget_bytes,
            });
        }
        Ok(())
    }
}

pub struct PdfSplitter<P: PdfPageSource> {
    source: P,
    config: docket_core::config::OcrConfig,
}

impl<P: PdfPageSource> PdfSplitter<P> {
    pub fn new(source: P, config: docket_core::config::OcrConfig) -> Self {
        Self { source, config }
    }

    pub fn should_chunk(&self, page_count: u32) -> bool {
        page_count > self.config.single_chunk_threshold_pages
    }

    /// In-memory split, bounded by a cooperative 30s watchdog timeout and a
    /// memory budget watchdog. Returns a single chunk for documents at or
    /// below the single-chunk threshold.
    pub async fn split(&self, pdf_bytes: &[u8]) -> DocketResult<Vec<PdfChunk>> {
        let timeout = Duration::from_secs(self.config.split_timeout_secs);
        match tokio::time::timeout(timeout, self.split_inner(pdf_bytes)).await {
            Ok(result) => result,
            Err(_) => Err(DocketError::StreamError {
                message: format!("pdf split exceeded {}s watchdog timeout", self.config.split_timeout_secs),
            }),
        }
    }

    async fn split_inner(&self, pdf_bytes: &[u8]) -> DocketResult<Vec<PdfChunk>> {
        let total_pages = self.source.page_count(pdf_bytes).await?;
        if total_pages == 0 {
            return Err(DocketError::invalid_parameter("PDF has no pages"));
        }

        if !self.should_chunk(total_pages) {
            let bytes = self.source.extract_range(pdf_bytes, 1, total_pages).await?;
            return Ok(vec![PdfChunk {
                chunk_index: 0,
                page_start: 1,
                page_end: total_pages,
                bytes,
            }]);
        }

        let chunk_size = self.config.default_chunk_pages.min(self.config.max_chunk_pages);
        let watchdog = MemoryWatchdog::new(self.config.memory_budget_bytes, self.config.memory_warn_fraction);

        let mut chunks = Vec::new();
        let mut page_start = 1u32;
        let mut chunk_index = 0u32;

        while page_start <= total_pages {
            let page_end = (page_start + chunk_size - 1).min(total_pages);
            let bytes = self.source.extract_range(pdf_bytes, page_start, page_end).await?;
            watchdog.record(bytes.len())?;

            chunks.push(PdfChunk {
                chunk_index,
                page_start,
                page_end,
                bytes,
            });

            page_start = page_end + 1;
            chunk_index += 1;
        }

        Ok(chunks)
    }

    /// Streaming split: writes each chunk to `chunk_N.pdf.tmp` then renames
    /// to `chunk_N.pdf` on the same filesystem. The returned handle owns a
    /// scoped temp directory that is removed on every exit path (explicit
    /// `cleanup()`, or best-effort on `Drop`).
    pub async fn split_streaming(&self, pdf_bytes: &[u8]) -> DocketResult<StreamingSplitResult> {
        let timeout = Duration::from_secs(self.config.split_timeout_secs);
        match tokio::time::timeout(timeout, self.split_streaming_inner(pdf_bytes)).await {
            Ok(result) => result,
            Err(_) => Err(DocketError::StreamError {
                message: format!("pdf streaming split exceeded {}s watchdog timeout", self.config.split_timeout_secs),
            }),
        }
    }

    async fn split_streaming_inner(&self, pdf_bytes: &[u8]) -> DocketResult<StreamingSplitResult> {
        let total_pages = self.source.page_count(pdf_bytes).await?;
        if total_pages == 0 {
            return Err(DocketError::invalid_parameter("PDF has no pages"));
        }

        let temp_dir = std::env::temp_dir().join(format!("docket-pdf-chunks-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&temp_dir)
            .await
            .map_err(|e| DocketError::StreamError { message: format!("failed to create temp dir: {e}") })?;

        let result = self.write_streaming_chunks(pdf_bytes, total_pages, &temp_dir).await;
        match result {
            Ok(chunks) => Ok(StreamingSplitResult { temp_dir, chunks }),
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&temp_dir).await;
                Err(e)
            }
        }
    }

    async fn write_streaming_chunks(
        &self,
        pdf_bytes: &[u8],
        total_pages: u32,
        temp_dir: &Path,
    ) -> DocketResult<Vec<(PathBuf, u32, u32)>> {
        let chunk_size = self.config.default_chunk_pages.min(self.config.max_chunk_pages);
        let mut chunks = Vec::new();
        let mut page_start = 1u32;
        let mut chunk_index = 0u32;

        while page_start <= total_pages {
            let page_end = (page_start + chunk_size - 1).min(total_pages);
            let bytes = self.source.extract_range(pdf_bytes, page_start, page_end).await?;

            let final_path = temp_dir.join(format!("chunk_{chunk_index}.pdf"));
            let tmp_path = temp_dir.join(format!("chunk_{chunk_index}.pdf.tmp"));

            if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                return Err(DocketError::StreamError { message: format!("failed to write chunk {chunk_index}: {e}") });
            }
            if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                return Err(DocketError::StreamError { message: format!("failed to rename chunk {chunk_index}: {e}") });
            }

            chunks.push((final_path, page_start, page_end));
            page_start = page_end + 1;
            chunk_index += 1;
        }

        Ok(chunks)
    }
}

/// Owns a temp directory of atomically-written chunk files. Cleans up on
/// `cleanup()` or, best-effort, on `Drop`.
pub struct StreamingSplitResult {
    temp_dir: PathBuf,
    chunks: Vec<(PathBuf, u32, u32)>,
}

impl StreamingSplitResult {
    pub fn chunks(&self) -> &[(PathBuf, u32, u32)] {
        &self.chunks
    }

    pub async fn read_chunk(&self, index: usize) -> DocketResult<(Vec<u8>, u32, u32)> {
        let (path, start, end) = self
            .chunks
            .get(index)
            .ok_or_else(|| DocketError::invalid_parameter(format!("chunk index {index} out of range")))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DocketError::StreamError { message: format!("failed to read chunk {index}: {e}") })?;
        Ok((bytes, *start, *end))
    }

    pub async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(&self.temp_dir).await;
    }
}

impl Drop for StreamingSplitResult {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}
