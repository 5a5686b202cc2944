mod kind;

pub use kind::ErrorKind;

use crate::ids::MatterId;

/// Top-level error type for the docket core. All subsystem errors convert
/// into this via `From` impls, the same way `cortex_error.rs` aggregates
/// `StorageError`/`EmbeddingError`/`TemporalError` into `CortexError`.
#[derive(Debug, thiserror::Error)]
pub enum DocketError {
    #[error("matter not found or caller lacks access: {matter_id}")]
    MatterNotFound { matter_id: MatterId },

    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("storage layer unavailable: {message}")]
    DatabaseNotConfigured { message: String },

    #[error("search failed: {message}")]
    SearchFailed { message: String },

    #[error("query blocked by safety guard: {reason}")]
    QueryBlocked { reason: String },

    #[error("memory limit exceeded: {used_bytes} bytes over {limit_bytes} byte budget")]
    MemoryLimitExceeded { used_bytes: u64, limit_bytes: u64 },

    #[error("page range invalid: {message}")]
    PageRangeInvalid { message: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("bbox count mismatch: expected {expected}, got {actual}")]
    BboxCountMismatch { expected: usize, actual: usize },

    #[error("citation verification batch failed: {message}")]
    CitationVerificationFailed { message: String },

    #[error("invalid job status transition: {from} -> {to}")]
    InvalidJobStatus { from: String, to: String },

    #[error("bulk operation limit exceeded: {requested} items, max {max}")]
    BulkLimitExceeded { requested: usize, max: usize },

    #[error("item not found")]
    ItemNotFound,

    #[error("stream error: {message}")]
    StreamError { message: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}

impl DocketError {
    /// Map to the stable error kind surfaced at the transport boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocketError::MatterNotFound { .. } => ErrorKind::MatterNotFound,
            DocketError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            DocketError::DatabaseNotConfigured { .. } => ErrorKind::DatabaseNotConfigured,
            DocketError::SearchFailed { .. } => ErrorKind::SearchFailed,
            DocketError::QueryBlocked { .. } => ErrorKind::QueryBlocked,
            DocketError::MemoryLimitExceeded { .. } => ErrorKind::MemoryLimitExceeded,
            DocketError::PageRangeInvalid { .. } => ErrorKind::PageRangeInvalid,
            DocketError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            DocketError::BboxCountMismatch { .. } => ErrorKind::BboxCountMismatch,
            DocketError::CitationVerificationFailed { .. } => {
                ErrorKind::CitationVerificationFailed
            }
            DocketError::InvalidJobStatus { .. } => ErrorKind::InvalidJobStatus,
            DocketError::BulkLimitExceeded { .. } => ErrorKind::BulkLimitExceeded,
            DocketError::ItemNotFound => ErrorKind::ItemNotFound,
            DocketError::StreamError { .. } => ErrorKind::StreamError,
            DocketError::SerializationError(_) | DocketError::ConfigError(_) => {
                ErrorKind::InvalidParameter
            }
        }
    }

    /// Whether a caller may retry the operation unchanged.
    pub fn retryable(&self) -> bool {
        self.kind().retryable()
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        DocketError::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type DocketResult<T> = Result<T, DocketError>;
