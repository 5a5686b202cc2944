use serde::{Deserialize, Serialize};

/// The error kinds surfaced at the (out-of-scope) transport boundary, per
/// the core's error-handling design. Never constructed directly by callers;
/// derived from a [`crate::errors::DocketError`] via [`DocketError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MatterNotFound,
    InvalidParameter,
    DatabaseNotConfigured,
    SearchFailed,
    QueryBlocked,
    MemoryLimitExceeded,
    PageRangeInvalid,
    ChecksumMismatch,
    BboxCountMismatch,
    CitationVerificationFailed,
    InvalidJobStatus,
    BulkLimitExceeded,
    ItemNotFound,
    StreamError,
}

impl ErrorKind {
    /// Whether a caller may retry the operation unchanged.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::DatabaseNotConfigured | ErrorKind::SearchFailed | ErrorKind::StreamError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        write!(f, "{s}")
    }
}
