//! Observability (C19): correlation-ID propagation and structured logging
//! shared by every crate above. A per-request [`CorrelationId`] is carried
//! explicitly (never a global), attached to a `tracing::Span` alongside
//! `user_id`/`matter_id` when they're in scope, and every record passes
//! through [`redact::redact`] before reaching a sink.

pub mod correlation;
pub mod init;
pub mod redact;

pub use correlation::CorrelationId;
pub use init::init_tracing;

use docket_core::ids::{MatterId, UserId};

/// Opens the per-request span every core entrypoint should run inside.
/// `correlation_id` is always present; `user_id`/`matter_id` are recorded
/// only when known at the call site, matching C19's "when in scope"
/// requirement rather than logging empty placeholders.
pub fn request_span(correlation_id: CorrelationId, user_id: Option<UserId>, matter_id: Option<MatterId>) -> tracing::Span {
    tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        user_id = user_id.map(|u| u.to_string()),
        matter_id = matter_id.map(|m| m.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_span_always_carries_a_correlation_id() {
        let id = CorrelationId::new();
        let span = request_span(id, None, None);
        assert_eq!(span.metadata().map(|m| m.name()), Some("request"));
    }
}
