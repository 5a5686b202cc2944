//! Per-request correlation ID (C19). Honors an inbound `X-Correlation-ID`
//! if present; otherwise mints a fresh one. Carried explicitly through
//! function arguments and `tracing::Span` fields — never a global or
//! thread-local, so concurrent requests on the same worker never cross
//! wires.

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Honors an inbound header value if it parses as a UUID; otherwise
    /// mints a fresh ID rather than rejecting the request over a malformed
    /// header.
    pub fn from_header(value: Option<&str>) -> Self {
        value.and_then(|v| Uuid::parse_str(v.trim()).ok()).map(Self).unwrap_or_else(Self::new)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honors_a_valid_inbound_header() {
        let inbound = Uuid::new_v4().to_string();
        let id = CorrelationId::from_header(Some(&inbound));
        assert_eq!(id.to_string(), inbound);
    }

    #[test]
    fn generates_fresh_id_when_header_absent() {
        let a = CorrelationId::from_header(None);
        let b = CorrelationId::from_header(None);
        assert_ne!(a, b);
    }

    #[test]
    fn generates_fresh_id_when_header_malformed() {
        let id = CorrelationId::from_header(Some("not-a-uuid"));
        assert!(Uuid::parse_str(&id.to_string()).is_ok());
    }
}
