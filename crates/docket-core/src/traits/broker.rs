use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DocketResult;

/// A queued unit of background work, addressed by topic (e.g. `"ocr"`,
/// `"citation_verification"`, `"entity_extraction"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Fire-and-forget background job queue. The orchestrator enqueues
/// evaluation/verification work onto it without waiting for completion.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, message: BrokerMessage) -> DocketResult<()>;
    async fn poll(&self, topic: &str, max: usize) -> DocketResult<Vec<BrokerMessage>>;
}
