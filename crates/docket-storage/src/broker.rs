use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use docket_core::errors::DocketResult;
use docket_core::traits::{Broker, BrokerMessage};

/// In-memory fire-and-forget queue, one FIFO per topic. Good enough for a
/// single-process deployment; a durable broker (e.g. backed by a message
/// bus) would implement the same trait.
#[derive(Default)]
pub struct InMemoryBroker {
    topics: DashMap<String, Mutex<VecDeque<BrokerMessage>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, message: BrokerMessage) -> DocketResult<()> {
        let queue = self.topics.entry(message.topic.clone()).or_default();
        queue.lock().await.push_back(message);
        Ok(())
    }

    async fn poll(&self, topic: &str, max: usize) -> DocketResult<Vec<BrokerMessage>> {
        let Some(queue) = self.topics.get(topic) else {
            return Ok(Vec::new());
        };
        let mut queue = queue.lock().await;
        let mut out = Vec::with_capacity(max.min(queue.len()));
        for _ in 0..max {
            match queue.pop_front() {
                Some(message) => out.push(message),
                None => break,
            }
        }
        Ok(out)
    }
}
