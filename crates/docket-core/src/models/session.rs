use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids::{EntityId, MatterId, SessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// `{role, content, source_refs?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: String,
    pub source_refs: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Per (matter, user) transient chat session with a bounded tail and a set
/// of mentioned entities for pronoun resolution. Ephemeral: TTL or
/// LRU-evicted by the KV store; nothing in this tier is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub matter_id: MatterId,
    pub user_id: UserId,
    pub messages: Vec<SessionMessage>,
    pub mentioned_entities: HashSet<EntityId>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Number of most-recent messages exposed for context.
    pub const CONTEXT_WINDOW: usize = 5;

    pub fn new(matter_id: MatterId, user_id: UserId) -> Self {
        Self {
            id: SessionId::new(),
            matter_id,
            user_id,
            messages: Vec::new(),
            mentioned_entities: HashSet::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn add_message(&mut self, role: MessageRole, content: String, source_refs: Vec<String>) {
        self.messages.push(SessionMessage {
            role,
            content,
            source_refs,
            created_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn recent_context(&self) -> &[SessionMessage] {
        let start = self.messages.len().saturating_sub(Self::CONTEXT_WINDOW);
        &self.messages[start..]
    }
}
