//! Session memory (C15): a transient per-(matter, user) chat session with
//! a bounded context window and a set of mentioned entities for pronoun
//! resolution. Nothing here is authoritative — eviction is TTL-driven by
//! the KV store, never by an explicit delete from a caller's business
//! logic.

use docket_core::config::CacheConfig;
use docket_core::errors::DocketResult;
use docket_core::guard::scoped_key;
use docket_core::ids::{EntityId, MatterId, UserId};
use docket_core::models::{MessageRole, Session, SessionMessage};
use docket_core::traits::KV;

fn session_key(matter_id: MatterId, user_id: UserId) -> String {
    let user = user_id.to_string();
    scoped_key("session", matter_id, &[user.as_str()])
}

async fn save(kv: &dyn KV, session: &Session, config: &CacheConfig) -> DocketResult<()> {
    let bytes = serde_json::to_vec(session)?;
    let ttl = std::time::Duration::from_secs(config.session_ttl_secs);
    kv.set(&session_key(session.matter_id, session.user_id), bytes, Some(ttl)).await
}

/// Loads the session for (matter, user), creating a fresh one if none
/// exists or the stored record is unreadable.
pub async fn get_or_create(kv: &dyn KV, matter_id: MatterId, user_id: UserId) -> DocketResult<Session> {
    match kv.get(&session_key(matter_id, user_id)).await? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| Session::new(matter_id, user_id))),
        None => Ok(Session::new(matter_id, user_id)),
    }
}

/// Appends a message, refreshes `mentioned_entities`, and persists.
pub async fn add_message(
    kv: &dyn KV,
    session: &mut Session,
    role: MessageRole,
    content: String,
    source_refs: Vec<String>,
    mentioned: &[EntityId],
    config: &CacheConfig,
) -> DocketResult<()> {
    session.add_message(role, content, source_refs);
    session.mentioned_entities.extend(mentioned.iter().copied());
    save(kv, session, config).await
}

/// The bounded tail exposed for context — see [`Session::CONTEXT_WINDOW`].
pub fn recent_context(session: &Session) -> &[SessionMessage] {
    session.recent_context()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_storage::InMemoryKv;

    #[tokio::test]
    async fn get_or_create_returns_fresh_session_when_absent() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let user_id = UserId::new();
        let session = get_or_create(&kv, matter_id, user_id).await.unwrap();
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn add_message_persists_and_bounds_context_window() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let user_id = UserId::new();
        let config = CacheConfig::default();
        let mut session = get_or_create(&kv, matter_id, user_id).await.unwrap();

        for i in 0..7 {
            add_message(&kv, &mut session, MessageRole::User, format!("message {i}"), Vec::new(), &[], &config)
                .await
                .unwrap();
        }

        assert_eq!(session.messages.len(), 7);
        assert_eq!(recent_context(&session).len(), Session::CONTEXT_WINDOW);

        let reloaded = get_or_create(&kv, matter_id, user_id).await.unwrap();
        assert_eq!(reloaded.messages.len(), 7);
    }

    #[tokio::test]
    async fn mentioned_entities_accumulate_across_messages() {
        let kv = InMemoryKv::default();
        let matter_id = MatterId::new();
        let user_id = UserId::new();
        let config = CacheConfig::default();
        let mut session = get_or_create(&kv, matter_id, user_id).await.unwrap();
        let entity_a = EntityId::new();
        let entity_b = EntityId::new();

        add_message(&kv, &mut session, MessageRole::User, "tell me about the lease".into(), Vec::new(), &[entity_a], &config)
            .await
            .unwrap();
        add_message(&kv, &mut session, MessageRole::Assistant, "it covers the lease".into(), Vec::new(), &[entity_b], &config)
            .await
            .unwrap();

        assert!(session.mentioned_entities.contains(&entity_a));
        assert!(session.mentioned_entities.contains(&entity_b));
    }
}
