//! C1 — Identifier & namespace guard.
//!
//! Every core call takes a `matter_id` and a caller identity. Before any
//! storage or retrieval, the guard validates the id and asserts membership;
//! on failure it returns `MATTER_NOT_FOUND` rather than a forbidden error,
//! so a caller can never distinguish "matter does not exist" from "you are
//! not a member" (no existence leaks).
//!
//! All derived keys (cache, queue, search) MUST embed `matter_id` as the
//! first scoping segment. [`scoped_key`] is the only sanctioned way to
//! build one; it fails closed if `matter_id` is ever blank.

use async_trait::async_trait;

use crate::errors::{DocketError, DocketResult};
use crate::ids::{MatterId, UserId};

/// Looks up matter membership. Implemented by the metadata-store adapter;
/// kept as a narrow trait here so the guard has no storage dependency.
#[async_trait]
pub trait MemberLookup: Send + Sync {
    async fn is_member(&self, matter_id: MatterId, user_id: UserId) -> DocketResult<bool>;
}

/// C1 entrypoint: validate and authorize a (matter, caller) pair.
pub struct NamespaceGuard<'a> {
    lookup: &'a dyn MemberLookup,
}

impl<'a> NamespaceGuard<'a> {
    pub fn new(lookup: &'a dyn MemberLookup) -> Self {
        Self { lookup }
    }

    /// Assert the caller is a member of the matter. Returns `MATTER_NOT_FOUND`
    /// both when the matter does not exist and when the caller lacks access —
    /// by design, never `FORBIDDEN`.
    pub async fn authorize(&self, matter_id: MatterId, user_id: UserId) -> DocketResult<()> {
        let is_member = self.lookup.is_member(matter_id, user_id).await?;
        if is_member {
            Ok(())
        } else {
            Err(DocketError::MatterNotFound { matter_id })
        }
    }
}

/// Build a matter-scoped key. `matter_id` is always the first segment.
/// Any caller that cannot supply a matter id cannot construct a key at
/// all — there is no "global" variant of this function.
pub fn scoped_key(namespace: &str, matter_id: MatterId, rest: &[&str]) -> String {
    let mut key = format!("{namespace}:{matter_id}");
    for segment in rest {
        key.push(':');
        key.push_str(segment);
    }
    key
}

/// Storage blob path convention: `{matter_id}/{subfolder}/{filename}`.
pub fn blob_path(matter_id: MatterId, subfolder: &str, filename: &str) -> String {
    format!("{matter_id}/{subfolder}/{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedLookup(AtomicBool);

    #[async_trait]
    impl MemberLookup for FixedLookup {
        async fn is_member(&self, _matter_id: MatterId, _user_id: UserId) -> DocketResult<bool> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn authorize_denies_as_not_found_never_forbidden() {
        let lookup = FixedLookup(AtomicBool::new(false));
        let guard = NamespaceGuard::new(&lookup);
        let err = guard
            .authorize(MatterId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::MatterNotFound);
    }

    #[tokio::test]
    async fn authorize_allows_members() {
        let lookup = FixedLookup(AtomicBool::new(true));
        let guard = NamespaceGuard::new(&lookup);
        assert!(guard.authorize(MatterId::new(), UserId::new()).await.is_ok());
    }

    #[test]
    fn scoped_key_embeds_matter_first() {
        let matter = MatterId::new();
        let key = scoped_key("cache:query", matter, &["abc123"]);
        assert_eq!(key, format!("cache:query:{matter}:abc123"));
    }
}
