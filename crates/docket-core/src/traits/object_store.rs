use async_trait::async_trait;

use crate::errors::DocketResult;

/// Content-addressed blob storage for source PDFs and derived artifacts.
/// Paths always come from [`crate::guard::blob_path`] so every key is
/// matter-scoped.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> DocketResult<()>;
    async fn get(&self, path: &str) -> DocketResult<Vec<u8>>;
    async fn delete(&self, path: &str) -> DocketResult<()>;
    async fn exists(&self, path: &str) -> DocketResult<bool>;
}
