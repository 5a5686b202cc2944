use async_trait::async_trait;

use crate::errors::DocketResult;

/// Dense vector embedding backend for the semantic leg of hybrid search
/// (C9). Implementations may batch internally; this trait takes batches
/// explicitly so callers control request shape.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;
    async fn embed(&self, texts: &[String]) -> DocketResult<Vec<Vec<f32>>>;
}

/// Cross-encoder reranker (C10). Scores each candidate against the query;
/// higher is more relevant. Implementations are free to batch internally.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, query: &str, candidates: &[String]) -> DocketResult<Vec<f32>>;
}
