use async_trait::async_trait;

use crate::errors::DocketResult;
use crate::ids::{ChunkId, MatterId};

/// Semantic leg of hybrid search (C9). A narrow interface over whatever
/// vector store backs chunk embeddings — brute-force in-process cosine
/// similarity for the reference adapter, but the contract says nothing
/// about the backing implementation.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, matter_id: MatterId, chunk_id: ChunkId, vector: Vec<f32>) -> DocketResult<()>;

    /// Returns `(chunk_id, cosine_similarity)` pairs scoped to `matter_id`,
    /// sorted descending by similarity, at most `limit` entries.
    async fn search(&self, matter_id: MatterId, query: &[f32], limit: usize) -> DocketResult<Vec<(ChunkId, f32)>>;
}
