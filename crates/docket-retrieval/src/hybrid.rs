//! Single-matter hybrid search (C9): BM25 + dense vector retrieval fused
//! by RRF. Callers are assumed to have already run the C1 namespace guard
//! — this module takes `matter_id` purely as a storage/index filter, not
//! an authorization check.

use docket_core::config::RetrievalConfig;
use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{ChunkId, MatterId};
use docket_core::traits::{Embedder, MetaStore, VectorIndex};

use crate::rrf;

#[derive(Debug, Clone, Copy)]
pub struct SearchWeights {
    pub bm25: f64,
    pub semantic: f64,
}

impl SearchWeights {
    pub fn clamped(self, config: &RetrievalConfig) -> Self {
        let clamp = |w: f64| w.clamp(config.weight_min, config.weight_max);
        Self { bm25: clamp(self.bm25), semantic: clamp(self.semantic) }
    }
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self { bm25: 1.0, semantic: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub score: f64,
}

/// Runs the BM25 and semantic retrievers concurrently on one task (no
/// per-retriever spawn) and fuses their ranked lists. If one retriever
/// fails the other's results are still returned, with a logged warning;
/// if both fail this returns a retryable [`DocketError::SearchFailed`]
/// rather than an empty result silently read as "no matches."
pub async fn hybrid_search(
    meta: &dyn MetaStore,
    vector_index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    matter_id: MatterId,
    query: &str,
    limit: usize,
    weights: SearchWeights,
    config: &RetrievalConfig,
) -> DocketResult<Vec<SearchHit>> {
    if query.trim().chars().count() < config.min_query_len {
        return Ok(Vec::new());
    }

    let weights = weights.clamped(config);
    let pool_size = config.candidate_pool_size.max(limit);

    let query_vector = embedder.embed(std::slice::from_ref(&query.to_string())).await;

    let bm25_future = meta.fts_search(matter_id, query, pool_size);
    let semantic_future = async {
        match query_vector {
            Ok(vectors) => match vectors.into_iter().next() {
                Some(vector) => vector_index.search(matter_id, &vector, pool_size).await,
                None => Ok(Vec::new()),
            },
            Err(e) => Err(e),
        }
    };

    let (bm25_result, semantic_result) = tokio::join!(bm25_future, semantic_future);

    let bm25_ranked: Vec<(ChunkId, usize)> = match &bm25_result {
        Ok(hits) => hits.iter().enumerate().map(|(rank, (chunk_id, _))| (*chunk_id, rank + 1)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "bm25 retriever failed, degrading to semantic-only");
            Vec::new()
        }
    };

    let semantic_ranked: Vec<(ChunkId, usize)> = match &semantic_result {
        Ok(hits) => hits.iter().enumerate().map(|(rank, (chunk_id, _))| (*chunk_id, rank + 1)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "semantic retriever failed, degrading to bm25-only");
            Vec::new()
        }
    };

    if bm25_result.is_err() && semantic_result.is_err() {
        return Err(DocketError::SearchFailed { message: "both bm25 and semantic retrievers failed".into() });
    }

    let fused = rrf::fuse(&[(&bm25_ranked, weights.bm25), (&semantic_ranked, weights.semantic)], config.rrf_k);

    Ok(fused.into_iter().take(limit).map(|(chunk_id, score)| SearchHit { chunk_id, score }).collect())
}
