//! Post-fusion rerank (C10): an optional cross-encoder pass over the fused
//! top-N content strings, plus an "inspector" instrumentation variant that
//! records per-stage timing and per-chunk contributions for debugging a
//! search without changing its result.

use std::time::Instant;

use docket_core::errors::DocketResult;
use docket_core::ids::ChunkId;
use docket_core::traits::Reranker;

use crate::hybrid::SearchHit;

#[derive(Debug, Clone, PartialEq)]
pub struct RerankedHit {
    pub chunk_id: ChunkId,
    pub rrf_score: f64,
    pub rerank_score: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct RerankOutcome {
    pub hits: Vec<RerankedHit>,
    /// Set when the reranker was skipped or failed; the fused order was
    /// kept as-is and truncated to `rerank_top_n`.
    pub fallback_reason: Option<String>,
}

/// Reranks `fused` (already sorted by RRF score) against `contents`, a
/// parallel slice of chunk content keyed by position. On reranker failure
/// this falls back to the fused order truncated to `rerank_top_n`, never
/// propagating the error — a rerank is an enhancement, not a requirement.
pub async fn rerank(
    reranker: &dyn Reranker,
    query: &str,
    fused: &[SearchHit],
    contents: &[String],
    rerank_top_n: usize,
) -> RerankOutcome {
    let candidates: Vec<String> = contents.iter().take(fused.len()).cloned().collect();

    match reranker.rerank(query, &candidates).await {
        Ok(scores) if scores.len() == candidates.len() => {
            let mut scored: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            let hits = scored
                .into_iter()
                .take(rerank_top_n)
                .map(|(idx, score)| RerankedHit {
                    chunk_id: fused[idx].chunk_id,
                    rrf_score: fused[idx].score,
                    rerank_score: Some(score),
                })
                .collect();
            RerankOutcome { hits, fallback_reason: None }
        }
        Ok(_) => fallback(fused, rerank_top_n, "reranker returned a score count mismatched with candidates"),
        Err(e) => {
            tracing::warn!(error = %e, "rerank failed, falling back to fused order");
            fallback(fused, rerank_top_n, "reranker call failed")
        }
    }
}

fn fallback(fused: &[SearchHit], rerank_top_n: usize, reason: &str) -> RerankOutcome {
    let hits = fused
        .iter()
        .take(rerank_top_n)
        .map(|hit| RerankedHit { chunk_id: hit.chunk_id, rrf_score: hit.score, rerank_score: None })
        .collect();
    RerankOutcome { hits, fallback_reason: Some(reason.to_string()) }
}

/// Per-chunk debug contribution recorded by [`inspect`].
#[derive(Debug, Clone)]
pub struct ChunkContribution {
    pub chunk_id: ChunkId,
    pub bm25_rank: Option<usize>,
    pub bm25_score: Option<f64>,
    pub semantic_rank: Option<usize>,
    pub semantic_score: Option<f64>,
    pub rrf_score: f64,
    pub rerank_rank: Option<usize>,
    pub rerank_score: Option<f32>,
    /// First 200 chars of the chunk's content, for debug display.
    pub content_preview: String,
}

#[derive(Debug, Clone)]
pub struct SearchDebugInfo {
    pub embedding_ms: u64,
    pub bm25_ms: u64,
    pub semantic_ms: u64,
    pub fusion_ms: u64,
    pub rerank_ms: u64,
    pub total_ms: u64,
    pub contributions: Vec<ChunkContribution>,
}

/// Stage timings fed into [`inspect`] by a caller that has already run the
/// search pipeline and captured `Instant`s around each stage. `bm25_done`
/// and `semantic_done` both measure from `embedding_done` since the two
/// retrievers run concurrently in [`crate::hybrid::hybrid_search`]; the
/// slower of the two is what the caller actually waited on.
pub struct StageTimings {
    pub start: Instant,
    pub embedding_done: Instant,
    pub bm25_done: Instant,
    pub semantic_done: Instant,
    pub fusion_done: Instant,
    pub rerank_done: Instant,
}

/// Assembles [`SearchDebugInfo`] from the raw per-stage ranked lists, the
/// fused result, the rerank outcome, and chunk content — purely a
/// formatting step, no I/O. Called by the orchestrator's debug-mode path,
/// never on the hot path of an ordinary query.
pub fn inspect(
    timings: &StageTimings,
    bm25_ranked: &[(ChunkId, f64)],
    semantic_ranked: &[(ChunkId, f64)],
    fused: &[SearchHit],
    reranked: &RerankOutcome,
    contents_by_chunk: &std::collections::HashMap<ChunkId, String>,
) -> SearchDebugInfo {
    let embedding_ms = timings.embedding_done.duration_since(timings.start).as_millis() as u64;
    let bm25_ms = timings.bm25_done.duration_since(timings.embedding_done).as_millis() as u64;
    let semantic_ms = timings.semantic_done.duration_since(timings.embedding_done).as_millis() as u64;
    let fusion_ms = timings.fusion_done.duration_since(timings.bm25_done.max(timings.semantic_done)).as_millis() as u64;
    let rerank_ms = timings.rerank_done.duration_since(timings.fusion_done).as_millis() as u64;
    let total_ms = timings.rerank_done.duration_since(timings.start).as_millis() as u64;

    let rerank_rank_of: std::collections::HashMap<ChunkId, (usize, f32)> = reranked
        .hits
        .iter()
        .enumerate()
        .filter_map(|(rank, hit)| hit.rerank_score.map(|score| (hit.chunk_id, (rank + 1, score))))
        .collect();

    let contributions = fused
        .iter()
        .enumerate()
        .map(|(fused_rank, hit)| {
            let bm25_entry = bm25_ranked.iter().enumerate().find(|(_, (id, _))| *id == hit.chunk_id);
            let semantic_entry = semantic_ranked.iter().enumerate().find(|(_, (id, _))| *id == hit.chunk_id);
            let rerank_entry = rerank_rank_of.get(&hit.chunk_id);
            let content = contents_by_chunk.get(&hit.chunk_id).cloned().unwrap_or_default();

            ChunkContribution {
                chunk_id: hit.chunk_id,
                bm25_rank: bm25_entry.map(|(rank, _)| rank + 1),
                bm25_score: bm25_entry.map(|(_, (_, score))| *score),
                semantic_rank: semantic_entry.map(|(rank, _)| rank + 1),
                semantic_score: semantic_entry.map(|(_, (_, score))| *score),
                rrf_score: hit.score,
                rerank_rank: rerank_entry.map(|(rank, _)| *rank),
                rerank_score: rerank_entry.map(|(_, score)| *score),
                content_preview: content.chars().take(200).collect(),
            }
        })
        .collect::<Vec<_>>();

    SearchDebugInfo {
        embedding_ms,
        bm25_ms,
        semantic_ms,
        fusion_ms,
        rerank_ms,
        total_ms,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docket_core::errors::DocketError;

    struct OrderReversingReranker;

    #[async_trait]
    impl Reranker for OrderReversingReranker {
        async fn rerank(&self, _query: &str, candidates: &[String]) -> DocketResult<Vec<f32>> {
            let n = candidates.len();
            Ok((0..n).map(|i| i as f32).collect())
        }
    }

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        async fn rerank(&self, _query: &str, _candidates: &[String]) -> DocketResult<Vec<f32>> {
            Err(DocketError::SearchFailed { message: "rerank backend unreachable".into() })
        }
    }

    fn sample_fused() -> Vec<SearchHit> {
        vec![
            SearchHit { chunk_id: ChunkId::new(), score: 0.5 },
            SearchHit { chunk_id: ChunkId::new(), score: 0.3 },
        ]
    }

    #[tokio::test]
    async fn rerank_reorders_by_descending_score() {
        let fused = sample_fused();
        let contents = vec!["first".to_string(), "second".to_string()];
        let outcome = rerank(&OrderReversingReranker, "q", &fused, &contents, 10).await;

        assert!(outcome.fallback_reason.is_none());
        // index 1 scores higher (1.0) than index 0 (0.0), so it comes first.
        assert_eq!(outcome.hits[0].chunk_id, fused[1].chunk_id);
    }

    #[tokio::test]
    async fn rerank_failure_falls_back_to_fused_order() {
        let fused = sample_fused();
        let contents = vec!["first".to_string(), "second".to_string()];
        let outcome = rerank(&FailingReranker, "q", &fused, &contents, 10).await;

        assert!(outcome.fallback_reason.is_some());
        assert_eq!(outcome.hits[0].chunk_id, fused[0].chunk_id);
        assert!(outcome.hits.iter().all(|h| h.rerank_score.is_none()));
    }

    #[tokio::test]
    async fn fallback_truncates_to_rerank_top_n() {
        let fused = sample_fused();
        let contents = vec!["first".to_string(), "second".to_string()];
        let outcome = rerank(&FailingReranker, "q", &fused, &contents, 1).await;

        assert_eq!(outcome.hits.len(), 1);
    }
}
