use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// RRF smoothing constant. Larger values flatten the influence of rank
    /// position; 60 is the standard literature default and what the fusion
    /// proptests assume.
    pub rrf_k: f64,
    /// Default number of results returned when a caller doesn't specify one.
    pub default_limit: usize,
    /// Weight applied to BM25 ranks before fusion.
    pub bm25_weight: f64,
    /// Weight applied to semantic ranks before fusion.
    pub semantic_weight: f64,
    /// Valid inclusive range for either weight.
    pub weight_min: f64,
    pub weight_max: f64,
    /// Candidates retained per leg before fusion.
    pub candidate_pool_size: usize,
    /// Results kept after reranking, before truncation to the caller limit.
    pub rerank_top_n: usize,
    /// Cap on matters searched concurrently in a global search.
    pub global_search_matter_concurrency: usize,
    /// Per-matter result cap folded into a global search before cross-matter
    /// fusion.
    pub global_per_matter_limit: usize,
    /// Clamp bounds applied to a caller-supplied global search limit.
    pub global_limit_min: usize,
    pub global_limit_max: usize,
    pub global_limit_default: usize,
    /// Max title-match hits blended into global search results.
    pub title_match_cap: usize,
    /// Minimum query length (in `char`s, after trimming) to run either
    /// retriever. Shorter queries return an empty result without touching
    /// BM25, the embedder, or the vector index.
    pub min_query_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            default_limit: 20,
            bm25_weight: 1.0,
            semantic_weight: 1.0,
            weight_min: 0.0,
            weight_max: 2.0,
            candidate_pool_size: 100,
            rerank_top_n: 20,
            global_search_matter_concurrency: 8,
            global_per_matter_limit: 10,
            global_limit_min: 1,
            global_limit_max: 50,
            global_limit_default: 20,
            title_match_cap: 5,
            min_query_len: 2,
        }
    }
}
