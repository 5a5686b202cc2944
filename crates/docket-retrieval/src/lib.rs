//! Hybrid search (C9), rerank and inspector (C10), and the cross-matter
//! global search aggregator (C17).

pub mod global;
pub mod hybrid;
pub mod rerank;
pub mod rrf;

pub use global::{global_search, GlobalSearchItem};
pub use hybrid::{hybrid_search, SearchHit, SearchWeights};
pub use rerank::{inspect, rerank as rerank_hits, ChunkContribution, RerankOutcome, RerankedHit, SearchDebugInfo, StageTimings};
