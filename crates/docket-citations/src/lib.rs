//! Citation verification against uploaded statute documents (C6): a
//! single-citation Jaccard-similarity matcher, and the batched retrying
//! orchestrator run when a cited act's statute document is uploaded.

pub mod orchestrator;
pub mod verify;

pub use orchestrator::{verify_act_citations, VerificationBatchSummary};
pub use verify::{verify_citation, CitationVerificationOutcome, MISMATCH_THRESHOLD, VERIFIED_THRESHOLD};
