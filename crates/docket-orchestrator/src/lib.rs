//! Streaming query orchestrator, safety guard and policing, and the job
//! tracker state machine (C11, C12, C18). Sits above `docket-memory` and
//! whatever engine crates a caller wires in — this crate owns the pipeline,
//! not any particular engine's internals.

pub mod job_tracker;
pub mod safety;
pub mod streaming;

pub use safety::{SafetyCheck, SanitizationResult, ViolationType};
pub use streaming::{CompleteEvent, EngineFindings, EngineTrace, QueryDeps, QueryEngine, SourceReference, StreamEvent};
