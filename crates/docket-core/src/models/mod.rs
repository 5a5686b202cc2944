pub mod cache;
pub mod chunk;
pub mod citation;
pub mod document;
pub mod entity;
pub mod finding;
pub mod history;
pub mod job;
pub mod matter;
pub mod session;
pub mod timeline;

pub use cache::{CachedQueryResult, EntityGraphCache, TimelineCache};
pub use chunk::{BoundingBox, Chunk, ChunkTier};
pub use citation::{ActResolution, ActResolutionStatus, ActUserAction, ExtractedCitation, VerificationStatus};
pub use document::{Document, DocumentStatus, DocumentType};
pub use entity::{Entity, EntityMention, EntityRelationship, EntityType, RelationshipType};
pub use finding::{
    aggregate_stats, requirement_tier, FindingType, FindingVerification, RequirementTier,
    VerificationDecision, VerificationStats,
};
pub use history::QueryHistoryEntry;
pub use job::{validate_transition, Job, JobStatus, JobTransition, StageHistoryEntry};
pub use matter::{Matter, MatterMember, MatterRole};
pub use session::{MessageRole, Session, SessionMessage};
pub use timeline::{
    decode_ambiguity, encode_ambiguity, Contradiction, ContradictionSeverity, DatePrecision,
    Statement, TimelineEvent,
};
