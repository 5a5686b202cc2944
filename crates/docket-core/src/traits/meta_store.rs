use async_trait::async_trait;

use crate::errors::DocketResult;
use crate::ids::{ChunkId, CitationId, DocumentId, EntityId, FindingId, JobId, MatterId, UserId};
use crate::models::{
    ActResolution, BoundingBox, Chunk, Document, Entity, EntityRelationship, ExtractedCitation,
    FindingVerification, Job, Matter, MatterMember, StageHistoryEntry, TimelineEvent,
};

/// Durable metadata storage: documents, chunks, citations, entities,
/// timeline, jobs, findings, and matter membership. Grounded on the
/// teacher's `memory_crud`/`queries` split, collapsed here into one
/// interface since every op is matter-scoped CRUD over a relational store.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn is_member(&self, matter_id: MatterId, user_id: UserId) -> DocketResult<bool>;
    async fn matter_members(&self, matter_id: MatterId) -> DocketResult<Vec<MatterMember>>;

    /// The membership join C17's global search enumerates accessible
    /// matters through.
    async fn list_matters_for_user(&self, user_id: UserId) -> DocketResult<Vec<Matter>>;
    async fn upsert_matter(&self, matter: &Matter) -> DocketResult<()>;
    async fn add_matter_member(&self, member: &MatterMember) -> DocketResult<()>;

    async fn insert_document(&self, document: &Document) -> DocketResult<()>;
    async fn get_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Option<Document>>;
    async fn list_documents(&self, matter_id: MatterId) -> DocketResult<Vec<Document>>;
    async fn soft_delete_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<()>;

    /// Persists a merged OCR result's bounding boxes. Re-processing a
    /// document replaces its bounding boxes the same way it replaces chunks.
    async fn replace_bounding_boxes(&self, document_id: DocumentId, bboxes: Vec<BoundingBox>) -> DocketResult<()>;
    async fn list_bounding_boxes(&self, document_id: DocumentId) -> DocketResult<Vec<BoundingBox>>;

    async fn replace_chunks(&self, matter_id: MatterId, document_id: DocumentId, chunks: Vec<Chunk>) -> DocketResult<()>;
    async fn get_chunk(&self, matter_id: MatterId, chunk_id: ChunkId) -> DocketResult<Option<Chunk>>;
    async fn list_chunks(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Vec<Chunk>>;

    /// BM25 full-text search over chunk content, scoped to `matter_id`.
    /// Returns `(chunk_id, bm25_score)` pairs; lower `bm25_score` is more
    /// relevant (SQLite FTS5 convention), which callers normalize before
    /// RRF fusion with the semantic leg.
    async fn fts_search(&self, matter_id: MatterId, query: &str, limit: usize) -> DocketResult<Vec<(ChunkId, f64)>>;

    async fn insert_citations(&self, matter_id: MatterId, citations: Vec<ExtractedCitation>) -> DocketResult<()>;
    async fn get_citation(&self, matter_id: MatterId, citation_id: CitationId) -> DocketResult<Option<ExtractedCitation>>;
    async fn list_citations(&self, matter_id: MatterId, document_id: Option<DocumentId>) -> DocketResult<Vec<ExtractedCitation>>;
    async fn update_citation_status(&self, matter_id: MatterId, citation_id: CitationId, citation: ExtractedCitation) -> DocketResult<()>;
    async fn list_pending_by_act(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Vec<ExtractedCitation>>;

    async fn upsert_act_resolution(&self, matter_id: MatterId, resolution: &ActResolution) -> DocketResult<()>;
    async fn get_act_resolution(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Option<ActResolution>>;
    async fn list_act_resolutions(&self, matter_id: MatterId) -> DocketResult<Vec<ActResolution>>;

    async fn upsert_entity(&self, entity: &Entity) -> DocketResult<EntityId>;
    async fn get_entity(&self, matter_id: MatterId, entity_id: EntityId) -> DocketResult<Option<Entity>>;
    async fn list_entities(&self, matter_id: MatterId) -> DocketResult<Vec<Entity>>;
    async fn insert_relationship(&self, relationship: &EntityRelationship) -> DocketResult<()>;
    async fn list_relationships(&self, matter_id: MatterId) -> DocketResult<Vec<EntityRelationship>>;

    async fn insert_timeline_events(&self, matter_id: MatterId, events: Vec<TimelineEvent>) -> DocketResult<()>;
    async fn list_timeline_events(&self, matter_id: MatterId) -> DocketResult<Vec<TimelineEvent>>;

    async fn create_job(&self, job: &Job) -> DocketResult<()>;
    async fn get_job(&self, matter_id: MatterId, job_id: JobId) -> DocketResult<Option<Job>>;
    async fn update_job(&self, job: &Job) -> DocketResult<()>;
    async fn append_stage_history(&self, entry: &StageHistoryEntry) -> DocketResult<()>;
    async fn list_stage_history(&self, matter_id: MatterId, job_id: JobId) -> DocketResult<Vec<StageHistoryEntry>>;

    async fn upsert_finding_verification(&self, record: &FindingVerification) -> DocketResult<()>;
    async fn get_finding_verification(&self, matter_id: MatterId, finding_id: FindingId) -> DocketResult<Option<FindingVerification>>;
    async fn list_finding_verifications(&self, matter_id: MatterId) -> DocketResult<Vec<FindingVerification>>;
}
