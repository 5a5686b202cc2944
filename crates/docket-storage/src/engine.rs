use std::path::Path;

use async_trait::async_trait;

use docket_core::errors::DocketResult;
use docket_core::ids::{ChunkId, CitationId, DocumentId, EntityId, FindingId, JobId, MatterId, UserId};
use docket_core::models::{
    ActResolution, BoundingBox, Chunk, Document, Entity, EntityRelationship, ExtractedCitation,
    FindingVerification, Job, Matter, MatterMember, StageHistoryEntry, TimelineEvent,
};
use docket_core::guard::MemberLookup;
use docket_core::traits::{MetaStore, VectorIndex};

use crate::pool::ConnectionPool;
use crate::queries;

/// `rusqlite`-backed reference implementation of [`MetaStore`]. Every
/// method takes the pool's single write connection; there is no separate
/// read replica (see `pool.rs`).
pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    pub fn open_in_memory() -> DocketResult<Self> {
        Ok(Self {
            pool: ConnectionPool::open_in_memory()?,
        })
    }

    pub fn open_file(path: impl AsRef<Path>) -> DocketResult<Self> {
        Ok(Self {
            pool: ConnectionPool::open_file(path)?,
        })
    }
}

#[async_trait]
impl MemberLookup for StorageEngine {
    async fn is_member(&self, matter_id: MatterId, user_id: UserId) -> DocketResult<bool> {
        self.pool.with_conn(|conn| queries::matters::is_member(conn, matter_id, user_id))
    }
}

#[async_trait]
impl MetaStore for StorageEngine {
    async fn is_member(&self, matter_id: MatterId, user_id: UserId) -> DocketResult<bool> {
        self.pool.with_conn(|conn| queries::matters::is_member(conn, matter_id, user_id))
    }

    async fn matter_members(&self, matter_id: MatterId) -> DocketResult<Vec<MatterMember>> {
        self.pool.with_conn(|conn| queries::matters::matter_members(conn, matter_id))
    }

    async fn list_matters_for_user(&self, user_id: UserId) -> DocketResult<Vec<Matter>> {
        self.pool.with_conn(|conn| queries::matters::list_matters_for_user(conn, user_id))
    }

    async fn upsert_matter(&self, matter: &Matter) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::matters::upsert_matter(conn, matter))
    }

    async fn add_matter_member(&self, member: &MatterMember) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::matters::add_matter_member(conn, member))
    }

    async fn insert_document(&self, document: &Document) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::documents::insert_document(conn, document))
    }

    async fn get_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Option<Document>> {
        self.pool.with_conn(|conn| queries::documents::get_document(conn, matter_id, document_id))
    }

    async fn list_documents(&self, matter_id: MatterId) -> DocketResult<Vec<Document>> {
        self.pool.with_conn(|conn| queries::documents::list_documents(conn, matter_id))
    }

    async fn soft_delete_document(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::documents::soft_delete_document(conn, matter_id, document_id))
    }

    async fn replace_bounding_boxes(&self, document_id: DocumentId, bboxes: Vec<BoundingBox>) -> DocketResult<()> {
        self.pool.with_conn(|conn| {
            queries::bounding_boxes::delete_bounding_boxes(conn, document_id)?;
            queries::bounding_boxes::insert_bounding_boxes(conn, &bboxes)
        })
    }

    async fn list_bounding_boxes(&self, document_id: DocumentId) -> DocketResult<Vec<BoundingBox>> {
        self.pool.with_conn(|conn| queries::bounding_boxes::list_bounding_boxes(conn, document_id))
    }

    async fn replace_chunks(&self, matter_id: MatterId, document_id: DocumentId, chunks: Vec<Chunk>) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::chunks::replace_chunks(conn, matter_id, document_id, chunks))
    }

    async fn get_chunk(&self, matter_id: MatterId, chunk_id: ChunkId) -> DocketResult<Option<Chunk>> {
        self.pool.with_conn(|conn| queries::chunks::get_chunk(conn, matter_id, chunk_id))
    }

    async fn list_chunks(&self, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Vec<Chunk>> {
        self.pool.with_conn(|conn| queries::chunks::list_chunks(conn, matter_id, document_id))
    }

    async fn fts_search(&self, matter_id: MatterId, query: &str, limit: usize) -> DocketResult<Vec<(ChunkId, f64)>> {
        self.pool.with_conn(|conn| queries::chunks::fts_search(conn, matter_id, query, limit))
    }

    async fn insert_citations(&self, matter_id: MatterId, citations: Vec<ExtractedCitation>) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::citations::insert_citations(conn, matter_id, citations))
    }

    async fn get_citation(&self, matter_id: MatterId, citation_id: CitationId) -> DocketResult<Option<ExtractedCitation>> {
        self.pool.with_conn(|conn| queries::citations::get_citation(conn, matter_id, citation_id))
    }

    async fn list_citations(&self, matter_id: MatterId, document_id: Option<DocumentId>) -> DocketResult<Vec<ExtractedCitation>> {
        self.pool.with_conn(|conn| queries::citations::list_citations(conn, matter_id, document_id))
    }

    async fn update_citation_status(&self, matter_id: MatterId, citation_id: CitationId, citation: ExtractedCitation) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::citations::update_citation_status(conn, matter_id, citation_id, citation))
    }

    async fn list_pending_by_act(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Vec<ExtractedCitation>> {
        self.pool.with_conn(|conn| queries::citations::list_pending_by_act(conn, matter_id, act_name_normalized))
    }

    async fn upsert_act_resolution(&self, matter_id: MatterId, resolution: &ActResolution) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::citations::upsert_act_resolution(conn, matter_id, resolution))
    }

    async fn get_act_resolution(&self, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Option<ActResolution>> {
        self.pool.with_conn(|conn| queries::citations::get_act_resolution(conn, matter_id, act_name_normalized))
    }

    async fn list_act_resolutions(&self, matter_id: MatterId) -> DocketResult<Vec<ActResolution>> {
        self.pool.with_conn(|conn| queries::citations::list_act_resolutions(conn, matter_id))
    }

    async fn upsert_entity(&self, entity: &Entity) -> DocketResult<EntityId> {
        self.pool.with_conn(|conn| queries::entities::upsert_entity(conn, entity))
    }

    async fn get_entity(&self, matter_id: MatterId, entity_id: EntityId) -> DocketResult<Option<Entity>> {
        self.pool.with_conn(|conn| queries::entities::get_entity(conn, matter_id, entity_id))
    }

    async fn list_entities(&self, matter_id: MatterId) -> DocketResult<Vec<Entity>> {
        self.pool.with_conn(|conn| queries::entities::list_entities(conn, matter_id))
    }

    async fn insert_relationship(&self, relationship: &EntityRelationship) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::entities::insert_relationship(conn, relationship))
    }

    async fn list_relationships(&self, matter_id: MatterId) -> DocketResult<Vec<EntityRelationship>> {
        self.pool.with_conn(|conn| queries::entities::list_relationships(conn, matter_id))
    }

    async fn insert_timeline_events(&self, matter_id: MatterId, events: Vec<TimelineEvent>) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::timeline::insert_timeline_events(conn, matter_id, events))
    }

    async fn list_timeline_events(&self, matter_id: MatterId) -> DocketResult<Vec<TimelineEvent>> {
        self.pool.with_conn(|conn| queries::timeline::list_timeline_events(conn, matter_id))
    }

    async fn create_job(&self, job: &Job) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::jobs::create_job(conn, job))
    }

    async fn get_job(&self, matter_id: MatterId, job_id: JobId) -> DocketResult<Option<Job>> {
        self.pool.with_conn(|conn| queries::jobs::get_job(conn, matter_id, job_id))
    }

    async fn update_job(&self, job: &Job) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::jobs::update_job(conn, job))
    }

    async fn append_stage_history(&self, entry: &StageHistoryEntry) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::jobs::append_stage_history(conn, entry))
    }

    async fn list_stage_history(&self, matter_id: MatterId, job_id: JobId) -> DocketResult<Vec<StageHistoryEntry>> {
        self.pool.with_conn(|conn| queries::jobs::list_stage_history(conn, matter_id, job_id))
    }

    async fn upsert_finding_verification(&self, record: &FindingVerification) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::findings::upsert_finding_verification(conn, record))
    }

    async fn get_finding_verification(&self, matter_id: MatterId, finding_id: FindingId) -> DocketResult<Option<FindingVerification>> {
        self.pool.with_conn(|conn| queries::findings::get_finding_verification(conn, matter_id, finding_id))
    }

    async fn list_finding_verifications(&self, matter_id: MatterId) -> DocketResult<Vec<FindingVerification>> {
        self.pool.with_conn(|conn| queries::findings::list_finding_verifications(conn, matter_id))
    }
}

#[async_trait]
impl VectorIndex for StorageEngine {
    async fn upsert(&self, matter_id: MatterId, chunk_id: ChunkId, vector: Vec<f32>) -> DocketResult<()> {
        self.pool.with_conn(|conn| queries::vector_search::upsert_embedding(conn, matter_id, chunk_id, &vector))
    }

    async fn search(&self, matter_id: MatterId, query: &[f32], limit: usize) -> DocketResult<Vec<(ChunkId, f32)>> {
        self.pool.with_conn(|conn| queries::vector_search::search(conn, matter_id, query, limit))
    }
}
