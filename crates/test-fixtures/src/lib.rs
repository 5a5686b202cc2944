//! Builder functions for domain-model test data. Every builder takes the
//! minimum it needs to produce a valid record and fills the rest with
//! sensible, overridable-by-mutation defaults — callers tweak the returned
//! value rather than passing a dozen constructor args.

use chrono::Utc;

use docket_core::ids::{ChunkId, DocumentId, EntityId, FindingId, MatterId, TimelineEventId, UserId};
use docket_core::models::{
    Chunk, ChunkTier, Document, DocumentStatus, DocumentType, Entity, EntityType,
    ExtractedCitation, FindingType, FindingVerification, Job, JobStatus, Matter, MatterMember,
    MatterRole, TimelineEvent, VerificationStatus,
};

pub fn matter_id() -> MatterId {
    MatterId::new()
}

pub fn user_id() -> UserId {
    UserId::new()
}

pub fn matter(name: &str) -> Matter {
    Matter { id: MatterId::new(), name: name.to_string() }
}

pub fn matter_member(matter_id: MatterId, user_id: UserId, role: MatterRole) -> MatterMember {
    MatterMember { matter_id, user_id, role }
}

pub fn document(matter_id: MatterId) -> Document {
    let now = Utc::now();
    Document {
        id: DocumentId::new(),
        matter_id,
        document_type: DocumentType::CaseFile,
        is_reference_material: false,
        status: DocumentStatus::Completed,
        filename: "complaint.pdf".to_string(),
        blob_path: format!("{matter_id}/documents/complaint.pdf"),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn act_document(matter_id: MatterId, act_name: &str) -> Document {
    let mut doc = document(matter_id);
    doc.document_type = DocumentType::Act;
    doc.is_reference_material = true;
    doc.filename = format!("{act_name}.pdf");
    doc
}

pub fn parent_chunk(matter_id: MatterId, document_id: DocumentId, index: u32) -> Chunk {
    Chunk {
        id: ChunkId::new(),
        matter_id,
        document_id,
        tier: ChunkTier::Parent,
        parent_chunk_id: None,
        chunk_index: index,
        content: "This section of the agreement concerns termination for cause.".to_string(),
        token_count: 400,
        page_number: Some(index + 1),
        bbox_ids: Vec::new(),
    }
}

pub fn child_chunk(matter_id: MatterId, document_id: DocumentId, parent: ChunkId, index: u32) -> Chunk {
    let mut chunk = parent_chunk(matter_id, document_id, index);
    chunk.id = ChunkId::new();
    chunk.tier = ChunkTier::Child;
    chunk.parent_chunk_id = Some(parent);
    chunk.token_count = 120;
    chunk
}

pub fn citation(document_id: DocumentId) -> ExtractedCitation {
    ExtractedCitation {
        id: docket_core::ids::CitationId::new(),
        act_name: "Contract Act 1872".to_string(),
        canonical_act_name: None,
        section: "73".to_string(),
        subsection: None,
        clause: None,
        raw_text: "Section 73 of the Contract Act, 1872".to_string(),
        quoted_text: None,
        confidence: 85,
        verification_status: VerificationStatus::Pending,
        source_document_id: document_id,
        source_chunk_id: None,
        page_number: Some(3),
    }
}

pub fn entity(matter_id: MatterId, name: &str) -> Entity {
    Entity {
        id: EntityId::new(),
        matter_id,
        canonical_name: name.to_string(),
        entity_type: EntityType::Person,
        aliases: Vec::new(),
        metadata: serde_json::json!({}),
        mention_count: 1,
    }
}

pub fn timeline_event(matter_id: MatterId) -> TimelineEvent {
    TimelineEvent {
        id: TimelineEventId::new(),
        matter_id,
        event_date: chrono::NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        event_date_precision: docket_core::models::DatePrecision::Day,
        event_date_text: "June 1, 2023".to_string(),
        event_type: "contract_signed".to_string(),
        description: "Contract executed by both parties".to_string(),
        confidence: 90,
        source_page: Some(1),
        source_bbox_ids: Vec::new(),
        is_manual: false,
        is_ambiguous: false,
        ambiguity_reason: None,
        entities_involved: Vec::new(),
    }
}

pub fn job(matter_id: MatterId, job_type: &str) -> Job {
    let now = Utc::now();
    Job {
        id: docket_core::ids::JobId::new(),
        matter_id,
        job_type: job_type.to_string(),
        status: JobStatus::Queued,
        current_stage: "queued".to_string(),
        total_stages: 4,
        completed_stages: 0,
        retry_count: 0,
        max_retries: 3,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn finding_verification(matter_id: MatterId, confidence_before: f64) -> FindingVerification {
    FindingVerification::new(
        FindingId::new(),
        matter_id,
        FindingType::Contradiction,
        "Two statements disagree on the closing date".to_string(),
        confidence_before,
    )
}
