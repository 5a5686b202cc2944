use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{ChunkId, CitationId, DocumentId, MatterId};
use docket_core::models::{ActResolution, ActResolutionStatus, ActUserAction, ExtractedCitation, VerificationStatus};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql};

pub fn insert_citations(conn: &Connection, matter_id: MatterId, citations: Vec<ExtractedCitation>) -> DocketResult<()> {
    for citation in &citations {
        insert_one(conn, matter_id, citation)?;
    }
    Ok(())
}

fn insert_one(conn: &Connection, matter_id: MatterId, citation: &ExtractedCitation) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO citations (
            id, matter_id, act_name, canonical_act_name, section, subsection, clause,
            raw_text, quoted_text, confidence, verification_status,
            source_document_id, source_chunk_id, page_number
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            citation.id.to_string(),
            matter_id.to_string(),
            citation.act_name,
            citation.canonical_act_name,
            citation.section,
            citation.subsection,
            citation.clause,
            citation.raw_text,
            citation.quoted_text,
            citation.confidence,
            enum_to_sql(&citation.verification_status)?,
            citation.source_document_id.to_string(),
            citation.source_chunk_id.map(|id| id.to_string()),
            citation.page_number,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const SELECT_COLUMNS: &str = "id, act_name, canonical_act_name, section, subsection, clause, \
     raw_text, quoted_text, confidence, verification_status, source_document_id, source_chunk_id, page_number";

type CitationRow = (
    String, String, Option<String>, String, Option<String>, Option<String>,
    String, Option<String>, u8, String, String, Option<String>, Option<u32>,
);

fn row_to_citation(row: &rusqlite::Row) -> rusqlite::Result<CitationRow> {
    Ok((
        row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?,
        row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?, row.get(12)?,
    ))
}

fn assemble_citation(raw: CitationRow) -> DocketResult<ExtractedCitation> {
    let (id, act_name, canonical_act_name, section, subsection, clause, raw_text, quoted_text,
        confidence, verification_status, source_document_id, source_chunk_id, page_number) = raw;
    Ok(ExtractedCitation {
        id: CitationId::parse(&id)?,
        act_name,
        canonical_act_name,
        section,
        subsection,
        clause,
        raw_text,
        quoted_text,
        confidence,
        verification_status: enum_from_sql::<VerificationStatus>(&verification_status)?,
        source_document_id: DocumentId::parse(&source_document_id)?,
        source_chunk_id: source_chunk_id.map(|s| ChunkId::parse(&s)).transpose()?,
        page_number,
    })
}

pub fn get_citation(conn: &Connection, matter_id: MatterId, citation_id: CitationId) -> DocketResult<Option<ExtractedCitation>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM citations WHERE matter_id = ?1 AND id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), citation_id.to_string()], row_to_citation)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_citation).transpose()
}

pub fn list_citations(conn: &Connection, matter_id: MatterId, document_id: Option<DocumentId>) -> DocketResult<Vec<ExtractedCitation>> {
    let (sql, doc_filter) = match document_id {
        Some(doc) => (
            format!("SELECT {SELECT_COLUMNS} FROM citations WHERE matter_id = ?1 AND source_document_id = ?2"),
            Some(doc.to_string()),
        ),
        None => (
            format!("SELECT {SELECT_COLUMNS} FROM citations WHERE matter_id = ?1"),
            None,
        ),
    };
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = if let Some(doc) = doc_filter {
        stmt.query_map(params![matter_id.to_string(), doc], row_to_citation)
    } else {
        stmt.query_map(params![matter_id.to_string()], row_to_citation)
    }
    .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_citation(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

pub fn update_citation_status(conn: &Connection, matter_id: MatterId, citation_id: CitationId, citation: ExtractedCitation) -> DocketResult<()> {
    conn.execute(
        "UPDATE citations SET canonical_act_name = ?1, verification_status = ?2, quoted_text = ?3
         WHERE matter_id = ?4 AND id = ?5",
        params![
            citation.canonical_act_name,
            enum_to_sql(&citation.verification_status)?,
            citation.quoted_text,
            matter_id.to_string(),
            citation_id.to_string(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn list_pending_by_act(conn: &Connection, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Vec<ExtractedCitation>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM citations \
             WHERE matter_id = ?1 AND LOWER(TRIM(act_name)) = ?2 AND verification_status = 'act_unavailable'"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string(), act_name_normalized], row_to_citation)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_citation(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

pub fn upsert_act_resolution(conn: &Connection, matter_id: MatterId, resolution: &ActResolution) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO act_resolutions (
            matter_id, act_name_normalized, act_name_display, act_document_id,
            resolution_status, user_action, citation_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(matter_id, act_name_normalized) DO UPDATE SET
            act_name_display = excluded.act_name_display,
            act_document_id = excluded.act_document_id,
            resolution_status = excluded.resolution_status,
            user_action = excluded.user_action,
            citation_count = excluded.citation_count",
        params![
            matter_id.to_string(),
            resolution.act_name_normalized,
            resolution.act_name_display,
            resolution.act_document_id.map(|id| id.to_string()),
            enum_to_sql(&resolution.resolution_status)?,
            enum_to_sql(&resolution.user_action)?,
            resolution.citation_count,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const ACT_COLUMNS: &str =
    "act_name_normalized, act_name_display, act_document_id, resolution_status, user_action, citation_count";

type ActRow = (String, String, Option<String>, String, String, u32);

fn row_to_act(row: &rusqlite::Row) -> rusqlite::Result<ActRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn assemble_act(raw: ActRow) -> DocketResult<ActResolution> {
    let (act_name_normalized, act_name_display, act_document_id, resolution_status, user_action, citation_count) = raw;
    Ok(ActResolution {
        act_name_normalized,
        act_name_display,
        act_document_id: act_document_id.map(|s| DocumentId::parse(&s)).transpose()?,
        resolution_status: enum_from_sql::<ActResolutionStatus>(&resolution_status)?,
        user_action: enum_from_sql::<ActUserAction>(&user_action)?,
        citation_count,
    })
}

pub fn get_act_resolution(conn: &Connection, matter_id: MatterId, act_name_normalized: &str) -> DocketResult<Option<ActResolution>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {ACT_COLUMNS} FROM act_resolutions WHERE matter_id = ?1 AND act_name_normalized = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), act_name_normalized], row_to_act)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_act).transpose()
}

pub fn list_act_resolutions(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<ActResolution>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {ACT_COLUMNS} FROM act_resolutions WHERE matter_id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], row_to_act)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_act(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}
