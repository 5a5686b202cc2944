use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{BoundingBoxId, ChunkId, DocumentId, MatterId};
use docket_core::models::{Chunk, ChunkTier};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql, json_from_sql, json_to_sql};

/// Deletes every chunk owned by `document_id` then reinserts `chunks`,
/// parents before children, matching the document-reprocessing ownership
/// rule: chunks are never patched in place.
pub fn replace_chunks(conn: &Connection, matter_id: MatterId, document_id: DocumentId, chunks: Vec<Chunk>) -> DocketResult<()> {
    conn.execute(
        "DELETE FROM chunks WHERE matter_id = ?1 AND document_id = ?2",
        params![matter_id.to_string(), document_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut ordered = chunks;
    ordered.sort_by_key(|c| match c.tier {
        ChunkTier::Parent => 0,
        ChunkTier::Child => 1,
    });

    for chunk in &ordered {
        conn.execute(
            "INSERT INTO chunks (
                id, matter_id, document_id, tier, parent_chunk_id, chunk_index,
                content, token_count, page_number, bbox_ids
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                chunk.id.to_string(),
                chunk.matter_id.to_string(),
                chunk.document_id.to_string(),
                enum_to_sql(&chunk.tier)?,
                chunk.parent_chunk_id.map(|id| id.to_string()),
                chunk.chunk_index,
                chunk.content,
                chunk.token_count,
                chunk.page_number,
                json_to_sql(&chunk.bbox_ids)?,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

const SELECT_COLUMNS: &str =
    "id, matter_id, document_id, tier, parent_chunk_id, chunk_index, content, token_count, page_number, bbox_ids";

type ChunkRow = (String, String, String, String, Option<String>, u32, String, u32, Option<u32>, String);

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<ChunkRow> {
    Ok((
        row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?,
        row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?,
    ))
}

fn assemble_chunk(raw: ChunkRow) -> DocketResult<Chunk> {
    let (id, matter_id, document_id, tier, parent_chunk_id, chunk_index, content, token_count, page_number, bbox_ids) = raw;
    Ok(Chunk {
        id: ChunkId::parse(&id)?,
        matter_id: MatterId::parse(&matter_id)?,
        document_id: DocumentId::parse(&document_id)?,
        tier: enum_from_sql::<ChunkTier>(&tier)?,
        parent_chunk_id: parent_chunk_id.map(|s| ChunkId::parse(&s)).transpose()?,
        chunk_index,
        content,
        token_count,
        page_number,
        bbox_ids: json_from_sql::<Vec<BoundingBoxId>>(&bbox_ids)?,
    })
}

pub fn get_chunk(conn: &Connection, matter_id: MatterId, chunk_id: ChunkId) -> DocketResult<Option<Chunk>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM chunks WHERE matter_id = ?1 AND id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), chunk_id.to_string()], row_to_chunk)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_chunk).transpose()
}

/// BM25-ranked chunk ids matching `query`, scoped to `matter_id` via a join
/// back to `chunks` (the FTS5 virtual table itself carries no matter
/// column, keeping index upkeep to the trigger-maintained `content` column
/// alone).
pub fn fts_search(conn: &Connection, matter_id: MatterId, query: &str, limit: usize) -> DocketResult<Vec<(ChunkId, f64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, bm25(chunks_fts) AS score
             FROM chunks_fts
             JOIN chunks c ON c.rowid = chunks_fts.rowid
             WHERE chunks_fts MATCH ?1 AND c.matter_id = ?2
             ORDER BY score
             LIMIT ?3",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![query, matter_id.to_string(), limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (id, score) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push((ChunkId::parse(&id)?, score));
    }
    Ok(out)
}

pub fn list_chunks(conn: &Connection, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Vec<Chunk>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM chunks WHERE matter_id = ?1 AND document_id = ?2 ORDER BY tier, chunk_index"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string(), document_id.to_string()], row_to_chunk)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_chunk(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}
