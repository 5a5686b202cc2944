use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{DocumentId, MatterId};
use docket_core::models::{Document, DocumentStatus, DocumentType};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql};

pub fn insert_document(conn: &Connection, document: &Document) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO documents (
            id, matter_id, document_type, is_reference_material, status,
            filename, blob_path, created_at, updated_at, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            document.id.to_string(),
            document.matter_id.to_string(),
            enum_to_sql(&document.document_type)?,
            document.is_reference_material as i32,
            enum_to_sql(&document.status)?,
            document.filename,
            document.blob_path,
            document.created_at.to_rfc3339(),
            document.updated_at.to_rfc3339(),
            document.deleted_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String, i32, String, String, String, String, String, Option<String>)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn assemble_document(raw: (String, String, String, i32, String, String, String, String, String, Option<String>)) -> DocketResult<Document> {
    let (id, matter_id, document_type, is_reference_material, status, filename, blob_path, created_at, updated_at, deleted_at) = raw;
    Ok(Document {
        id: DocumentId::parse(&id)?,
        matter_id: MatterId::parse(&matter_id)?,
        document_type: enum_from_sql::<DocumentType>(&document_type)?,
        is_reference_material: is_reference_material != 0,
        status: enum_from_sql::<DocumentStatus>(&status)?,
        filename,
        blob_path,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&chrono::Utc),
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&chrono::Utc),
        deleted_at: deleted_at
            .map(|t| {
                chrono::DateTime::parse_from_rfc3339(&t)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .transpose()?,
    })
}

const SELECT_COLUMNS: &str = "id, matter_id, document_type, is_reference_material, status, \
     filename, blob_path, created_at, updated_at, deleted_at";

pub fn get_document(conn: &Connection, matter_id: MatterId, document_id: DocumentId) -> DocketResult<Option<Document>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM documents WHERE matter_id = ?1 AND id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), document_id.to_string()], row_to_document)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_document).transpose()
}

pub fn list_documents(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<Document>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE matter_id = ?1 AND deleted_at IS NULL ORDER BY created_at"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], row_to_document)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_document(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

pub fn soft_delete_document(conn: &Connection, matter_id: MatterId, document_id: DocumentId) -> DocketResult<()> {
    conn.execute(
        "UPDATE documents SET deleted_at = ?1, updated_at = ?1 WHERE matter_id = ?2 AND id = ?3",
        params![
            chrono::Utc::now().to_rfc3339(),
            matter_id.to_string(),
            document_id.to_string(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
