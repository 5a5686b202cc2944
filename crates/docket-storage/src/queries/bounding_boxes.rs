use rusqlite::{params, Connection};

use docket_core::errors::DocketResult;
use docket_core::ids::{BoundingBoxId, DocumentId};
use docket_core::models::BoundingBox;

use crate::err::to_storage_err;

pub fn insert_bounding_boxes(conn: &Connection, bboxes: &[BoundingBox]) -> DocketResult<()> {
    for bbox in bboxes {
        conn.execute(
            "INSERT INTO bounding_boxes (
                id, document_id, page_number, text, confidence, reading_order_index,
                x, y, width, height
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                bbox.id.to_string(),
                bbox.document_id.to_string(),
                bbox.page_number,
                bbox.text,
                bbox.confidence,
                bbox.reading_order_index,
                bbox.x,
                bbox.y,
                bbox.width,
                bbox.height,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

const SELECT_COLUMNS: &str = "id, document_id, page_number, text, confidence, reading_order_index, x, y, width, height";

type BboxRow = (String, String, u32, String, f64, u32, f64, f64, f64, f64);

fn row_to_bbox(row: &rusqlite::Row) -> rusqlite::Result<BboxRow> {
    Ok((
        row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?,
        row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?,
    ))
}

fn assemble_bbox(raw: BboxRow) -> DocketResult<BoundingBox> {
    let (id, document_id, page_number, text, confidence, reading_order_index, x, y, width, height) = raw;
    Ok(BoundingBox {
        id: BoundingBoxId::parse(&id)?,
        document_id: DocumentId::parse(&document_id)?,
        page_number,
        text,
        confidence,
        reading_order_index,
        x,
        y,
        width,
        height,
    })
}

pub fn list_bounding_boxes(conn: &Connection, document_id: DocumentId) -> DocketResult<Vec<BoundingBox>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM bounding_boxes WHERE document_id = ?1 ORDER BY page_number, reading_order_index"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt.query_map(params![document_id.to_string()], row_to_bbox).map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_bbox(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

pub fn delete_bounding_boxes(conn: &Connection, document_id: DocumentId) -> DocketResult<()> {
    conn.execute("DELETE FROM bounding_boxes WHERE document_id = ?1", params![document_id.to_string()])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
