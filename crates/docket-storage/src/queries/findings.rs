use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{FindingId, MatterId, UserId};
use docket_core::models::{FindingType, FindingVerification, VerificationDecision};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql};

pub fn upsert_finding_verification(conn: &Connection, record: &FindingVerification) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO finding_verifications (
            finding_id, matter_id, finding_type, finding_summary, confidence_before,
            decision, verified_by, verified_at, confidence_after, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(finding_id) DO UPDATE SET
            decision = excluded.decision,
            verified_by = excluded.verified_by,
            verified_at = excluded.verified_at,
            confidence_after = excluded.confidence_after,
            notes = excluded.notes",
        params![
            record.finding_id.to_string(),
            record.matter_id.to_string(),
            enum_to_sql(&record.finding_type)?,
            record.finding_summary,
            record.confidence_before,
            enum_to_sql(&record.decision)?,
            record.verified_by.map(|id| id.to_string()),
            record.verified_at.map(|t| t.to_rfc3339()),
            record.confidence_after,
            record.notes,
            record.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const SELECT_COLUMNS: &str = "finding_id, matter_id, finding_type, finding_summary, confidence_before, \
     decision, verified_by, verified_at, confidence_after, notes, created_at";

type FindingRow = (
    String, String, String, String, f64, String, Option<String>, Option<String>, Option<f64>, Option<String>, String,
);

fn row_to_finding(row: &rusqlite::Row) -> rusqlite::Result<FindingRow> {
    Ok((
        row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?,
        row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?,
    ))
}

fn assemble_finding(raw: FindingRow) -> DocketResult<FindingVerification> {
    let (finding_id, matter_id, finding_type, finding_summary, confidence_before, decision,
        verified_by, verified_at, confidence_after, notes, created_at) = raw;
    Ok(FindingVerification {
        finding_id: FindingId::parse(&finding_id)?,
        matter_id: MatterId::parse(&matter_id)?,
        finding_type: enum_from_sql::<FindingType>(&finding_type)?,
        finding_summary,
        confidence_before,
        decision: enum_from_sql::<VerificationDecision>(&decision)?,
        verified_by: verified_by.map(|s| UserId::parse(&s)).transpose()?,
        verified_at: verified_at
            .map(|t| {
                chrono::DateTime::parse_from_rfc3339(&t)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .transpose()?,
        confidence_after,
        notes,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&chrono::Utc),
    })
}

pub fn get_finding_verification(conn: &Connection, matter_id: MatterId, finding_id: FindingId) -> DocketResult<Option<FindingVerification>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM finding_verifications WHERE matter_id = ?1 AND finding_id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), finding_id.to_string()], row_to_finding)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_finding).transpose()
}

pub fn list_finding_verifications(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<FindingVerification>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM finding_verifications WHERE matter_id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], row_to_finding)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_finding(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}
