use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{JobId, MatterId};
use docket_core::models::{Job, JobStatus, StageHistoryEntry};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql};

pub fn create_job(conn: &Connection, job: &Job) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO jobs (
            id, matter_id, job_type, status, current_stage, total_stages,
            completed_stages, retry_count, max_retries, error_message, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            job.id.to_string(),
            job.matter_id.to_string(),
            job.job_type,
            enum_to_sql(&job.status)?,
            job.current_stage,
            job.total_stages,
            job.completed_stages,
            job.retry_count,
            job.max_retries,
            job.error_message,
            job.created_at.to_rfc3339(),
            job.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const SELECT_COLUMNS: &str = "id, matter_id, job_type, status, current_stage, total_stages, \
     completed_stages, retry_count, max_retries, error_message, created_at, updated_at";

type JobRow = (String, String, String, String, String, u32, u32, u32, u32, Option<String>, String, String);

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobRow> {
    Ok((
        row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?,
        row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?,
    ))
}

fn assemble_job(raw: JobRow) -> DocketResult<Job> {
    let (id, matter_id, job_type, status, current_stage, total_stages, completed_stages,
        retry_count, max_retries, error_message, created_at, updated_at) = raw;
    Ok(Job {
        id: JobId::parse(&id)?,
        matter_id: MatterId::parse(&matter_id)?,
        job_type,
        status: enum_from_sql::<JobStatus>(&status)?,
        current_stage,
        total_stages,
        completed_stages,
        retry_count,
        max_retries,
        error_message,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&chrono::Utc),
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&chrono::Utc),
    })
}

pub fn get_job(conn: &Connection, matter_id: MatterId, job_id: JobId) -> DocketResult<Option<Job>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE matter_id = ?1 AND id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), job_id.to_string()], row_to_job)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_job).transpose()
}

pub fn update_job(conn: &Connection, job: &Job) -> DocketResult<()> {
    conn.execute(
        "UPDATE jobs SET status = ?1, current_stage = ?2, total_stages = ?3, completed_stages = ?4,
         retry_count = ?5, max_retries = ?6, error_message = ?7, updated_at = ?8
         WHERE matter_id = ?9 AND id = ?10",
        params![
            enum_to_sql(&job.status)?,
            job.current_stage,
            job.total_stages,
            job.completed_stages,
            job.retry_count,
            job.max_retries,
            job.error_message,
            job.updated_at.to_rfc3339(),
            job.matter_id.to_string(),
            job.id.to_string(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn append_stage_history(conn: &Connection, entry: &StageHistoryEntry) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO stage_history (job_id, stage, status, recorded_at, detail) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.job_id.to_string(),
            entry.stage,
            enum_to_sql(&entry.status)?,
            entry.recorded_at.to_rfc3339(),
            entry.detail,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn list_stage_history(conn: &Connection, matter_id: MatterId, job_id: JobId) -> DocketResult<Vec<StageHistoryEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT sh.job_id, sh.stage, sh.status, sh.recorded_at, sh.detail
             FROM stage_history sh
             JOIN jobs j ON j.id = sh.job_id
             WHERE j.matter_id = ?1 AND sh.job_id = ?2
             ORDER BY sh.recorded_at",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string(), job_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (job_id_raw, stage, status, recorded_at, detail) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(StageHistoryEntry {
            job_id: JobId::parse(&job_id_raw)?,
            stage,
            status: enum_from_sql::<JobStatus>(&status)?,
            recorded_at: chrono::DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| to_storage_err(e.to_string()))?
                .with_timezone(&chrono::Utc),
            detail,
        });
    }
    Ok(out)
}
