//! v003: matter memory caches — timeline cache, entity graph cache, query
//! history. The query-result cache and session store live in the KV tier,
//! not here; these are the durable, versioned derived caches (C13).

use rusqlite::Connection;

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;

pub fn migrate(conn: &Connection) -> DocketResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS timeline_cache (
            matter_id   TEXT PRIMARY KEY,
            cached_at   TEXT NOT NULL,
            version     INTEGER NOT NULL,
            events      TEXT NOT NULL,
            event_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entity_graph_cache (
            matter_id          TEXT PRIMARY KEY,
            cached_at          TEXT NOT NULL,
            version            INTEGER NOT NULL,
            entities           TEXT NOT NULL,
            relationships      TEXT NOT NULL,
            entity_count       INTEGER NOT NULL,
            relationship_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS query_history (
            matter_id          TEXT NOT NULL,
            query              TEXT NOT NULL,
            engines_used       TEXT NOT NULL,
            confidence         REAL NOT NULL,
            prompt_tokens      INTEGER NOT NULL,
            completion_tokens  INTEGER NOT NULL,
            attorney_verified  INTEGER NOT NULL,
            created_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_query_history_matter
            ON query_history(matter_id, created_at DESC);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
