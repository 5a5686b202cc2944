//! Migration runner — version tracking, forward-only, transactional per
//! migration.

mod v001_core_tables;
mod v002_fts5_index;
mod v003_cache_tables;
mod v004_vector_index;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;

pub const LATEST_VERSION: u32 = 4;

type MigrationFn = fn(&Connection) -> DocketResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 4] = [
    (1, "core_tables", v001_core_tables::migrate),
    (2, "fts5_index", v002_fts5_index::migrate),
    (3, "cache_tables", v003_cache_tables::migrate),
    (4, "vector_index", v004_vector_index::migrate),
];

pub fn current_version(conn: &Connection) -> DocketResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| to_storage_err(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn run_migrations(conn: &Connection) -> DocketResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{} -> v{}", current, LATEST_VERSION);

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(format!("begin transaction for v{version:03}: {e}")))?;

        match migrate_fn(conn) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(|e| to_storage_err(format!("record version v{version:03}: {e}")))?;
                conn.execute_batch("COMMIT")
                    .map_err(|e| to_storage_err(format!("commit v{version:03}: {e}")))?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(to_storage_err(format!(
                    "migration v{version:03} ({name}) failed: {e}"
                )));
            }
        }
    }

    info!("applied {applied} migration(s), now at v{LATEST_VERSION}");
    Ok(applied)
}
