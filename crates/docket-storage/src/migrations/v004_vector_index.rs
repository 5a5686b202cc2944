//! v004: chunk embeddings for C9's semantic retrieval leg. Vectors are
//! stored as little-endian f32 blobs and searched by brute-force cosine
//! similarity in `queries::vector_search` — no vector extension is loaded,
//! an in-process scan rather than an external vector database.

use rusqlite::Connection;

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;

pub fn migrate(conn: &Connection) -> DocketResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS chunk_embeddings (
            chunk_id  TEXT PRIMARY KEY,
            matter_id TEXT NOT NULL,
            dims      INTEGER NOT NULL,
            vector    BLOB NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chunk_embeddings_matter ON chunk_embeddings(matter_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
