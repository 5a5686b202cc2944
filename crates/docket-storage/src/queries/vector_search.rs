use rusqlite::{params, Connection};

use docket_core::errors::DocketResult;
use docket_core::ids::{ChunkId, MatterId};

use crate::err::to_storage_err;

pub fn f32_vec_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

pub fn upsert_embedding(conn: &Connection, matter_id: MatterId, chunk_id: ChunkId, vector: &[f32]) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO chunk_embeddings (chunk_id, matter_id, dims, vector) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(chunk_id) DO UPDATE SET matter_id = excluded.matter_id, dims = excluded.dims, vector = excluded.vector",
        params![chunk_id.to_string(), matter_id.to_string(), vector.len() as i64, f32_vec_to_bytes(vector)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Brute-force cosine-similarity scan over `matter_id`'s embeddings.
/// Zero-norm queries, dimension mismatches, and non-positive similarity
/// are all filtered out rather than erroring.
pub fn search(conn: &Connection, matter_id: MatterId, query: &[f32], limit: usize) -> DocketResult<Vec<(ChunkId, f32)>> {
    let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    if query_norm == 0.0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare("SELECT chunk_id, dims, vector FROM chunk_embeddings WHERE matter_id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, Vec<u8>>(2)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut scored = Vec::new();
    for row in rows {
        let (chunk_id, dims, bytes) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if dims as usize != query.len() {
            continue;
        }
        let vector = bytes_to_f32_vec(&bytes);
        let similarity = cosine_similarity(query, &vector);
        if similarity <= 0.0 {
            continue;
        }
        scored.push((ChunkId::parse(&chunk_id)?, similarity));
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    Ok(scored)
}
