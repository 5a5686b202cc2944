//! v001: matters, documents, chunks, bounding boxes, citations, entities,
//! timeline, jobs, findings.

use rusqlite::Connection;

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;

pub fn migrate(conn: &Connection) -> DocketResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS matters (
            id   TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS matter_members (
            matter_id TEXT NOT NULL,
            user_id   TEXT NOT NULL,
            role      TEXT NOT NULL,
            PRIMARY KEY (matter_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_matter_members_matter ON matter_members(matter_id);

        CREATE TABLE IF NOT EXISTS documents (
            id                     TEXT PRIMARY KEY,
            matter_id              TEXT NOT NULL,
            document_type          TEXT NOT NULL,
            is_reference_material  INTEGER NOT NULL,
            status                 TEXT NOT NULL,
            filename               TEXT NOT NULL,
            blob_path              TEXT NOT NULL,
            created_at             TEXT NOT NULL,
            updated_at             TEXT NOT NULL,
            deleted_at             TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_documents_matter ON documents(matter_id) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS chunks (
            id              TEXT PRIMARY KEY,
            matter_id       TEXT NOT NULL,
            document_id     TEXT NOT NULL,
            tier            TEXT NOT NULL,
            parent_chunk_id TEXT,
            chunk_index     INTEGER NOT NULL,
            content         TEXT NOT NULL,
            token_count     INTEGER NOT NULL,
            page_number     INTEGER,
            bbox_ids        TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id, tier, chunk_index);
        CREATE INDEX IF NOT EXISTS idx_chunks_matter ON chunks(matter_id);

        CREATE TABLE IF NOT EXISTS bounding_boxes (
            id                  TEXT PRIMARY KEY,
            document_id         TEXT NOT NULL,
            page_number         INTEGER NOT NULL,
            text                TEXT NOT NULL,
            confidence          REAL NOT NULL,
            reading_order_index INTEGER NOT NULL,
            x REAL NOT NULL, y REAL NOT NULL, width REAL NOT NULL, height REAL NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        );
        CREATE INDEX IF NOT EXISTS idx_bbox_document_page ON bounding_boxes(document_id, page_number);

        CREATE TABLE IF NOT EXISTS citations (
            id                     TEXT PRIMARY KEY,
            matter_id              TEXT NOT NULL,
            act_name               TEXT NOT NULL,
            canonical_act_name     TEXT,
            section                TEXT NOT NULL,
            subsection             TEXT,
            clause                 TEXT,
            raw_text               TEXT NOT NULL,
            quoted_text            TEXT,
            confidence             INTEGER NOT NULL,
            verification_status    TEXT NOT NULL,
            source_document_id     TEXT NOT NULL,
            source_chunk_id        TEXT,
            page_number            INTEGER,
            FOREIGN KEY (source_document_id) REFERENCES documents(id)
        );
        CREATE INDEX IF NOT EXISTS idx_citations_matter ON citations(matter_id);
        CREATE INDEX IF NOT EXISTS idx_citations_document ON citations(source_document_id);
        CREATE INDEX IF NOT EXISTS idx_citations_act ON citations(matter_id, canonical_act_name);

        CREATE TABLE IF NOT EXISTS act_resolutions (
            matter_id             TEXT NOT NULL,
            act_name_normalized   TEXT NOT NULL,
            act_name_display      TEXT NOT NULL,
            act_document_id       TEXT,
            resolution_status     TEXT NOT NULL,
            user_action           TEXT NOT NULL,
            citation_count        INTEGER NOT NULL,
            PRIMARY KEY (matter_id, act_name_normalized)
        );

        CREATE TABLE IF NOT EXISTS entities (
            id              TEXT PRIMARY KEY,
            matter_id       TEXT NOT NULL,
            canonical_name  TEXT NOT NULL,
            entity_type     TEXT NOT NULL,
            aliases         TEXT NOT NULL,
            metadata        TEXT NOT NULL,
            mention_count   INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_dedup
            ON entities(matter_id, entity_type, canonical_name COLLATE NOCASE);

        CREATE TABLE IF NOT EXISTS entity_mentions (
            entity_id   TEXT NOT NULL,
            chunk_id    TEXT NOT NULL,
            page_number INTEGER,
            bbox_ids    TEXT NOT NULL,
            raw_text    TEXT NOT NULL,
            context     TEXT NOT NULL,
            FOREIGN KEY (entity_id) REFERENCES entities(id)
        );
        CREATE INDEX IF NOT EXISTS idx_entity_mentions_entity ON entity_mentions(entity_id);

        CREATE TABLE IF NOT EXISTS entity_relationships (
            matter_id          TEXT NOT NULL,
            source_entity_id   TEXT NOT NULL,
            target_entity_id   TEXT NOT NULL,
            relationship_type  TEXT NOT NULL,
            confidence         INTEGER NOT NULL,
            PRIMARY KEY (source_entity_id, target_entity_id, relationship_type)
        );
        CREATE INDEX IF NOT EXISTS idx_entity_rel_matter ON entity_relationships(matter_id);

        CREATE TABLE IF NOT EXISTS timeline_events (
            id                    TEXT PRIMARY KEY,
            matter_id             TEXT NOT NULL,
            event_date            TEXT NOT NULL,
            event_date_precision  TEXT NOT NULL,
            event_date_text       TEXT NOT NULL,
            event_type            TEXT NOT NULL,
            description           TEXT NOT NULL,
            confidence            INTEGER NOT NULL,
            source_page           INTEGER,
            source_bbox_ids       TEXT NOT NULL,
            is_manual             INTEGER NOT NULL,
            entities_involved     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_timeline_matter_date ON timeline_events(matter_id, event_date);

        CREATE TABLE IF NOT EXISTS jobs (
            id              TEXT PRIMARY KEY,
            matter_id       TEXT NOT NULL,
            job_type        TEXT NOT NULL,
            status          TEXT NOT NULL,
            current_stage   TEXT NOT NULL,
            total_stages    INTEGER NOT NULL,
            completed_stages INTEGER NOT NULL,
            retry_count     INTEGER NOT NULL,
            max_retries     INTEGER NOT NULL,
            error_message   TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_matter ON jobs(matter_id, status);

        CREATE TABLE IF NOT EXISTS stage_history (
            job_id       TEXT NOT NULL,
            stage        TEXT NOT NULL,
            status       TEXT NOT NULL,
            recorded_at  TEXT NOT NULL,
            detail       TEXT,
            FOREIGN KEY (job_id) REFERENCES jobs(id)
        );
        CREATE INDEX IF NOT EXISTS idx_stage_history_job ON stage_history(job_id, recorded_at);

        CREATE TABLE IF NOT EXISTS finding_verifications (
            finding_id         TEXT PRIMARY KEY,
            matter_id          TEXT NOT NULL,
            finding_type       TEXT NOT NULL,
            finding_summary    TEXT NOT NULL,
            confidence_before  REAL NOT NULL,
            decision           TEXT NOT NULL,
            verified_by        TEXT,
            verified_at        TEXT,
            confidence_after   REAL,
            notes              TEXT,
            created_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_findings_matter ON finding_verifications(matter_id, decision);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
