use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{EntityId, MatterId};
use docket_core::models::{Entity, EntityRelationship, EntityType, RelationshipType};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql, json_from_sql, json_to_sql};

/// Insert a new entity, or merge into the existing row matching the
/// matter-scoped dedup key (`matter_id`, `entity_type`,
/// `canonical_name` case-insensitive). Returns the surviving entity's id.
pub fn upsert_entity(conn: &Connection, entity: &Entity) -> DocketResult<EntityId> {
    if let Some(existing_id) = find_dedup_match(conn, entity)? {
        merge_into_existing(conn, existing_id, entity)?;
        return Ok(existing_id);
    }

    conn.execute(
        "INSERT INTO entities (id, matter_id, canonical_name, entity_type, aliases, metadata, mention_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entity.id.to_string(),
            entity.matter_id.to_string(),
            entity.canonical_name,
            enum_to_sql(&entity.entity_type)?,
            json_to_sql(&entity.aliases)?,
            serde_json::to_string(&entity.metadata).map_err(|e| to_storage_err(e.to_string()))?,
            entity.mention_count,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(entity.id)
}

fn find_dedup_match(conn: &Connection, entity: &Entity) -> DocketResult<Option<EntityId>> {
    conn.query_row(
        "SELECT id FROM entities WHERE matter_id = ?1 AND entity_type = ?2 AND canonical_name = ?3 COLLATE NOCASE",
        params![entity.matter_id.to_string(), enum_to_sql(&entity.entity_type)?, entity.canonical_name],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .map(|s| EntityId::parse(&s))
    .transpose()
}

fn merge_into_existing(conn: &Connection, existing_id: EntityId, incoming: &Entity) -> DocketResult<()> {
    conn.execute(
        "UPDATE entities SET mention_count = mention_count + ?1 WHERE id = ?2",
        params![incoming.mention_count, existing_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let raw_aliases: String = conn
        .query_row("SELECT aliases FROM entities WHERE id = ?1", params![existing_id.to_string()], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut aliases: Vec<String> = json_from_sql(&raw_aliases)?;
    for alias in &incoming.aliases {
        if !aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
            aliases.push(alias.clone());
        }
    }
    conn.execute(
        "UPDATE entities SET aliases = ?1 WHERE id = ?2",
        params![json_to_sql(&aliases)?, existing_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const SELECT_COLUMNS: &str = "id, matter_id, canonical_name, entity_type, aliases, metadata, mention_count";

type EntityRow = (String, String, String, String, String, String, u32);

fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<EntityRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn assemble_entity(raw: EntityRow) -> DocketResult<Entity> {
    let (id, matter_id, canonical_name, entity_type, aliases, metadata, mention_count) = raw;
    Ok(Entity {
        id: EntityId::parse(&id)?,
        matter_id: MatterId::parse(&matter_id)?,
        canonical_name,
        entity_type: enum_from_sql::<EntityType>(&entity_type)?,
        aliases: json_from_sql(&aliases)?,
        metadata: serde_json::from_str(&metadata).map_err(|e| to_storage_err(e.to_string()))?,
        mention_count,
    })
}

pub fn get_entity(conn: &Connection, matter_id: MatterId, entity_id: EntityId) -> DocketResult<Option<Entity>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM entities WHERE matter_id = ?1 AND id = ?2"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![matter_id.to_string(), entity_id.to_string()], row_to_entity)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(assemble_entity).transpose()
}

pub fn list_entities(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<Entity>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM entities WHERE matter_id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], row_to_entity)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(assemble_entity(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

pub fn insert_relationship(conn: &Connection, relationship: &EntityRelationship) -> DocketResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO entity_relationships (
            matter_id, source_entity_id, target_entity_id, relationship_type, confidence
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            relationship.matter_id.to_string(),
            relationship.source_entity_id.to_string(),
            relationship.target_entity_id.to_string(),
            enum_to_sql(&relationship.relationship_type)?,
            relationship.confidence,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn list_relationships(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<EntityRelationship>> {
    let mut stmt = conn
        .prepare("SELECT matter_id, source_entity_id, target_entity_id, relationship_type, confidence FROM entity_relationships WHERE matter_id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u8>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (matter_id, source_entity_id, target_entity_id, relationship_type, confidence) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(EntityRelationship {
            matter_id: MatterId::parse(&matter_id)?,
            source_entity_id: EntityId::parse(&source_entity_id)?,
            target_entity_id: EntityId::parse(&target_entity_id)?,
            relationship_type: enum_from_sql::<RelationshipType>(&relationship_type)?,
            confidence,
        });
    }
    Ok(out)
}
