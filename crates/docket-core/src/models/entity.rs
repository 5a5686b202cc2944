use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{BoundingBoxId, ChunkId, EntityId, MatterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Org,
    Institution,
    Asset,
}

/// Matter-scoped; deduplicated within a matter by canonical-name + type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub matter_id: MatterId,
    pub canonical_name: String,
    pub entity_type: EntityType,
    pub aliases: Vec<String>,
    pub metadata: Value,
    pub mention_count: u32,
}

impl Entity {
    /// Case-insensitive dedup key: (matter, canonical_name, type).
    pub fn dedup_key(matter_id: MatterId, canonical_name: &str, entity_type: EntityType) -> (MatterId, String, EntityType) {
        (matter_id, canonical_name.trim().to_lowercase(), entity_type)
    }
}

/// Ties an entity to one chunk, page, and optional bboxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub entity_id: EntityId,
    pub chunk_id: ChunkId,
    pub page_number: Option<u32>,
    pub bbox_ids: Vec<BoundingBoxId>,
    pub raw_text: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    HasRole,
    AliasOf,
    RelatedTo,
}

/// Directed edge between two entities in the same matter. Cross-matter
/// edges are impossible by construction: both endpoints are `EntityId`s
/// resolved through a matter-scoped lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub matter_id: MatterId,
    pub source_entity_id: EntityId,
    pub target_entity_id: EntityId,
    pub relationship_type: RelationshipType,
    /// 0-100.
    pub confidence: u8,
}
