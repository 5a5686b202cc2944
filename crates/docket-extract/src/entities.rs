//! Entity/graph extractor (C7): one LLM call per chunk returns entities and
//! relationships; matter-scoped dedup merges against whatever the caller
//! already has on file for that matter.

use std::collections::HashMap;

use docket_core::errors::DocketResult;
use docket_core::ids::{ChunkId, EntityId, MatterId};
use docket_core::models::{Entity, EntityMention, EntityRelationship, EntityType, RelationshipType};
use docket_core::traits::{Llm, LlmRequest};

#[derive(Debug, Clone)]
pub struct EntityDraft {
    pub canonical_name: String,
    pub entity_type: EntityType,
    pub aliases: Vec<String>,
    pub mention_text: String,
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct RelationshipDraft {
    pub source_name: String,
    pub target_name: String,
    pub relationship_type: RelationshipType,
    pub confidence: u8,
}

#[derive(Debug, Clone, Default)]
pub struct RawExtraction {
    pub entities: Vec<EntityDraft>,
    pub relationships: Vec<RelationshipDraft>,
}

/// Runs the LLM extraction for one chunk's content.
pub async fn extract_entities(llm: &dyn Llm, chunk_text: &str) -> DocketResult<RawExtraction> {
    if chunk_text.trim().is_empty() {
        return Ok(RawExtraction::default());
    }

    let prompt = format!(
        "Extract entities (people, organizations, institutions, assets) and the \
         relationships between them from the following legal text. Respond with a \
         JSON object {{\"entities\": [{{\"canonical_name\", \"entity_type\" (PERSON|ORG|INSTITUTION|ASSET), \
         \"aliases\": [], \"mention_text\", \"context\"}}], \"relationships\": \
         [{{\"source\", \"target\", \"type\" (HAS_ROLE|ALIAS_OF|RELATED_TO), \"confidence\"}}]}}.\n\nTEXT:\n{chunk_text}"
    );
    let response = llm.complete(LlmRequest::new(prompt)).await?;
    Ok(parse_response(&response.text))
}

fn parse_response(raw: &str) -> RawExtraction {
    let trimmed = raw.trim();
    let json_text = if trimmed.starts_with("```") {
        trimmed.lines().filter(|l| !l.trim_start().starts_with("```")).collect::<Vec<_>>().join("\n")
    } else {
        trimmed.to_string()
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_text) else {
        return RawExtraction::default();
    };

    let entities = value
        .get("entities")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let canonical_name = item.get("canonical_name")?.as_str()?.to_string();
                    let entity_type = parse_entity_type(item.get("entity_type")?.as_str()?)?;
                    Some(EntityDraft {
                        canonical_name,
                        entity_type,
                        aliases: item
                            .get("aliases")
                            .and_then(|v| v.as_array())
                            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                            .unwrap_or_default(),
                        mention_text: item.get("mention_text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                        context: item.get("context").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let relationships = value
        .get("relationships")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(RelationshipDraft {
                        source_name: item.get("source")?.as_str()?.to_string(),
                        target_name: item.get("target")?.as_str()?.to_string(),
                        relationship_type: parse_relationship_type(item.get("type").and_then(|v| v.as_str()).unwrap_or("RELATED_TO")),
                        confidence: item.get("confidence").and_then(|v| v.as_u64()).unwrap_or(50).min(100) as u8,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    RawExtraction { entities, relationships }
}

fn parse_entity_type(raw: &str) -> Option<EntityType> {
    match raw.to_uppercase().as_str() {
        "PERSON" => Some(EntityType::Person),
        "ORG" | "ORGANIZATION" => Some(EntityType::Org),
        "INSTITUTION" => Some(EntityType::Institution),
        "ASSET" => Some(EntityType::Asset),
        _ => None,
    }
}

fn parse_relationship_type(raw: &str) -> RelationshipType {
    match raw.to_uppercase().as_str() {
        "HAS_ROLE" => RelationshipType::HasRole,
        "ALIAS_OF" => RelationshipType::AliasOf,
        _ => RelationshipType::RelatedTo,
    }
}

/// Result of merging a batch of [`EntityDraft`]s against a matter's
/// existing entities: which rows are brand new, which existing rows need
/// an update (merged aliases, bumped `mention_count`), and the mentions to
/// insert unconditionally.
pub struct ExtractionOutcome {
    pub new_entities: Vec<Entity>,
    pub updated_entities: Vec<Entity>,
    pub mentions: Vec<EntityMention>,
    pub relationships: Vec<EntityRelationship>,
    /// Lowercased canonical name -> resolved id, for callers that need to
    /// relate this batch's entities to something else (e.g. timeline
    /// entity-linking, C8).
    pub name_index: HashMap<String, EntityId>,
}

/// Dedup: for each entity look up `(matter_id, canonical_name, type)`
/// case-insensitively against `existing`; insert if absent, else merge
/// aliases and increment `mention_count`. Mentions are always inserted.
/// Relationships resolve `source_name`/`target_name` against the combined
/// name index (existing + new); a relationship naming an entity absent
/// from both the extraction and `existing` is dropped.
pub fn dedupe_entities(
    matter_id: MatterId,
    existing: &[Entity],
    chunk_id: ChunkId,
    extraction: RawExtraction,
) -> ExtractionOutcome {
    let mut name_index: HashMap<String, EntityId> = HashMap::new();
    let mut by_key: HashMap<(String, EntityType), Entity> = HashMap::new();
    for entity in existing {
        let key = (entity.canonical_name.trim().to_lowercase(), entity.entity_type);
        name_index.insert(key.0.clone(), entity.id);
        by_key.insert(key, entity.clone());
    }

    let mut updated_ids = std::collections::HashSet::new();
    let mut mentions = Vec::new();

    for draft in &extraction.entities {
        let key = (draft.canonical_name.trim().to_lowercase(), draft.entity_type);
        let entity = by_key.entry(key.clone()).or_insert_with(|| Entity {
            id: EntityId::new(),
            matter_id,
            canonical_name: draft.canonical_name.clone(),
            entity_type: draft.entity_type,
            aliases: Vec::new(),
            metadata: serde_json::Value::Null,
            mention_count: 0,
        });

        for alias in &draft.aliases {
            if !entity.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
                entity.aliases.push(alias.clone());
            }
        }
        entity.mention_count += 1;
        updated_ids.insert(entity.id);
        name_index.insert(key.0, entity.id);

        mentions.push(EntityMention {
            entity_id: entity.id,
            chunk_id,
            page_number: None,
            bbox_ids: Vec::new(),
            raw_text: draft.mention_text.clone(),
            context: draft.context.clone(),
        });
    }

    let existing_ids: std::collections::HashSet<EntityId> = existing.iter().map(|e| e.id).collect();
    let mut new_entities = Vec::new();
    let mut updated_entities = Vec::new();
    for entity in by_key.into_values() {
        if !updated_ids.contains(&entity.id) {
            continue;
        }
        if existing_ids.contains(&entity.id) {
            updated_entities.push(entity);
        } else {
            new_entities.push(entity);
        }
    }

    let relationships = extraction
        .relationships
        .into_iter()
        .filter_map(|draft| {
            let source = *name_index.get(&draft.source_name.trim().to_lowercase())?;
            let target = *name_index.get(&draft.target_name.trim().to_lowercase())?;
            Some(EntityRelationship {
                matter_id,
                source_entity_id: source,
                target_entity_id: target,
                relationship_type: draft.relationship_type,
                confidence: draft.confidence,
            })
        })
        .collect();

    ExtractionOutcome { new_entities, updated_entities, mentions, relationships, name_index }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_is_inserted_when_absent() {
        let matter = MatterId::new();
        let extraction = RawExtraction {
            entities: vec![EntityDraft {
                canonical_name: "Acme Corp".into(),
                entity_type: EntityType::Org,
                aliases: vec!["Acme".into()],
                mention_text: "Acme Corp".into(),
                context: "Acme Corp filed suit".into(),
            }],
            relationships: Vec::new(),
        };
        let outcome = dedupe_entities(matter, &[], ChunkId::new(), extraction);
        assert_eq!(outcome.new_entities.len(), 1);
        assert!(outcome.updated_entities.is_empty());
        assert_eq!(outcome.mentions.len(), 1);
        assert_eq!(outcome.new_entities[0].mention_count, 1);
    }

    #[test]
    fn existing_entity_merges_aliases_and_bumps_mention_count_case_insensitively() {
        let matter = MatterId::new();
        let existing = Entity {
            id: EntityId::new(),
            matter_id,
            canonical_name: "Acme Corp".into(),
            entity_type: EntityType::Org,
            aliases: vec!["Acme".into()],
            metadata: serde_json::Value::Null,
            mention_count: 3,
        };
        let extraction = RawExtraction {
            entities: vec![EntityDraft {
                canonical_name: "ACME CORP".into(),
                entity_type: EntityType::Org,
                aliases: vec!["The Company".into()],
                mention_text: "the Company".into(),
                context: "context".into(),
            }],
            relationships: Vec::new(),
        };
        let outcome = dedupe_entities(matter, std::slice::from_ref(&existing), ChunkId::new(), extraction);
        assert!(outcome.new_entities.is_empty());
        assert_eq!(outcome.updated_entities.len(), 1);
        assert_eq!(outcome.updated_entities[0].mention_count, 4);
        assert_eq!(outcome.updated_entities[0].aliases.len(), 2);
    }

    #[test]
    fn relationship_missing_an_endpoint_is_dropped() {
        let matter = MatterId::new();
        let extraction = RawExtraction {
            entities: vec![EntityDraft {
                canonical_name: "Alice".into(),
                entity_type: EntityType::Person,
                aliases: Vec::new(),
                mention_text: "Alice".into(),
                context: String::new(),
            }],
            relationships: vec![RelationshipDraft {
                source_name: "Alice".into(),
                target_name: "Ghost Inc".into(),
                relationship_type: RelationshipType::RelatedTo,
                confidence: 70,
            }],
        };
        let outcome = dedupe_entities(matter, &[], ChunkId::new(), extraction);
        assert!(outcome.relationships.is_empty());
    }
}
