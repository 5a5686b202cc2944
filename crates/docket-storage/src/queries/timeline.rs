use rusqlite::{params, Connection};

use docket_core::errors::DocketResult;
use docket_core::ids::{EntityId, MatterId, TimelineEventId};
use docket_core::models::{DatePrecision, TimelineEvent};

use crate::err::to_storage_err;
use crate::ser::{enum_from_sql, enum_to_sql, json_from_sql, json_to_sql};

pub fn insert_timeline_events(conn: &Connection, matter_id: MatterId, events: Vec<TimelineEvent>) -> DocketResult<()> {
    for event in &events {
        conn.execute(
            "INSERT INTO timeline_events (
                id, matter_id, event_date, event_date_precision, event_date_text,
                event_type, description, confidence, source_page, source_bbox_ids,
                is_manual, entities_involved
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                event.id.to_string(),
                matter_id.to_string(),
                event.event_date.to_string(),
                enum_to_sql(&event.event_date_precision)?,
                event.event_date_text,
                event.event_type,
                docket_core::models::timeline::encode_ambiguity(
                    &event.description,
                    event.is_ambiguous,
                    event.ambiguity_reason.as_deref(),
                ),
                event.confidence,
                event.source_page,
                json_to_sql(&event.source_bbox_ids)?,
                event.is_manual as i32,
                json_to_sql(&event.entities_involved)?,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

const SELECT_COLUMNS: &str = "id, event_date, event_date_precision, event_date_text, event_type, \
     description, confidence, source_page, source_bbox_ids, is_manual, entities_involved";

pub fn list_timeline_events(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<TimelineEvent>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM timeline_events WHERE matter_id = ?1 ORDER BY event_date"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, u8>(6)?,
                row.get::<_, Option<u32>>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, i32>(9)?,
                row.get::<_, String>(10)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (id, event_date, precision, event_date_text, event_type, stored_description,
            confidence, source_page, source_bbox_ids, is_manual, entities_involved) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let (is_ambiguous, ambiguity_reason, description) =
            docket_core::models::timeline::decode_ambiguity(&stored_description);
        out.push(TimelineEvent {
            id: TimelineEventId::parse(&id)?,
            matter_id,
            event_date: event_date.parse().map_err(|_| to_storage_err("bad event_date"))?,
            event_date_precision: enum_from_sql::<DatePrecision>(&precision)?,
            event_date_text,
            event_type,
            description,
            confidence,
            source_page,
            source_bbox_ids: json_from_sql(&source_bbox_ids)?,
            is_manual: is_manual != 0,
            is_ambiguous,
            ambiguity_reason,
            entities_involved: json_from_sql::<Vec<EntityId>>(&entities_involved)?,
        });
    }
    Ok(out)
}
