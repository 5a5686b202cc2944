use rusqlite::{params, Connection, OptionalExtension};

use docket_core::errors::DocketResult;
use docket_core::ids::{MatterId, UserId};
use docket_core::models::{Matter, MatterMember, MatterRole};

use crate::err::to_storage_err;
use crate::ser::enum_from_sql;

pub fn is_member(conn: &Connection, matter_id: MatterId, user_id: UserId) -> DocketResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM matter_members WHERE matter_id = ?1 AND user_id = ?2",
            params![matter_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(found.is_some())
}

pub fn matter_members(conn: &Connection, matter_id: MatterId) -> DocketResult<Vec<MatterMember>> {
    let mut stmt = conn
        .prepare("SELECT matter_id, user_id, role FROM matter_members WHERE matter_id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![matter_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (matter_id, user_id, role) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(MatterMember {
            matter_id: MatterId::parse(&matter_id)?,
            user_id: UserId::parse(&user_id)?,
            role: enum_from_sql::<MatterRole>(&role)?,
        });
    }
    Ok(out)
}

/// The membership join underlying C17's "enumerate accessible matters":
/// every matter `user_id` belongs to, regardless of role.
pub fn list_matters_for_user(conn: &Connection, user_id: UserId) -> DocketResult<Vec<Matter>> {
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.name FROM matters m \
             INNER JOIN matter_members mm ON mm.matter_id = m.id \
             WHERE mm.user_id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id.to_string()], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (id, name) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(Matter { id: MatterId::parse(&id)?, name });
    }
    Ok(out)
}

pub fn upsert_matter(conn: &Connection, matter: &Matter) -> DocketResult<()> {
    conn.execute(
        "INSERT INTO matters (id, name) VALUES (?1, ?2) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![matter.id.to_string(), matter.name],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn add_matter_member(conn: &Connection, member: &MatterMember) -> DocketResult<()> {
    let role = crate::ser::enum_to_sql(&member.role)?;
    conn.execute(
        "INSERT INTO matter_members (matter_id, user_id, role) VALUES (?1, ?2, ?3) \
         ON CONFLICT(matter_id, user_id) DO UPDATE SET role = excluded.role",
        params![member.matter_id.to_string(), member.user_id.to_string(), role],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
