use serde::{Deserialize, Serialize};

use crate::ids::{MatterId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterRole {
    Owner,
    Editor,
    Viewer,
}

/// Container identity. Has zero or more member users with roles.
/// Created externally; invariant: at least one owner. The role is the
/// authorization predicate for all core operations (read-only vs
/// mutating), though the core itself only asserts *membership* (C1) —
/// role-level authorization is a caller concern layered on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matter {
    pub id: MatterId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatterMember {
    pub matter_id: MatterId,
    pub user_id: UserId,
    pub role: MatterRole,
}
