//! Small helpers for storing serde enums as bare TEXT columns (no quotes),
//! the same `serde_json::to_string(..).trim_matches('"')` convention the
//! teacher uses for `memory_type`/`importance`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;

pub(crate) fn enum_to_sql<T: Serialize>(value: &T) -> DocketResult<String> {
    let json = serde_json::to_string(value).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(json.trim_matches('"').to_string())
}

pub(crate) fn enum_from_sql<T: DeserializeOwned>(raw: &str) -> DocketResult<T> {
    serde_json::from_str(&format!("\"{raw}\"")).map_err(|e| to_storage_err(e.to_string()))
}

pub(crate) fn json_to_sql<T: Serialize>(value: &T) -> DocketResult<String> {
    serde_json::to_string(value).map_err(|e| to_storage_err(e.to_string()))
}

pub(crate) fn json_from_sql<T: DeserializeOwned>(raw: &str) -> DocketResult<T> {
    serde_json::from_str(raw).map_err(|e| to_storage_err(e.to_string()))
}
