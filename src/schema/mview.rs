//! Materialized view records.
//!
//! JSON shape:
//! { "id": "mv1", "name": "mv1", "fragmentIds": [10, 11] }
//!
//! The meta service reports numeric table ids; they are kept as strings so
//! that pinned snapshots with symbolic ids load the same way.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedView {
    #[serde(deserialize_with = "deserialize_view_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Fragments this view depends on.
    #[serde(default)]
    pub fragment_ids: Vec<u32>,
}

fn deserialize_view_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    let id = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    };
    if id.trim().is_empty() {
        return Err(de::Error::custom("materialized view id cannot be empty"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numeric_id_is_stringified() {
        let mv: MaterializedView =
            serde_json::from_str(r#"{"id": 1001, "name": "t", "fragmentIds": [3]}"#).unwrap();
        assert_eq!(
            mv,
            MaterializedView {
                id: "1001".to_string(),
                name: "t".to_string(),
                fragment_ids: vec![3],
            }
        );
    }

    #[test]
    fn blank_id_is_rejected() {
        let res: Result<MaterializedView, _> = serde_json::from_str(r#"{"id": "  "}"#);
        assert!(res.is_err());
    }
}
