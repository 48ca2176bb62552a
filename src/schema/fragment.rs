//! Fragment records: a logical operator stage and the actors running it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    #[serde(alias = "fragmentId")]
    pub id: u32,

    /// Operator kind, e.g. `HashJoin`. Empty when only derived from actors.
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub actor_ids: Vec<u32>,
}
