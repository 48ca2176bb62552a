//! Actor records.
//!
//! JSON shape (one entry per worker node):
//! [
//!   {
//!     "node": "127.0.0.1:5688",
//!     "actors": [
//!       { "id": 1, "downstream": [2], "fragmentId": 10 },
//!       ...
//!     ]
//!   }
//! ]
//!
//! The meta service spells some keys differently (`actorId`,
//! `downstreamActorId`); both spellings are accepted.

use serde::{Deserialize, Serialize};

/// A single execution unit running on a worker node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(alias = "actorId")]
    pub id: u32,

    /// Immediate downstream actors (fan-out edges).
    #[serde(default, alias = "downstreamActorId")]
    pub downstream: Vec<u32>,

    pub fragment_id: u32,
}

/// One worker node's contribution to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActorGroup {
    pub node: String,

    #[serde(default)]
    pub actors: Vec<Actor>,
}

impl ActorGroup {
    pub fn edge_count(&self) -> usize {
        self.actors.iter().map(|a| a.downstream.len()).sum()
    }
}
