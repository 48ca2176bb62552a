//! Topology loading.
//!
//! A load fetches the actor, fragment and materialized-view listings from a
//! `TopologySource` concurrently and validates them as one unit: either a
//! complete `Snapshot` comes back or a single `LoadError` does. Nothing is
//! cached between loads.

pub mod live;
pub mod pinned;
pub mod source;

pub use live::LiveSource;
pub use pinned::PinnedSource;
pub use source::TopologySource;

use crate::topology::{RawTopology, ShapeError, Snapshot};

use std::path::PathBuf;

pub const ACTORS_PATH: &str = "api/actors";
pub const FRAGMENTS_PATH: &str = "api/fragments";
pub const MATERIALIZED_VIEWS_PATH: &str = "api/materialized_views";

/// Why a load failed.
///
/// `Display` is the message shown to the user. The endpoint and the failure
/// class are available separately via [`LoadError::path`] and
/// [`LoadError::kind`] so logs can tell transport and shape problems apart.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{message}")]
    Fetch { path: String, message: String },

    #[error("{path} responded with HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("unexpected response from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid topology: {0}")]
    Shape(#[from] ShapeError),
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "fetch",
            LoadError::Status { .. } => "status",
            LoadError::Parse { .. } => "parse",
            LoadError::Io { .. } => "io",
            LoadError::Shape(_) => "shape",
        }
    }

    pub fn path(&self) -> Option<String> {
        match self {
            LoadError::Fetch { path, .. }
            | LoadError::Status { path, .. }
            | LoadError::Parse { path, .. } => Some(path.clone()),
            LoadError::Io { path, .. } => Some(path.display().to_string()),
            LoadError::Shape(_) => None,
        }
    }
}

/// Fetch all three listings at once and validate them together.
///
/// The fetches are not sequenced; the first failure aborts the others and
/// is returned as-is.
pub async fn load_snapshot(source: &dyn TopologySource) -> Result<Snapshot, LoadError> {
    tracing::debug!(source = %source.describe(), "loading topology");

    let fetched = tokio::try_join!(
        source.fetch_actor_groups(),
        source.fetch_fragments(),
        source.fetch_materialized_views(),
    );

    let snapshot = fetched.and_then(|(actor_groups, fragments, materialized_views)| {
        Snapshot::validate(RawTopology {
            actor_groups,
            fragments,
            materialized_views,
        })
        .map_err(LoadError::from)
    });

    match &snapshot {
        Ok(s) => {
            let summary = s.summary();
            tracing::info!(
                source = %source.describe(),
                nodes = summary.nodes,
                actors = summary.actors,
                fragments = summary.fragments,
                materialized_views = summary.materialized_views,
                warnings = summary.warnings,
                "topology loaded"
            );
        }
        Err(e) => {
            let path = e.path().unwrap_or_else(|| "-".to_string());
            tracing::warn!(
                source = %source.describe(),
                kind = e.kind(),
                %path,
                error = %e,
                "topology load failed"
            );
        }
    }

    snapshot
}
