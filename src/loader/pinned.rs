//! Pinned snapshots: the same listings as the live API, served from memory,
//! from a directory of JSON files, or from the demo snapshot compiled into
//! the binary.
//!
//! Directory layout:
//!   <dir>/actors.json
//!   <dir>/materialized_views.json
//!   <dir>/fragments.json          (optional; derived from actors if absent)
//!
//! Files are re-read on every fetch.

use crate::loader::source::TopologySource;
use crate::loader::{ACTORS_PATH, FRAGMENTS_PATH, LoadError, MATERIALIZED_VIEWS_PATH};
use crate::schema::{ActorGroup, Fragment, MaterializedView};
#[cfg(test)]
use crate::topology::RawTopology;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BUNDLED_ACTORS: &str = include_str!("../../data/join/actors.json");
const BUNDLED_FRAGMENTS: &str = include_str!("../../data/join/fragments.json");
const BUNDLED_VIEWS: &str = include_str!("../../data/join/materialized_views.json");

pub struct PinnedSource {
    origin: Origin,
}

enum Origin {
    #[cfg(test)]
    Records(RawTopology),
    Dir(PathBuf),
    Bundled,
}

impl PinnedSource {
    #[cfg(test)]
    pub fn from_records(records: RawTopology) -> Self {
        Self {
            origin: Origin::Records(records),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Dir(dir.into()),
        }
    }

    /// A two-node hash join of two tables into one materialized view.
    pub fn bundled() -> Self {
        Self {
            origin: Origin::Bundled,
        }
    }
}

#[async_trait]
impl TopologySource for PinnedSource {
    fn describe(&self) -> String {
        match &self.origin {
            #[cfg(test)]
            Origin::Records(_) => "in-memory snapshot".to_string(),
            Origin::Dir(dir) => format!("snapshot dir {}", dir.display()),
            Origin::Bundled => "bundled join snapshot".to_string(),
        }
    }

    async fn fetch_actor_groups(&self) -> Result<Vec<ActorGroup>, LoadError> {
        match &self.origin {
            #[cfg(test)]
            Origin::Records(r) => Ok(r.actor_groups.clone()),
            Origin::Bundled => parse(ACTORS_PATH, BUNDLED_ACTORS),
            Origin::Dir(dir) => read_file(dir, ACTORS_PATH, false).await,
        }
    }

    async fn fetch_fragments(&self) -> Result<Vec<Fragment>, LoadError> {
        match &self.origin {
            #[cfg(test)]
            Origin::Records(r) => Ok(r.fragments.clone()),
            Origin::Bundled => parse(FRAGMENTS_PATH, BUNDLED_FRAGMENTS),
            Origin::Dir(dir) => read_file(dir, FRAGMENTS_PATH, true).await,
        }
    }

    async fn fetch_materialized_views(&self) -> Result<Vec<MaterializedView>, LoadError> {
        match &self.origin {
            #[cfg(test)]
            Origin::Records(r) => Ok(r.materialized_views.clone()),
            Origin::Bundled => parse(MATERIALIZED_VIEWS_PATH, BUNDLED_VIEWS),
            Origin::Dir(dir) => read_file(dir, MATERIALIZED_VIEWS_PATH, false).await,
        }
    }
}

async fn read_file<T: DeserializeOwned>(
    dir: &Path,
    endpoint: &str,
    optional: bool,
) -> Result<Vec<T>, LoadError> {
    let path = file_for(dir, endpoint);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => parse(&path.display().to_string(), &text),
        Err(e) if optional && e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "optional listing absent");
            Ok(Vec::new())
        }
        Err(source) => Err(LoadError::Io { path, source }),
    }
}

/// `api/actors` -> `<dir>/actors.json`
fn file_for(dir: &Path, endpoint: &str) -> PathBuf {
    let stem = endpoint.rsplit('/').next().unwrap_or(endpoint);
    dir.join(format!("{}.json", stem))
}

fn parse<T: DeserializeOwned>(path: &str, text: &str) -> Result<Vec<T>, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Parse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_snapshot;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_maps_to_file_name() {
        let dir = Path::new("/snap");
        assert_eq!(file_for(dir, ACTORS_PATH), dir.join("actors.json"));
        assert_eq!(
            file_for(dir, MATERIALIZED_VIEWS_PATH),
            dir.join("materialized_views.json")
        );
    }

    #[tokio::test]
    async fn bundled_snapshot_is_consistent() {
        let snapshot = load_snapshot(&PinnedSource::bundled()).await.unwrap();
        assert!(snapshot.warnings().is_empty());
        assert!(snapshot.is_renderable());

        let summary = snapshot.summary();
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.actors, 7);
        assert_eq!(summary.fragments, 4);
        assert_eq!(summary.materialized_views, 3);
    }

    #[tokio::test]
    async fn dir_without_fragments_derives_them() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("actors.json"),
            r#"[{"node":"n1","actors":[{"id":1,"downstream":[2],"fragmentId":10},{"id":2,"downstream":[],"fragmentId":10}]}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("materialized_views.json"),
            r#"[{"id":"mv1","name":"mv1","fragmentIds":[10]}]"#,
        )
        .unwrap();

        let snapshot = load_snapshot(&PinnedSource::from_dir(dir.path()))
            .await
            .unwrap();
        assert_eq!(
            snapshot.fragments(),
            &[Fragment {
                id: 10,
                kind: String::new(),
                actor_ids: vec![1, 2],
            }]
        );
    }

    #[tokio::test]
    async fn missing_required_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&PinnedSource::from_dir(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[tokio::test]
    async fn records_are_returned_unchanged() {
        let records = RawTopology {
            actor_groups: vec![ActorGroup {
                node: "n1".to_string(),
                actors: vec![],
            }],
            ..Default::default()
        };
        let source = PinnedSource::from_records(records.clone());
        assert_eq!(
            source.fetch_actor_groups().await.unwrap(),
            records.actor_groups
        );
    }
}
