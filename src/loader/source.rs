use crate::loader::LoadError;
use crate::schema::{ActorGroup, Fragment, MaterializedView};

use async_trait::async_trait;

/// Where topology listings come from.
///
/// A live cluster and a pinned snapshot are interchangeable behind this
/// trait; callers never branch on which one they hold.
#[async_trait]
pub trait TopologySource: Send + Sync {
    /// Short human-readable origin, used in logs.
    fn describe(&self) -> String;

    async fn fetch_actor_groups(&self) -> Result<Vec<ActorGroup>, LoadError>;

    async fn fetch_fragments(&self) -> Result<Vec<Fragment>, LoadError>;

    async fn fetch_materialized_views(&self) -> Result<Vec<MaterializedView>, LoadError>;
}
