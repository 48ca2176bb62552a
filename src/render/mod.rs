//! Visualization side of the page.

pub mod html;

pub use html::render_page;

use crate::schema::{ActorGroup, MaterializedView};

/// Consumer of a loaded topology.
///
/// Only called when there is at least one actor to draw, but
/// implementations must still cope with a single node or views that
/// reference nothing.
pub trait TopologyView {
    fn render(&mut self, actor_groups: &[ActorGroup], materialized_views: &[MaterializedView]);
}
