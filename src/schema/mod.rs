//! Record layer: serde shapes returned by the cluster management API.
//!
//! These are the raw records as they arrive on the wire (or from a pinned
//! snapshot on disk). Cross-record checks live in `topology`.

pub mod actor;
pub mod fragment;
pub mod mview;

pub use actor::ActorGroup;
pub use fragment::Fragment;
pub use mview::MaterializedView;
