//! Source selection shared by every subcommand.
//!
//! The live API and a pinned snapshot are a configuration choice; the rest
//! of the program only sees an `Arc<dyn TopologySource>`.

use crate::loader::{LiveSource, PinnedSource, TopologySource};

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Query the meta node's dashboard API.
    Live,
    /// Serve a pinned snapshot from disk (or the bundled demo snapshot).
    #[default]
    Static,
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    #[arg(long, value_enum, default_value_t = SourceKind::Static)]
    pub source: SourceKind,

    /// Meta node dashboard address, `host:port` or a full URL.
    #[arg(long, default_value = "127.0.0.1:5691")]
    pub addr: String,

    /// Per-request timeout for the live source.
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    /// Snapshot directory for the static source. Uses the bundled snapshot
    /// when omitted.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl SourceArgs {
    pub fn build(&self) -> Arc<dyn TopologySource> {
        match (self.source, &self.data_dir) {
            (SourceKind::Live, _) => Arc::new(LiveSource::new(
                &self.addr,
                Duration::from_secs(self.timeout_secs),
            )),
            (SourceKind::Static, Some(dir)) => Arc::new(PinnedSource::from_dir(dir.clone())),
            (SourceKind::Static, None) => Arc::new(PinnedSource::bundled()),
        }
    }
}
