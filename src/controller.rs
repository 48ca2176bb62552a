//! Page state for the streaming topology view.
//!
//! `PageController` owns the loaded collections and the error message for
//! one mounted page. Loads run as spawned tasks and write back through a
//! shared state handle; every task carries a clone of the page's liveness
//! token and checks it under the state lock before writing, so a load that
//! resolves after `unmount` is discarded.

use crate::loader::{LoadError, TopologySource, load_snapshot};
use crate::render::TopologyView;
use crate::schema::{ActorGroup, MaterializedView};
use crate::topology::{self, Snapshot, TopologyWarning};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Empty,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub phase: Phase,
    pub actor_groups: Vec<ActorGroup>,
    pub materialized_views: Vec<MaterializedView>,
    pub warnings: Vec<TopologyWarning>,
    /// Empty when there is nothing to report.
    pub message: String,
}

/// What the page should show right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub error: Option<String>,
    pub body: PageBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    Streaming {
        actor_groups: Vec<ActorGroup>,
        materialized_views: Vec<MaterializedView>,
    },
    NoData,
}

impl PageView {
    /// Hand the collections to `view` if there is anything to draw.
    /// Returns whether the consumer was invoked.
    pub fn present<V: TopologyView + ?Sized>(&self, view: &mut V) -> bool {
        match &self.body {
            PageBody::Streaming {
                actor_groups,
                materialized_views,
            } => {
                view.render(actor_groups, materialized_views);
                true
            }
            PageBody::NoData => false,
        }
    }
}

pub struct PageController {
    source: Arc<dyn TopologySource>,
    state: Arc<Mutex<PageState>>,
    liveness: CancellationToken,
}

impl PageController {
    pub fn new(source: Arc<dyn TopologySource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(PageState::default())),
            liveness: CancellationToken::new(),
        }
    }

    /// Start the initial load. Returns immediately; the state changes when
    /// the returned task completes.
    pub fn mount(&self) -> JoinHandle<()> {
        tracing::debug!(source = %self.source.describe(), "page mounted");
        self.spawn_load()
    }

    /// Replace the current snapshot with a fresh one.
    pub fn reload(&self) -> JoinHandle<()> {
        self.spawn_load()
    }

    /// Tear the page down: in-flight loads become no-ops and the message is
    /// cleared. Loaded collections are left in place until the controller is
    /// dropped. Calling it twice is harmless.
    pub fn unmount(&self) {
        let mut state = lock(&self.state);
        self.liveness.cancel();
        state.message.clear();
        state.phase = Phase::Empty;
        tracing::debug!("page unmounted");
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        !self.liveness.is_cancelled()
    }

    pub fn state(&self) -> PageState {
        lock(&self.state).clone()
    }

    pub fn view(&self) -> PageView {
        let state = lock(&self.state);
        let error = (!state.message.is_empty()).then(|| state.message.clone());
        let body = if topology::is_renderable(&state.actor_groups) {
            PageBody::Streaming {
                actor_groups: state.actor_groups.clone(),
                materialized_views: state.materialized_views.clone(),
            }
        } else {
            PageBody::NoData
        };
        PageView { error, body }
    }

    fn spawn_load(&self) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let liveness = self.liveness.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = liveness.cancelled() => {
                    tracing::debug!("load abandoned: page unmounted");
                    return;
                }
                result = load_snapshot(source.as_ref()) => result,
            };
            apply(&state, &liveness, result);
        })
    }
}

/// Write a finished load into the page state, unless the page is gone.
fn apply(
    state: &Mutex<PageState>,
    liveness: &CancellationToken,
    result: Result<Snapshot, LoadError>,
) {
    let mut state = lock(state);
    if liveness.is_cancelled() {
        tracing::debug!("load result dropped: page unmounted");
        return;
    }

    match result {
        Ok(snapshot) => {
            let (actor_groups, materialized_views, warnings) = snapshot.into_parts();
            state.actor_groups = actor_groups;
            state.materialized_views = materialized_views;
            state.warnings = warnings;
            state.phase = Phase::Loaded;
        }
        Err(e) => {
            state.message = e.to_string();
            state.phase = Phase::Error;
        }
    }
}

fn lock(state: &Mutex<PageState>) -> MutexGuard<'_, PageState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
