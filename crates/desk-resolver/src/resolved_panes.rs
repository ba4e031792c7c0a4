//! Mounted resolved-panes handle
//!
//! [`ResolvedPanesHandle`] subscribes once to a resolved-pane stream on a
//! tokio task and keeps the latest [`PanesProjection`] for a view layer to
//! read. On every emission it:
//!
//! - Stores the projection and bumps the change counter
//! - Publishes an [`ActivePanesSnapshot`] for the intent fast path
//! - Opens a freshly selected document's default panes with a `replace`
//!   navigation, once per router state
//!
//! Stream errors are kept for an error boundary; the task ends with them.
//! Dropping the handle aborts the task, which drops the upstream router
//! subscription, and clears the registry.

use crate::active_panes::{ActivePanesRegistry, ActivePanesSnapshot};
use crate::error::PaneResolutionError;
use crate::projection::{maybe_open_default_panes, project_panes, PanesProjection};
use crate::resolved_stream::{create_resolved_pane_node_stream, ResolvedPaneStreamOptions, ResolvedPanesStream};
use desk_router::{NavigateOptions, Navigator, RouterPanes};
use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct HandleState {
    projection: RwLock<PanesProjection>,
    error: RwLock<Option<PaneResolutionError>>,
    maximized: RwLock<Option<String>>,
    finished: AtomicBool,
    changes: watch::Sender<u64>,
}

impl HandleState {
    fn new() -> Self {
        Self {
            projection: RwLock::new(PanesProjection::default()),
            error: RwLock::new(None),
            maximized: RwLock::new(None),
            finished: AtomicBool::new(false),
            changes: watch::Sender::new(0),
        }
    }

    fn bump(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

/// Subscription to the resolved panes of one mounted desk
#[derive(Debug)]
pub struct ResolvedPanesHandle {
    state: Arc<HandleState>,
    registry: Arc<ActivePanesRegistry>,
    task: JoinHandle<()>,
}

impl ResolvedPanesHandle {
    /// Resolve router panes from `options` and follow the result
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn mount(
        options: ResolvedPaneStreamOptions,
        navigator: Arc<dyn Navigator>,
        registry: Arc<ActivePanesRegistry>,
    ) -> Self {
        Self::spawn(create_resolved_pane_node_stream(options), navigator, registry)
    }

    /// Follow an existing resolved-pane stream
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        mut stream: ResolvedPanesStream,
        navigator: Arc<dyn Navigator>,
        registry: Arc<ActivePanesRegistry>,
    ) -> Self {
        let state = Arc::new(HandleState::new());
        let task_state = state.clone();
        let task_registry = registry.clone();

        let task = tokio::spawn(async move {
            // Router state the default panes were last opened for; progressive
            // emissions of that same state must not navigate again
            let mut opened_for: Option<RouterPanes> = None;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(resolved) => {
                        let projection = project_panes(&resolved);
                        task_registry.set(ActivePanesSnapshot::from_projection(&projection));
                        let default_panes = maybe_open_default_panes(&resolved, &projection.router_panes);
                        if opened_for.as_ref() != Some(&projection.router_panes) {
                            opened_for = None;
                        }
                        let router_panes = projection.router_panes.clone();
                        *task_state.projection.write() = projection;
                        task_state.bump();

                        if let Some(panes) = default_panes {
                            if opened_for.is_none() {
                                tracing::debug!(groups = panes.len(), "opening default panes");
                                navigator.navigate(panes, NavigateOptions::replace());
                                opened_for = Some(router_panes);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "resolved panes stream failed");
                        *task_state.error.write() = Some(err);
                        task_state.bump();
                    }
                }
            }
            task_state.finished.store(true, Ordering::Release);
            task_state.bump();
        });

        Self { state, registry, task }
    }

    /// Latest projection with the maximized pane applied
    #[must_use]
    pub fn projection(&self) -> PanesProjection {
        let maximized = self.state.maximized.read().clone();
        self.state.projection.read().clone().with_maximized(maximized.as_deref())
    }

    /// Latest pane data
    #[must_use]
    pub fn pane_data_items(&self) -> Vec<crate::projection::PaneData> {
        self.projection().pane_data_items
    }

    /// Router panes of the latest projection, root group included
    #[must_use]
    pub fn router_panes(&self) -> RouterPanes {
        self.state.projection.read().router_panes.clone()
    }

    /// Resolved panes of the latest projection
    #[must_use]
    pub fn resolved_panes(&self) -> Vec<crate::resolved_stream::ResolvedPaneMeta> {
        self.state.projection.read().resolved_panes.clone()
    }

    /// Error that ended the stream, if any
    #[must_use]
    pub fn error(&self) -> Option<PaneResolutionError> {
        self.state.error.read().clone()
    }

    /// Key of the maximized pane
    #[must_use]
    pub fn maximized_pane(&self) -> Option<String> {
        self.state.maximized.read().clone()
    }

    /// Maximize the pane with `key`, or restore with `None`
    pub fn set_maximized_pane(&self, key: Option<String>) {
        *self.state.maximized.write() = key;
        self.state.bump();
    }

    /// Change counter, bumped on every update
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.changes.subscribe()
    }

    /// Check if the stream ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Wait for a projection matching `predicate`
    ///
    /// Returns `None` if the stream ends first.
    pub async fn wait_until<F>(&self, mut predicate: F) -> Option<PanesProjection>
    where
        F: FnMut(&PanesProjection) -> bool,
    {
        let mut changes = self.subscribe();
        loop {
            let projection = self.projection();
            if predicate(&projection) {
                return Some(projection);
            }
            if self.is_finished() {
                return None;
            }
            changes.changed().await.ok()?;
        }
    }
}

impl Drop for ResolvedPanesHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.registry.clear();
        tracing::debug!("resolved panes unmounted");
    }
}
