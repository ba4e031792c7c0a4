//! Navigation seam
//!
//! The desk never owns the URL. It reads router panes from a stream and asks a
//! [`Navigator`] to move somewhere else. [`MemoryRouter`] is an in-process
//! implementation backed by a `tokio::sync::watch` channel.

use crate::codec::{parse_panes_segment, to_path};
use crate::error::RouterError;
use crate::sibling::RouterPanes;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Navigation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

impl NavigateOptions {
    /// Push-style navigation
    #[inline]
    #[must_use]
    pub fn push() -> Self {
        Self { replace: false }
    }

    /// Replace-style navigation
    #[inline]
    #[must_use]
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// Something that can move the router to new panes
pub trait Navigator: Send + Sync {
    /// Navigate to `panes`
    fn navigate(&self, panes: RouterPanes, options: NavigateOptions);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn navigate(&self, panes: RouterPanes, options: NavigateOptions) {
        (**self).navigate(panes, options);
    }
}

/// In-memory router with history
#[derive(Debug)]
pub struct MemoryRouter {
    state: watch::Sender<RouterPanes>,
    history: Mutex<Vec<RouterPanes>>,
}

impl MemoryRouter {
    /// Create router at `initial`
    #[must_use]
    pub fn new(initial: RouterPanes) -> Self {
        let (state, _) = watch::channel(initial.clone());
        Self {
            state,
            history: Mutex::new(vec![initial]),
        }
    }

    /// Create router from a panes path
    ///
    /// # Errors
    /// Returns the parse error for a malformed path.
    pub fn from_path(path: &str) -> Result<Self, RouterError> {
        Ok(Self::new(parse_panes_segment(path)?))
    }

    /// Current router panes
    #[must_use]
    pub fn current(&self) -> RouterPanes {
        self.state.borrow().clone()
    }

    /// Current location as a path
    #[must_use]
    pub fn path(&self) -> String {
        to_path(&self.state.borrow())
    }

    /// History entries, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<RouterPanes> {
        self.history.lock().clone()
    }

    /// Raw watch receiver
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RouterPanes> {
        self.state.subscribe()
    }

    /// Number of live subscriptions to the router state
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Stream of router panes: the current value, then every change
    ///
    /// Values that change faster than they are consumed collapse into the
    /// latest one. The stream ends when the router is dropped.
    #[must_use]
    pub fn panes_stream(&self) -> BoxStream<'static, RouterPanes> {
        let mut rx = self.state.subscribe();
        rx.mark_changed();
        futures::stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let panes = rx.borrow_and_update().clone();
            Some((panes, rx))
        })
        .boxed()
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new(RouterPanes::new())
    }
}

impl Navigator for MemoryRouter {
    fn navigate(&self, panes: RouterPanes, options: NavigateOptions) {
        tracing::debug!(path = %to_path(&panes), replace = options.replace, "navigate");
        {
            let mut history = self.history.lock();
            match history.last_mut() {
                Some(top) if options.replace => *top = panes.clone(),
                _ => history.push(panes.clone()),
            }
        }
        self.state.send_replace(panes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sibling::RouterPaneSibling;

    #[test]
    fn push_and_replace_history() {
        let router = MemoryRouter::from_path("author").unwrap();
        router.navigate(vec![vec![RouterPaneSibling::new("book")]], NavigateOptions::push());
        router.navigate(vec![vec![RouterPaneSibling::new("movie")]], NavigateOptions::replace());

        let history = router.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0][0][0].id, "author");
        assert_eq!(history[1][0][0].id, "movie");
        assert_eq!(router.path(), "/movie");
    }

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let router = MemoryRouter::from_path("author").unwrap();
        let mut stream = router.panes_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first[0][0].id, "author");

        router.navigate(vec![vec![RouterPaneSibling::new("book")]], NavigateOptions::push());
        let second = stream.next().await.unwrap();
        assert_eq!(second[0][0].id, "book");
    }

    #[tokio::test]
    async fn dropping_stream_releases_subscription() {
        let router = MemoryRouter::default();
        assert_eq!(router.subscriber_count(), 0);
        let stream = router.panes_stream();
        assert_eq!(router.subscriber_count(), 1);
        drop(stream);
        assert_eq!(router.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_ends_with_router() {
        let router = MemoryRouter::default();
        let mut stream = router.panes_stream();
        assert!(stream.next().await.is_some());
        drop(router);
        assert!(stream.next().await.is_none());
    }
}
