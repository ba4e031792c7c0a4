//! Pane resolution with memoization
//!
//! [`resolve_pane`] turns an [`UnresolvedPane`] into a stream of resolved
//! nodes, following futures and live streams returned by child resolvers.
//! [`PaneResolver`] adds a memo cache keyed by the unresolved pane's identity
//! and the context fingerprint, so unchanged panes are not re-resolved on
//! every navigation.
//!
//! Deferred resolutions are driven by one task per cache entry that replays
//! the latest value to every subscriber. Evicting an entry aborts its task.
//!
//! An entry holds the pane it was resolved from, so its identity cannot be
//! reused by another allocation while the entry lives. A new pane resolved at
//! an index supersedes the entries recorded there.

use crate::error::PaneResolutionError;
use crate::stream_ext::SwitchMapExt;
use dashmap::DashMap;
use desk_structure::{ChildContext, PaneNode, Resolution, StructureError, UnresolvedPane};
use futures::future::ready;
use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Outcome of resolving one pane
pub type PaneResult = Result<Arc<PaneNode>, PaneResolutionError>;

/// Stream of resolved nodes for one pane; each item replaces the previous one
pub type PaneStream = BoxStream<'static, PaneResult>;

fn fail(context: &ChildContext, err: StructureError) -> PaneStream {
    stream::once(ready(Err(PaneResolutionError::at(context.index, context.split_index, err)))).boxed()
}

fn no_child(context: &ChildContext) -> StructureError {
    StructureError::NoChild {
        parent: context.parent.as_ref().map_or_else(String::new, |p| p.id.clone()),
        item_id: context.id.clone(),
    }
}

/// Resolve `unresolved` without memoization
#[must_use]
pub fn resolve_pane(unresolved: &UnresolvedPane, context: &ChildContext) -> PaneStream {
    match unresolved {
        UnresolvedPane::Node(node) => stream::once(ready(Ok(node.clone()))).boxed(),
        UnresolvedPane::Resolver(resolver) => match resolver.resolve(&context.id, context) {
            Ok(resolution) => follow(resolution, Arc::new(context.clone())),
            Err(err) => fail(context, err),
        },
    }
}

fn follow(resolution: Resolution, context: Arc<ChildContext>) -> PaneStream {
    match resolution {
        Resolution::Pane(pane) => resolve_pane(&pane, &context),
        Resolution::Empty => fail(&context, no_child(&context)),
        Resolution::Pending(future) => future
            .into_stream()
            .flat_map(move |result| match result {
                Ok(resolution) => follow(resolution, context.clone()),
                Err(err) => fail(&context, err),
            })
            .boxed(),
        Resolution::Live(updates) => updates
            .switch_map(move |result| match result {
                Ok(resolution) => follow(resolution, context.clone()),
                Err(err) => fail(&context, err),
            })
            .boxed(),
    }
}

/// Memo cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pane: usize,
    context: u64,
}

impl MemoKey {
    /// Key for resolving `pane` in `context`
    #[must_use]
    pub fn new(pane: &UnresolvedPane, context: &ChildContext) -> Self {
        Self {
            pane: pane.identity(),
            context: context.fingerprint(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Replay {
    latest: Option<PaneResult>,
    seq: u64,
    done: bool,
}

fn replay(sender: &watch::Sender<Replay>) -> PaneStream {
    stream::unfold((sender.subscribe(), 0_u64), |(mut rx, seen)| async move {
        loop {
            let (latest, seq, done) = {
                let state = rx.borrow_and_update();
                (state.latest.clone(), state.seq, state.done)
            };
            if seq != seen {
                if let Some(value) = latest {
                    return Some((value, (rx, seq)));
                }
            }
            if done {
                return None;
            }
            rx.changed().await.ok()?;
        }
    })
    .boxed()
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum MemoValue {
    Ready(Arc<PaneNode>),
    Shared {
        sender: Arc<watch::Sender<Replay>>,
        _task: AbortOnDrop,
    },
}

struct MemoEntry {
    pane: UnresolvedPane,
    value: MemoValue,
}

impl MemoEntry {
    fn stream(&self) -> PaneStream {
        match &self.value {
            MemoValue::Ready(node) => stream::once(ready(Ok(node.clone()))).boxed(),
            MemoValue::Shared { sender, .. } => replay(sender),
        }
    }
}

/// Memoizing pane resolver
///
/// Cache keys are recorded per flat index so that a navigation can evict
/// everything below the first changed pane.
pub struct PaneResolver {
    memoize: bool,
    cache: DashMap<MemoKey, MemoEntry>,
    keys_by_index: Mutex<Vec<HashSet<MemoKey>>>,
}

impl PaneResolver {
    /// Create resolver
    #[must_use]
    pub fn new(memoize: bool) -> Self {
        Self {
            memoize,
            cache: DashMap::new(),
            keys_by_index: Mutex::new(Vec::new()),
        }
    }

    /// Number of cached resolutions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing is cached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve `unresolved` for the pane at `context.index`
    pub fn resolve(&self, unresolved: &UnresolvedPane, context: &ChildContext) -> PaneStream {
        let UnresolvedPane::Resolver(resolver) = unresolved else {
            return resolve_pane(unresolved, context);
        };
        if !self.memoize {
            return resolve_pane(unresolved, context);
        }

        let key = MemoKey::new(unresolved, context);
        if let Some(entry) = self.cache.get(&key) {
            if entry.pane.ptr_eq(unresolved) {
                tracing::trace!(index = context.index, id = %context.id, "memoized pane");
                return entry.stream();
            }
        }

        let mut resolution = match resolver.resolve(&context.id, context) {
            Ok(resolution) => resolution,
            Err(err) => return fail(context, err),
        };
        // Settle synchronous chains without spawning
        let value = loop {
            match resolution {
                Resolution::Pane(UnresolvedPane::Node(node)) => break MemoValue::Ready(node),
                Resolution::Pane(UnresolvedPane::Resolver(next)) => match next.resolve(&context.id, context) {
                    Ok(next) => resolution = next,
                    Err(err) => return fail(context, err),
                },
                Resolution::Empty => return fail(context, no_child(context)),
                deferred => match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => break spawn_shared(&runtime, deferred, context),
                    Err(_) => {
                        tracing::debug!(id = %context.id, "no runtime, resolving without memoization");
                        return follow(deferred, Arc::new(context.clone()));
                    }
                },
            }
        };

        let entry = MemoEntry {
            pane: unresolved.clone(),
            value,
        };
        let stream = entry.stream();
        self.cache.insert(key, entry);
        self.record(context.index, key);
        stream
    }

    /// Record `key` at `index`, evicting the keys it supersedes there
    fn record(&self, index: usize, key: MemoKey) {
        let mut keys = self.keys_by_index.lock();
        if keys.len() <= index {
            keys.resize_with(index + 1, HashSet::new);
        }
        let superseded: Vec<MemoKey> = keys[index].iter().copied().filter(|k| *k != key).collect();
        keys[index].clear();
        keys[index].insert(key);

        let mut evicted = 0;
        for old in superseded {
            let in_use = keys.iter().any(|at| at.contains(&old));
            if !in_use && self.cache.remove(&old).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::debug!(index, evicted, "superseded pane resolutions evicted");
        }
    }

    /// Drop cached resolutions recorded at or after `diff_index` that are not
    /// also used before it; returns how many were evicted
    pub fn evict_from(&self, diff_index: usize) -> usize {
        let mut keys = self.keys_by_index.lock();
        let split = diff_index.min(keys.len());
        let keep: HashSet<MemoKey> = keys[..split].iter().flatten().copied().collect();
        let mut evicted = 0;
        for key in keys[split..].iter().flatten() {
            if !keep.contains(key) && self.cache.remove(key).is_some() {
                evicted += 1;
            }
        }
        keys.truncate(split);
        evicted
    }
}

fn spawn_shared(runtime: &tokio::runtime::Handle, resolution: Resolution, context: &ChildContext) -> MemoValue {
    let sender = Arc::new(watch::Sender::new(Replay::default()));
    let mut updates = follow(resolution, Arc::new(context.clone()));
    let task_sender = sender.clone();
    let id = context.id.clone();

    let task = runtime.spawn(async move {
        while let Some(result) = updates.next().await {
            task_sender.send_modify(|state| {
                state.latest = Some(result);
                state.seq += 1;
            });
        }
        tracing::trace!(%id, "pane resolution settled");
        task_sender.send_modify(|state| state.done = true);
    });

    MemoValue::Shared {
        sender,
        _task: AbortOnDrop(task.abort_handle()),
    }
}

impl std::fmt::Debug for PaneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneResolver")
            .field("memoize", &self.memoize)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_structure::{ChildResolver, PaneKind, StructureContext};
    use desk_structure::{ListOptions, Resolution};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node(id: &str) -> PaneNode {
        PaneNode::new(id, id, PaneKind::List(ListOptions::default()))
    }

    fn context(id: &str, index: usize) -> ChildContext {
        let mut context = ChildContext::root(id, Arc::new(StructureContext::new()));
        context.index = index;
        context
    }

    fn counting(calls: Arc<AtomicUsize>) -> UnresolvedPane {
        ChildResolver::new(move |id, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Resolution::node(node(id)))
        })
        .into()
    }

    #[tokio::test]
    async fn follows_nested_resolutions() {
        let pane: UnresolvedPane = ChildResolver::new(|id, _| {
            let id = id.to_string();
            Ok(Resolution::pending(async move {
                Ok(Resolution::live(stream::iter(vec![
                    Ok(Resolution::node(node(&format!("{id}-1")))),
                    Ok(Resolution::node(node(&format!("{id}-2")))),
                ])))
            }))
        })
        .into();

        let ids: Vec<String> = resolve_pane(&pane, &context("a", 1))
            .map(|r| r.unwrap().id.clone())
            .collect()
            .await;
        assert_eq!(ids, vec!["a-1", "a-2"]);
    }

    #[tokio::test]
    async fn empty_resolution_is_no_child() {
        let pane: UnresolvedPane = ChildResolver::new(|_, _| Ok(Resolution::Empty)).into();
        let first = resolve_pane(&pane, &context("a", 3)).next().await.unwrap();
        let err = first.unwrap_err();
        assert!(err.is_no_child());
        assert_eq!(err.index(), 3);
    }

    #[tokio::test]
    async fn memoizes_until_evicted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pane = counting(calls.clone());
        let resolver = PaneResolver::new(true);

        let a = resolver.resolve(&pane, &context("a", 1)).next().await.unwrap().unwrap();
        let b = resolver.resolve(&pane, &context("a", 1)).next().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(resolver.evict_from(2), 0);
        assert_eq!(resolver.evict_from(1), 1);
        resolver.resolve(&pane, &context("a", 1)).next().await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shared_deferred_resolution_replays_latest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let pane: UnresolvedPane = ChildResolver::new(move |id, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            let id = id.to_string();
            Ok(Resolution::pending(async move { Ok(Resolution::node(node(&id))) }))
        })
        .into();
        let resolver = PaneResolver::new(true);

        let first: Vec<_> = resolver.resolve(&pane, &context("doc", 2)).collect().await;
        let second: Vec<_> = resolver.resolve(&pane, &context("doc", 2)).collect().await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert!(Arc::ptr_eq(first[0].as_ref().unwrap(), second[0].as_ref().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_pane_at_an_index_supersedes_the_old_one() {
        let resolver = PaneResolver::new(true);
        let first = counting(Arc::new(AtomicUsize::new(0)));
        resolver.resolve(&first, &context("a", 1)).next().await.unwrap().unwrap();
        resolver.resolve(&first, &context("a", 2)).next().await.unwrap().unwrap();
        assert_eq!(resolver.len(), 2);

        for _ in 0..5 {
            let next = counting(Arc::new(AtomicUsize::new(0)));
            resolver.resolve(&next, &context("a", 1)).next().await.unwrap().unwrap();
        }
        assert_eq!(resolver.len(), 2);
    }

    #[tokio::test]
    async fn cached_entries_keep_their_pane_alive() {
        let resolver = PaneResolver::new(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let pane = counting(calls.clone());
        let identity = pane.identity();
        resolver.resolve(&pane, &context("a", 1)).next().await.unwrap().unwrap();
        drop(pane);

        // A fresh resolver cannot take the cached one's address
        let fresh = counting(calls.clone());
        assert_ne!(fresh.identity(), identity);
        resolver.resolve(&fresh, &context("a", 1)).next().await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let pane: UnresolvedPane = ChildResolver::new(move |id, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StructureError::resolver(id, "boom"))
        })
        .into();
        let resolver = PaneResolver::new(true);

        for _ in 0..2 {
            let result = resolver.resolve(&pane, &context("x", 1)).next().await.unwrap();
            assert!(result.is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(resolver.is_empty());
    }
}
