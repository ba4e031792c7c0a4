//! Resolved-pane stream factory
//!
//! Turns a stream of [`RouterPanes`] into a stream of [`ResolvedPaneMeta`]
//! lists, one entry per visible pane:
//!
//! - An implicit root router pane is prepended to every navigation
//! - Each resolved pane is emitted right away, followed by loading slots for
//!   everything below it; deeper panes replace their slots as they resolve
//! - A new navigation drops the resolution of the previous one before it
//!   starts, so nothing stale is emitted afterwards
//! - A pane without a child truncates the list; other resolver errors end
//!   the stream with `Err`

use crate::config::ResolverConfig;
use crate::error::PaneResolutionError;
use crate::pane_resolver::PaneResolver;
use crate::stream_ext::{until_error, SwitchMapExt};
use desk_router::{RouterPaneSibling, RouterPanes};
use desk_structure::compose::{fallback_editor, is_fallback_editor_id};
use desk_structure::{ChildContext, ChildResolver, PaneNode, Resolution, StructureContext, UnresolvedPane};
use futures::future::ready;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, OnceLock};

/// A pane position: still loading or resolved to a node
#[derive(Debug, Clone)]
pub enum PaneSlot {
    /// Resolution in flight
    Loading,
    /// Resolved node
    Resolved(Arc<PaneNode>),
}

impl PaneSlot {
    /// Check if the slot is still loading
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Resolved node, if any
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<&Arc<PaneNode>> {
        match self {
            Self::Loading => None,
            Self::Resolved(node) => Some(node),
        }
    }

    /// Pane type name, or `unknown` while loading
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.node().map_or("unknown", |node| node.type_name())
    }
}

/// Slots are equal when both are loading or both hold the same node instance
impl PartialEq for PaneSlot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Loading, Self::Loading) => true,
            (Self::Resolved(a), Self::Resolved(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One router pane with its position in the flattened sequence
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRouterPane {
    /// Router sibling
    pub sibling: RouterPaneSibling,
    /// Group index (0 is the implicit root)
    pub group_index: usize,
    /// Index within the group
    pub sibling_index: usize,
    /// Index in the flattened sequence
    pub flat_index: usize,
}

/// One visible pane
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaneMeta {
    /// Group index (0 is the implicit root)
    pub group_index: usize,
    /// Index within the group
    pub sibling_index: usize,
    /// Index in the flattened sequence
    pub flat_index: usize,
    /// Router sibling this pane was opened for
    pub router_pane_sibling: RouterPaneSibling,
    /// Router ids from the root down to this pane
    pub path: Vec<String>,
    /// Loading or resolved node
    pub pane: PaneSlot,
}

impl ResolvedPaneMeta {
    fn new(flat: &FlatRouterPane, path: Vec<String>, pane: PaneSlot) -> Self {
        Self {
            group_index: flat.group_index,
            sibling_index: flat.sibling_index,
            flat_index: flat.flat_index,
            router_pane_sibling: flat.sibling.clone(),
            path,
            pane,
        }
    }
}

/// Stream of resolved pane lists
pub type ResolvedPanesStream = BoxStream<'static, Result<Vec<ResolvedPaneMeta>, PaneResolutionError>>;

/// Inputs of [`create_resolved_pane_node_stream`]
pub struct ResolvedPaneStreamOptions {
    /// Root pane of the structure
    pub root: UnresolvedPane,
    /// Router panes, one item per navigation
    pub router_panes: BoxStream<'static, RouterPanes>,
    /// Structure context handed to resolvers
    pub structure: Arc<StructureContext>,
    /// Resolver settings
    pub config: ResolverConfig,
}

impl ResolvedPaneStreamOptions {
    /// Create options with the default config
    pub fn new(
        root: impl Into<UnresolvedPane>,
        router_panes: BoxStream<'static, RouterPanes>,
        structure: Arc<StructureContext>,
    ) -> Self {
        Self {
            root: root.into(),
            router_panes,
            structure,
            config: ResolverConfig::default(),
        }
    }

    /// With config
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }
}

/// Flatten groups into one sequence, numbering every sibling
#[must_use]
pub fn flatten_router_panes(panes: &RouterPanes) -> Vec<FlatRouterPane> {
    panes
        .iter()
        .enumerate()
        .flat_map(|(group_index, group)| {
            group.iter().enumerate().map(move |(sibling_index, sibling)| (group_index, sibling_index, sibling))
        })
        .enumerate()
        .map(|(flat_index, (group_index, sibling_index, sibling))| FlatRouterPane {
            sibling: sibling.clone(),
            group_index,
            sibling_index,
            flat_index,
        })
        .collect()
}

/// First flat index at which `curr` differs from `prev`
#[must_use]
pub fn diff_index(prev: &[FlatRouterPane], curr: &[FlatRouterPane]) -> usize {
    curr.iter()
        .enumerate()
        .position(|(idx, pane)| prev.get(idx) != Some(pane))
        .unwrap_or(curr.len())
}

fn fallback_editor_pane() -> UnresolvedPane {
    static PANE: OnceLock<UnresolvedPane> = OnceLock::new();
    PANE.get_or_init(|| {
        ChildResolver::new(|node_id, context| fallback_editor(node_id, context).map(Resolution::node)).into()
    })
    .clone()
}

fn loading_panes(path: &[String], rest: &[FlatRouterPane]) -> Vec<ResolvedPaneMeta> {
    rest.iter()
        .enumerate()
        .map(|(rest_index, pane)| {
            let mut loading_path = path.to_vec();
            loading_path.extend((0..rest.len() - rest_index).map(|offset| format!("[{}]", pane.flat_index + offset)));
            ResolvedPaneMeta::new(pane, loading_path, PaneSlot::Loading)
        })
        .collect()
}

struct Walk {
    flat: Vec<FlatRouterPane>,
    resolver: Arc<PaneResolver>,
    structure: Arc<StructureContext>,
}

fn resolve_tree(
    walk: Arc<Walk>,
    unresolved: Option<UnresolvedPane>,
    position: usize,
    parent: Option<Arc<PaneNode>>,
    path: Vec<String>,
) -> ResolvedPanesStream {
    let Some(current) = walk.flat.get(position).cloned() else {
        return stream::empty().boxed();
    };
    let mut current_path = path.clone();
    current_path.push(current.sibling.id.clone());

    let Some(unresolved) = unresolved else {
        tracing::warn!(index = current.flat_index, id = %current.sibling.id, "pane has no child, truncating");
        return stream::once(ready(Ok(Vec::new()))).boxed();
    };

    let context = ChildContext {
        id: current.sibling.id.clone(),
        parent: parent.clone(),
        index: current.flat_index,
        split_index: current.sibling_index,
        path: current_path.clone(),
        params: current.sibling.params.clone(),
        payload: current.sibling.payload.clone(),
        structure: walk.structure.clone(),
    };
    let resolved = walk.resolver.resolve(&unresolved, &context);

    resolved
        .switch_map(move |result| -> ResolvedPanesStream {
            let node = match result {
                Ok(node) => node,
                Err(err) if err.is_no_child() => {
                    tracing::warn!(index = current.flat_index, error = %err, "pane resolution returned no child");
                    return stream::once(ready(Ok(Vec::new()))).boxed();
                }
                Err(err) => {
                    tracing::warn!(index = current.flat_index, error = %err, "pane resolution failed");
                    return stream::once(ready(Err(err))).boxed();
                }
            };

            let meta = ResolvedPaneMeta::new(&current, current_path.clone(), PaneSlot::Resolved(node.clone()));
            let rest = &walk.flat[position + 1..];
            let Some(next) = rest.first() else {
                return stream::once(ready(Ok(vec![meta]))).boxed();
            };

            let next_stream = if is_fallback_editor_id(&next.sibling.id) {
                resolve_tree(
                    walk.clone(),
                    Some(fallback_editor_pane()),
                    position + 1,
                    parent.clone(),
                    current_path.clone(),
                )
            } else if next.group_index == current.group_index {
                // split pane: same unresolved pane, same parent
                resolve_tree(walk.clone(), Some(unresolved.clone()), position + 1, parent.clone(), path.clone())
            } else {
                resolve_tree(
                    walk.clone(),
                    node.child.clone(),
                    position + 1,
                    Some(node.clone()),
                    current_path.clone(),
                )
            };

            let mut first = Vec::with_capacity(rest.len() + 1);
            first.push(meta.clone());
            first.extend(loading_panes(&current_path, rest));

            stream::once(ready(Ok(first)))
                .chain(next_stream.map(move |result| {
                    result.map(|deeper| {
                        let mut panes = Vec::with_capacity(deeper.len() + 1);
                        panes.push(meta.clone());
                        panes.extend(deeper);
                        panes
                    })
                }))
                .boxed()
        })
        .boxed()
}

fn keep_resolved(prev: &[ResolvedPaneMeta], next: Vec<ResolvedPaneMeta>) -> Vec<ResolvedPaneMeta> {
    next.into_iter()
        .enumerate()
        .map(|(idx, pane)| match prev.get(idx) {
            Some(previous)
                if pane.pane.is_loading() && previous.router_pane_sibling.id == pane.router_pane_sibling.id =>
            {
                ResolvedPaneMeta {
                    router_pane_sibling: pane.router_pane_sibling,
                    ..previous.clone()
                }
            }
            _ => pane,
        })
        .collect()
}

/// Create the resolved-pane stream
///
/// Emits after every partial resolution and every navigation; consecutive
/// equal lists are suppressed. The stream ends after the first error, or once
/// the router stream ends and the last resolution settles.
#[must_use]
pub fn create_resolved_pane_node_stream(options: ResolvedPaneStreamOptions) -> ResolvedPanesStream {
    let ResolvedPaneStreamOptions {
        root,
        router_panes,
        structure,
        config,
    } = options;

    let resolver = Arc::new(PaneResolver::new(config.memoize));
    let cache = resolver.clone();
    let root_id = config.root_id;
    let mut previous: Vec<FlatRouterPane> = Vec::new();

    let navigations = router_panes.map(move |panes| {
        let mut groups = Vec::with_capacity(panes.len() + 1);
        groups.push(vec![RouterPaneSibling::new(root_id.clone())]);
        groups.extend(panes);

        let flat = flatten_router_panes(&groups);
        let diff = diff_index(&previous, &flat);
        let evicted = cache.evict_from(diff);
        tracing::debug!(panes = flat.len(), diff_index = diff, evicted, "resolving navigation");
        previous.clone_from(&flat);
        flat
    });

    let resolved = navigations.switch_map(move |flat| {
        let walk = Arc::new(Walk {
            flat,
            resolver: resolver.clone(),
            structure: structure.clone(),
        });
        resolve_tree(walk, Some(root.clone()), 0, None, Vec::new())
    });

    let merged = resolved.scan(Vec::<ResolvedPaneMeta>::new(), |prev, item| {
        let item = item.map(|next| {
            let merged = keep_resolved(prev, next);
            prev.clone_from(&merged);
            merged
        });
        ready(Some(item))
    });

    let distinct = merged
        .scan(None::<Vec<ResolvedPaneMeta>>, |last, item| {
            let out = match item {
                Ok(panes) if last.as_ref() == Some(&panes) => None,
                Ok(panes) => {
                    *last = Some(panes.clone());
                    Some(Ok(panes))
                }
                Err(err) => Some(Err(err)),
            };
            ready(Some(out))
        })
        .filter_map(ready);

    until_error(distinct.boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat(path: &str) -> Vec<FlatRouterPane> {
        let mut panes = vec![vec![RouterPaneSibling::new("root")]];
        panes.extend(desk_router::parse_panes_segment(path).unwrap());
        flatten_router_panes(&panes)
    }

    #[test]
    fn flattening_numbers_siblings() {
        let panes = flat("a;b|c;d");
        let positions: Vec<_> = panes
            .iter()
            .map(|p| (p.sibling.id.as_str(), p.group_index, p.sibling_index, p.flat_index))
            .collect();
        assert_eq!(
            positions,
            vec![("root", 0, 0, 0), ("a", 1, 0, 1), ("b", 2, 0, 2), ("c", 2, 1, 3), ("d", 3, 0, 4)]
        );
    }

    #[test]
    fn diff_index_finds_first_change() {
        assert_eq!(diff_index(&flat("a;b"), &flat("a;b")), 3);
        assert_eq!(diff_index(&flat("a;b"), &flat("a;c")), 2);
        assert_eq!(diff_index(&[], &flat("a")), 0);
        assert_eq!(diff_index(&flat("a;b,view=x"), &flat("a;b")), 2);
    }

    #[test]
    fn loading_paths_count_remaining_panes() {
        let panes = flat("a;b");
        let loading = loading_panes(&["root".into()], &panes[1..]);
        assert_eq!(loading[0].path, vec!["root", "[1]", "[2]"]);
        assert_eq!(loading[1].path, vec!["root", "[2]"]);
        assert!(loading.iter().all(|p| p.pane.is_loading()));
    }

    #[test]
    fn loading_slot_keeps_previous_pane_with_same_id() {
        let panes = flat("a");
        let node = Arc::new(PaneNode::new(
            "a",
            "A",
            desk_structure::PaneKind::List(desk_structure::ListOptions::default()),
        ));
        let prev = vec![ResolvedPaneMeta::new(&panes[1], vec!["root".into(), "a".into()], PaneSlot::Resolved(node))];
        let next = vec![ResolvedPaneMeta::new(&panes[1], vec!["root".into(), "[1]".into()], PaneSlot::Loading)];
        assert_eq!(keep_resolved(&prev, next), prev);
    }
}
