//! Active panes registry
//!
//! The mounted [`ResolvedPanesHandle`](crate::ResolvedPanesHandle) is the only
//! writer; the intent resolver reads snapshots through the [`ActivePanes`]
//! trait to try its fast path without walking the structure.

use crate::projection::PanesProjection;
use desk_router::RouterPanes;
use desk_structure::PaneNode;
use parking_lot::RwLock;
use std::sync::Arc;

/// A resolved, visible pane
#[derive(Debug, Clone)]
pub struct ActivePane {
    /// Resolved node
    pub node: Arc<PaneNode>,
    /// Group index (0 is the implicit root)
    pub group_index: usize,
    /// Index within the group
    pub sibling_index: usize,
    /// Flat index
    pub flat_index: usize,
}

/// Visible panes at one point in time
#[derive(Debug, Clone, Default)]
pub struct ActivePanesSnapshot {
    /// Resolved panes, outermost first; loading panes are left out
    pub panes: Vec<ActivePane>,
    /// Router panes without the implicit root group
    pub router_panes: RouterPanes,
}

impl ActivePanesSnapshot {
    /// Snapshot of a projection
    #[must_use]
    pub fn from_projection(projection: &PanesProjection) -> Self {
        let panes = projection
            .resolved_panes
            .iter()
            .filter_map(|meta| {
                meta.pane.node().map(|node| ActivePane {
                    node: node.clone(),
                    group_index: meta.group_index,
                    sibling_index: meta.sibling_index,
                    flat_index: meta.flat_index,
                })
            })
            .collect();
        Self {
            panes,
            router_panes: projection.router_panes.iter().skip(1).cloned().collect(),
        }
    }
}

/// Read access to the currently visible panes
pub trait ActivePanes: Send + Sync {
    /// Current snapshot, `None` when no desk is mounted
    fn snapshot(&self) -> Option<ActivePanesSnapshot>;
}

/// Shared registry of the visible panes
#[derive(Debug, Default)]
pub struct ActivePanesRegistry {
    current: RwLock<Option<ActivePanesSnapshot>>,
}

impl ActivePanesRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot
    pub fn set(&self, snapshot: ActivePanesSnapshot) {
        *self.current.write() = Some(snapshot);
    }

    /// Forget the snapshot
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Check if a desk is mounted
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current.read().is_some()
    }
}

impl ActivePanes for ActivePanesRegistry {
    fn snapshot(&self) -> Option<ActivePanesSnapshot> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::project_panes;
    use crate::resolved_stream::{flatten_router_panes, PaneSlot, ResolvedPaneMeta};
    use desk_router::RouterPaneSibling;
    use desk_structure::{ListOptions, PaneKind};

    #[test]
    fn snapshot_skips_loading_and_root_group() {
        let groups = vec![vec![RouterPaneSibling::new("root")], vec![RouterPaneSibling::new("author")]];
        let node = Arc::new(PaneNode::new("content", "Content", PaneKind::List(ListOptions::default())));
        let resolved: Vec<_> = flatten_router_panes(&groups)
            .into_iter()
            .zip([PaneSlot::Resolved(node), PaneSlot::Loading])
            .map(|(flat, pane)| ResolvedPaneMeta {
                group_index: flat.group_index,
                sibling_index: flat.sibling_index,
                flat_index: flat.flat_index,
                path: vec![flat.sibling.id.clone()],
                router_pane_sibling: flat.sibling,
                pane,
            })
            .collect();

        let snapshot = ActivePanesSnapshot::from_projection(&project_panes(&resolved));
        assert_eq!(snapshot.panes.len(), 1);
        assert_eq!(snapshot.panes[0].node.id, "content");
        assert_eq!(snapshot.router_panes, vec![vec![RouterPaneSibling::new("author")]]);
    }

    #[test]
    fn registry_mount_state() {
        let registry = ActivePanesRegistry::new();
        assert!(!registry.is_mounted());
        registry.set(ActivePanesSnapshot::default());
        assert!(registry.is_mounted());
        assert!(registry.snapshot().is_some());
        registry.clear();
        assert!(registry.snapshot().is_none());
    }
}
