//! Pane-data projection
//!
//! Pure functions turning resolved pane metas into the per-pane records a
//! view layer renders, plus the default-panes rule for freshly opened
//! documents.

use crate::resolved_stream::{PaneSlot, ResolvedPaneMeta};
use desk_router::{PaneParams, RouterPaneSibling, RouterPanes};
use serde_json::Value;

/// Param marking a document whose default panes were already opened
pub const EXPANDED_PARAM: &str = "expanded";

/// Everything a view layer needs to render one pane
#[derive(Debug, Clone, PartialEq)]
pub struct PaneData {
    /// Pane belongs to the second to last group
    pub active: bool,
    /// Pane is the last one
    pub selected: bool,
    /// Id of the first pane in the next group
    pub child_item_id: Option<String>,
    /// Router id of this pane
    pub item_id: String,
    /// Group index (0 is the implicit root)
    pub group_index: usize,
    /// Index within the group
    pub sibling_index: usize,
    /// Flat index
    pub index: usize,
    /// Stable render key
    pub key: String,
    /// Loading or resolved node
    pub pane: PaneSlot,
    /// Router params of the pane
    pub params: PaneParams,
    /// Breadcrumb ids joined by `;`
    pub path: String,
    /// Transient payload
    pub payload: Option<Value>,
    /// Pane is maximized
    pub maximized: bool,
}

/// Render key of a pane: `<type>-<item id>-<group>[<sibling>]`
#[must_use]
pub fn pane_key(meta: &ResolvedPaneMeta) -> String {
    format!(
        "{}-{}-{}[{}]",
        meta.pane.type_name(),
        meta.router_pane_sibling.id,
        meta.group_index,
        meta.sibling_index
    )
}

/// Projection of one resolved pane list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanesProjection {
    /// One record per visible pane
    pub pane_data_items: Vec<PaneData>,
    /// Router panes rebuilt from the resolved panes, root group included
    pub router_panes: RouterPanes,
    /// Resolved panes as emitted by the stream
    pub resolved_panes: Vec<ResolvedPaneMeta>,
}

impl PanesProjection {
    /// Mark the pane with `key` as maximized; `None` clears it
    #[must_use]
    pub fn with_maximized(mut self, key: Option<&str>) -> Self {
        for item in &mut self.pane_data_items {
            item.maximized = key.is_some_and(|k| k == item.key);
        }
        self
    }

    /// Selected pane, if any
    #[must_use]
    pub fn selected(&self) -> Option<&PaneData> {
        self.pane_data_items.iter().find(|item| item.selected)
    }
}

fn rebuild_router_panes(resolved: &[ResolvedPaneMeta]) -> RouterPanes {
    let mut groups: RouterPanes = Vec::new();
    for meta in resolved {
        match groups.get_mut(meta.group_index) {
            Some(group) => group.push(meta.router_pane_sibling.clone()),
            None => groups.push(vec![meta.router_pane_sibling.clone()]),
        }
    }
    groups
}

/// Project resolved panes into pane data
#[must_use]
pub fn project_panes(resolved: &[ResolvedPaneMeta]) -> PanesProjection {
    let router_panes = rebuild_router_panes(resolved);
    let active_group = router_panes.len().checked_sub(2);
    let last = resolved.len().checked_sub(1);

    let pane_data_items = resolved
        .iter()
        .map(|meta| PaneData {
            active: Some(meta.group_index) == active_group,
            selected: Some(meta.flat_index) == last,
            child_item_id: router_panes
                .get(meta.group_index + 1)
                .and_then(|group| group.first())
                .map(|sibling| sibling.id.clone()),
            item_id: meta.router_pane_sibling.id.clone(),
            group_index: meta.group_index,
            sibling_index: meta.sibling_index,
            index: meta.flat_index,
            key: pane_key(meta),
            pane: meta.pane.clone(),
            params: meta.router_pane_sibling.params.clone(),
            path: meta.path.join(";"),
            payload: meta.router_pane_sibling.payload.clone(),
            maximized: false,
        })
        .collect();

    PanesProjection {
        pane_data_items,
        router_panes,
        resolved_panes: resolved.to_vec(),
    }
}

/// Router panes opening a document's default panes side by side
///
/// Applies when the last pane is a resolved document with default panes, is
/// alone in its group, and has not been expanded yet. The returned panes
/// exclude the root group and replace the document's group with one sibling
/// per default view; the caller navigates with `replace`.
#[must_use]
pub fn maybe_open_default_panes(resolved: &[ResolvedPaneMeta], router_panes: &RouterPanes) -> Option<RouterPanes> {
    let last = resolved.last()?;
    let document = last.pane.node()?.as_document()?;
    if document.default_panes.is_empty() || last.group_index == 0 {
        return None;
    }
    if router_panes.get(last.group_index).map(Vec::len) != Some(1) {
        return None;
    }
    let sibling = &last.router_pane_sibling;
    if sibling.params.is_set(EXPANDED_PARAM) {
        return None;
    }

    let expanded = document
        .default_panes
        .iter()
        .enumerate()
        .map(|(idx, view)| {
            let mut params = sibling.params.clone();
            params.set("view", view.as_str());
            if idx == 0 {
                params.set(EXPANDED_PARAM, "true");
            }
            RouterPaneSibling::new(sibling.id.clone())
                .with_params(params)
                .with_payload(sibling.payload.clone())
        })
        .collect();

    let mut panes: RouterPanes = router_panes[1..last.group_index].to_vec();
    panes.push(expanded);
    tracing::debug!(
        document = %sibling.id,
        views = document.default_panes.len(),
        "opening default panes"
    );
    Some(panes)
}
