//! Pane-scoped router operations
//!
//! A [`PaneRouter`] is the view a single open pane has of the router state.
//! Every operation is pure: it returns the next [`RouterPanes`] and leaves the
//! actual navigation to a [`Navigator`](crate::Navigator).
//!
//! Positions use desk coordinates: group 0 is the implicit root pane, which is
//! not part of the router state, so group `g` lives at `panes[g - 1]`.

use crate::error::RouterError;
use crate::params::{is_exclusive_param, PaneParams};
use crate::sibling::{RouterPaneGroup, RouterPaneSibling, RouterPanes};
use serde_json::Value;

/// How `set_params` treats a duplicate of the group root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetParamsOptions {
    /// Write params the duplicate inherited back to the group root
    pub recurse_if_inherited: bool,
}

impl SetParamsOptions {
    /// Enable writing inherited params back to the root
    #[inline]
    #[must_use]
    pub fn with_recurse_if_inherited(mut self, recurse: bool) -> Self {
        self.recurse_if_inherited = recurse;
        self
    }
}

/// Router operations for the pane at one position
#[derive(Debug, Clone, Copy)]
pub struct PaneRouter<'a> {
    panes: &'a RouterPanes,
    group_index: usize,
    sibling_index: usize,
}

impl<'a> PaneRouter<'a> {
    /// Router for the pane at `group_index` / `sibling_index`
    #[inline]
    #[must_use]
    pub fn new(panes: &'a RouterPanes, group_index: usize, sibling_index: usize) -> Self {
        Self {
            panes,
            group_index,
            sibling_index,
        }
    }

    /// Router for the implicit root pane
    #[inline]
    #[must_use]
    pub fn root(panes: &'a RouterPanes) -> Self {
        Self::new(panes, 0, 0)
    }

    /// Desk group index of this pane
    #[inline]
    #[must_use]
    pub fn group_index(&self) -> usize {
        self.group_index
    }

    /// Sibling index within the group
    #[inline]
    #[must_use]
    pub fn sibling_index(&self) -> usize {
        self.sibling_index
    }

    /// Router state this pane sees
    #[inline]
    #[must_use]
    pub fn router_panes(&self) -> &'a RouterPanes {
        self.panes
    }

    /// Number of siblings in this pane's group (root counts as one)
    #[must_use]
    pub fn group_length(&self) -> usize {
        match self.group_index.checked_sub(1) {
            Some(idx) => self.panes.get(idx).map_or(0, Vec::len),
            None => 1,
        }
    }

    /// Check if the group holds more than this pane
    #[inline]
    #[must_use]
    pub fn has_group_siblings(&self) -> bool {
        self.group_length() > 1
    }

    /// Router sibling backing this pane
    #[must_use]
    pub fn sibling(&self) -> Option<&'a RouterPaneSibling> {
        let idx = self.group_index.checked_sub(1)?;
        self.panes.get(idx)?.get(self.sibling_index)
    }

    /// Open `child_id` as the next group, closing everything to the right
    #[must_use]
    pub fn child_panes(&self, child_id: &str, payload: Option<Value>) -> RouterPanes {
        let keep = self.group_index.min(self.panes.len());
        let mut panes: RouterPanes = self.panes[..keep].to_vec();
        panes.push(vec![RouterPaneSibling::new(child_id).with_payload(payload)]);
        panes
    }

    /// Rewrite params and payload of the last group's root
    ///
    /// `None` keeps the existing value.
    #[must_use]
    pub fn parameterized_panes(&self, params: Option<PaneParams>, payload: Option<Value>) -> RouterPanes {
        let mut panes = self.panes.clone();
        if let Some(root) = panes.last_mut().and_then(|group| group.first_mut()) {
            if let Some(params) = params {
                root.params = params;
            }
            if payload.is_some() {
                root.payload = payload;
            }
        }
        panes
    }

    /// Replace the whole group with a single pane
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn replace_current(&self, sibling: RouterPaneSibling) -> Result<RouterPanes, RouterError> {
        self.modify_current_group(|_, _| vec![sibling])
    }

    /// Remove this pane from its group; the last pane of a group stays
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn close_current(&self) -> Result<RouterPanes, RouterError> {
        let sibling_index = self.sibling_index;
        self.modify_current_group(|mut group, _| {
            if group.len() > 1 {
                group.remove(sibling_index);
            }
            group
        })
    }

    /// Insert a copy of this pane right after it
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn duplicate_current(
        &self,
        params: Option<PaneParams>,
        payload: Option<Value>,
    ) -> Result<RouterPanes, RouterError> {
        let sibling_index = self.sibling_index;
        self.modify_current_group(|mut group, item| {
            let copy = RouterPaneSibling {
                params: params.unwrap_or_else(|| item.params.clone()),
                payload: payload.or_else(|| item.payload.clone()),
                ..item.clone()
            };
            group.insert(sibling_index + 1, copy);
            group
        })
    }

    /// Set or clear the `view` param
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn set_view(&self, view: Option<&str>) -> Result<RouterPanes, RouterError> {
        let current = self.sibling().map(|s| s.params.clone()).unwrap_or_default();
        let mut params = current.omit(&["view"]);
        if let Some(view) = view.filter(|v| !v.is_empty()) {
            params.push("view", view);
        }
        self.set_params(params, SetParamsOptions::default())
    }

    /// Replace this pane's params
    ///
    /// A duplicate of the group root (same id, not the root itself) only stores
    /// what differs from the root, unless `recurse_if_inherited` is set, in
    /// which case inherited keys are written back to the root instead.
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn set_params(&self, params: PaneParams, options: SetParamsOptions) -> Result<RouterPanes, RouterError> {
        let sibling_index = self.sibling_index;
        self.modify_current_group(|mut group, item| {
            let is_duplicate = sibling_index > 0 && item.id == group[0].id;
            if !is_duplicate {
                group[sibling_index].params = params;
                return group;
            }

            let root_params = group[0].params.clone();
            if options.recurse_if_inherited {
                let inherited_keys: Vec<&str> = item
                    .params
                    .keys()
                    .into_iter()
                    .filter(|key| root_params.get(key) == item.params.get(key))
                    .collect();
                let removed: Vec<&str> = inherited_keys
                    .iter()
                    .copied()
                    .filter(|key| !params.is_set(key))
                    .collect();
                let new_keys = params.keys();
                let remaining: Vec<&str> = new_keys
                    .iter()
                    .copied()
                    .filter(|key| inherited_keys.contains(key))
                    .collect();
                let exclusive: Vec<&str> = new_keys
                    .iter()
                    .copied()
                    .filter(|key| !inherited_keys.contains(key))
                    .collect();

                group[0].params = root_params.omit(&removed).merged(&params.pick(&remaining));
                group[sibling_index].params = params.pick(&exclusive);
            } else {
                let own: PaneParams = params
                    .iter()
                    .filter(|(key, value)| is_exclusive_param(key) || root_params.get(key) != Some(*value))
                    .collect();
                group[sibling_index].params = own;
            }
            group
        })
    }

    /// Replace this pane's payload
    ///
    /// # Errors
    /// Returns `RouterError::PaneOutOfRange` for the root pane or a stale position.
    pub fn set_payload(&self, payload: Option<Value>) -> Result<RouterPanes, RouterError> {
        let sibling_index = self.sibling_index;
        self.modify_current_group(|mut group, _| {
            group[sibling_index].payload = payload;
            group
        })
    }

    fn modify_current_group(
        &self,
        modifier: impl FnOnce(RouterPaneGroup, &RouterPaneSibling) -> RouterPaneGroup,
    ) -> Result<RouterPanes, RouterError> {
        let out_of_range = || RouterError::PaneOutOfRange {
            group_index: self.group_index,
            sibling_index: self.sibling_index,
        };
        let idx = self.group_index.checked_sub(1).ok_or_else(out_of_range)?;
        let group = self.panes.get(idx).ok_or_else(out_of_range)?;
        let item = group.get(self.sibling_index).ok_or_else(out_of_range)?;

        let mut panes = self.panes.clone();
        panes[idx] = modifier(group.clone(), item);
        Ok(panes)
    }
}
