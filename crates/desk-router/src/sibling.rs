//! Router pane state
//!
//! [`RouterPanes`] is the desk's slice of router state: one group per depth
//! level, each group holding the sibling (split) panes at that level.

use crate::params::PaneParams;
use serde::{Deserialize, Serialize};

/// One open pane instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterPaneSibling {
    /// Item id this pane was opened for
    pub id: String,
    /// View state (selected view, template, …)
    #[serde(default, skip_serializing_if = "PaneParams::is_empty")]
    pub params: PaneParams,
    /// Transient data that never reaches the URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Opaque payload reference carried by the URL
    #[serde(default, rename = "payloadRef", skip_serializing_if = "Option::is_none")]
    pub payload_ref: Option<String>,
}

impl RouterPaneSibling {
    /// Create sibling for an item id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// With params
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: PaneParams) -> Self {
        self.params = params;
        self
    }

    /// With a single param set
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// With payload
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Option<serde_json::Value>) -> Self {
        self.payload = payload;
        self
    }

    /// With payload reference
    #[inline]
    #[must_use]
    pub fn with_payload_ref(mut self, payload_ref: impl Into<String>) -> Self {
        self.payload_ref = Some(payload_ref.into());
        self
    }

    /// Param value by key
    #[inline]
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }
}

/// Sibling panes sharing a tree position; the first one is the group root
pub type RouterPaneGroup = Vec<RouterPaneSibling>;

/// Router pane groups from the root to the focused leaf
pub type RouterPanes = Vec<RouterPaneGroup>;

/// Total number of siblings across all groups
#[inline]
#[must_use]
pub fn sibling_count(panes: &RouterPanes) -> usize {
    panes.iter().map(Vec::len).sum()
}

/// Drop transient payloads and empty groups, leaving what a URL can carry
#[must_use]
pub fn strip_transient(panes: &RouterPanes) -> RouterPanes {
    panes
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            group
                .iter()
                .map(|sibling| RouterPaneSibling {
                    payload: None,
                    ..sibling.clone()
                })
                .collect()
        })
        .collect()
}
