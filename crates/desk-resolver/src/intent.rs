//! Intent resolution
//!
//! Turns an [`IntentRequest`] into the router panes to navigate to.
//!
//! - Fast path: ask the visible panes, innermost first, through the
//!   [`ActivePanes`] registry. No structure is resolved.
//! - Slow path: walk the structure tree breadth-first from the root
//!   ([`IntentTreeWalk`]) and pick the shallowest, left-most match.
//!
//! Progress is published as an [`IntentStatus`] through a `watch` channel.

use crate::active_panes::ActivePanes;
use crate::config::ResolverConfig;
use crate::error::IntentError;
use crate::pane_resolver::resolve_pane;
use async_trait::async_trait;
use desk_router::{NavigateOptions, Navigator, PaneParams, RouterPaneGroup, RouterPaneSibling, RouterPanes};
use desk_structure::compose::FALLBACK_EDITOR_PREFIX;
use desk_structure::intent::default_intent_checker;
use desk_structure::{ChildContext, IntentContext, IntentRequest, PaneKind, PaneNode, StructureContext, UnresolvedPane};
use futures::future::join_all;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;

/// Filter of a plain document type list
const TYPE_FILTER: &str = "_type == $type";

/// Progress of the latest intent resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IntentStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// Walking the structure tree
    Resolving,
    /// Last resolution failed
    Failed(String),
}

impl IntentStatus {
    /// Check if a tree walk is in flight
    #[inline]
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

/// Structure tree search for an intent
#[async_trait]
pub trait IntentTreeWalk: Send + Sync {
    /// Router panes for `request`, found by walking the structure
    async fn resolve_intent(&self, request: &IntentRequest) -> Result<RouterPanes, IntentError>;
}

/// Intent params without `id` and `type`
fn other_params(request: &IntentRequest) -> PaneParams {
    request.params.omit(&["id", "type"])
}

fn target_group(target: &str, params: PaneParams, payload: Option<Value>) -> RouterPaneGroup {
    vec![RouterPaneSibling::new(target).with_params(params).with_payload(payload)]
}

/// Target group split into one sibling per default view
///
/// Stays a single sibling unless the document has more than one valid
/// default view.
fn document_group(target: &str, params: &PaneParams, payload: Option<&Value>, node: &PaneNode) -> RouterPaneGroup {
    let Some(document) = node.as_document() else {
        return target_group(target, params.clone(), payload.cloned());
    };
    let views = document.valid_default_panes();
    if views.len() < document.default_panes.len() {
        let invalid: Vec<&str> = document
            .default_panes
            .iter()
            .map(String::as_str)
            .filter(|id| !views.contains(id))
            .collect();
        tracing::warn!(document = %document.id, ?invalid, "ignoring default panes without a matching view");
    }
    if views.len() <= 1 {
        return target_group(target, params.clone(), payload.cloned());
    }
    views
        .into_iter()
        .map(|view| {
            RouterPaneSibling::new(target)
                .with_params(params.clone().with("view", view))
                .with_payload(payload.cloned())
        })
        .collect()
}

/// One pane position visited by the tree walk
struct Visit {
    unresolved: UnresolvedPane,
    id: String,
    parent: Option<Arc<PaneNode>>,
    path: Vec<String>,
    index: usize,
}

/// Breadth-first intent search over a structure tree
#[derive(Debug, Clone)]
pub struct StructureIntentWalker {
    root: UnresolvedPane,
    structure: Arc<StructureContext>,
    config: ResolverConfig,
}

impl StructureIntentWalker {
    /// Create walker starting at `root`
    pub fn new(root: impl Into<UnresolvedPane>, structure: Arc<StructureContext>) -> Self {
        Self {
            root: root.into(),
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

    fn context(&self, visit: &Visit) -> ChildContext {
        ChildContext {
            id: visit.id.clone(),
            parent: visit.parent.clone(),
            index: visit.index,
            split_index: 0,
            path: visit.path.clone(),
            params: PaneParams::new(),
            payload: None,
            structure: self.structure.clone(),
        }
    }

    /// First node of a pane; `None` when it has no child
    async fn first_node(&self, visit: &Visit) -> Result<Option<Arc<PaneNode>>, IntentError> {
        match resolve_pane(&visit.unresolved, &self.context(visit)).next().await {
            Some(Ok(node)) => Ok(Some(node)),
            Some(Err(err)) if err.is_no_child() => Ok(None),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }

    /// Group for `target` below `matched`, split when the document it opens
    /// has several default views
    async fn matched_group(
        &self,
        matched: &Arc<PaneNode>,
        visit: &Visit,
        target: &str,
        request: &IntentRequest,
    ) -> RouterPaneGroup {
        let params = other_params(request);
        let Some(child) = matched.child.clone() else {
            return target_group(target, params, request.payload.clone());
        };
        let mut path = visit.path.clone();
        path.push(target.to_string());
        let opened = Visit {
            unresolved: child,
            id: target.to_string(),
            parent: Some(matched.clone()),
            path,
            index: visit.index + 1,
        };
        match self.first_node(&opened).await {
            Ok(Some(node)) => document_group(target, &params, request.payload.as_ref(), &node),
            Ok(None) => target_group(target, params, request.payload.clone()),
            Err(err) => {
                tracing::warn!(%target, error = %err, "could not open intent target to read its default panes");
                target_group(target, params, request.payload.clone())
            }
        }
    }

    fn fallback(&self, request: &IntentRequest, target: Option<&str>) -> Result<RouterPanes, IntentError> {
        let unresolved = || IntentError::Unresolved {
            intent: request.intent.clone(),
        };
        if !self.config.fallback_editor {
            return Err(unresolved());
        }
        let (Some(target), Some(schema_type)) = (target, request.schema_type()) else {
            return Err(unresolved());
        };
        tracing::debug!(%target, "no structure match, using fallback editor");
        Ok(vec![target_group(
            &format!("{FALLBACK_EDITOR_PREFIX}{target}"),
            other_params(request).with("type", schema_type),
            request.payload.clone(),
        )])
    }
}

fn accepts(node: &PaneNode, request: &IntentRequest, index: usize) -> bool {
    if node.can_handle_intent(&request.intent, &request.params, index) {
        return true;
    }
    node.as_document_list().is_some_and(|options| {
        options.filter == TYPE_FILTER
            && options.schema_type_name.is_some()
            && options.schema_type_name.as_deref() == request.schema_type()
    })
}

#[async_trait]
impl IntentTreeWalk for StructureIntentWalker {
    async fn resolve_intent(&self, request: &IntentRequest) -> Result<RouterPanes, IntentError> {
        let target = request.document_id().map(str::to_string);
        let mut level = VecDeque::from([Visit {
            unresolved: self.root.clone(),
            id: self.config.root_id.clone(),
            parent: None,
            path: Vec::new(),
            index: 0,
        }]);

        while !level.is_empty() {
            let visits: Vec<Visit> = level.drain(..).collect();
            let nodes = join_all(visits.iter().map(|visit| self.first_node(visit))).await;

            for (visit, node) in visits.iter().zip(nodes) {
                let Some(node) = node? else {
                    continue;
                };

                let crumbs = |path: &[String]| -> RouterPanes {
                    path.iter().map(|id| vec![RouterPaneSibling::new(id.clone())]).collect()
                };

                if let (Some(target), PaneKind::Document(document)) = (target.as_deref(), &node.kind) {
                    if document.id == target {
                        let mut panes = crumbs(&visit.path[..visit.path.len().saturating_sub(1)]);
                        panes.push(document_group(
                            target,
                            &other_params(request),
                            request.payload.as_ref(),
                            &node,
                        ));
                        tracing::debug!(%target, depth = visit.path.len(), "intent matched open document");
                        return Ok(panes);
                    }
                }

                if accepts(&node, request, visit.index) {
                    let target = target.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                    let mut panes = crumbs(&visit.path);
                    panes.push(self.matched_group(&node, visit, &target, request).await);
                    tracing::debug!(pane = %node.id, depth = visit.path.len(), "intent matched pane");
                    return Ok(panes);
                }

                if visit.index + 1 > self.config.intent_max_depth {
                    continue;
                }
                if let (Some(list), Some(child)) = (node.as_list(), node.child.as_ref()) {
                    for item in list.navigable() {
                        let mut path = visit.path.clone();
                        path.push(item.id.clone());
                        level.push_back(Visit {
                            unresolved: child.clone(),
                            id: item.id.clone(),
                            parent: Some(node.clone()),
                            path,
                            index: visit.index + 1,
                        });
                    }
                }
            }
        }

        self.fallback(request, target.as_deref())
    }
}

/// Resolves intents, trying the visible panes before the structure tree
pub struct IntentResolver {
    active: Arc<dyn ActivePanes>,
    walker: Arc<dyn IntentTreeWalk>,
    status: watch::Sender<IntentStatus>,
}

impl IntentResolver {
    /// Create resolver
    pub fn new(active: Arc<dyn ActivePanes>, walker: Arc<dyn IntentTreeWalk>) -> Self {
        Self {
            active,
            walker,
            status: watch::Sender::new(IntentStatus::Idle),
        }
    }

    /// Subscribe to status changes
    #[must_use]
    pub fn status(&self) -> watch::Receiver<IntentStatus> {
        self.status.subscribe()
    }

    /// Current status
    #[must_use]
    pub fn current_status(&self) -> IntentStatus {
        self.status.borrow().clone()
    }

    /// Router panes from the visible panes alone
    ///
    /// Panes are asked innermost first. An `edit` for a document that is
    /// already open keeps the panes up to that document; otherwise the first
    /// accepting pane gets the target as a new group after its own.
    #[must_use]
    pub fn fast_path(&self, request: &IntentRequest) -> Option<RouterPanes> {
        let snapshot = self.active.snapshot()?;
        let target = request.document_id();

        for pane in snapshot.panes.iter().rev() {
            let kept = || -> RouterPanes { snapshot.router_panes.iter().take(pane.group_index).cloned().collect() };

            let open_document = pane.node.as_document().is_some_and(|d| Some(d.id.as_str()) == target);
            if request.is_edit() && open_document {
                tracing::debug!(document = ?target, group = pane.group_index, "intent matched open document");
                return Some(kept());
            }

            let context = IntentContext {
                pane: &pane.node,
                index: pane.flat_index,
            };
            let accepted = match &pane.node.intent_handler {
                Some(handler) => handler.check(&request.intent, &request.params, context),
                None => false,
            } || (matches!(pane.node.kind, PaneKind::DocumentList(_))
                && default_intent_checker(&request.intent, &request.params, context));
            if !accepted {
                continue;
            }

            let params = match request.template() {
                Some(_) if request.is_create() => request.params.pick(&["template", "version"]),
                _ => PaneParams::new(),
            };
            let id = target.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
            let mut panes = kept();
            panes.push(target_group(&id, params, request.payload.clone()));
            tracing::debug!(pane = %pane.node.id, group = pane.group_index, "intent resolved from visible panes");
            return Some(panes);
        }
        None
    }

    /// Router panes for `request`
    ///
    /// # Errors
    /// - `IntentError::MissingId` for an `edit` without an id
    /// - `IntentError::Unresolved` when nothing accepts the intent
    /// - Structure errors hit while walking the tree
    pub async fn resolve(&self, request: &IntentRequest) -> Result<RouterPanes, IntentError> {
        if request.is_edit() && request.document_id().is_none() {
            return Err(IntentError::MissingId(request.intent.clone()));
        }
        if let Some(panes) = self.fast_path(request) {
            self.status.send_replace(IntentStatus::Idle);
            return Ok(panes);
        }

        tracing::debug!(intent = %request.intent, "resolving intent from structure");
        self.status.send_replace(IntentStatus::Resolving);
        let result = self.walker.resolve_intent(request).await;
        let status = match &result {
            Ok(_) => IntentStatus::Idle,
            Err(err) => {
                tracing::warn!(intent = %request.intent, error = %err, "intent resolution failed");
                IntentStatus::Failed(err.to_string())
            }
        };
        self.status.send_replace(status);
        result
    }

    /// Resolve `request` and navigate there, replacing the current entry
    ///
    /// # Errors
    /// See [`IntentResolver::resolve`].
    pub async fn navigate(&self, request: &IntentRequest, navigator: &dyn Navigator) -> Result<RouterPanes, IntentError> {
        let panes = self.resolve(request).await?;
        navigator.navigate(panes.clone(), NavigateOptions::replace());
        Ok(panes)
    }
}

impl std::fmt::Debug for IntentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentResolver")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_structure::{DocumentOptions, View};
    use pretty_assertions::assert_eq;

    fn author(default_panes: &[&str]) -> PaneNode {
        PaneNode::new(
            "a1",
            "Author",
            PaneKind::Document(
                DocumentOptions::new("a1", "author")
                    .with_views(vec![View::form("editor"), View::component("preview", "Preview")])
                    .with_default_panes(default_panes.iter().map(ToString::to_string).collect()),
            ),
        )
    }

    #[test]
    fn document_group_splits_on_several_views() {
        let group = document_group("a1", &PaneParams::new(), None, &author(&["editor", "preview"]));
        let views: Vec<_> = group.iter().map(|s| s.param("view")).collect();
        assert_eq!(views, vec![Some("editor"), Some("preview")]);
    }

    #[test]
    fn document_group_ignores_invalid_views() {
        let group = document_group("a1", &PaneParams::new(), None, &author(&["editor", "missing"]));
        assert_eq!(group, vec![RouterPaneSibling::new("a1")]);
    }

    #[test]
    fn other_params_drop_id_and_type() {
        let request = IntentRequest::edit("a1", "author").with_param("template", "t");
        assert_eq!(other_params(&request), PaneParams::new().with("template", "t"));
    }

    #[test]
    fn status_predicate() {
        assert!(IntentStatus::Resolving.is_resolving());
        assert!(!IntentStatus::Failed("x".into()).is_resolving());
    }
}
