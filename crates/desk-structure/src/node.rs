//! Structure pane nodes
//!
//! A [`PaneNode`] is an immutable description of one pane: its id, title,
//! kind-specific options, menu items and how its children resolve. Nodes are
//! shared as `Arc<PaneNode>` once resolved.
//!
//! Children are resolved lazily through [`UnresolvedPane`], which is either a
//! ready node or a [`ChildResolver`] function. A resolver may answer with a
//! node, a future, a live stream of nodes, or nothing at all ([`Resolution`]).

use crate::context::ChildContext;
use crate::document_list::SortOrdering;
use crate::error::StructureError;
use crate::intent::IntentPredicate;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Signature of a child resolver
///
/// Called with the requested item id and the resolution context.
pub type ChildResolverFn = dyn Fn(&str, &ChildContext) -> Result<Resolution, StructureError> + Send + Sync;

/// Shared child resolver function
#[derive(Clone)]
pub struct ChildResolver(Arc<ChildResolverFn>);

impl ChildResolver {
    /// Wrap a resolver function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &ChildContext) -> Result<Resolution, StructureError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Resolve the child for `item_id`
    ///
    /// # Errors
    /// Whatever the resolver function returns.
    #[inline]
    pub fn resolve(&self, item_id: &str, context: &ChildContext) -> Result<Resolution, StructureError> {
        (self.0)(item_id, context)
    }

    /// Identity of the underlying function, stable across clones
    #[inline]
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Check if both wrap the same function instance
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ChildResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildResolver({:#x})", self.identity())
    }
}

/// A pane that may still need resolving
#[derive(Debug, Clone)]
pub enum UnresolvedPane {
    /// Ready node
    Node(Arc<PaneNode>),
    /// Function producing the node
    Resolver(ChildResolver),
}

impl UnresolvedPane {
    /// Identity used for memoization, stable across clones
    #[must_use]
    pub fn identity(&self) -> usize {
        match self {
            Self::Node(node) => Arc::as_ptr(node) as usize,
            Self::Resolver(resolver) => resolver.identity(),
        }
    }

    /// Check if both are the same node or resolver instance
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Resolver(a), Self::Resolver(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Ready node, if this is not a resolver
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&Arc<PaneNode>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Resolver(_) => None,
        }
    }
}

impl From<PaneNode> for UnresolvedPane {
    fn from(node: PaneNode) -> Self {
        Self::Node(Arc::new(node))
    }
}

impl From<Arc<PaneNode>> for UnresolvedPane {
    fn from(node: Arc<PaneNode>) -> Self {
        Self::Node(node)
    }
}

impl From<ChildResolver> for UnresolvedPane {
    fn from(resolver: ChildResolver) -> Self {
        Self::Resolver(resolver)
    }
}

/// What a child resolver hands back
pub enum Resolution {
    /// A node, or another resolver to call with the same arguments
    Pane(UnresolvedPane),
    /// Resolution completes later
    Pending(BoxFuture<'static, Result<Resolution, StructureError>>),
    /// Resolution changes over time; each item replaces the previous one
    Live(BoxStream<'static, Result<Resolution, StructureError>>),
    /// No child for this item
    Empty,
}

impl Resolution {
    /// Resolution to a ready node
    #[inline]
    #[must_use]
    pub fn node(node: PaneNode) -> Self {
        Self::Pane(node.into())
    }

    /// Resolution completing with `future`
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Resolution, StructureError>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Resolution following `stream`
    pub fn live<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Resolution, StructureError>> + Send + 'static,
    {
        Self::Live(stream.boxed())
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pane(pane) => f.debug_tuple("Pane").field(pane).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Live(_) => f.write_str("Live(..)"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl From<PaneNode> for Resolution {
    fn from(node: PaneNode) -> Self {
        Self::node(node)
    }
}

impl From<UnresolvedPane> for Resolution {
    fn from(pane: UnresolvedPane) -> Self {
        Self::Pane(pane)
    }
}

/// Entry in a list pane
#[derive(Debug, Clone)]
pub enum ListItem {
    /// Navigable item
    Item(ListItemNode),
    /// Visual separator
    Divider,
}

impl ListItem {
    /// Item id, `None` for dividers
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Item(item) => Some(&item.id),
            Self::Divider => None,
        }
    }
}

impl From<ListItemNode> for ListItem {
    fn from(item: ListItemNode) -> Self {
        Self::Item(item)
    }
}

/// Navigable list entry
#[derive(Debug, Clone)]
pub struct ListItemNode {
    /// Item id, used as router sibling id
    pub id: String,
    /// Display title
    pub title: String,
    /// Schema type shown by this item, if any
    pub schema_type: Option<String>,
    /// Pane opened for this item
    pub child: Option<UnresolvedPane>,
}

impl ListItemNode {
    /// Create item
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            schema_type: None,
            child: None,
        }
    }

    /// With child pane
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: impl Into<UnresolvedPane>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// With schema type
    #[inline]
    #[must_use]
    pub fn with_schema_type(mut self, schema_type: impl Into<String>) -> Self {
        self.schema_type = Some(schema_type.into());
        self
    }
}

/// List pane options
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Entries in display order
    pub items: Vec<ListItem>,
    /// Preview layout key
    pub default_layout: Option<String>,
}

impl ListOptions {
    /// Navigable item with `id`
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ListItemNode> {
        self.items.iter().find_map(|entry| match entry {
            ListItem::Item(item) if item.id == id => Some(item),
            _ => None,
        })
    }

    /// Navigable items, dividers skipped
    pub fn navigable(&self) -> impl Iterator<Item = &ListItemNode> {
        self.items.iter().filter_map(|entry| match entry {
            ListItem::Item(item) => Some(item),
            ListItem::Divider => None,
        })
    }
}

/// Document-list pane options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListOptions {
    /// GROQ filter, without the surrounding `*[...]`
    pub filter: String,
    /// Query parameters referenced by the filter
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// API version to query with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Ordering when the user has not picked one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_ordering: Vec<SortOrdering>,
    /// Schema type every listed document has
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type_name: Option<String>,
    /// Initial value template ids offered by this list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial_value_templates: Vec<String>,
}

impl DocumentListOptions {
    /// Create options for `filter`
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// With a query parameter
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// With schema type name
    #[inline]
    #[must_use]
    pub fn with_schema_type(mut self, schema_type: impl Into<String>) -> Self {
        self.schema_type_name = Some(schema_type.into());
        self
    }

    /// With default ordering
    #[inline]
    #[must_use]
    pub fn with_default_ordering(mut self, ordering: Vec<SortOrdering>) -> Self {
        self.default_ordering = ordering;
        self
    }

    /// With initial value templates
    #[inline]
    #[must_use]
    pub fn with_initial_value_templates(mut self, templates: Vec<String>) -> Self {
        self.initial_value_templates = templates;
        self
    }
}

/// A document view (form or custom component)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// View id, used as the `view` param
    pub id: String,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Component name; `None` means the form view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl View {
    /// Form view
    #[must_use]
    pub fn form(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            component: None,
        }
    }

    /// Component view
    #[must_use]
    pub fn component(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            component: Some(component.into()),
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check if this is the form view
    #[inline]
    #[must_use]
    pub fn is_form(&self) -> bool {
        self.component.is_none()
    }
}

/// Document pane options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentOptions {
    /// Document id
    pub id: String,
    /// Schema type name
    pub schema_type: String,
    /// Initial value template id
    pub template: Option<String>,
    /// Template parameters (from the pane payload)
    pub template_parameters: Option<Value>,
    /// Available views
    pub views: Vec<View>,
    /// View ids to open side by side when the document is opened
    pub default_panes: Vec<String>,
}

impl DocumentOptions {
    /// Create options for a document
    #[must_use]
    pub fn new(id: impl Into<String>, schema_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema_type: schema_type.into(),
            ..Self::default()
        }
    }

    /// With views
    #[inline]
    #[must_use]
    pub fn with_views(mut self, views: Vec<View>) -> Self {
        self.views = views;
        self
    }

    /// With default panes
    #[inline]
    #[must_use]
    pub fn with_default_panes(mut self, default_panes: Vec<String>) -> Self {
        self.default_panes = default_panes;
        self
    }

    /// With initial value template
    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>, parameters: Option<Value>) -> Self {
        self.template = Some(template.into());
        self.template_parameters = parameters;
        self
    }

    /// Default panes that name an existing view
    #[must_use]
    pub fn valid_default_panes(&self) -> Vec<&str> {
        self.default_panes
            .iter()
            .filter(|id| self.views.iter().any(|view| &view.id == *id))
            .map(String::as_str)
            .collect()
    }
}

/// Custom component pane options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentOptions {
    /// Component name the view layer renders
    pub component: String,
    /// Free-form options passed to the component
    pub options: Value,
    /// Actions the component handles
    pub actions: Vec<String>,
}

impl ComponentOptions {
    /// Create options for `component`
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            options: Value::Null,
            actions: Vec::new(),
        }
    }

    /// With handled actions
    #[inline]
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }
}

/// Pane variant
#[derive(Debug, Clone)]
pub enum PaneKind {
    /// Static list of items
    List(ListOptions),
    /// Query-backed list of documents
    DocumentList(DocumentListOptions),
    /// Document editor
    Document(DocumentOptions),
    /// Custom component
    Component(ComponentOptions),
}

impl PaneKind {
    /// Type name as used in pane keys
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::DocumentList(_) => "documentList",
            Self::Document(_) => "document",
            Self::Component(_) => "component",
        }
    }
}

/// Intent attached to a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemIntent {
    /// Intent name (`create`, `edit`, …)
    #[serde(rename = "type")]
    pub intent: String,
    /// Intent params
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Pane menu entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Id for selection state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display title
    pub title: String,
    /// Named action handled by the pane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Intent to navigate to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<MenuItemIntent>,
    /// Menu group id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Action params
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// Show in the pane header instead of the menu
    #[serde(default)]
    pub show_as_action: bool,
}

impl MenuItem {
    /// Menu item running a named action
    #[must_use]
    pub fn action(title: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            action: Some(action.into()),
            intent: None,
            group: None,
            params: Map::new(),
            show_as_action: false,
        }
    }

    /// Menu item navigating to an intent
    #[must_use]
    pub fn intent(title: impl Into<String>, intent: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            id: None,
            title: title.into(),
            action: None,
            intent: Some(MenuItemIntent {
                intent: intent.into(),
                params,
            }),
            group: None,
            params: Map::new(),
            show_as_action: false,
        }
    }

    /// With group
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// With action param
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Shown as header action
    #[inline]
    #[must_use]
    pub fn shown_as_action(mut self) -> Self {
        self.show_as_action = true;
        self
    }
}

/// Menu group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemGroup {
    /// Group id
    pub id: String,
    /// Display title
    pub title: String,
}

/// One pane of the structure tree
#[derive(Clone)]
pub struct PaneNode {
    /// Node id
    pub id: String,
    /// Display title
    pub title: String,
    /// Variant with options
    pub kind: PaneKind,
    /// Menu entries declared for this pane
    pub menu_items: Vec<MenuItem>,
    /// Menu groups
    pub menu_item_groups: Vec<MenuItemGroup>,
    /// How children of this pane resolve
    pub child: Option<UnresolvedPane>,
    /// Custom intent acceptance, replacing the default checks
    pub intent_handler: Option<IntentPredicate>,
}

impl PaneNode {
    /// Create node
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: PaneKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            menu_items: Vec::new(),
            menu_item_groups: Vec::new(),
            child: None,
            intent_handler: None,
        }
    }

    /// With id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With child
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: impl Into<UnresolvedPane>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// With menu items
    #[inline]
    #[must_use]
    pub fn with_menu_items(mut self, items: Vec<MenuItem>) -> Self {
        self.menu_items = items;
        self
    }

    /// With menu groups
    #[inline]
    #[must_use]
    pub fn with_menu_item_groups(mut self, groups: Vec<MenuItemGroup>) -> Self {
        self.menu_item_groups = groups;
        self
    }

    /// With intent predicate
    #[inline]
    #[must_use]
    pub fn with_intent_handler(mut self, handler: IntentPredicate) -> Self {
        self.intent_handler = Some(handler);
        self
    }

    /// Type name (`list`, `documentList`, `document`, `component`)
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// List options, if this is a list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&ListOptions> {
        match &self.kind {
            PaneKind::List(options) => Some(options),
            _ => None,
        }
    }

    /// Document-list options, if this is a document list
    #[inline]
    #[must_use]
    pub fn as_document_list(&self) -> Option<&DocumentListOptions> {
        match &self.kind {
            PaneKind::DocumentList(options) => Some(options),
            _ => None,
        }
    }

    /// Document options, if this is a document
    #[inline]
    #[must_use]
    pub fn as_document(&self) -> Option<&DocumentOptions> {
        match &self.kind {
            PaneKind::Document(options) => Some(options),
            _ => None,
        }
    }

    /// Serializable outline of this node
    #[must_use]
    pub fn summary(&self) -> PaneSummary {
        PaneSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            pane_type: self.type_name().to_string(),
            has_child: self.child.is_some(),
        }
    }
}

impl fmt::Debug for PaneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaneNode")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("menu_items", &self.menu_items.len())
            .field("child", &self.child.is_some())
            .field("intent_handler", &self.intent_handler.is_some())
            .finish()
    }
}

/// Outline of a pane node for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneSummary {
    /// Node id
    pub id: String,
    /// Display title
    pub title: String,
    /// Type name
    #[serde(rename = "type")]
    pub pane_type: String,
    /// Whether the node can open children
    pub has_child: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_survives_clone() {
        let pane: UnresolvedPane = PaneNode::new("a", "A", PaneKind::List(ListOptions::default())).into();
        let copy = pane.clone();
        assert_eq!(pane.identity(), copy.identity());

        let resolver = ChildResolver::new(|_, _| Ok(Resolution::Empty));
        let other = resolver.clone();
        assert_eq!(resolver.identity(), other.identity());
        assert_ne!(
            resolver.identity(),
            ChildResolver::new(|_, _| Ok(Resolution::Empty)).identity()
        );

        let resolver: UnresolvedPane = resolver.into();
        assert!(resolver.ptr_eq(&UnresolvedPane::Resolver(other)));
        assert!(pane.ptr_eq(&copy));
        assert!(!pane.ptr_eq(&resolver));
    }

    #[test]
    fn list_lookup_skips_dividers() {
        let options = ListOptions {
            items: vec![
                ListItemNode::new("a", "A").into(),
                ListItem::Divider,
                ListItemNode::new("b", "B").into(),
            ],
            default_layout: None,
        };
        assert_eq!(options.item("b").map(|i| i.title.as_str()), Some("B"));
        assert!(options.item("c").is_none());
        assert_eq!(options.navigable().count(), 2);
    }

    #[test]
    fn valid_default_panes_filters_unknown_views() {
        let options = DocumentOptions::new("doc", "author")
            .with_views(vec![View::form("editor"), View::component("preview", "Preview")])
            .with_default_panes(vec!["editor".into(), "nope".into(), "preview".into()]);
        assert_eq!(options.valid_default_panes(), vec!["editor", "preview"]);
    }

    #[test]
    fn summary_has_type_name() {
        let node = PaneNode::new("books", "Books", PaneKind::DocumentList(DocumentListOptions::new("_type == \"book\"")));
        let summary = node.summary();
        assert_eq!(summary.pane_type, "documentList");
        assert!(!summary.has_child);
    }
}
