//! Structure and child-resolution context
//!
//! [`StructureContext`] owns everything the structure tree needs from the
//! host: the schema-type registry, initial value templates and the factory
//! for default document nodes. [`ChildContext`] is what a child resolver
//! receives for each call.

use crate::node::{DocumentOptions, PaneKind, PaneNode, View};
use desk_router::PaneParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Registered schema type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaType {
    /// Type name, e.g. `author`
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Whether the type is a document type (as opposed to an object type)
    #[serde(default = "default_true")]
    pub document: bool,
}

fn default_true() -> bool {
    true
}

impl SchemaType {
    /// Document type
    #[must_use]
    pub fn document(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: Some(title.into()),
            document: true,
        }
    }

    /// Title, falling back to the name
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Initial value template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template id
    pub id: String,
    /// Schema type the template creates
    pub schema_type: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Initial value
    #[serde(default)]
    pub value: Value,
}

/// Views and default panes for documents of one schema type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNodeSpec {
    /// Views in display order
    #[serde(default)]
    pub views: Vec<View>,
    /// View ids opened side by side
    #[serde(default)]
    pub default_panes: Vec<String>,
}

/// Custom document node factory: `(schema_type, document_id)`
pub type DocumentNodeFactory = Arc<dyn Fn(&str, &str) -> Option<PaneNode> + Send + Sync>;

/// Host-provided structure context
#[derive(Clone, Default)]
pub struct StructureContext {
    schema_types: Vec<SchemaType>,
    templates: Vec<Template>,
    document_nodes: HashMap<String, DocumentNodeSpec>,
    document_node_factory: Option<DocumentNodeFactory>,
}

impl StructureContext {
    /// Empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a schema type
    #[must_use]
    pub fn with_schema_type(mut self, schema_type: SchemaType) -> Self {
        self.schema_types.retain(|t| t.name != schema_type.name);
        self.schema_types.push(schema_type);
        self
    }

    /// With an initial value template
    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.retain(|t| t.id != template.id);
        self.templates.push(template);
        self
    }

    /// With a document node spec for a schema type
    #[must_use]
    pub fn with_document_node(mut self, schema_type: impl Into<String>, spec: DocumentNodeSpec) -> Self {
        self.document_nodes.insert(schema_type.into(), spec);
        self
    }

    /// With a custom document node factory; consulted before per-type specs
    #[must_use]
    pub fn with_document_node_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str, &str) -> Option<PaneNode> + Send + Sync + 'static,
    {
        self.document_node_factory = Some(Arc::new(factory));
        self
    }

    /// Registered schema types in registration order
    #[inline]
    #[must_use]
    pub fn schema_types(&self) -> &[SchemaType] {
        &self.schema_types
    }

    /// Schema type by name
    #[must_use]
    pub fn schema_type(&self, name: &str) -> Option<&SchemaType> {
        self.schema_types.iter().find(|t| t.name == name)
    }

    /// Template by id
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates creating `schema_type`
    #[must_use]
    pub fn templates_for(&self, schema_type: &str) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.schema_type == schema_type).collect()
    }

    /// Document editor node for a document of `schema_type`
    #[must_use]
    pub fn resolve_document_node(&self, schema_type: &str, document_id: &str) -> PaneNode {
        if let Some(node) = self
            .document_node_factory
            .as_ref()
            .and_then(|factory| factory(schema_type, document_id))
        {
            return node;
        }

        let spec = self.document_nodes.get(schema_type).cloned().unwrap_or_default();
        let views = if spec.views.is_empty() {
            vec![View::form("editor")]
        } else {
            spec.views
        };
        let title = self
            .schema_type(schema_type)
            .map_or(schema_type, SchemaType::display_title)
            .to_string();

        PaneNode::new(
            document_id,
            title,
            PaneKind::Document(
                DocumentOptions::new(document_id, schema_type)
                    .with_views(views)
                    .with_default_panes(spec.default_panes),
            ),
        )
    }
}

impl fmt::Debug for StructureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureContext")
            .field("schema_types", &self.schema_types)
            .field("templates", &self.templates.len())
            .field("document_nodes", &self.document_nodes.keys().collect::<Vec<_>>())
            .field("document_node_factory", &self.document_node_factory.is_some())
            .finish()
    }
}

/// Arguments of a child resolver call
#[derive(Debug, Clone)]
pub struct ChildContext {
    /// Requested item id
    pub id: String,
    /// Pane whose child is being resolved
    pub parent: Option<Arc<PaneNode>>,
    /// Flat index of the pane being resolved
    pub index: usize,
    /// Sibling index within its group
    pub split_index: usize,
    /// Router ids from the root down to this pane
    pub path: Vec<String>,
    /// Router params of the sibling
    pub params: PaneParams,
    /// Transient payload of the sibling
    pub payload: Option<Value>,
    /// Structure context
    pub structure: Arc<StructureContext>,
}

impl ChildContext {
    /// Context for the root pane
    #[must_use]
    pub fn root(id: impl Into<String>, structure: Arc<StructureContext>) -> Self {
        let id = id.into();
        Self {
            path: vec![id.clone()],
            id,
            parent: None,
            index: 0,
            split_index: 0,
            params: PaneParams::new(),
            payload: None,
            structure,
        }
    }

    /// Hash of everything that can change a resolver's answer besides the
    /// resolver itself
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        self.parent.as_ref().map(|p| p.id.as_str()).hash(&mut hasher);
        self.index.hash(&mut hasher);
        self.split_index.hash(&mut hasher);
        self.path.hash(&mut hasher);
        self.params.hash(&mut hasher);
        self.payload.as_ref().map(Value::to_string).hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> StructureContext {
        StructureContext::new()
            .with_schema_type(SchemaType::document("author", "Author"))
            .with_document_node(
                "author",
                DocumentNodeSpec {
                    views: vec![View::form("editor"), View::component("preview", "Preview")],
                    default_panes: vec!["editor".into(), "preview".into()],
                },
            )
    }

    #[test]
    fn document_node_uses_type_spec() {
        let node = context().resolve_document_node("author", "a1");
        let options = node.as_document().unwrap();
        assert_eq!(node.id, "a1");
        assert_eq!(node.title, "Author");
        assert_eq!(options.views.len(), 2);
        assert_eq!(options.default_panes, vec!["editor", "preview"]);
    }

    #[test]
    fn document_node_defaults_to_form_view() {
        let node = context().resolve_document_node("book", "b1");
        let options = node.as_document().unwrap();
        assert_eq!(options.views, vec![View::form("editor")]);
        assert!(options.default_panes.is_empty());
    }

    #[test]
    fn factory_takes_precedence() {
        let ctx = context().with_document_node_factory(|schema_type, id| {
            (schema_type == "author").then(|| {
                PaneNode::new("custom", "Custom", PaneKind::Document(DocumentOptions::new(id, schema_type)))
            })
        });
        assert_eq!(ctx.resolve_document_node("author", "a1").id, "custom");
        assert_eq!(ctx.resolve_document_node("book", "b1").id, "b1");
    }

    #[test]
    fn fingerprint_tracks_params() {
        let structure = Arc::new(context());
        let a = ChildContext::root("root", structure.clone());
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.params.set("view", "x");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
