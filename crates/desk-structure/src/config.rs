//! Declarative structure config
//!
//! A [`StructureConfig`] describes schema types, templates, per-type document
//! views and the root list, in TOML or JSON. [`StructureConfig::build`]
//! validates it and produces the immutable node tree.
//!
//! ```toml
//! [[schemaTypes]]
//! name = "author"
//! title = "Author"
//!
//! [documentNodes.author]
//! views = [{ id = "editor" }, { id = "preview", component = "Preview" }]
//! defaultPanes = ["editor", "preview"]
//!
//! [root]
//! title = "Content"
//! items = [{ kind = "documentTypeList", type = "author" }, { kind = "divider" }]
//! ```

use crate::compose::{
    component, default_structure, document_list, document_type_list, list, structure_node_id, DEFAULT_ROOT_ID,
};
use crate::context::{DocumentNodeSpec, SchemaType, StructureContext, Template};
use crate::document_list::{ListQueryPolicy, SortOrdering};
use crate::error::StructureError;
use crate::intent::IntentPredicate;
use crate::node::{ComponentOptions, DocumentListOptions, ListItem, ListItemNode, PaneNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Root of a structure config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureConfig {
    /// Registered schema types
    #[serde(default)]
    pub schema_types: Vec<SchemaType>,
    /// Initial value templates
    #[serde(default)]
    pub templates: Vec<Template>,
    /// Views and default panes per schema type
    #[serde(default)]
    pub document_nodes: BTreeMap<String, DocumentNodeSpec>,
    /// Root list; a list of every document type when absent
    #[serde(default)]
    pub root: Option<ListConfig>,
    /// Document-list query limits
    #[serde(default)]
    pub list_query: ListQueryPolicy,
}

/// A list and its items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    /// List id; derived from the title when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Items in display order
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// One list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemConfig {
    /// Every document of a schema type
    #[serde(rename_all = "camelCase")]
    DocumentTypeList {
        /// Schema type name
        #[serde(rename = "type")]
        type_name: String,
        /// Item id; the type name when absent
        #[serde(default)]
        id: Option<String>,
        /// Title override
        #[serde(default)]
        title: Option<String>,
    },
    /// Nested list
    #[serde(rename_all = "camelCase")]
    List {
        /// Item id; derived from the title when absent
        #[serde(default)]
        id: Option<String>,
        /// Display title
        #[serde(default)]
        title: String,
        /// Items of the nested list
        #[serde(default)]
        items: Vec<ItemConfig>,
    },
    /// Documents matching a filter
    #[serde(rename_all = "camelCase")]
    DocumentList {
        /// Item id; derived from the title when absent
        #[serde(default)]
        id: Option<String>,
        /// Display title
        #[serde(default)]
        title: String,
        /// Query filter
        filter: String,
        /// Filter params
        #[serde(default)]
        params: Map<String, Value>,
        /// Schema type of every listed document
        #[serde(default, rename = "type")]
        schema_type: Option<String>,
        /// Default ordering
        #[serde(default)]
        default_ordering: Vec<SortOrdering>,
    },
    /// A single document (singleton)
    #[serde(rename_all = "camelCase")]
    Document {
        /// Item id; the document id when absent
        #[serde(default)]
        id: Option<String>,
        /// Display title
        #[serde(default)]
        title: Option<String>,
        /// Schema type name
        #[serde(rename = "type")]
        schema_type: String,
        /// Document id
        document_id: String,
    },
    /// Custom component
    #[serde(rename_all = "camelCase")]
    Component {
        /// Item id; derived from the title when absent
        #[serde(default)]
        id: Option<String>,
        /// Display title
        #[serde(default)]
        title: String,
        /// Component name
        component: String,
        /// Options passed to the component
        #[serde(default)]
        options: Value,
        /// Actions the component handles
        #[serde(default)]
        actions: Vec<String>,
        /// Intent names the component accepts
        #[serde(default)]
        intents: Vec<String>,
    },
    /// Separator
    Divider,
}

/// Built structure: context plus root node
#[derive(Debug, Clone)]
pub struct Structure {
    /// Structure context
    pub context: Arc<StructureContext>,
    /// Root pane node
    pub root: Arc<PaneNode>,
    /// Document-list query limits
    pub list_query: ListQueryPolicy,
}

impl StructureConfig {
    /// Parse TOML config
    ///
    /// # Errors
    /// Returns `StructureError::Config` on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self, StructureError> {
        toml::from_str(input).map_err(|e| StructureError::Config(e.to_string()))
    }

    /// Parse JSON config
    ///
    /// # Errors
    /// Returns `StructureError::Config` on malformed input.
    pub fn from_json_str(input: &str) -> Result<Self, StructureError> {
        serde_json::from_str(input).map_err(|e| StructureError::Config(e.to_string()))
    }

    /// Load config from a `.json` or `.toml` file
    ///
    /// # Errors
    /// Returns `StructureError::Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StructureError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| StructureError::Config(format!("cannot read {}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        tracing::debug!(path = %path.display(), json = is_json, "loading structure config");
        if is_json {
            Self::from_json_str(&input)
        } else {
            Self::from_toml_str(&input)
        }
    }

    /// Structure context described by this config
    ///
    /// # Errors
    /// Returns `StructureError::UnknownSchemaType` for templates or document
    /// nodes referencing unregistered types.
    pub fn context(&self) -> Result<StructureContext, StructureError> {
        let mut context = StructureContext::new();
        for schema_type in &self.schema_types {
            context = context.with_schema_type(schema_type.clone());
        }

        for template in &self.templates {
            if context.schema_type(&template.schema_type).is_none() {
                return Err(StructureError::UnknownSchemaType(template.schema_type.clone()));
            }
            context = context.with_template(template.clone());
        }

        for (type_name, spec) in &self.document_nodes {
            if context.schema_type(type_name).is_none() {
                return Err(StructureError::UnknownSchemaType(type_name.clone()));
            }
            for pane in &spec.default_panes {
                if !spec.views.iter().any(|view| &view.id == pane) {
                    tracing::warn!(schema_type = %type_name, view = %pane, "default pane does not name a view");
                }
            }
            context = context.with_document_node(type_name.clone(), spec.clone());
        }

        Ok(context)
    }

    /// Validate and build the structure
    ///
    /// # Errors
    /// Returns the first definition error found.
    pub fn build(&self) -> Result<Structure, StructureError> {
        let context = self.context()?;
        let root = match &self.root {
            Some(root) => {
                let id = item_id(root.id.as_deref(), &root.title).unwrap_or_else(|| DEFAULT_ROOT_ID.to_string());
                build_list(&context, &id, &root.title, &root.items, "root")?
            }
            None => default_structure(&context)?,
        };

        Ok(Structure {
            context: Arc::new(context),
            root: Arc::new(root),
            list_query: self.list_query,
        })
    }
}

fn item_id(explicit: Option<&str>, title: &str) -> Option<String> {
    match explicit.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Some(id.to_string()),
        None => Some(structure_node_id(title)).filter(|id| !id.is_empty()),
    }
}

fn require_id(explicit: Option<&str>, title: &str, path: &str) -> Result<String, StructureError> {
    item_id(explicit, title).ok_or_else(|| StructureError::MissingId {
        kind: "list items".into(),
        path: path.to_string(),
    })
}

fn require_type<'a>(context: &StructureContext, type_name: &'a str) -> Result<&'a str, StructureError> {
    context
        .schema_type(type_name)
        .map(|_| type_name)
        .ok_or_else(|| StructureError::UnknownSchemaType(type_name.to_string()))
}

fn build_list(
    context: &StructureContext,
    id: &str,
    title: &str,
    items: &[ItemConfig],
    path: &str,
) -> Result<PaneNode, StructureError> {
    let mut seen = HashSet::new();
    let mut built = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let item_path = format!("{path}.items[{idx}]");
        let entry = build_item(context, item, &item_path)?;
        if let Some(item_id) = entry.id() {
            if !seen.insert(item_id.to_string()) {
                return Err(StructureError::DuplicateId {
                    id: item_id.to_string(),
                    path: item_path,
                });
            }
        }
        built.push(entry);
    }

    Ok(list(id, title, built))
}

fn build_item(context: &StructureContext, item: &ItemConfig, path: &str) -> Result<ListItem, StructureError> {
    let entry = match item {
        ItemConfig::Divider => return Ok(ListItem::Divider),
        ItemConfig::DocumentTypeList { type_name, id, title } => {
            let mut node = document_type_list(context, type_name)?;
            if let Some(title) = title {
                node = node.with_title(title.clone());
            }
            let id = id.clone().filter(|id| !id.is_empty()).unwrap_or_else(|| type_name.clone());
            ListItemNode::new(id, node.title.clone())
                .with_schema_type(type_name.clone())
                .with_child(node)
        }
        ItemConfig::List { id, title, items } => {
            let id = require_id(id.as_deref(), title, path)?;
            let node = build_list(context, &id, title, items, path)?;
            ListItemNode::new(id, title.clone()).with_child(node)
        }
        ItemConfig::DocumentList {
            id,
            title,
            filter,
            params,
            schema_type,
            default_ordering,
        } => {
            let id = require_id(id.as_deref(), title, path)?;
            let mut options = DocumentListOptions::new(filter.clone()).with_default_ordering(default_ordering.clone());
            options.params = params.clone();
            if let Some(schema_type) = schema_type {
                options = options.with_schema_type(require_type(context, schema_type)?);
            }
            let node = document_list(id.clone(), title.clone(), options)?;
            let mut item = ListItemNode::new(id, title.clone()).with_child(node);
            item.schema_type.clone_from(schema_type);
            item
        }
        ItemConfig::Document {
            id,
            title,
            schema_type,
            document_id,
        } => {
            let schema_type = require_type(context, schema_type)?;
            if document_id.trim().is_empty() {
                return Err(StructureError::MissingId {
                    kind: "documents".into(),
                    path: path.to_string(),
                });
            }
            let node = context.resolve_document_node(schema_type, document_id);
            let title = title.clone().unwrap_or_else(|| node.title.clone());
            let id = id.clone().filter(|id| !id.is_empty()).unwrap_or_else(|| document_id.clone());
            ListItemNode::new(id, title)
                .with_schema_type(schema_type)
                .with_child(node)
        }
        ItemConfig::Component {
            id,
            title,
            component: name,
            options,
            actions,
            intents,
        } => {
            let id = require_id(id.as_deref(), title, path)?;
            let mut node = component(
                id.clone(),
                title.clone(),
                ComponentOptions {
                    component: name.clone(),
                    options: options.clone(),
                    actions: actions.clone(),
                },
            );
            if !intents.is_empty() {
                let intents = intents.clone();
                node = node.with_intent_handler(IntentPredicate::new(move |intent, _, _| {
                    intents.iter().any(|i| i == intent)
                }));
            }
            ListItemNode::new(id, title.clone()).with_child(node)
        }
    };
    Ok(entry.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PaneKind;
    use pretty_assertions::assert_eq;

    const TOML: &str = r#"
[[schemaTypes]]
name = "author"
title = "Author"

[[schemaTypes]]
name = "settings"
title = "Settings"

[documentNodes.author]
views = [{ id = "editor" }, { id = "preview", component = "Preview" }]
defaultPanes = ["editor", "preview"]

[root]
title = "Content"

[[root.items]]
kind = "documentTypeList"
type = "author"
title = "Cool Authors"

[[root.items]]
kind = "divider"

[[root.items]]
kind = "document"
title = "Site Settings"
type = "settings"
documentId = "settings"

[[root.items]]
kind = "list"
title = "Not so deep"
items = [{ kind = "component", title = "Stats", component = "StatsPane", intents = ["inspect"] }]
"#;

    #[test]
    fn builds_from_toml() {
        let structure = StructureConfig::from_toml_str(TOML).unwrap().build().unwrap();
        assert_eq!(structure.root.id, "content");

        let list = structure.root.as_list().unwrap();
        let ids: Vec<_> = list.navigable().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["author", "settings", "notSoDeep"]);
        assert_eq!(list.item("author").unwrap().title, "Cool Authors");

        let nested = list.item("notSoDeep").unwrap().child.clone().unwrap();
        let nested = nested.as_node().unwrap();
        let stats = nested.as_list().unwrap().item("stats").unwrap();
        let stats = stats.child.as_ref().unwrap().as_node().unwrap();
        assert!(matches!(stats.kind, PaneKind::Component(_)));
        assert!(stats.can_handle_intent("inspect", &desk_router::PaneParams::new(), 5));
    }

    #[test]
    fn builds_from_json() {
        let json = r#"{
            "schemaTypes": [{"name": "book", "title": "Book"}],
            "root": {"id": "root-list", "title": "Books", "items": [
                {"kind": "documentList", "title": "Recent", "filter": "_type == 'book'", "type": "book"}
            ]}
        }"#;
        let structure = StructureConfig::from_json_str(json).unwrap().build().unwrap();
        assert_eq!(structure.root.id, "root-list");
        let item = structure.root.as_list().unwrap().item("recent").unwrap();
        assert_eq!(item.schema_type.as_deref(), Some("book"));
    }

    #[test]
    fn default_root_when_absent() {
        let config = StructureConfig::from_json_str(r#"{"schemaTypes": [{"name": "book"}]}"#).unwrap();
        let structure = config.build().unwrap();
        assert_eq!(structure.root.as_list().unwrap().navigable().count(), 1);
        assert_eq!(structure.list_query, ListQueryPolicy::default());
    }

    #[test]
    fn missing_ids_are_rejected() {
        let json = r#"{"root": {"title": "Content", "items": [{"kind": "list"}]}}"#;
        let err = StructureConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert_eq!(err.to_string(), "`id` is required for list items at root.items[0]");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{"root": {"title": "Content", "items": [
            {"kind": "list", "title": "A"},
            {"kind": "list", "id": "a", "title": "Other"}
        ]}}"#;
        let err = StructureConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert!(matches!(err, StructureError::DuplicateId { ref id, .. } if id == "a"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let json = r#"{"root": {"title": "Content", "items": [{"kind": "documentTypeList", "type": "ghost"}]}}"#;
        let err = StructureConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert_eq!(err, StructureError::UnknownSchemaType("ghost".into()));
    }

    #[test]
    fn malformed_input_is_a_config_error() {
        assert!(matches!(
            StructureConfig::from_toml_str("root = 5"),
            Err(StructureError::Config(_))
        ));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("structure.toml");
        std::fs::write(&toml_path, TOML).unwrap();
        assert_eq!(StructureConfig::load(&toml_path).unwrap().schema_types.len(), 2);

        let json_path = dir.path().join("structure.json");
        std::fs::write(&json_path, r#"{"schemaTypes": [{"name": "book"}]}"#).unwrap();
        assert_eq!(StructureConfig::load(&json_path).unwrap().schema_types.len(), 1);
    }
}
