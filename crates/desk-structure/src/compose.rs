//! Structure composition
//!
//! Plain constructor functions for pane nodes. Every function returns a new
//! immutable value; customisation goes through the consuming `with_*` methods
//! on the returned node.

use crate::context::{ChildContext, StructureContext};
use crate::document_list::{type_name_from_filter, validate_filter};
use crate::error::StructureError;
use crate::node::{
    ChildResolver, ComponentOptions, DocumentListOptions, DocumentOptions, ListItem, ListItemNode, ListOptions,
    MenuItem, PaneKind, PaneNode, Resolution,
};
use serde_json::Map;

/// Prefix of router ids that open a document editor directly
pub const FALLBACK_EDITOR_PREFIX: &str = "__edit__";

/// Id of the default root list
pub const DEFAULT_ROOT_ID: &str = "content";

/// Node id derived from a title: `"Not so deep"` becomes `notSoDeep`
#[must_use]
pub fn structure_node_id(title: &str) -> String {
    let mut id = String::with_capacity(title.len());
    for (idx, word) in title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if idx == 0 {
                id.extend(first.to_lowercase());
            } else {
                id.extend(first.to_uppercase());
            }
            id.push_str(chars.as_str());
        }
    }
    id
}

/// Resolver opening the list item whose id was requested
#[must_use]
pub fn list_child_resolver() -> ChildResolver {
    ChildResolver::new(|item_id, context| {
        let Some(item) = context
            .parent
            .as_ref()
            .and_then(|parent| parent.as_list())
            .and_then(|list| list.item(item_id))
        else {
            return Ok(Resolution::Empty);
        };

        Ok(item.child.clone().map_or(Resolution::Empty, Resolution::Pane))
    })
}

/// Resolver opening a document editor for the requested document id
///
/// The schema type comes from the `template` param, the list's schema type or
/// a single-type filter, in that order.
#[must_use]
pub fn document_child_resolver() -> ChildResolver {
    ChildResolver::new(|item_id, context| {
        let structure = &context.structure;
        let template = context.params.get("template").filter(|t| !t.is_empty());

        let schema_type = match template {
            Some(template_id) => Some(
                structure
                    .template(template_id)
                    .ok_or_else(|| StructureError::UnknownTemplate(template_id.to_string()))?
                    .schema_type
                    .clone(),
            ),
            None => context.parent.as_ref().and_then(|parent| {
                let options = parent.as_document_list()?;
                options
                    .schema_type_name
                    .clone()
                    .or_else(|| type_name_from_filter(&options.filter, &options.params))
            }),
        };
        let schema_type = schema_type.ok_or_else(|| StructureError::UnknownDocumentType(item_id.to_string()))?;

        let mut node = structure.resolve_document_node(&schema_type, item_id);
        if let (Some(template_id), PaneKind::Document(options)) = (template, &mut node.kind) {
            options.template = Some(template_id.to_string());
            options.template_parameters = context.payload.clone();
        }
        Ok(Resolution::node(node))
    })
}

/// List pane with static items
#[must_use]
pub fn list(id: impl Into<String>, title: impl Into<String>, items: Vec<ListItem>) -> PaneNode {
    PaneNode::new(
        id,
        title,
        PaneKind::List(ListOptions {
            items,
            default_layout: None,
        }),
    )
    .with_child(list_child_resolver())
}

/// Navigable list item
#[must_use]
pub fn list_item(id: impl Into<String>, title: impl Into<String>) -> ListItemNode {
    ListItemNode::new(id, title)
}

/// List item whose id is derived from its title
#[must_use]
pub fn titled_list_item(title: &str) -> ListItemNode {
    ListItemNode::new(structure_node_id(title), title)
}

/// List divider
#[must_use]
pub fn divider() -> ListItem {
    ListItem::Divider
}

/// Document-list pane
///
/// # Errors
/// Returns `StructureError::InvalidFilter` for a filter that is a query.
pub fn document_list(
    id: impl Into<String>,
    title: impl Into<String>,
    options: DocumentListOptions,
) -> Result<PaneNode, StructureError> {
    validate_filter(&options.filter)?;
    Ok(PaneNode::new(id, title, PaneKind::DocumentList(options)).with_child(document_child_resolver()))
}

/// Document-list pane for every document of a registered schema type
///
/// # Errors
/// Returns `StructureError::UnknownSchemaType` if the type is not registered.
pub fn document_type_list(structure: &StructureContext, type_name: &str) -> Result<PaneNode, StructureError> {
    let schema_type = structure
        .schema_type(type_name)
        .ok_or_else(|| StructureError::UnknownSchemaType(type_name.to_string()))?;
    let title = schema_type.display_title().to_string();
    let templates = structure
        .templates_for(type_name)
        .into_iter()
        .map(|t| t.id.clone())
        .collect();

    let mut intent_params = Map::new();
    intent_params.insert("type".into(), type_name.into());

    let options = DocumentListOptions::new("_type == $type")
        .with_param("type", type_name)
        .with_schema_type(type_name)
        .with_initial_value_templates(templates);

    Ok(document_list(type_name, title.clone(), options)?.with_menu_items(vec![
        MenuItem::intent(format!("Create new {title}"), "create", intent_params).shown_as_action(),
    ]))
}

/// List item opening the document-type list for `type_name`
///
/// # Errors
/// Returns `StructureError::UnknownSchemaType` if the type is not registered.
pub fn document_type_list_item(structure: &StructureContext, type_name: &str) -> Result<ListItemNode, StructureError> {
    let node = document_type_list(structure, type_name)?;
    Ok(ListItemNode::new(type_name, node.title.clone())
        .with_schema_type(type_name)
        .with_child(node))
}

/// Document editor pane
#[must_use]
pub fn document(options: DocumentOptions) -> PaneNode {
    let id = options.id.clone();
    let title = options.schema_type.clone();
    PaneNode::new(id, title, PaneKind::Document(options))
}

/// Custom component pane
#[must_use]
pub fn component(id: impl Into<String>, title: impl Into<String>, options: ComponentOptions) -> PaneNode {
    PaneNode::new(id, title, PaneKind::Component(options))
}

/// Root list with one document-type list per registered document type
///
/// # Errors
/// Propagates errors from [`document_type_list_item`].
pub fn default_structure(structure: &StructureContext) -> Result<PaneNode, StructureError> {
    let items = structure
        .schema_types()
        .iter()
        .filter(|t| t.document)
        .map(|t| document_type_list_item(structure, &t.name).map(ListItem::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(list(DEFAULT_ROOT_ID, "Content", items))
}

/// Document editor for a router id of the form `__edit__<document id>`
///
/// # Errors
/// Returns `StructureError::UnknownDocumentType` when the router params carry
/// no `type`.
pub fn fallback_editor(node_id: &str, context: &ChildContext) -> Result<PaneNode, StructureError> {
    let id = node_id.strip_prefix(FALLBACK_EDITOR_PREFIX).unwrap_or(node_id);
    let schema_type = context
        .params
        .get("type")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| StructureError::UnknownDocumentType(id.to_string()))?;

    let mut node = context.structure.resolve_document_node(schema_type, id).with_id("editor");
    if let (Some(template), PaneKind::Document(options)) =
        (context.params.get("template").filter(|t| !t.is_empty()), &mut node.kind)
    {
        options.template = Some(template.to_string());
        options.template_parameters = context.payload.clone();
    }
    Ok(node)
}

/// Check if a router id asks for the fallback editor
#[inline]
#[must_use]
pub fn is_fallback_editor_id(id: &str) -> bool {
    id.starts_with(FALLBACK_EDITOR_PREFIX)
}
