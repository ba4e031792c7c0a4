//! Intent requests and pane acceptance
//!
//! An intent ("edit document X", "create a book") is matched against panes
//! either through a custom [`IntentPredicate`] on the node or through the
//! default rules for document lists.

use crate::document_list::type_name_from_filter;
use crate::node::{PaneKind, PaneNode};
use desk_router::PaneParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Intent name for opening an existing document
pub const EDIT_INTENT: &str = "edit";
/// Intent name for creating a document
pub const CREATE_INTENT: &str = "create";

/// Request to navigate by intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    /// Intent name
    pub intent: String,
    /// Intent params (`id`, `type`, `template`, `version`, …)
    #[serde(default)]
    pub params: PaneParams,
    /// Transient payload (e.g. template parameters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl IntentRequest {
    /// Create request
    #[must_use]
    pub fn new(intent: impl Into<String>, params: PaneParams) -> Self {
        Self {
            intent: intent.into(),
            params,
            payload: None,
        }
    }

    /// `edit` request for a document
    #[must_use]
    pub fn edit(id: impl Into<String>, schema_type: impl Into<String>) -> Self {
        Self::new(
            EDIT_INTENT,
            PaneParams::new().with("id", id.into()).with("type", schema_type.into()),
        )
    }

    /// `create` request for a schema type
    #[must_use]
    pub fn create(schema_type: impl Into<String>) -> Self {
        Self::new(CREATE_INTENT, PaneParams::new().with("type", schema_type.into()))
    }

    /// With payload
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// With a param
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Target document id
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.params.get("id").filter(|id| !id.is_empty())
    }

    /// Target schema type
    #[inline]
    #[must_use]
    pub fn schema_type(&self) -> Option<&str> {
        self.params.get("type").filter(|t| !t.is_empty())
    }

    /// Requested template
    #[inline]
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.params.get("template").filter(|t| !t.is_empty())
    }

    /// Check if this is an `edit` intent
    #[inline]
    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.intent == EDIT_INTENT
    }

    /// Check if this is a `create` intent
    #[inline]
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.intent == CREATE_INTENT
    }
}

/// Where the pane being asked sits
#[derive(Debug, Clone, Copy)]
pub struct IntentContext<'a> {
    /// Pane being asked
    pub pane: &'a PaneNode,
    /// Position in the pane sequence being searched
    pub index: usize,
}

/// Signature of an intent predicate
pub type IntentCheckFn = dyn Fn(&str, &PaneParams, IntentContext<'_>) -> bool + Send + Sync;

/// Custom intent acceptance for a pane
#[derive(Clone)]
pub struct IntentPredicate(Arc<IntentCheckFn>);

impl IntentPredicate {
    /// Wrap a predicate function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &PaneParams, IntentContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Predicate accepting every intent
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_, _, _| true)
    }

    /// Predicate accepting nothing
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_, _, _| false)
    }

    /// Ask the predicate
    #[inline]
    #[must_use]
    pub fn check(&self, intent: &str, params: &PaneParams, context: IntentContext<'_>) -> bool {
        (self.0)(intent, params, context)
    }
}

impl fmt::Debug for IntentPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntentPredicate(..)")
    }
}

/// Schema types a pane lists
#[must_use]
pub fn listed_type_names(pane: &PaneNode) -> Vec<String> {
    match &pane.kind {
        PaneKind::DocumentList(options) => match &options.schema_type_name {
            Some(name) => vec![name.clone()],
            None => type_name_from_filter(&options.filter, &options.params)
                .into_iter()
                .collect(),
        },
        _ => Vec::new(),
    }
}

/// Default acceptance: document lists of the requested type accept `edit`
/// (with an id) and `create`; a templated `create` needs the template to be
/// offered by the list
#[must_use]
pub fn default_intent_checker(intent: &str, params: &PaneParams, context: IntentContext<'_>) -> bool {
    let is_edit = intent == EDIT_INTENT;
    let is_create = intent == CREATE_INTENT;
    let type_names = listed_type_names(context.pane);

    if is_create {
        if let Some(template) = params.get("template").filter(|t| !t.is_empty()) {
            return context
                .pane
                .as_document_list()
                .is_some_and(|options| options.initial_value_templates.iter().any(|t| t == template));
        }
    }

    let type_matches = params
        .get("type")
        .is_some_and(|t| type_names.iter().any(|name| name == t));
    (is_edit && params.is_set("id") && type_matches) || (is_create && type_matches)
}

/// Default acceptance limited to the first two panes
#[must_use]
pub fn shallow_intent_checker(intent: &str, params: &PaneParams, context: IntentContext<'_>) -> bool {
    context.index <= 1 && default_intent_checker(intent, params, context)
}

impl PaneNode {
    /// Check if this pane at `index` can handle the intent
    ///
    /// Nodes with a custom predicate use only that; lists fall back to the
    /// shallow default check; documents and components decline.
    #[must_use]
    pub fn can_handle_intent(&self, intent: &str, params: &PaneParams, index: usize) -> bool {
        let context = IntentContext { pane: self, index };
        match &self.intent_handler {
            Some(handler) => handler.check(intent, params, context),
            None => match self.kind {
                PaneKind::List(_) | PaneKind::DocumentList(_) => shallow_intent_checker(intent, params, context),
                PaneKind::Document(_) | PaneKind::Component(_) => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocumentListOptions;

    fn book_list() -> PaneNode {
        PaneNode::new(
            "book",
            "Books",
            PaneKind::DocumentList(
                DocumentListOptions::new("_type == $type")
                    .with_param("type", "book")
                    .with_initial_value_templates(vec!["book-by-author".into()]),
            ),
        )
    }

    #[test]
    fn document_list_accepts_matching_type() {
        let list = book_list();
        let edit = IntentRequest::edit("b1", "book");
        assert!(list.can_handle_intent(&edit.intent, &edit.params, 1));
        let other = IntentRequest::edit("m1", "movie");
        assert!(!list.can_handle_intent(&other.intent, &other.params, 1));
    }

    #[test]
    fn default_check_is_shallow() {
        let list = book_list();
        let edit = IntentRequest::edit("b1", "book");
        assert!(!list.can_handle_intent(&edit.intent, &edit.params, 2));
    }

    #[test]
    fn edit_needs_an_id() {
        let list = book_list();
        let params = PaneParams::from([("type", "book")]);
        assert!(!list.can_handle_intent(EDIT_INTENT, &params, 0));
        assert!(list.can_handle_intent(CREATE_INTENT, &params, 0));
    }

    #[test]
    fn templated_create_needs_offered_template() {
        let list = book_list();
        let ok = IntentRequest::create("book").with_param("template", "book-by-author");
        let missing = IntentRequest::create("book").with_param("template", "other");
        assert!(list.can_handle_intent(&ok.intent, &ok.params, 1));
        assert!(!list.can_handle_intent(&missing.intent, &missing.params, 1));
    }

    #[test]
    fn custom_predicate_replaces_defaults() {
        let list = book_list().with_intent_handler(IntentPredicate::never());
        let edit = IntentRequest::edit("b1", "book");
        assert!(!list.can_handle_intent(&edit.intent, &edit.params, 1));

        let deep = book_list().with_intent_handler(IntentPredicate::always());
        assert!(deep.can_handle_intent("anything", &PaneParams::new(), 7));
    }

    #[test]
    fn request_accessors() {
        let request = IntentRequest::edit("doc-1", "author");
        assert!(request.is_edit());
        assert_eq!(request.document_id(), Some("doc-1"));
        assert_eq!(request.schema_type(), Some("author"));
        assert_eq!(request.template(), None);
    }
}
