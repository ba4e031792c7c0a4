//! Testing utilities for the studio desk workspace
//!
//! Shared fixtures, fakes and async helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use desk_resolver::{IntentError, IntentTreeWalk, ResolvedPaneMeta};
use desk_router::{MemoryRouter, NavigateOptions, Navigator, RouterPanes};
use desk_structure::compose::{divider, document, document_type_list_item, list, list_item};
use desk_structure::{
    DocumentNodeSpec, DocumentOptions, IntentRequest, ListItem, PaneNode, SchemaType, StructureContext, Template,
    View,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Authors, books, movies and a settings singleton; authors open an editor
/// and a preview side by side
pub fn sample_context() -> StructureContext {
    StructureContext::new()
        .with_schema_type(SchemaType::document("author", "Author"))
        .with_schema_type(SchemaType::document("book", "Book"))
        .with_schema_type(SchemaType::document("movie", "Movie"))
        .with_schema_type(SchemaType::document("settings", "Settings"))
        .with_document_node(
            "author",
            DocumentNodeSpec {
                views: vec![View::form("editor"), View::component("preview", "AuthorPreview")],
                default_panes: vec!["editor".into(), "preview".into()],
            },
        )
        .with_template(Template {
            id: "book-by-author".into(),
            schema_type: "book".into(),
            title: Some("Book by author".into()),
            value: serde_json::json!({"author": {"_ref": "$authorId"}}),
        })
}

/// Root list `content` with one list per document type and a settings item
pub fn sample_structure(context: &StructureContext) -> PaneNode {
    let items = ["author", "book", "movie"]
        .into_iter()
        .map(|type_name| document_type_list_item(context, type_name).map(ListItem::from))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let settings = list_item("settings", "Settings")
        .with_child(document(DocumentOptions::new("settings", "settings")));

    let mut all = items;
    all.push(divider());
    all.push(settings.into());
    list("content", "Content", all)
}

/// `sample_context` and `sample_structure` ready for a resolver
pub fn sample() -> (Arc<StructureContext>, PaneNode) {
    let context = sample_context();
    let root = sample_structure(&context);
    (Arc::new(context), root)
}

/// Router ids of resolved panes
pub fn pane_ids(panes: &[ResolvedPaneMeta]) -> Vec<String> {
    panes.iter().map(|p| p.router_pane_sibling.id.clone()).collect()
}

/// Check that every pane is resolved
pub fn all_resolved(panes: &[ResolvedPaneMeta]) -> bool {
    panes.iter().all(|p| !p.pane.is_loading())
}

/// Navigator recording every call, optionally forwarding to a router
#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<(RouterPanes, NavigateOptions)>>,
    forward: Option<Arc<MemoryRouter>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn forwarding(router: Arc<MemoryRouter>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            forward: Some(router),
        })
    }

    pub fn calls(&self) -> Vec<(RouterPanes, NavigateOptions)> {
        self.calls.lock().clone()
    }

    pub fn replace_count(&self) -> usize {
        self.calls.lock().iter().filter(|(_, options)| options.replace).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, panes: RouterPanes, options: NavigateOptions) {
        self.calls.lock().push((panes.clone(), options));
        if let Some(router) = &self.forward {
            router.navigate(panes, options);
        }
    }
}

/// Tree walk counting its calls; answers from `inner` or fails unresolved
pub struct CountingWalker {
    calls: AtomicUsize,
    inner: Option<Arc<dyn IntentTreeWalk>>,
}

impl CountingWalker {
    pub fn unresolved() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inner: None,
        })
    }

    pub fn wrapping(inner: Arc<dyn IntentTreeWalk>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inner: Some(inner),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentTreeWalk for CountingWalker {
    async fn resolve_intent(&self, request: &IntentRequest) -> Result<RouterPanes, IntentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner {
            Some(inner) => inner.resolve_intent(request).await,
            None => Err(IntentError::Unresolved {
                intent: request.intent.clone(),
            }),
        }
    }
}

/// Wait until the router has exactly `count` subscribers
pub async fn wait_for_subscribers(router: &MemoryRouter, count: usize) -> bool {
    for _ in 0..200 {
        if router.subscriber_count() == count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    router.subscriber_count() == count
}
