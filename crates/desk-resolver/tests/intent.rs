use desk_resolver::prelude::*;
use desk_resolver::{ActivePanes, IntentTreeWalk};
use desk_router::{encode_panes_segment, PaneParams, RouterPaneSibling};
use desk_structure::compose::{
    document, document_list, document_type_list_item, list, list_item, titled_list_item,
};
use desk_structure::{
    ChildResolver, DocumentListOptions, DocumentOptions, IntentPredicate, IntentRequest, ListItem, PaneNode,
    SchemaType, StructureContext, StructureError,
};
use desk_test_utils::{all_resolved, sample, CountingWalker, RecordingNavigator};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn walker(root: PaneNode, context: StructureContext) -> StructureIntentWalker {
    StructureIntentWalker::new(root, Arc::new(context))
}

fn settings_doc() -> PaneNode {
    document(DocumentOptions::new("settings", "settings"))
}

fn settings_context() -> StructureContext {
    StructureContext::new().with_schema_type(SchemaType::document("settings", "Settings"))
}

fn ids(panes: &RouterPanes) -> String {
    encode_panes_segment(panes)
}

async fn mounted(path: &str) -> (ResolvedPanesHandle, Arc<ActivePanesRegistry>) {
    let (structure, root) = sample();
    let router = Arc::new(MemoryRouter::from_path(path).unwrap());
    let registry = Arc::new(ActivePanesRegistry::new());
    let handle = ResolvedPanesHandle::mount(
        ResolvedPaneStreamOptions::new(root, router.panes_stream(), structure),
        RecordingNavigator::new(),
        registry.clone(),
    );
    let groups = desk_router::parse_panes_segment(path).unwrap();
    let expected = groups.iter().map(Vec::len).sum::<usize>() + 1;
    handle
        .wait_until(|p| p.resolved_panes.len() == expected && all_resolved(&p.resolved_panes))
        .await
        .unwrap();
    (handle, registry)
}

#[tokio::test]
async fn open_document_resolves_without_walking() {
    let (_handle, registry) = mounted("book;doc-1").await;
    let walker = CountingWalker::unresolved();
    let resolver = IntentResolver::new(registry, walker.clone());

    let panes = resolver.resolve(&IntentRequest::edit("doc-1", "book")).await.unwrap();
    assert_eq!(ids(&panes), "book;doc-1");
    assert_eq!(walker.calls(), 0);
    assert_eq!(resolver.current_status(), IntentStatus::Idle);
}

#[tokio::test]
async fn visible_list_accepts_edit() {
    let (_handle, registry) = mounted("book;doc-1").await;
    let walker = CountingWalker::unresolved();
    let resolver = IntentResolver::new(registry, walker.clone());

    let panes = resolver.resolve(&IntentRequest::edit("doc-2", "book")).await.unwrap();
    assert_eq!(ids(&panes), "book;doc-2");
    assert_eq!(walker.calls(), 0);
}

#[tokio::test]
async fn visible_list_accepts_templated_create() {
    let (_handle, registry) = mounted("book").await;
    let resolver = IntentResolver::new(registry, CountingWalker::unresolved());

    let request = IntentRequest::create("book")
        .with_param("template", "book-by-author")
        .with_param("version", "2")
        .with_param("extra", "x");
    let panes = resolver.fast_path(&request).unwrap();
    assert_eq!(panes.len(), 2);
    assert_eq!(panes[1][0].id.len(), 36);
    assert_eq!(
        panes[1][0].params,
        PaneParams::new().with("template", "book-by-author").with("version", "2")
    );

    let plain = resolver.fast_path(&IntentRequest::create("book")).unwrap();
    assert!(plain[1][0].params.is_empty());
}

#[tokio::test]
async fn fast_path_needs_a_mounted_desk() {
    let registry = Arc::new(ActivePanesRegistry::new());
    assert!(registry.snapshot().is_none());
    let resolver = IntentResolver::new(registry, CountingWalker::unresolved());
    assert!(resolver.fast_path(&IntentRequest::edit("doc-1", "book")).is_none());
}

#[tokio::test]
async fn unmatched_fast_path_falls_back_to_the_walk() {
    let (_handle, registry) = mounted("book").await;
    let (structure, root) = sample();
    let walker = CountingWalker::wrapping(Arc::new(StructureIntentWalker::new(root, structure)));
    let resolver = IntentResolver::new(registry, walker.clone());

    let panes = resolver.resolve(&IntentRequest::edit("m1", "movie")).await.unwrap();
    assert_eq!(ids(&panes), "movie;m1");
    assert_eq!(walker.calls(), 1);
}

#[tokio::test]
async fn edit_without_id_is_rejected() {
    let resolver = IntentResolver::new(Arc::new(ActivePanesRegistry::new()), CountingWalker::unresolved());
    let request = IntentRequest::new("edit", PaneParams::new().with("type", "book"));
    let err = resolver.resolve(&request).await.unwrap_err();
    assert_eq!(err, IntentError::MissingId("edit".into()));
}

#[tokio::test]
async fn failures_are_published_as_status() {
    let resolver = IntentResolver::new(Arc::new(ActivePanesRegistry::new()), CountingWalker::unresolved());
    let status = resolver.status();

    let err = resolver.resolve(&IntentRequest::edit("x", "ghost")).await.unwrap_err();
    assert!(err.is_unresolved());
    assert_eq!(
        *status.borrow(),
        IntentStatus::Failed("could not resolve intent 'edit'".into())
    );
}

#[tokio::test]
async fn navigate_replaces_the_current_entry() {
    let (structure, root) = sample();
    let resolver = IntentResolver::new(
        Arc::new(ActivePanesRegistry::new()),
        Arc::new(StructureIntentWalker::new(root, structure)),
    );
    let navigator = RecordingNavigator::new();

    resolver.navigate(&IntentRequest::edit("b1", "book"), &*navigator).await.unwrap();
    let calls = navigator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.replace);
    assert_eq!(ids(&calls[0].0), "book;b1");
}

#[tokio::test]
async fn walk_splits_document_with_default_panes() {
    let (structure, root) = sample();
    let panes = StructureIntentWalker::new(root, structure)
        .resolve_intent(&IntentRequest::edit("author123", "author"))
        .await
        .unwrap();
    assert_eq!(
        panes,
        vec![
            vec![RouterPaneSibling::new("author")],
            vec![
                RouterPaneSibling::new("author123").with_param("view", "editor"),
                RouterPaneSibling::new("author123").with_param("view", "preview"),
            ],
        ]
    );
}

#[tokio::test]
async fn walk_finds_singleton_document() {
    let (structure, root) = sample();
    let panes = StructureIntentWalker::new(root, structure)
        .resolve_intent(&IntentRequest::edit("settings", "settings"))
        .await
        .unwrap();
    assert_eq!(ids(&panes), "settings");
}

#[tokio::test]
async fn walk_finds_nested_document() {
    let deeper = list("deeper", "Deeper", vec![list_item("settings", "Settings").with_child(settings_doc()).into()]);
    let deep = list("deep", "Deep", vec![list_item("deeper", "Deeper").with_child(deeper).into()]);
    let root = list("content", "Content", vec![list_item("deep", "Deep").with_child(deep).into()]);

    let panes = walker(root, settings_context())
        .resolve_intent(&IntentRequest::edit("settings", "settings"))
        .await
        .unwrap();
    assert_eq!(ids(&panes), "deep;deeper;settings");
}

#[tokio::test]
async fn walk_prefers_shallowest_match() {
    let deeper = list("deeper", "Deeper", vec![list_item("settings", "Settings").with_child(settings_doc()).into()]);
    let deep = list("deep", "Deep", vec![list_item("deeper", "Deeper").with_child(deeper).into()]);
    let not_so_deep = list(
        "notSoDeep",
        "Not so deep",
        vec![list_item("settings", "Settings").with_child(settings_doc()).into()],
    );
    let root = list(
        "content",
        "Content",
        vec![
            list_item("deep", "Deep").with_child(deep).into(),
            titled_list_item("Not so deep").with_child(not_so_deep).into(),
        ],
    );

    let panes = walker(root, settings_context())
        .resolve_intent(&IntentRequest::edit("settings", "settings"))
        .await
        .unwrap();
    assert_eq!(ids(&panes), "notSoDeep;settings");
}

#[tokio::test]
async fn walk_respects_custom_intent_handlers() {
    let context = StructureContext::new().with_schema_type(SchemaType::document("book", "Book"));
    let refusing = document_list("books", "Books", DocumentListOptions::new("_type == \"book\""))
        .unwrap()
        .with_intent_handler(IntentPredicate::never());
    let accepting = document_list("altBooks", "Books", DocumentListOptions::new("_type == \"book\""))
        .unwrap()
        .with_intent_handler(IntentPredicate::always());
    let root = list(
        "content",
        "Content",
        vec![
            list_item("booksItem", "Books").with_child(refusing).into(),
            list_item("altBookId", "Books").with_child(accepting).into(),
        ],
    );

    let panes = walker(root, context)
        .resolve_intent(&IntentRequest::edit("book123", "book"))
        .await
        .unwrap();
    assert_eq!(panes, vec![vec![RouterPaneSibling::new("altBookId")], vec![RouterPaneSibling::new("book123")]]);
}

#[tokio::test]
async fn walk_matches_type_list_under_any_item_id() {
    let context = StructureContext::new().with_schema_type(SchemaType::document("author", "Author"));
    let item = document_type_list_item(&context, "author").unwrap();
    let some_item = list_item("someItem", "Someone").with_child(item.child.clone().unwrap());
    let root = list("content", "Content", vec![ListItem::from(some_item)]);

    let panes = walker(root, context)
        .resolve_intent(&IntentRequest::edit("author123", "author"))
        .await
        .unwrap();
    assert_eq!(ids(&panes), "someItem;author123");
}

#[tokio::test]
async fn walk_keeps_other_params_and_payload() {
    let (structure, root) = sample();
    let request = IntentRequest::edit("b1", "book")
        .with_param("inspect", "history")
        .with_payload(serde_json::json!({"focus": "title"}));
    let panes = StructureIntentWalker::new(root, structure).resolve_intent(&request).await.unwrap();
    let target = &panes[1][0];
    assert_eq!(target.params, PaneParams::new().with("inspect", "history"));
    assert_eq!(target.payload, Some(serde_json::json!({"focus": "title"})));
}

#[tokio::test]
async fn unmatched_walk_is_unresolved_unless_fallback_enabled() {
    let (structure, root) = sample();
    let request = IntentRequest::edit("g1", "ghost");

    let err = StructureIntentWalker::new(root.clone(), structure.clone())
        .resolve_intent(&request)
        .await
        .unwrap_err();
    assert!(err.is_unresolved());

    let panes = StructureIntentWalker::new(root, structure)
        .with_config(ResolverConfig::default().with_fallback_editor(true))
        .resolve_intent(&request)
        .await
        .unwrap();
    assert_eq!(ids(&panes), "__edit__g1,type=ghost");
}

#[tokio::test]
async fn walk_depth_is_limited() {
    let deeper = list("deeper", "Deeper", vec![list_item("settings", "Settings").with_child(settings_doc()).into()]);
    let deep = list("deep", "Deep", vec![list_item("deeper", "Deeper").with_child(deeper).into()]);
    let root = list("content", "Content", vec![list_item("deep", "Deep").with_child(deep).into()]);

    let err = walker(root, settings_context())
        .with_config(ResolverConfig::default().with_intent_max_depth(2))
        .resolve_intent(&IntentRequest::edit("settings", "settings"))
        .await
        .unwrap_err();
    assert!(err.is_unresolved());
}

#[tokio::test]
async fn walk_propagates_structure_errors() {
    let root = list("content", "Content", vec![list_item("broken", "Broken").into()])
        .with_child(ChildResolver::new(|id, _| Err(StructureError::resolver(id, "boom"))));

    let err = walker(root, StructureContext::new())
        .resolve_intent(&IntentRequest::edit("x", "book"))
        .await
        .unwrap_err();
    assert!(matches!(err, IntentError::Resolution(_)));
}
