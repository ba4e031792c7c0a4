use async_trait::async_trait;
use desk_structure::{
    DocumentListController, DocumentListOptions, DocumentStub, ListQueryPolicy, QueryClient, QueryError,
    SortDirection, SortOrder, SortOrdering, StructureError,
};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Client answering from a queue of canned responses, repeating the last one
#[derive(Default)]
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<usize, QueryError>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(responses: impl IntoIterator<Item = Result<usize, QueryError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            queries: Mutex::default(),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn fetch(&self, query: &str, _params: &Map<String, Value>) -> Result<Vec<DocumentStub>, QueryError> {
        self.queries.lock().unwrap().push(query.to_string());
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        };
        let count = next.unwrap_or(Ok(0))?;
        Ok((0..count).map(|i| DocumentStub::new(format!("book-{i}"), "book")).collect())
    }
}

fn books() -> DocumentListOptions {
    DocumentListOptions::new("_type == $type").with_param("type", "book")
}

#[tokio::test]
async fn first_load_fetches_one_page() {
    let client = ScriptedClient::new([Ok(10)]);
    let mut controller = DocumentListController::new(client.clone(), books()).unwrap();

    let state = controller.load().await;
    assert!(state.loaded);
    assert_eq!(state.entries.len(), 10);
    assert!(!state.full_list);
    assert!(client.queries()[0].contains("[0...100]"));
}

#[tokio::test]
async fn escalates_to_full_list_once_past_threshold() {
    let client = ScriptedClient::new([Ok(100)]);
    let mut controller = DocumentListController::new(client.clone(), books()).unwrap();
    controller.load().await;

    // threshold = 51 * 100 / 2
    assert!(!controller.on_scroll(2000.0, 51.0).await);
    assert!(controller.on_scroll(2600.0, 51.0).await);
    assert!(!controller.on_scroll(9000.0, 51.0).await);

    let queries = client.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].contains("[0...2000]"));
    assert!(controller.state().full_list);
}

#[tokio::test]
async fn short_page_never_escalates() {
    let client = ScriptedClient::new([Ok(40)]);
    let mut controller = DocumentListController::new(client.clone(), books()).unwrap();
    controller.load().await;

    assert!(!controller.on_scroll(100_000.0, 51.0).await);
    assert_eq!(client.queries().len(), 1);
}

#[tokio::test]
async fn custom_policy_moves_the_threshold() {
    let client = ScriptedClient::new([Ok(10)]);
    let policy = ListQueryPolicy::new().with_page_size(10).with_full_list_limit(50);
    let mut controller = DocumentListController::new(client.clone(), books())
        .unwrap()
        .with_policy(policy);
    controller.load().await;

    assert!(controller.on_scroll(250.0, 50.0).await);
    assert!(client.queries()[1].contains("[0...50]"));
}

#[tokio::test]
async fn failed_query_is_kept_inline_until_retry() {
    let client = ScriptedClient::new([Err(QueryError::Timeout), Ok(3)]);
    let mut controller = DocumentListController::new(client.clone(), books()).unwrap();

    let state = controller.load().await;
    assert_eq!(state.error, Some(QueryError::Timeout));
    assert!(!state.loaded);
    assert!(!controller.on_scroll(100_000.0, 51.0).await);

    let state = controller.retry().await;
    assert_eq!(state.error, None);
    assert_eq!(state.entries.len(), 3);
}

#[tokio::test]
async fn sort_order_changes_the_query() {
    let client = ScriptedClient::new([Ok(1)]);
    let mut controller = DocumentListController::new(client.clone(), books()).unwrap();
    controller.load().await;
    controller
        .set_sort_order(SortOrder {
            by: vec![SortOrdering::new("title", SortDirection::Asc)],
            extended_projection: None,
        })
        .await;

    let queries = client.queries();
    assert!(queries[0].contains("order(_createdAt desc)"));
    assert!(queries[1].contains("order(title asc)"));
}

#[test]
fn query_shaped_filters_are_rejected() {
    let client = ScriptedClient::new([]);
    let err = DocumentListController::new(client, DocumentListOptions::new("*[_type == 'book']"))
        .err()
        .unwrap();
    assert!(matches!(err, StructureError::InvalidFilter { .. }));
}
