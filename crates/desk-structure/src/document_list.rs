//! Document-list query policy
//!
//! Provides:
//! - Query building for a document-list filter (page and full-list limits)
//! - Type-name extraction from single-type filters
//! - Draft/published collation
//! - [`DocumentListController`]: initial page, one scroll-driven escalation to
//!   the full list, inline errors with retry

use crate::error::{QueryError, StructureError};
use crate::node::DocumentListOptions;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

/// Prefix marking draft document ids
pub const DRAFTS_PREFIX: &str = "drafts.";

/// Fields every list query projects
const PROJECTION_FIELDS: &[&str] = &["_id", "_type"];

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortDirection {
    /// Query keyword
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrdering {
    /// Field path
    pub field: String,
    /// Direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrdering {
    /// Create clause
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordering used when neither the user nor the list picks one
#[must_use]
pub fn default_ordering() -> Vec<SortOrdering> {
    vec![SortOrdering::new("_createdAt", SortDirection::Desc)]
}

/// User-selected sort order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
    /// Ordering clauses
    pub by: Vec<SortOrdering>,
    /// Extra projection needed by the ordering (e.g. dereferenced fields)
    #[serde(default)]
    pub extended_projection: Option<String>,
}

/// Page and full-list limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQueryPolicy {
    /// Documents fetched initially
    pub page_size: usize,
    /// Documents fetched once the list escalates
    pub full_list_limit: usize,
}

impl ListQueryPolicy {
    /// Default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// With full-list limit
    #[inline]
    #[must_use]
    pub fn with_full_list_limit(mut self, limit: usize) -> Self {
        self.full_list_limit = limit;
        self
    }

    /// Scroll offset at which a full page escalates to the full list
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn escalation_threshold(&self, item_height: f64) -> f64 {
        item_height * (self.page_size as f64 / 2.0)
    }
}

impl Default for ListQueryPolicy {
    fn default() -> Self {
        Self {
            page_size: 100,
            full_list_limit: 2000,
        }
    }
}

fn order_clause(ordering: &[SortOrdering]) -> String {
    ordering
        .iter()
        .map(|o| format!("{} {}", o.field.trim(), o.direction.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the list query for `filter`
///
/// `ordering` falls back to [`default_ordering`] when empty. With an extended
/// projection the slice is applied before ordering, which keeps ordering
/// case-insensitive for dereferenced fields.
#[must_use]
pub fn build_list_query(
    filter: &str,
    ordering: &[SortOrdering],
    extended_projection: Option<&str>,
    limit: usize,
) -> String {
    let fallback = default_ordering();
    let ordering = if ordering.is_empty() { &fallback[..] } else { ordering };
    let final_projection = PROJECTION_FIELDS.join(", ");

    match extended_projection.filter(|p| !p.trim().is_empty()) {
        Some(extended) => {
            let first_projection = format!("{final_projection}, {extended}");
            [
                format!("*[{filter}] [0...{limit}]"),
                format!("{{{first_projection}}}"),
                format!("order({})", order_clause(ordering)),
                format!("{{{final_projection}}}"),
            ]
            .join(" | ")
        }
        None => format!(
            "*[{filter}] | order({}) [0...{limit}] {{{final_projection}}}",
            order_clause(ordering)
        ),
    }
}

/// Reject filters that look like a whole query
///
/// # Errors
/// Returns `StructureError::InvalidFilter` for filters starting with `*` or `{`.
pub fn validate_filter(filter: &str) -> Result<&str, StructureError> {
    let trimmed = filter.trim();
    match trimmed.chars().next() {
        Some(first @ ('*' | '{')) => Err(StructureError::InvalidFilter {
            filter: trimmed.to_string(),
            first,
        }),
        _ => Ok(trimmed),
    }
}

fn single_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\b_type\s*==\s*(['"].*?['"]|\$.*?(?:\s|$))|\B(['"].*?['"]|\$.*?(?:\s|$))\s*==\s*_type\b"#)
            .unwrap_or_else(|err| unreachable!("static pattern: {err}"))
    })
}

fn simple_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^_type\s*==\s*['"$]\w+['"]?\s*$"#).unwrap_or_else(|err| unreachable!("static pattern: {err}"))
    })
}

/// Type name constrained by a `_type == …` clause in `filter`
///
/// Literal strings and `$param` references (looked up in `params`) are
/// supported on either side of the comparison.
#[must_use]
pub fn type_name_from_filter(filter: &str, params: &Map<String, Value>) -> Option<String> {
    let captures = single_type_pattern().captures(filter)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str().trim();
    let is_quote = |c: char| c == '"' || c == '\'';
    let unquoted = raw.trim_start_matches(is_quote).trim_end_matches(is_quote);

    let name = match unquoted.strip_prefix('$') {
        Some(param) => params.get(param)?.as_str()?.to_string(),
        None => unquoted.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

/// Check if `filter` is nothing but a single `_type == …` clause
#[must_use]
pub fn is_simple_type_filter(filter: &str) -> bool {
    simple_type_pattern().is_match(filter.trim())
}

/// Published id for a possibly-draft id
#[inline]
#[must_use]
pub fn published_id(id: &str) -> &str {
    id.strip_prefix(DRAFTS_PREFIX).unwrap_or(id)
}

/// Document as returned by a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStub {
    /// Document id (`drafts.` prefixed for drafts)
    #[serde(rename = "_id")]
    pub id: String,
    /// Schema type
    #[serde(rename = "_type")]
    pub type_name: String,
    /// Any other projected fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DocumentStub {
    /// Create stub
    #[must_use]
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            fields: Map::new(),
        }
    }

    /// Check if this is a draft
    #[inline]
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.id.starts_with(DRAFTS_PREFIX)
    }
}

/// One row of a document list after collation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    /// Published id
    pub id: String,
    /// Draft if there is one, otherwise the published document
    pub document: DocumentStub,
    /// A draft exists
    pub has_draft: bool,
    /// A published version exists
    pub has_published: bool,
}

/// Collapse drafts and published documents into one entry per document,
/// keeping first-seen order
#[must_use]
pub fn collate(documents: Vec<DocumentStub>) -> Vec<ListEntry> {
    let mut entries: Vec<(String, Option<DocumentStub>, Option<DocumentStub>)> = Vec::new();

    for doc in documents {
        let id = published_id(&doc.id).to_string();
        let idx = match entries.iter().position(|(existing, _, _)| *existing == id) {
            Some(idx) => idx,
            None => {
                entries.push((id, None, None));
                entries.len() - 1
            }
        };
        let entry = &mut entries[idx];
        if doc.is_draft() {
            entry.1 = Some(doc);
        } else {
            entry.2 = Some(doc);
        }
    }

    entries
        .into_iter()
        .filter_map(|(id, draft, published)| {
            let has_draft = draft.is_some();
            let has_published = published.is_some();
            let document = draft.or(published)?;
            Some(ListEntry {
                id,
                document,
                has_draft,
                has_published,
            })
        })
        .collect()
}

/// Content API seam for list queries
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Run a query
    async fn fetch(&self, query: &str, params: &Map<String, Value>) -> Result<Vec<DocumentStub>, QueryError>;
}

/// Document-list view state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    /// Collated rows
    pub entries: Vec<ListEntry>,
    /// Raw document count of the last successful query
    pub fetched: usize,
    /// A query has completed successfully
    pub loaded: bool,
    /// The full list has been requested
    pub full_list: bool,
    /// Error of the last query, shown inline
    pub error: Option<QueryError>,
    /// Last issued query
    pub last_query: Option<String>,
}

impl ListState {
    /// Check if another page might exist
    #[inline]
    #[must_use]
    pub fn might_have_more(&self, policy: &ListQueryPolicy) -> bool {
        self.fetched == policy.page_size
    }
}

/// Drives the queries of one document-list pane
pub struct DocumentListController<C: ?Sized> {
    client: Arc<C>,
    options: DocumentListOptions,
    policy: ListQueryPolicy,
    sort_order: Option<SortOrder>,
    state: ListState,
}

impl<C: QueryClient + ?Sized> DocumentListController<C> {
    /// Create controller for a document-list pane
    ///
    /// # Errors
    /// Returns `StructureError::InvalidFilter` for a filter that is a query.
    pub fn new(client: Arc<C>, options: DocumentListOptions) -> Result<Self, StructureError> {
        validate_filter(&options.filter)?;
        Ok(Self {
            client,
            options,
            policy: ListQueryPolicy::default(),
            sort_order: None,
            state: ListState::default(),
        })
    }

    /// With query policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: ListQueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Query for the page or the full list
    #[must_use]
    pub fn query(&self, full_list: bool) -> String {
        let limit = if full_list {
            self.policy.full_list_limit
        } else {
            self.policy.page_size
        };
        let (ordering, extended) = match &self.sort_order {
            Some(order) if !order.by.is_empty() => (&order.by[..], order.extended_projection.as_deref()),
            Some(order) => (&self.options.default_ordering[..], order.extended_projection.as_deref()),
            None => (&self.options.default_ordering[..], None),
        };
        build_list_query(self.options.filter.trim(), ordering, extended, limit)
    }

    /// Load the first page
    pub async fn load(&mut self) -> &ListState {
        self.run(false).await;
        &self.state
    }

    /// Change sort order and reload from the first page
    pub async fn set_sort_order(&mut self, order: SortOrder) -> &ListState {
        self.sort_order = Some(order);
        self.run(false).await;
        &self.state
    }

    /// React to the list scrolling; returns whether the full list was requested
    ///
    /// Escalates once, when the last result is a full page and `scroll_top`
    /// passes half a page of items.
    pub async fn on_scroll(&mut self, scroll_top: f64, item_height: f64) -> bool {
        let state = &self.state;
        if !state.loaded || state.error.is_some() || state.full_list || !state.might_have_more(&self.policy) {
            return false;
        }
        if scroll_top < self.policy.escalation_threshold(item_height) {
            return false;
        }

        tracing::debug!(filter = %self.options.filter, "escalating document list to full list");
        self.run(true).await;
        true
    }

    /// Re-issue the last query
    pub async fn retry(&mut self) -> &ListState {
        let full_list = self.state.full_list;
        self.run(full_list).await;
        &self.state
    }

    async fn run(&mut self, full_list: bool) {
        let query = self.query(full_list);
        tracing::debug!(%query, full_list, "running document list query");

        self.state.full_list = full_list;
        self.state.last_query = Some(query.clone());
        match self.client.fetch(&query, &self.options.params).await {
            Ok(documents) => {
                self.state.fetched = documents.len();
                self.state.entries = collate(documents);
                self.state.loaded = true;
                self.state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, retryable = err.is_retryable(), "document list query failed");
                self.state.error = Some(err);
            }
        }
    }
}
