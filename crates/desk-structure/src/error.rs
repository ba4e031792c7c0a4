//! Error types for the structure tree
//!
//! Covers:
//! - Child resolution failures (including the "no child" case that only
//!   truncates the visible panes)
//! - Structure definition and config validation
//! - Document-list queries

/// Structure resolution and definition errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    /// Resolver produced nothing for the requested item
    #[error("child of pane '{parent}' returned no child for item '{item_id}'")]
    NoChild {
        /// Id of the pane whose child was requested
        parent: String,
        /// Requested item id
        item_id: String,
    },

    /// Pane node has no child resolver at all
    #[error("pane '{0}' has no children")]
    Leaf(String),

    /// Structure node without a usable id
    #[error("`id` is required for {kind} at {path}")]
    MissingId {
        /// Node kind ("list items", "documents", …)
        kind: String,
        /// Position in the structure, e.g. `root.items[2]`
        path: String,
    },

    /// Two siblings in one list share an id
    #[error("list item ids must be unique, found duplicate '{id}' at {path}")]
    DuplicateId {
        /// Duplicated id
        id: String,
        /// Position in the structure
        path: String,
    },

    /// Reference to a schema type that is not registered
    #[error("unknown schema type '{0}'")]
    UnknownSchemaType(String),

    /// Document editor requested without a resolvable type
    #[error("cannot resolve schema type for document '{0}'")]
    UnknownDocumentType(String),

    /// Reference to an initial value template that does not exist
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    /// Document-list filter looks like a full query
    #[error("`filter` cannot start with `{first}`, looks like a query rather than a filter: {filter}")]
    InvalidFilter {
        /// The offending filter
        filter: String,
        /// First character of the filter
        first: char,
    },

    /// Config could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// Custom child resolver failed
    #[error("resolver for '{id}' failed: {message}")]
    Resolver {
        /// Item id being resolved
        id: String,
        /// Error message from the resolver
        message: String,
    },
}

impl StructureError {
    /// Check if this only means "nothing to show here"
    #[inline]
    #[must_use]
    pub fn is_no_child(&self) -> bool {
        matches!(self, Self::NoChild { .. } | Self::Leaf(_))
    }

    /// Check if the error comes from the structure definition itself
    #[inline]
    #[must_use]
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::MissingId { .. }
                | Self::DuplicateId { .. }
                | Self::UnknownSchemaType(_)
                | Self::UnknownTemplate(_)
                | Self::InvalidFilter { .. }
                | Self::Config(_)
        )
    }

    /// Create a resolver error
    #[inline]
    pub fn resolver(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolver {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Document-list query errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Backend rejected or failed the request
    #[error("query failed: {0}")]
    Request(String),

    /// Request did not complete
    #[error("query timed out")]
    Timeout,

    /// Response could not be understood
    #[error("could not decode query response: {0}")]
    Decode(String),
}

impl QueryError {
    /// Check if the query may succeed when re-issued
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_child_predicate() {
        let err = StructureError::NoChild {
            parent: "root".into(),
            item_id: "nope".into(),
        };
        assert!(err.is_no_child());
        assert!(!err.is_definition_error());
        assert!(err.to_string().contains("returned no child"));
    }

    #[test]
    fn missing_id_message() {
        let err = StructureError::MissingId {
            kind: "list items".into(),
            path: "root.items[0]".into(),
        };
        assert_eq!(err.to_string(), "`id` is required for list items at root.items[0]");
        assert!(err.is_definition_error());
    }

    #[test]
    fn query_retryable() {
        assert!(QueryError::Timeout.is_retryable());
        assert!(!QueryError::Decode("x".into()).is_retryable());
    }
}
