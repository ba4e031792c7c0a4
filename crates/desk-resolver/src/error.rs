//! Error types for pane resolution and intents

use desk_router::RouterError;
use desk_structure::StructureError;

/// Error raised while resolving the visible panes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaneResolutionError {
    /// A child resolver failed
    #[error("pane resolution error at index {index}{}: {source}", split_suffix(.split_index))]
    Resolve {
        /// Flat index of the pane being resolved
        index: usize,
        /// Sibling index of the pane being resolved
        split_index: usize,
        /// Underlying structure error
        #[source]
        source: StructureError,
    },

    /// A resolver finished without producing a pane
    #[error("resolver for '{id}' at index {index} completed without a pane")]
    Exhausted {
        /// Requested item id
        id: String,
        /// Flat index of the pane being resolved
        index: usize,
    },
}

fn split_suffix(split_index: &usize) -> String {
    if *split_index > 0 {
        format!(" for split pane index {split_index}")
    } else {
        String::new()
    }
}

impl PaneResolutionError {
    /// Wrap a structure error raised at a pane position
    #[inline]
    #[must_use]
    pub fn at(index: usize, split_index: usize, source: StructureError) -> Self {
        Self::Resolve {
            index,
            split_index,
            source,
        }
    }

    /// Check if this only truncates the visible panes
    #[inline]
    #[must_use]
    pub fn is_no_child(&self) -> bool {
        match self {
            Self::Resolve { source, .. } => source.is_no_child(),
            Self::Exhausted { .. } => true,
        }
    }

    /// Flat index the error was raised at
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Resolve { index, .. } | Self::Exhausted { index, .. } => *index,
        }
    }

    /// Underlying structure error, if any
    #[inline]
    #[must_use]
    pub fn structure_error(&self) -> Option<&StructureError> {
        match self {
            Self::Resolve { source, .. } => Some(source),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Error raised while resolving an intent
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    /// Neither a mounted pane nor the structure tree accepts the intent
    #[error("could not resolve intent '{intent}'")]
    Unresolved {
        /// Intent name
        intent: String,
    },

    /// `edit` without a document id
    #[error("intent '{0}' requires an `id` param")]
    MissingId(String),

    /// The tree walk hit a structure error
    #[error(transparent)]
    Resolution(#[from] PaneResolutionError),

    /// Router panes could not be built
    #[error(transparent)]
    Router(#[from] RouterError),
}

impl IntentError {
    /// Check if the failure means "nothing matched"
    #[inline]
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_mention_split_index() {
        let err = PaneResolutionError::at(2, 1, StructureError::UnknownSchemaType("x".into()));
        assert_eq!(
            err.to_string(),
            "pane resolution error at index 2 for split pane index 1: unknown schema type 'x'"
        );
        let err = PaneResolutionError::at(2, 0, StructureError::UnknownSchemaType("x".into()));
        assert_eq!(err.to_string(), "pane resolution error at index 2: unknown schema type 'x'");
    }

    #[test]
    fn no_child_predicate() {
        let no_child = PaneResolutionError::at(
            1,
            0,
            StructureError::NoChild {
                parent: "root".into(),
                item_id: "x".into(),
            },
        );
        assert!(no_child.is_no_child());
        assert_eq!(no_child.index(), 1);
        assert!(PaneResolutionError::at(1, 0, StructureError::Leaf("doc".into()))
            .structure_error()
            .is_some());
    }
}
