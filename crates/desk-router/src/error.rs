//! Error types for desk routing

/// Router pane parsing and navigation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// Malformed `%XX` escape
    #[error("invalid percent-encoding in '{input}'")]
    InvalidPercentEncoding {
        /// Offending component
        input: String,
    },

    /// Escapes decode to bytes that are not UTF-8
    #[error("percent-decoded component is not valid UTF-8: '{input}'")]
    InvalidUtf8 {
        /// Offending component
        input: String,
    },

    /// Group root without an id
    #[error("pane group {group_index} has no id for its first pane")]
    EmptyPaneId {
        /// Zero-based group index
        group_index: usize,
    },

    /// Pane position outside the current router state
    #[error("no pane at group {group_index}, sibling {sibling_index}")]
    PaneOutOfRange {
        /// Zero-based group index
        group_index: usize,
        /// Zero-based sibling index
        sibling_index: usize,
    },
}
