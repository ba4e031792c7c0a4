//! Desk Structure - the pane tree behind the studio desk
//!
//! Provides:
//! - [`PaneNode`]: immutable pane definitions (list, document list, document, component)
//! - The child-resolution contract ([`ChildResolver`], [`Resolution`], [`ChildContext`])
//! - Builder functions for composing structures ([`compose`])
//! - Intent acceptance rules for panes ([`intent`])
//! - Document-list query policy and controller ([`document_list`])
//! - A declarative TOML/JSON structure config ([`StructureConfig`])
//!
//! # Example
//!
//! ```rust
//! use desk_structure::{compose, SchemaType, StructureContext};
//!
//! let context = StructureContext::new().with_schema_type(SchemaType::document("book", "Book"));
//! let root = compose::default_structure(&context).unwrap();
//! assert_eq!(root.id, compose::DEFAULT_ROOT_ID);
//! assert!(root.as_list().unwrap().item("book").is_some());
//! ```

pub mod capabilities;
pub mod compose;
pub mod config;
pub mod context;
pub mod document_list;
pub mod error;
pub mod intent;
pub mod node;

pub use capabilities::{PaneCapabilities, SET_LAYOUT_ACTION, SET_SORT_ORDER_ACTION, SET_VIEW_ACTION};
pub use config::{ItemConfig, ListConfig, Structure, StructureConfig};
pub use context::{ChildContext, DocumentNodeSpec, SchemaType, StructureContext, Template};
pub use document_list::{
    DocumentListController, DocumentStub, ListEntry, ListQueryPolicy, ListState, QueryClient, SortDirection,
    SortOrder, SortOrdering,
};
pub use error::{QueryError, StructureError};
pub use intent::{IntentContext, IntentPredicate, IntentRequest, CREATE_INTENT, EDIT_INTENT};
pub use node::{
    ChildResolver, ComponentOptions, DocumentListOptions, DocumentOptions, ListItem, ListItemNode, ListOptions,
    MenuItem, MenuItemGroup, PaneKind, PaneNode, PaneSummary, Resolution, UnresolvedPane, View,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building structures
    pub use crate::compose::{component, divider, document, document_list, list, list_item};
    pub use crate::{
        ChildContext, ChildResolver, IntentRequest, PaneCapabilities, PaneKind, PaneNode, Resolution,
        StructureContext, StructureError, UnresolvedPane,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
