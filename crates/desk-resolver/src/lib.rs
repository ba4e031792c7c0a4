//! Desk Resolver - from router panes to rendered panes
//!
//! Provides:
//! - [`create_resolved_pane_node_stream`]: resolves router panes against a
//!   structure tree, progressively and with cancellation on navigation
//! - [`PaneResolver`]: memoized pane resolution shared across navigations
//! - [`project_panes`] and [`ResolvedPanesHandle`]: per-pane data for a view
//!   layer, including the default-panes rule
//! - [`IntentResolver`]: intent navigation through the visible panes or a
//!   breadth-first structure walk
//!
//! # Example
//!
//! ```rust,no_run
//! use desk_resolver::prelude::*;
//! use desk_structure::{compose, SchemaType, StructureContext};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let structure = Arc::new(StructureContext::new().with_schema_type(SchemaType::document("book", "Book")));
//! let root = compose::default_structure(&structure)?;
//! let router = MemoryRouter::from_path("book;book-1")?;
//!
//! let options = ResolvedPaneStreamOptions::new(root, router.panes_stream(), structure);
//! let mut panes = create_resolved_pane_node_stream(options);
//! while let Some(resolved) = panes.next().await {
//!     let projection = project_panes(&resolved?);
//!     println!("{} panes", projection.pane_data_items.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod active_panes;
pub mod config;
pub mod error;
pub mod intent;
pub mod pane_resolver;
pub mod projection;
pub mod resolved_panes;
pub mod resolved_stream;
pub mod stream_ext;

pub use active_panes::{ActivePane, ActivePanes, ActivePanesRegistry, ActivePanesSnapshot};
pub use config::{ResolverConfig, ROOT_PANE_ID};
pub use error::{IntentError, PaneResolutionError};
pub use intent::{IntentResolver, IntentStatus, IntentTreeWalk, StructureIntentWalker};
pub use pane_resolver::{resolve_pane, PaneResolver, PaneResult, PaneStream};
pub use projection::{maybe_open_default_panes, pane_key, project_panes, PaneData, PanesProjection};
pub use resolved_panes::ResolvedPanesHandle;
pub use resolved_stream::{
    create_resolved_pane_node_stream, diff_index, flatten_router_panes, FlatRouterPane, PaneSlot,
    ResolvedPaneMeta, ResolvedPaneStreamOptions, ResolvedPanesStream,
};
pub use stream_ext::{until_error, SwitchMapExt};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for mounting a desk
    pub use crate::{
        create_resolved_pane_node_stream, project_panes, ActivePanesRegistry, IntentError, IntentResolver,
        IntentStatus, PaneData, PaneResolutionError, PaneSlot, ResolvedPaneMeta, ResolvedPaneStreamOptions,
        ResolvedPanesHandle, ResolverConfig, StructureIntentWalker,
    };
    pub use desk_router::{MemoryRouter, NavigateOptions, Navigator, RouterPanes};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
