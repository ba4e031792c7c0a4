//! Desk Router - pane routing state for the studio desk
//!
//! Provides:
//! - [`RouterPanes`]: groups of sibling panes from the root to the focused leaf
//! - A URL codec for the `/<group>;<group>` pane path segment
//! - [`PaneRouter`]: pure per-pane operations (open child, split, close, set params)
//! - [`Navigator`] and an in-memory [`MemoryRouter`]
//!
//! # Example
//!
//! ```rust
//! use desk_router::{encode_panes_segment, parse_panes_segment};
//!
//! let panes = parse_panes_segment("/author;author-1,view=preview").unwrap();
//! assert_eq!(panes.len(), 2);
//! assert_eq!(panes[1][0].param("view"), Some("preview"));
//! assert_eq!(encode_panes_segment(&panes), "author;author-1,view=preview");
//! ```

pub mod codec;
pub mod error;
pub mod navigator;
pub mod pane_router;
pub mod params;
pub mod sibling;

pub use codec::{
    canonicalize, decode_component, encode_component, encode_panes_segment, parse_panes_segment, to_path,
};
pub use error::RouterError;
pub use navigator::{MemoryRouter, NavigateOptions, Navigator};
pub use pane_router::{PaneRouter, SetParamsOptions};
pub use params::{is_exclusive_param, PaneParams, EXCLUSIVE_PARAMS, RESERVED_PARAMS};
pub use sibling::{sibling_count, strip_transient, RouterPaneGroup, RouterPaneSibling, RouterPanes};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with desk routing
    pub use crate::{
        encode_panes_segment, parse_panes_segment, MemoryRouter, NavigateOptions, Navigator, PaneParams,
        PaneRouter, RouterError, RouterPaneGroup, RouterPaneSibling, RouterPanes,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
