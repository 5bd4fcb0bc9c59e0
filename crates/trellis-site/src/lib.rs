//! Page tree and navigation services for Trellis.
//!
//! This crate turns a scanned content source into the structures the server
//! dispatches against:
//!
//! - [`TreeBuilder`] / [`PageTree`]: route-keyed page tree with ancestor
//!   repair and deterministic sibling ordering.
//! - [`SiteTree`]: cached snapshot service. Builds are serialized, snapshots
//!   are swapped atomically, and a failed build never replaces a good one.
//! - [`Navigation`]: navigation projection with cascading hide, HTML
//!   rendering, and host menu sync through [`MenuSink`].

mod nav;
mod site;
mod tree;

pub use nav::{MenuEntry, MenuSink, MenuSinkError, NavItem, Navigation, is_current_or_ancestor};
pub use site::{SiteTree, SiteTreeConfig, TreeStats};
pub use tree::{BuildError, PageTree, TreeBuilder};
