//! Content scanning and page model for Trellis.
//!
//! This crate covers the first two stages of the site pipeline:
//!
//! 1. [`scan_content_root`] walks a content directory and returns every
//!    content file beneath it in a deterministic order.
//! 2. [`Page::from_file`] parses one content file (front matter + body) into
//!    an immutable [`Page`] record, deriving its route, slug, depth and
//!    parent from the file path.
//!
//! Tree construction (parent repair, ordering, caching) lives in
//! `trellis-site`; this crate has no knowledge of other pages.

mod front_matter;
mod page;
mod scan;

pub use front_matter::{FrontMatter, FrontMatterError};
pub use page::{Page, PageError, derive_route, normalize_route, parent_route, route_slug};
pub use scan::scan_content_root;
