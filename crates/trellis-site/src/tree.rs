//! Page tree construction.
//!
//! [`TreeBuilder`] stages pages in a route-keyed map, repairs missing
//! ancestors, orders siblings, and freezes the result into an immutable
//! [`PageTree`] snapshot.
//!
//! # Ancestor repair
//!
//! A page whose declared parent route has no page attaches to the nearest
//! existing ancestor instead: the parent route is walked upward by stripping
//! trailing segments until an existing route is found. A page with no
//! existing ancestor at all becomes a root. The stored page record always
//! reflects the repaired parent, never the declared one.
//!
//! # Ordering
//!
//! Siblings (and roots) are sorted by `sort_order` ascending, ties broken by
//! case-insensitive title, then by route. The ordering is total, so rebuilds
//! from the same content produce identical child lists.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use trellis_content::{Page, parent_route};

/// Error returned when a tree cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The content source yielded no pages.
    #[error("no pages found in content source")]
    NoPages,
}

/// Immutable page tree snapshot.
///
/// Pages are keyed by canonical route. Parent and child links are stored on
/// the pages themselves; `roots` holds the ordered top-level routes.
#[derive(Clone, Debug, Default)]
pub struct PageTree {
    pages: HashMap<String, Page>,
    roots: Vec<String>,
    built: bool,
    built_at: u64,
}

impl PageTree {
    pub(crate) fn new(pages: HashMap<String, Page>, roots: Vec<String>, built_at: u64) -> Self {
        Self {
            pages,
            roots,
            built: true,
            built_at,
        }
    }

    /// Look up a page by canonical route.
    #[must_use]
    pub fn get(&self, route: &str) -> Option<&Page> {
        self.pages.get(route)
    }

    /// Ordered child pages of a route.
    ///
    /// Child routes always resolve after a build; a dangling route is
    /// silently dropped.
    #[must_use]
    pub fn children(&self, route: &str) -> Vec<&Page> {
        let Some(page) = self.pages.get(route) else {
            return Vec::new();
        };
        page.children
            .iter()
            .filter_map(|child| self.pages.get(child))
            .collect()
    }

    /// Ordered root pages.
    #[must_use]
    pub fn roots(&self) -> Vec<&Page> {
        self.roots
            .iter()
            .filter_map(|route| self.pages.get(route))
            .collect()
    }

    /// The home page, when the content source provides one.
    #[must_use]
    pub fn front_page(&self) -> Option<&Page> {
        self.pages.get("/")
    }

    /// Total number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the tree holds no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Whether this snapshot came from a successful build.
    ///
    /// The initial empty snapshot and the snapshot left behind by a failed
    /// build both report `false`.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Unix timestamp of the build that produced this snapshot.
    #[must_use]
    pub fn built_at(&self) -> u64 {
        self.built_at
    }

    /// All pages, keyed by route (for cache serialization and status checks).
    #[must_use]
    pub fn pages(&self) -> &HashMap<String, Page> {
        &self.pages
    }

    /// Root routes in order (for cache serialization).
    #[must_use]
    pub fn root_routes(&self) -> &[String] {
        &self.roots
    }
}

/// Builder that stages pages and freezes them into a [`PageTree`].
pub struct TreeBuilder {
    pages: HashMap<String, Page>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    /// Stage a page, keyed by route.
    ///
    /// A duplicate route overwrites the previously staged page; the scanner's
    /// deterministic file order makes the winner reproducible.
    pub fn add_page(&mut self, page: Page) {
        if let Some(previous) = self.pages.insert(page.route.clone(), page) {
            tracing::warn!(route = %previous.route, "Duplicate route, keeping later page");
        }
    }

    /// Number of staged pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no pages have been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Repair ancestors, order siblings, and freeze the tree.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NoPages`] when nothing was staged. The caller
    /// reports this through the status surface rather than aborting.
    pub fn build(mut self) -> Result<PageTree, BuildError> {
        if self.pages.is_empty() {
            return Err(BuildError::NoPages);
        }

        // Deterministic processing order regardless of map iteration
        let mut routes: Vec<String> = self.pages.keys().cloned().collect();
        routes.sort();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut roots: Vec<String> = Vec::new();

        for route in &routes {
            match self.resolve_parent(route) {
                Some(parent) => {
                    children.entry(parent.clone()).or_default().push(route.clone());
                    // Store the repaired parent, replacing the record
                    if let Some(page) = self.pages.get_mut(route)
                        && page.parent.as_deref() != Some(&parent)
                    {
                        tracing::debug!(
                            route = %route,
                            parent = %parent,
                            "Reattached page to nearest existing ancestor"
                        );
                        page.parent = Some(parent);
                    }
                }
                None => {
                    if let Some(page) = self.pages.get_mut(route) {
                        page.parent = None;
                    }
                    roots.push(route.clone());
                }
            }
        }

        for (parent, mut child_routes) in children {
            sort_sibling_routes(&mut child_routes, &self.pages);
            if let Some(page) = self.pages.get_mut(&parent) {
                page.children = child_routes;
            }
        }
        sort_sibling_routes(&mut roots, &self.pages);

        let built_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        Ok(PageTree::new(self.pages, roots, built_at))
    }

    /// Resolve the effective parent route for a page.
    ///
    /// Walks the declared parent chain upward until an existing route is
    /// found. `None` means the page is a root.
    fn resolve_parent(&self, route: &str) -> Option<String> {
        let page = self.pages.get(route)?;
        let mut candidate = page.parent.clone();

        while let Some(parent) = candidate {
            if self.pages.contains_key(&parent) {
                return Some(parent);
            }
            candidate = parent_route(&parent);
        }
        None
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort sibling routes in place: `sort_order` asc, then case-insensitive
/// title, then route.
fn sort_sibling_routes(routes: &mut [String], pages: &HashMap<String, Page>) {
    routes.sort_by(|a, b| match (pages.get(a), pages.get(b)) {
        (Some(pa), Some(pb)) => compare_siblings(pa, pb),
        _ => a.cmp(b),
    });
}

fn compare_siblings(a: &Page, b: &Page) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.route.cmp(&b.route))
}
