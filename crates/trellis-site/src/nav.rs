//! Navigation projection over the page tree.
//!
//! [`Navigation`] projects the current [`PageTree`](crate::PageTree) snapshot
//! into an ordered [`NavItem`] forest. Hiding cascades: a page with
//! `show_in_nav = false` removes itself and its entire subtree from the
//! projection, even when descendants are individually visible.
//!
//! The projection is cached in its own bucket, keyed by the snapshot's build
//! timestamp, so a rebuilt tree invalidates it implicitly.
//!
//! # Menu sync
//!
//! After a successful build the top-level projection can be mirrored into a
//! host menu via [`MenuSink`]: managed entries are deleted, recreated from
//! the current projection, and the slot is rebound. The sink owns the
//! "managed" bookkeeping; the projector only drives the sequence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use trellis_cache::{CacheBucket, CacheBucketExt};
use trellis_content::{Page, normalize_route};

use crate::site::SiteTree;

/// Cache key for the projection within the nav bucket.
const NAV_KEY: &str = "projection";

/// A single navigation entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    /// Navigation label.
    pub title: String,
    /// Canonical page route.
    pub route: String,
    /// Link target.
    pub url: String,
    /// Nesting depth in the projection (0 for top-level items).
    pub depth: usize,
    /// Access level of the underlying page.
    pub access_level: String,
    /// Ordered child items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// Error reported by a [`MenuSink`] operation.
#[derive(Debug, thiserror::Error)]
#[error("menu sink: {0}")]
pub struct MenuSinkError(pub String);

/// A flat menu entry handed to a [`MenuSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    /// Display title.
    pub title: String,
    /// Link target.
    pub url: String,
    /// Zero-based position within the slot.
    pub position: usize,
}

/// Host menu integration point.
///
/// Implementations manage entries in a named placement slot. Entries created
/// through this trait are "managed": `clear_slot` must remove exactly those,
/// leaving entries from other sources alone.
pub trait MenuSink: Send + Sync {
    /// Remove all managed entries from the slot.
    fn clear_slot(&self, slot: &str) -> Result<(), MenuSinkError>;

    /// Create one managed entry in the slot.
    fn add_entry(&self, slot: &str, entry: &MenuEntry) -> Result<(), MenuSinkError>;

    /// Bind the slot to its placement after entries are in place.
    fn bind_slot(&self, slot: &str) -> Result<(), MenuSinkError>;
}

/// Whether `route` is the current route or one of its ancestors.
///
/// Both arguments must be canonical routes. The trailing slash keeps the
/// prefix check on segment boundaries: `/a/` is an ancestor of `/a/b/`,
/// while `/ab/` is not. Reflexive.
#[must_use]
pub fn is_current_or_ancestor(route: &str, current: &str) -> bool {
    current == route || current.starts_with(route)
}

/// Navigation projector with its own cache bucket.
pub struct Navigation {
    site: Arc<SiteTree>,
    bucket: Box<dyn CacheBucket>,
}

impl Navigation {
    /// Create a projector over a site tree service.
    ///
    /// Opens a `nav` bucket in the site's cache, so version wipes and TTL
    /// expiry apply to the projection as well.
    #[must_use]
    pub fn new(site: Arc<SiteTree>) -> Self {
        let bucket = site.cache().bucket("nav");
        Self { site, bucket }
    }

    /// Full navigation projection, in tree order.
    pub fn tree(&self) -> Vec<NavItem> {
        let tree = self.site.tree();
        let etag = tree.built_at().to_string();

        if let Some(items) = self.bucket.get_json::<Vec<NavItem>>(NAV_KEY, &etag) {
            return items;
        }

        let items: Vec<NavItem> = tree
            .roots()
            .into_iter()
            .filter_map(|page| self.project(&tree, page, 0))
            .collect();

        self.bucket.set_json(NAV_KEY, &etag, &items);
        items
    }

    /// Top-level items only, children stripped.
    pub fn top_level(&self) -> Vec<NavItem> {
        self.tree()
            .into_iter()
            .map(|item| NavItem {
                children: Vec::new(),
                ..item
            })
            .collect()
    }

    /// Projection subtree rooted at a route.
    ///
    /// The route is normalized first, so `reports` and `/reports/` address
    /// the same subtree. `None` when the route is absent from the projection
    /// (including hidden pages).
    pub fn subtree(&self, route: &str) -> Option<NavItem> {
        let route = normalize_route(route);
        find_item(&self.tree(), &route).cloned()
    }

    /// Total number of visible items, all levels included.
    pub fn count(&self) -> usize {
        fn count_items(items: &[NavItem]) -> usize {
            items.len() + items.iter().map(|i| count_items(&i.children)).sum::<usize>()
        }
        count_items(&self.tree())
    }

    /// Render the projection as a nested `<ul>` list.
    ///
    /// The item matching `current_route` exactly gets the `nav-current`
    /// class; its ancestors get `nav-ancestor`. Nesting stops at
    /// `max_depth` levels (1 renders top-level items only).
    pub fn render_html(&self, current_route: &str, max_depth: usize) -> String {
        let current = normalize_route(current_route);
        let mut html = String::from("<ul class=\"trellis-nav\">\n");
        for item in &self.tree() {
            render_item(&mut html, item, &current, 1, max_depth);
        }
        html.push_str("</ul>\n");
        html
    }

    /// Drop the cached projection.
    ///
    /// The next access re-projects from the current tree snapshot.
    pub fn invalidate(&self) {
        self.bucket.remove(NAV_KEY);
    }

    /// Mirror the top-level projection into a host menu slot.
    ///
    /// Deletes managed entries, recreates one entry per top-level item, then
    /// rebinds the slot.
    ///
    /// # Errors
    ///
    /// Propagates the first sink failure; the slot may then hold a partial
    /// entry set until the next sync.
    pub fn sync_menu(&self, sink: &dyn MenuSink, slot: &str) -> Result<(), MenuSinkError> {
        let items = self.top_level();

        sink.clear_slot(slot)?;
        for (position, item) in items.iter().enumerate() {
            sink.add_entry(
                slot,
                &MenuEntry {
                    title: item.title.clone(),
                    url: item.url.clone(),
                    position,
                },
            )?;
        }
        sink.bind_slot(slot)?;

        tracing::debug!(slot = %slot, entries = items.len(), "Synced navigation menu");
        Ok(())
    }

    /// Project one page and its visible subtree.
    ///
    /// `None` hides the page and everything beneath it.
    fn project(&self, tree: &crate::PageTree, page: &Page, depth: usize) -> Option<NavItem> {
        if !page.show_in_nav {
            return None;
        }

        let children = tree
            .children(&page.route)
            .into_iter()
            .filter_map(|child| self.project(tree, child, depth + 1))
            .collect();

        Some(NavItem {
            title: page.nav_title.clone(),
            route: page.route.clone(),
            url: page.route.clone(),
            depth,
            access_level: page.access_level.clone(),
            children,
        })
    }
}

fn find_item<'a>(items: &'a [NavItem], route: &str) -> Option<&'a NavItem> {
    for item in items {
        if item.route == route {
            return Some(item);
        }
        if let Some(found) = find_item(&item.children, route) {
            return Some(found);
        }
    }
    None
}

fn render_item(html: &mut String, item: &NavItem, current: &str, depth: usize, max_depth: usize) {
    let class = if item.route == *current {
        " class=\"nav-current\""
    } else if is_current_or_ancestor(&item.route, current) {
        " class=\"nav-ancestor\""
    } else {
        ""
    };

    html.push_str(&format!(
        "<li{class}><a href=\"{}\">{}</a>",
        escape_html(&item.url),
        escape_html(&item.title)
    ));

    if depth < max_depth && !item.children.is_empty() {
        html.push_str("\n<ul>\n");
        for child in &item.children {
            render_item(html, child, current, depth + 1, max_depth);
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</li>\n");
}

/// Minimal HTML escaping for text and attribute positions.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Navigation: Send, Sync);

    use std::fs;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use crate::site::SiteTreeConfig;

    use super::*;

    fn create_nav(files: &[(&str, &str)]) -> (tempfile::TempDir, Navigation) {
        let temp_dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let abs = temp_dir.path().join(path);
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(abs, content).unwrap();
        }
        let site = Arc::new(SiteTree::new(SiteTreeConfig {
            source_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        }));
        (temp_dir, Navigation::new(site))
    }

    #[test]
    fn test_tree_projects_visible_pages() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", "---\ntitle: Reports\n---\n"),
            ("reports/q1.md", "# Q1"),
        ]);

        let items = nav.tree();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].route, "/");
        assert_eq!(items[0].depth, 0);
        assert_eq!(items[0].children.len(), 1);
        assert_eq!(items[0].children[0].route, "/reports/");
        assert_eq!(items[0].children[0].depth, 1);
        assert_eq!(items[0].children[0].children[0].route, "/reports/q1/");
    }

    #[test]
    fn test_hidden_page_prunes_whole_subtree() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            (
                "reports/_index.md",
                "---\ntitle: Reports\nshow_in_nav: false\n---\n",
            ),
            // Child explicitly visible, still pruned with its parent
            ("reports/q1.md", "---\nshow_in_nav: true\n---\n"),
            ("about.md", "# About"),
        ]);

        let items = nav.tree();

        assert_eq!(items.len(), 1);
        let home = &items[0];
        assert_eq!(home.children.len(), 1);
        assert_eq!(home.children[0].route, "/about/");
        assert!(nav.subtree("/reports/").is_none());
        assert!(nav.subtree("/reports/q1/").is_none());
    }

    #[test]
    fn test_uses_nav_title() {
        let (_guard, nav) = create_nav(&[(
            "guide.md",
            "---\ntitle: Full Guide Title\nnav_title: Guide\n---\n",
        )]);

        let items = nav.tree();

        assert_eq!(items[0].title, "Guide");
    }

    #[test]
    fn test_top_level_strips_children() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", ""),
            ("reports/q1.md", ""),
        ]);

        let items = nav.top_level();

        assert_eq!(items.len(), 1);
        assert!(items[0].children.is_empty());
    }

    #[test]
    fn test_subtree_normalizes_route() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", "---\ntitle: Reports\n---\n"),
            ("reports/q1.md", "# Q1"),
        ]);

        for spelling in ["/reports/", "reports", "/reports", "reports/"] {
            let subtree = nav.subtree(spelling).expect(spelling);
            assert_eq!(subtree.route, "/reports/");
            assert_eq!(subtree.children.len(), 1);
        }
    }

    #[test]
    fn test_count_includes_all_levels() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", ""),
            ("reports/q1.md", ""),
            ("reports/q2.md", ""),
        ]);

        assert_eq!(nav.count(), 4);
    }

    #[test]
    fn test_is_current_or_ancestor() {
        assert!(is_current_or_ancestor("/a/", "/a/"));
        assert!(is_current_or_ancestor("/a/", "/a/b/"));
        assert!(is_current_or_ancestor("/", "/a/b/"));
        assert!(!is_current_or_ancestor("/ab/", "/a/b/"));
        assert!(!is_current_or_ancestor("/a/b/", "/a/"));
    }

    #[test]
    fn test_render_html_marks_current_and_ancestor() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", "---\ntitle: Reports\n---\n"),
            ("reports/q1.md", "---\ntitle: Q1\n---\n"),
        ]);

        let html = nav.render_html("/reports/q1/", 10);

        assert!(html.contains("<li class=\"nav-ancestor\"><a href=\"/reports/\">Reports</a>"));
        assert!(html.contains("<li class=\"nav-current\"><a href=\"/reports/q1/\">Q1</a>"));
    }

    #[test]
    fn test_render_html_bounds_depth() {
        let (_guard, nav) = create_nav(&[
            ("index.md", "# Home"),
            ("reports/_index.md", "---\ntitle: Reports\n---\n"),
            ("reports/q1.md", "---\ntitle: Q1\n---\n"),
        ]);

        let html = nav.render_html("/", 2);

        // Depth 2 shows / and /reports/ but not /reports/q1/
        assert!(html.contains("Reports"));
        assert!(!html.contains("Q1"));
    }

    #[test]
    fn test_render_html_escapes_titles() {
        let (_guard, nav) = create_nav(&[("page.md", "---\ntitle: \"A <b> & B\"\n---\n")]);

        let html = nav.render_html("/", 5);

        assert!(html.contains("A &lt;b&gt; &amp; B"));
        assert!(!html.contains("<b>"));
    }

    // Recording sink for sync tests

    #[derive(Default)]
    struct RecordingSink {
        log: Mutex<Vec<String>>,
        fail_on_add: bool,
    }

    impl MenuSink for RecordingSink {
        fn clear_slot(&self, slot: &str) -> Result<(), MenuSinkError> {
            self.log.lock().unwrap().push(format!("clear:{slot}"));
            Ok(())
        }

        fn add_entry(&self, slot: &str, entry: &MenuEntry) -> Result<(), MenuSinkError> {
            if self.fail_on_add {
                return Err(MenuSinkError("add failed".to_owned()));
            }
            self.log
                .lock()
                .unwrap()
                .push(format!("add:{slot}:{}:{}:{}", entry.position, entry.title, entry.url));
            Ok(())
        }

        fn bind_slot(&self, slot: &str) -> Result<(), MenuSinkError> {
            self.log.lock().unwrap().push(format!("bind:{slot}"));
            Ok(())
        }
    }

    #[test]
    fn test_sync_menu_clears_adds_binds_in_order() {
        let (_guard, nav) = create_nav(&[
            ("alpha.md", "---\ntitle: Alpha\nsort_order: 1\n---\n"),
            ("beta.md", "---\ntitle: Beta\nsort_order: 2\n---\n"),
        ]);
        let sink = RecordingSink::default();

        nav.sync_menu(&sink, "main").unwrap();

        let log = sink.log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "clear:main",
                "add:main:0:Alpha:/alpha/",
                "add:main:1:Beta:/beta/",
                "bind:main",
            ]
        );
    }

    #[test]
    fn test_sync_menu_propagates_sink_error() {
        let (_guard, nav) = create_nav(&[("alpha.md", "# Alpha")]);
        let sink = RecordingSink {
            fail_on_add: true,
            ..Default::default()
        };

        assert!(nav.sync_menu(&sink, "main").is_err());
    }
}
