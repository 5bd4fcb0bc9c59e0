//! Response assembly helpers: markdown rendering, ETags, breadcrumbs.

use md5::{Digest, Md5};
use pulldown_cmark::{Options, Parser, html};
use serde::Serialize;

use trellis_site::PageTree;

/// Render a markdown body to HTML.
#[must_use]
pub fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(body, options);
    let mut output = String::with_capacity(body.len() * 2);
    html::push_html(&mut output, parser);
    output
}

/// Compute `ETag` from version and content.
///
/// Uses MD5 hash truncated to 64 bits (16 hex chars) - sufficient for
/// cache invalidation with negligible collision probability.
#[must_use]
pub fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}

/// One breadcrumb entry. The last crumb has no URL.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Crumb {
    fn link(label: &str, url: &str) -> Self {
        Self {
            label: label.to_owned(),
            url: Some(url.to_owned()),
        }
    }

    fn current(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            url: None,
        }
    }
}

/// Breadcrumb trail for a page, walking the parent chain up to the root.
///
/// The front page gets a single unlinked "Home" crumb. Ancestors missing
/// from the tree are skipped rather than invented.
#[must_use]
pub fn page_breadcrumbs(tree: &PageTree, route: &str) -> Vec<Crumb> {
    if route == "/" {
        return vec![Crumb::current("Home")];
    }

    let mut trail = Vec::new();
    if let Some(page) = tree.get(route) {
        trail.push(Crumb::current(&page.title));
        let mut cursor = page.parent.clone();
        while let Some(parent_route) = cursor {
            match tree.get(&parent_route) {
                Some(parent) => {
                    let label = if parent_route == "/" {
                        "Home"
                    } else {
                        &parent.title
                    };
                    trail.push(Crumb::link(label, &parent_route));
                    cursor = parent.parent.clone();
                }
                None => break,
            }
        }
        if trail.last().is_none_or(|c| c.url.as_deref() != Some("/")) {
            trail.push(Crumb::link("Home", "/"));
        }
    } else {
        trail.push(Crumb::link("Home", "/"));
    }

    trail.reverse();
    trail
}

/// Breadcrumb trail for an artifact detail view.
#[must_use]
pub fn artifact_breadcrumbs(plural_label: &str, slug_base: &str, item_title: &str) -> Vec<Crumb> {
    vec![
        Crumb::link("Home", "/"),
        Crumb::link(plural_label, &format!("/{slug_base}/")),
        Crumb::current(item_title),
    ]
}
