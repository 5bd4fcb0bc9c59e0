//! Page model and route derivation.
//!
//! A [`Page`] is an immutable value parsed from one content file. Its route,
//! slug, depth and parent are derived from the file path; its remaining
//! fields come from the front matter block with path-derived defaults.
//!
//! # Route convention
//!
//! Routes are canonical slash-delimited paths with a leading and trailing
//! slash (`/`, `/reports/`, `/reports/q1/`). Derivation from a relative
//! source path:
//!
//! - the content extension is stripped;
//! - an index stem (`index` or `_index`) collapses onto the directory route,
//!   so `reports/_index.md` -> `/reports/` and `index.md` -> `/`;
//! - an underscore-prefixed directory segment is hidden: it is removed from
//!   the route and its descendants move one level shallower
//!   (`_drafts/notes.md` -> `/notes/`); a page from such a path defaults to
//!   `show_in_nav = false`;
//! - an underscore-prefixed file keeps its route position but sheds the
//!   marker (`_secret.md` -> `/secret/`, also nav-hidden by default), so the
//!   hidden convention never leaks into route strings.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::front_matter::{FrontMatter, FrontMatterError};

/// The directory-index stems. A file with one of these stems takes its
/// directory's route.
const INDEX_STEMS: [&str; 2] = ["index", "_index"];

/// Prefix marking a path segment as hidden.
const HIDDEN_PREFIX: char = '_';

/// A single content page.
///
/// Immutable once constructed; tree construction replaces records (with
/// repaired parents or sorted children) rather than mutating them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical route (`/`, `/seg/.../`). Unique key across the tree.
    pub route: String,
    /// Route with slashes replaced by hyphens; `root` for `/`.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Navigation label.
    pub nav_title: String,
    /// Page description.
    #[serde(default)]
    pub description: Option<String>,
    /// Raw content body (markdown).
    pub body: String,
    /// When present, the page is a listing page rendered by querying the
    /// provider registered for this type.
    #[serde(default)]
    pub artifact_type: Option<String>,
    /// Opaque provider query filter.
    #[serde(default)]
    pub filter: BTreeMap<String, String>,
    /// Sibling sort key, ascending.
    #[serde(default)]
    pub sort_order: i64,
    /// Number of route segments (0 for `/`).
    pub depth: usize,
    /// Whether the source file was a directory index.
    pub is_index: bool,
    /// Navigation visibility. Hiding cascades over the whole subtree.
    pub show_in_nav: bool,
    /// Parent route. `None` marks a root candidate; after tree construction
    /// every non-`None` value refers to an existing route.
    #[serde(default)]
    pub parent: Option<String>,
    /// Ordered child routes. Populated by tree construction only.
    #[serde(default)]
    pub children: Vec<String>,
    /// Access level, interpreted only by the router.
    pub access_level: String,
}

/// Error returned when a content file cannot become a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Malformed front matter block.
    #[error("{0}")]
    FrontMatter(#[from] FrontMatterError),
}

impl Page {
    /// Parse a content file into a page.
    ///
    /// # Arguments
    ///
    /// * `rel_path` - Path relative to the content root (e.g., `reports/q1.md`)
    /// * `raw` - Raw file content
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed front matter block; the caller skips
    /// the file rather than aborting the whole load.
    pub fn from_file(rel_path: &Path, raw: &str) -> Result<Self, PageError> {
        let (matter, body) = FrontMatter::split(raw)?;

        let route = derive_route(rel_path);
        let slug = route_slug(&route);
        let depth = route_depth(&route);
        let parent = parent_route(&route);
        let is_index = path_stem(rel_path)
            .is_some_and(|stem| INDEX_STEMS.contains(&stem));
        let hidden = path_has_hidden_segment(rel_path);

        let title = matter
            .title
            .unwrap_or_else(|| default_title(&route));
        let nav_title = matter.nav_title.unwrap_or_else(|| title.clone());

        Ok(Self {
            slug,
            nav_title,
            description: matter.description,
            body: body.to_owned(),
            artifact_type: matter
                .artifact_type
                .or_else(|| default_artifact_type(rel_path)),
            filter: matter.filter,
            sort_order: matter.sort_order.unwrap_or(0),
            depth,
            is_index,
            show_in_nav: matter.show_in_nav.unwrap_or(!hidden),
            parent,
            children: Vec::new(),
            access_level: matter
                .access_level
                .unwrap_or_else(|| "public".to_owned()),
            route,
            title,
        })
    }

    /// Whether this page must be rendered by querying a provider.
    #[must_use]
    pub fn is_listing(&self) -> bool {
        self.artifact_type.is_some()
    }
}

/// Derive the canonical route for a source path relative to the content root.
///
/// Idempotent over canonical routes: deriving from `reports/q1/` again
/// yields `/reports/q1/`.
#[must_use]
pub fn derive_route(rel_path: &Path) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let components: Vec<String> = rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    for (i, component) in components.iter().enumerate() {
        let is_last = i == components.len() - 1;
        let segment = if is_last {
            strip_extension(component)
        } else {
            component.as_str()
        };

        if segment.is_empty() {
            continue;
        }
        if is_last && INDEX_STEMS.contains(&segment) {
            // Index stem collapses onto the directory route
            continue;
        }
        if segment.starts_with(HIDDEN_PREFIX) {
            if !is_last {
                // Hidden directory level: descendants move one level shallower
                continue;
            }
            // Hidden file: the marker stays out of the route
            let stripped = segment.trim_start_matches(HIDDEN_PREFIX);
            if !stripped.is_empty() {
                segments.push(stripped);
            }
            continue;
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return "/".to_owned();
    }
    format!("/{}/", segments.join("/"))
}

/// Normalize a route string to the canonical leading+trailing-slash form.
///
/// Collapses duplicate slashes; the empty route and `/` both normalize
/// to `/`.
#[must_use]
pub fn normalize_route(route: &str) -> String {
    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_owned();
    }
    format!("/{}/", segments.join("/"))
}

/// Slug for a canonical route: slashes become hyphens, `root` for `/`.
#[must_use]
pub fn route_slug(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        return "root".to_owned();
    }
    trimmed.replace('/', "-")
}

/// Parent route of a canonical route: the route minus its last segment.
///
/// `None` only for the home route `/`.
#[must_use]
pub fn parent_route(route: &str) -> Option<String> {
    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    match segments.len() {
        0 => None,
        1 => Some("/".to_owned()),
        n => Some(format!("/{}/", segments[..n - 1].join("/"))),
    }
}

/// Number of non-empty segments in a canonical route.
fn route_depth(route: &str) -> usize {
    route.split('/').filter(|s| !s.is_empty()).count()
}

/// File stem of the last path component (extension stripped).
fn path_stem(rel_path: &Path) -> Option<&str> {
    rel_path.file_stem().and_then(|s| s.to_str())
}

/// Whether any path segment carries the hidden prefix (the index stem
/// `_index` does not count).
fn path_has_hidden_segment(rel_path: &Path) -> bool {
    rel_path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        let stem = strip_extension(&name);
        stem.starts_with(HIDDEN_PREFIX) && stem != "_index"
    })
}

/// Default artifact type: the first directory segment of the source path.
///
/// Files at the content root get none. The folder name is used verbatim;
/// singular/plural mapping is a provider concern.
fn default_artifact_type(rel_path: &Path) -> Option<String> {
    let mut components = rel_path.components();
    let first = components.next()?;
    // The first component must be a directory, not the file itself
    components.next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}

/// Title fallback derived from the last route segment.
fn default_title(route: &str) -> String {
    let Some(last) = route.split('/').filter(|s| !s.is_empty()).next_back() else {
        return "Home".to_owned();
    };
    humanize(last)
}

/// Turn a slug-like segment into a display title ("quarterly-reports" ->
/// "Quarterly Reports").
fn humanize(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a trailing file extension from a path segment.
fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    }
}
