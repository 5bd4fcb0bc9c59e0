//! Request path classification.
//!
//! Every content request funnels through one catch-all route; this module
//! decides what kind of response it should become. Artifact detail paths win
//! over pages, and pages win over the front page, so a provider can claim
//! `/reports/{slug}/` even when a markdown page shadows the same route.

use std::collections::HashMap;

use trellis_content::normalize_route;
use trellis_provider::ProviderRegistry;

/// What a request path resolves to, before any tree or provider lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteTarget {
    /// The site front page.
    FrontPage,
    /// A provider-backed item detail: `/{slug_base}/{slug}/`.
    Artifact { item_type: String, slug: String },
    /// A markdown page at the given canonical route.
    Page { route: String },
}

/// Map each registered slug base to its content type id.
#[must_use]
pub fn slug_base_index(registry: &ProviderRegistry) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for item_type in registry.types() {
        if let Some(config) = registry.get(&item_type).and_then(|p| p.type_config(&item_type)) {
            index.insert(config.slug_base.clone(), item_type);
        }
    }
    index
}

/// Classify a raw request path.
///
/// `raw` is the catch-all remainder, with or without surrounding slashes.
/// Classification is purely syntactic; the caller still has to look the
/// target up and fall back on a miss.
#[must_use]
pub fn classify_path(raw: &str, slug_bases: &HashMap<String, String>) -> RouteTarget {
    let route = normalize_route(raw);
    if route == "/" {
        return RouteTarget::FrontPage;
    }

    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() == 2
        && let Some(item_type) = slug_bases.get(segments[0])
    {
        return RouteTarget::Artifact {
            item_type: item_type.clone(),
            slug: segments[1].to_owned(),
        };
    }

    RouteTarget::Page { route }
}
