//! Navigation API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use trellis_site::NavItem;

use crate::state::AppState;

/// Query parameters for GET /api/navigation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NavigationQuery {
    /// Route to highlight as current in the rendered fragment.
    current: Option<String>,
}

/// Response for GET /api/navigation.
#[derive(Serialize)]
pub(crate) struct NavigationResponse {
    /// Navigation tree items.
    items: Vec<NavItem>,
    /// Rendered HTML fragment, depth-limited per configuration.
    html: String,
}

/// Handle GET /api/navigation.
pub(crate) async fn get_navigation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NavigationQuery>,
) -> Json<NavigationResponse> {
    let items = state.nav.tree();
    let current = query.current.as_deref().unwrap_or("/");
    let html = state.nav.render_html(current, state.nav_max_depth);
    Json(NavigationResponse { items, html })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use trellis_provider::ProviderRegistry;
    use trellis_site::{SiteTree, SiteTreeConfig};

    use crate::hooks::Hooks;

    use super::*;

    fn state(dir: &TempDir) -> Arc<AppState> {
        let site = Arc::new(SiteTree::new(SiteTreeConfig {
            source_dir: dir.path().to_path_buf(),
            cache_dir: None,
            ..Default::default()
        }));
        Arc::new(AppState::new(
            site,
            Arc::new(ProviderRegistry::new()),
            Hooks::default(),
            "0.0.0-test",
        ))
    }

    #[test]
    fn test_current_route_is_highlighted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.md"), "# Home").unwrap();
        std::fs::write(dir.path().join("about.md"), "---\ntitle: About\n---\n").unwrap();

        let query = NavigationQuery {
            current: Some("/about/".to_owned()),
        };
        let response =
            tokio_test::block_on(get_navigation(State(state(&dir)), Query(query)));

        assert!(
            response
                .0
                .html
                .contains("<li class=\"nav-current\"><a href=\"/about/\">About</a>")
        );
    }

    #[test]
    fn test_missing_current_defaults_to_front_page() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.md"), "# Home").unwrap();

        let response = tokio_test::block_on(get_navigation(
            State(state(&dir)),
            Query(NavigationQuery::default()),
        ));

        assert!(
            response
                .0
                .html
                .contains("<li class=\"nav-current\"><a href=\"/\">Home</a>")
        );
    }

    #[test]
    fn test_navigation_response_serialization() {
        let response = NavigationResponse {
            items: vec![NavItem {
                title: "Guides".to_string(),
                route: "/guides/".to_string(),
                url: "/guides/".to_string(),
                depth: 1,
                access_level: "public".to_string(),
                children: vec![],
            }],
            html: "<ul class=\"trellis-nav\"></ul>".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["items"][0]["title"], "Guides");
        assert_eq!(json["items"][0]["route"], "/guides/");
    }
}
