//! Status and administration endpoints.
//!
//! `GET /api/status` reports overall health; `POST /api/rebuild` drops the
//! tree and navigation caches and reruns construction unconditionally.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use trellis_provider::RegistryStats;
use trellis_site::TreeStats;

use crate::state::AppState;

/// Overall service status.
///
/// `inactive` means the engine cannot serve at all (bad or missing
/// configuration); `degraded` means it serves but the content is
/// structurally unsound; `structurally_up` is the healthy state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ServiceStatus {
    Inactive,
    Degraded,
    StructurallyUp,
}

/// Response for GET /api/status.
#[derive(Serialize)]
pub(crate) struct StatusResponse {
    status: ServiceStatus,
    config_valid: bool,
    content_root_set: bool,
    tree: TreeStats,
    registry: RegistryStats,
    warnings: Vec<String>,
}

/// Response for POST /api/rebuild.
#[derive(Serialize)]
pub(crate) struct RebuildResponse {
    rebuilt: bool,
    tree: TreeStats,
}

fn build_report(state: &AppState) -> StatusResponse {
    // Force a build so the report reflects current content, not a stale
    // unbuilt default.
    let tree = state.site.tree();
    let stats = state.site.stats();

    let mut warnings = Vec::new();
    if !state.config_valid {
        warnings.push("configuration failed validation".to_owned());
    }
    if !state.content_root_set {
        warnings.push("no content root configured".to_owned());
    }
    if stats.pages == 0 {
        warnings.push("content tree is empty".to_owned());
    }
    if let Some(error) = &stats.last_error {
        warnings.push(format!("last build failed: {error}"));
    }
    let mut untitled: Vec<&str> = tree
        .pages()
        .values()
        .filter(|page| page.title.trim().is_empty())
        .map(|page| page.route.as_str())
        .collect();
    untitled.sort_unstable();
    for route in untitled {
        warnings.push(format!("page {route} has an empty title"));
    }

    let status = if !state.config_valid || !state.content_root_set {
        ServiceStatus::Inactive
    } else if !warnings.is_empty() {
        ServiceStatus::Degraded
    } else {
        ServiceStatus::StructurallyUp
    };

    StatusResponse {
        status,
        config_valid: state.config_valid,
        content_root_set: state.content_root_set,
        tree: stats,
        registry: state.registry.stats(),
        warnings,
    }
}

/// Handle GET /api/status.
pub(crate) async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(build_report(&state))
}

/// Handle POST /api/rebuild.
pub(crate) async fn post_rebuild(State(state): State<Arc<AppState>>) -> Json<RebuildResponse> {
    tracing::info!("Rebuild requested");
    state.nav.invalidate();
    state.site.rebuild();
    state.sync_menu();

    Json(RebuildResponse {
        rebuilt: true,
        tree: state.site.stats(),
    })
}
