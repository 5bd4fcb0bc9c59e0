//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        .route("/api/status", get(handlers::status::get_status))
        .route("/api/rebuild", post(handlers::status::post_rebuild))
        .route("/api/navigation", get(handlers::navigation::get_navigation));

    // Content catch-all; `/` is the front-page fallback
    let content_routes = Router::new()
        .route("/", get(handlers::pages::get_front_page))
        .route("/{*path}", get(handlers::pages::get_content));

    Router::new()
        .merge(api_routes)
        .merge(content_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
