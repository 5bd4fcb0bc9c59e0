//! HTTP server for the Trellis content engine.
//!
//! Serves the page tree, provider-backed listings and detail views, and a
//! small administration surface as JSON:
//! - `GET /` and `GET /{*path}` — content dispatch (artifact, page, front page)
//! - `GET /api/navigation` — navigation projection
//! - `GET /api/status` — health report
//! - `POST /api/rebuild` — drop caches and rebuild
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use trellis_provider::ProviderRegistry;
//! use trellis_server::{Hooks, ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 7878,
//!         source_dir: PathBuf::from("content"),
//!         cache_dir: Some(PathBuf::from(".trellis/cache")),
//!         ..Default::default()
//!     };
//!
//!     let registry = Arc::new(ProviderRegistry::new());
//!     run_server(config, registry, Hooks::default(), None).await.unwrap();
//! }
//! ```

mod access;
mod app;
mod dispatch;
mod error;
mod handlers;
mod hooks;
mod middleware;
mod render;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use trellis_provider::ProviderRegistry;
use trellis_site::{SiteTree, SiteTreeConfig};

pub use access::{AccessDecision, Session, evaluate_access};
pub use hooks::{AccessContext, Hooks};
pub use trellis_site::{MenuEntry, MenuSink, MenuSinkError};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Content source directory.
    pub source_dir: PathBuf,
    /// Content file extension without the dot.
    pub extension: String,
    /// Cache directory (`None` disables caching).
    pub cache_dir: Option<PathBuf>,
    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: Option<u64>,
    /// Navigation render depth limit.
    pub nav_max_depth: usize,
    /// Whether startup configuration validated cleanly.
    pub config_valid: bool,
    /// Whether a content root was configured at all.
    pub content_root_set: bool,
    /// Menu placement slot mirrored through the menu sink.
    pub menu_slot: String,
    /// Application version (for cache invalidation).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            source_dir: PathBuf::from("content"),
            extension: "md".to_string(),
            cache_dir: None,
            cache_ttl_secs: Some(3600),
            nav_max_depth: 3,
            config_valid: true,
            content_root_set: true,
            menu_slot: "main".to_string(),
            version: String::new(),
        }
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the listener fails to bind or the server fails while
/// running.
pub async fn run_server(
    config: ServerConfig,
    registry: Arc<ProviderRegistry>,
    hooks: Hooks,
    menu_sink: Option<Arc<dyn MenuSink>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let site = Arc::new(SiteTree::new(SiteTreeConfig {
        source_dir: config.source_dir.clone(),
        extension: config.extension.clone(),
        cache_dir: config.cache_dir.clone(),
        version: config.version.clone(),
        ttl_secs: config.cache_ttl_secs,
    }));

    let state = Arc::new(
        AppState::new(site, registry, hooks, &config.version)
            .with_nav_max_depth(config.nav_max_depth)
            .with_config_valid(config.config_valid)
            .with_content_root_set(config.content_root_set)
            .with_menu_sink(menu_sink, &config.menu_slot),
    );

    // Build once up front and mirror the menu before taking traffic
    state.site.tree();
    state.sync_menu();

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from a loaded Trellis config file.
#[must_use]
pub fn server_config_from_config(config: &trellis_config::Config, version: String) -> ServerConfig {
    let content_root_set = config.content_resolved.source_dir.is_some();

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        source_dir: config
            .content_resolved
            .source_dir
            .clone()
            .unwrap_or_default(),
        extension: config.content_resolved.extension.clone(),
        cache_dir: config.cache_dir(),
        cache_ttl_secs: config.cache_resolved.ttl_secs,
        nav_max_depth: config.nav.max_depth,
        config_valid: config.validate().is_ok(),
        content_root_set,
        menu_slot: config.nav.menu_slot.clone(),
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_config_maps_fields() {
        let config = trellis_config::Config::default();
        let server = server_config_from_config(&config, "0.3.2".to_owned());

        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 7878);
        assert_eq!(server.extension, "md");
        assert_eq!(server.menu_slot, "main");
        assert!(!server.content_root_set);
        assert_eq!(server.version, "0.3.2");
    }
}
