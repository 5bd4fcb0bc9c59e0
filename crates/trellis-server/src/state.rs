//! Shared application state.

use std::sync::Arc;

use trellis_provider::ProviderRegistry;
use trellis_site::{MenuSink, Navigation, SiteTree};

use crate::hooks::Hooks;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Page tree with cached snapshots.
    pub site: Arc<SiteTree>,
    /// Navigation projection over the tree.
    pub nav: Arc<Navigation>,
    /// Content providers keyed by type.
    pub registry: Arc<ProviderRegistry>,
    /// Deployment extension hooks.
    pub hooks: Arc<Hooks>,
    /// Engine version, folded into ETags.
    pub version: String,
    /// Depth limit for rendered navigation.
    pub nav_max_depth: usize,
    /// Whether startup configuration validated cleanly.
    pub config_valid: bool,
    /// Whether a content root is configured at all.
    pub content_root_set: bool,
    /// Host menu integration, when the deployment provides one.
    pub menu_sink: Option<Arc<dyn MenuSink>>,
    /// Menu placement slot mirrored on rebuilds.
    pub menu_slot: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        site: Arc<SiteTree>,
        registry: Arc<ProviderRegistry>,
        hooks: Hooks,
        version: &str,
    ) -> Self {
        let nav = Arc::new(Navigation::new(Arc::clone(&site)));
        Self {
            site,
            nav,
            registry,
            hooks: Arc::new(hooks),
            version: version.to_owned(),
            nav_max_depth: 3,
            config_valid: true,
            content_root_set: true,
            menu_sink: None,
            menu_slot: "main".to_owned(),
        }
    }

    #[must_use]
    pub fn with_nav_max_depth(mut self, depth: usize) -> Self {
        self.nav_max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_config_valid(mut self, valid: bool) -> Self {
        self.config_valid = valid;
        self
    }

    #[must_use]
    pub fn with_content_root_set(mut self, set: bool) -> Self {
        self.content_root_set = set;
        self
    }

    #[must_use]
    pub fn with_menu_sink(mut self, sink: Option<Arc<dyn MenuSink>>, slot: &str) -> Self {
        self.menu_sink = sink;
        self.menu_slot = slot.to_owned();
        self
    }

    /// Mirror the current navigation into the host menu, if a sink is set.
    ///
    /// Sink failures are logged and swallowed; menu sync never takes down a
    /// rebuild or the server.
    pub fn sync_menu(&self) {
        if let Some(sink) = &self.menu_sink
            && let Err(error) = self.nav.sync_menu(sink.as_ref(), &self.menu_slot)
        {
            tracing::warn!(slot = %self.menu_slot, error = %error, "Menu sync failed");
        }
    }
}
