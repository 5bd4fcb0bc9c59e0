//! `trellis serve` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use trellis_config::{CliSettings, Config};
use trellis_provider::ProviderRegistry;
use trellis_server::{Hooks, run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover trellis.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable caching (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable caching.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        // Resolve flags before moving into CliSettings
        let cache_enabled = self.resolve_cache_enabled();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            source_dir: self.source_dir,
            cache_enabled,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        match &config.content_resolved.source_dir {
            Some(dir) => output.info(&format!("Content directory: {}", dir.display())),
            None => output.warning("No content directory configured, engine will be inactive"),
        }

        if let Some(cache_dir) = config.cache_dir() {
            ensure_cache_dir(&cache_dir)?;
            output.info(&format!("Cache directory: {}", cache_dir.display()));
        } else {
            output.info("Cache: disabled");
        }

        // Providers are registered by deployments embedding the server crate;
        // the stock binary serves pages only.
        let registry = Arc::new(ProviderRegistry::new());

        // The stock binary has no host menu to mirror into
        let server_config = server_config_from_config(&config, version.to_owned());
        run_server(server_config, registry, Hooks::default(), None)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }
}

/// Ensure the cache directory exists with a `.gitignore`.
fn ensure_cache_dir(cache_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(cache_dir)?;

    let gitignore_path = cache_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by trellis\n*\n");
    }

    Ok(())
}
