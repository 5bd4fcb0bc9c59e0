//! `trellis rebuild` command implementation.

use std::path::PathBuf;

use clap::Args;
use trellis_config::{Config, ContentRootState};
use trellis_site::{SiteTree, SiteTreeConfig};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the rebuild command.
#[derive(Args)]
pub(crate) struct RebuildArgs {
    /// Path to configuration file (default: auto-discover trellis.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl RebuildArgs {
    /// Execute the rebuild command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading fails, no content root is
    /// configured, or the rebuild produces no pages.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        let source_dir = match config.content_root_state() {
            ContentRootState::Unset => {
                return Err(CliError::Server(
                    "no content root configured, nothing to rebuild".to_owned(),
                ));
            }
            ContentRootState::Missing(dir) | ContentRootState::Ready(dir) => dir,
        };

        let site = SiteTree::new(SiteTreeConfig {
            source_dir,
            extension: config.content_resolved.extension.clone(),
            cache_dir: config.cache_dir(),
            version: version.to_owned(),
            ttl_secs: config.cache_resolved.ttl_secs,
        });

        output.info("Rebuilding page tree...");
        site.rebuild();
        let stats = site.stats();

        if let Some(error) = &stats.last_error {
            output.error(&format!("Rebuild failed: {error}"));
            return Err(CliError::Server(error.clone()));
        }

        output.success(&format!(
            "Rebuilt {} pages ({} roots)",
            stats.pages, stats.roots
        ));
        Ok(())
    }
}
