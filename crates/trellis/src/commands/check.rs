//! `trellis check` command implementation.

use std::path::PathBuf;

use clap::Args;
use trellis_config::{Config, ContentRootState};
use trellis_site::{SiteTree, SiteTreeConfig};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover trellis.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// Prints the status report and exits non-zero when the site is not
    /// structurally up.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading fails or the site is
    /// inactive or degraded.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        output.highlight("Trellis status");
        output.separator();

        let config_valid = match config.validate() {
            Ok(()) => {
                output.success("Configuration: valid");
                true
            }
            Err(e) => {
                output.error(&format!("Configuration: {e}"));
                false
            }
        };

        let source_dir = match config.content_root_state() {
            ContentRootState::Unset => {
                output.error("Content root: not configured (inactive)");
                return Err(CliError::Server("site is inactive".to_owned()));
            }
            ContentRootState::Missing(dir) => {
                output.warning(&format!(
                    "Content root: {} does not exist (builds degrade)",
                    dir.display()
                ));
                dir
            }
            ContentRootState::Ready(dir) => {
                output.success(&format!("Content root: {}", dir.display()));
                dir
            }
        };

        // Build without the cache so the report reflects the sources on disk.
        let site = SiteTree::new(SiteTreeConfig {
            source_dir,
            extension: config.content_resolved.extension.clone(),
            cache_dir: None,
            version: version.to_owned(),
            ttl_secs: None,
        });
        let tree = site.tree();
        let stats = site.stats();

        output.info(&format!(
            "Pages: {} ({} roots)",
            stats.pages, stats.roots
        ));

        let mut warnings = Vec::new();
        if stats.pages == 0 {
            warnings.push("content tree is empty".to_owned());
        }
        if let Some(error) = &stats.last_error {
            warnings.push(format!("last build failed: {error}"));
        }
        for page in tree.pages().values() {
            if page.title.trim().is_empty() {
                warnings.push(format!("page {} has an empty title", page.route));
            }
        }
        warnings.sort();

        for warning in &warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        output.separator();
        if config_valid && warnings.is_empty() {
            output.success("Status: structurally_up");
            Ok(())
        } else if config_valid {
            output.warning("Status: degraded");
            Err(CliError::Server("site is degraded".to_owned()))
        } else {
            output.error("Status: inactive");
            Err(CliError::Server("site is inactive".to_owned()))
        }
    }
}
