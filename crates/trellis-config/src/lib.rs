//! Configuration management for Trellis.
//!
//! Parses `trellis.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! Paths support `~` expansion and are resolved relative to the config file's
//! directory.
//!
//! An unset content root is a valid configuration: the engine reports itself
//! `inactive` instead of failing. A root that is set but missing or empty is
//! a build-time problem (`degraded`), not a configuration error. Use
//! [`Config::content_root_state`] to tell the cases apart.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "trellis.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override content source directory.
    pub source_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Content configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Navigation configuration.
    pub nav: NavConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
        }
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    source_dir: Option<String>,
    extension: Option<String>,
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Content root directory. `None` means the engine is not configured.
    pub source_dir: Option<PathBuf>,
    /// Content file extension without the dot.
    pub extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            extension: "md".to_owned(),
        }
    }
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    ttl_secs: Option<u64>,
}

/// Resolved cache configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether file caching is enabled.
    pub enabled: bool,
    /// Cache directory.
    pub dir: PathBuf,
    /// Cache entry lifetime in seconds. `None` means entries never expire.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".trellis/cache"),
            ttl_secs: Some(3600),
        }
    }
}

/// Navigation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Named placement slot for menu sync.
    pub menu_slot: String,
    /// Maximum nesting depth in rendered navigation.
    pub max_depth: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            menu_slot: "main".to_owned(),
            max_depth: 3,
        }
    }
}

/// State of the configured content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRootState {
    /// No root configured; the engine is inactive by design.
    Unset,
    /// Root configured but absent or not a directory; builds will degrade.
    Missing(PathBuf),
    /// Root exists and is a directory.
    Ready(PathBuf),
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `trellis.toml` in current directory and
    /// parents, falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading and path resolution, so CLI
    /// arguments take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist or parsing
    /// fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Resolve raw string paths against the config file's directory.
    fn resolve_paths(&mut self, base: &Path) {
        self.content_resolved = ContentConfig {
            source_dir: self
                .content
                .source_dir
                .as_deref()
                .map(|dir| resolve_path(dir, base)),
            extension: self
                .content
                .extension
                .clone()
                .unwrap_or_else(|| "md".to_owned()),
        };

        let defaults = CacheConfig::default();
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(defaults.enabled),
            dir: self
                .cache
                .dir
                .as_deref()
                .map_or_else(|| base.join(defaults.dir.clone()), |dir| resolve_path(dir, base)),
            ttl_secs: self.cache.ttl_secs.or(defaults.ttl_secs),
        };
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.content_resolved.source_dir = Some(source_dir.clone());
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
    }

    /// Validate configuration values.
    ///
    /// An unset content root passes validation; only values that can never
    /// work are rejected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        require_non_empty(&self.content_resolved.extension, "content.extension")?;
        if self.content_resolved.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "content.extension must not include the dot".to_owned(),
            ));
        }

        require_non_empty(&self.nav.menu_slot, "nav.menu_slot")?;
        if self.nav.max_depth == 0 {
            return Err(ConfigError::Validation(
                "nav.max_depth must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Classify the content root for the status surface.
    #[must_use]
    pub fn content_root_state(&self) -> ContentRootState {
        match &self.content_resolved.source_dir {
            None => ContentRootState::Unset,
            Some(dir) if dir.is_dir() => ContentRootState::Ready(dir.clone()),
            Some(dir) => ContentRootState::Missing(dir.clone()),
        }
    }

    /// Cache directory when caching is enabled.
    #[must_use]
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_resolved
            .enabled
            .then(|| self.cache_resolved.dir.clone())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            content: ContentConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            nav: NavConfig::default(),
            content_resolved: ContentConfig::default(),
            cache_resolved: CacheConfig {
                dir: base.join(".trellis/cache"),
                ..Default::default()
            },
            config_path: None,
        }
    }
}

/// Expand `~` and resolve a possibly relative path against a base directory.
fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load_toml(content: &str) -> Config {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        Config::load(Some(&path), None).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7878);
        assert_eq!(config.content_resolved.extension, "md");
        assert!(config.content_resolved.source_dir.is_none());
        assert!(config.cache_resolved.enabled);
        assert_eq!(config.nav.menu_slot, "main");
        assert_eq!(config.nav.max_depth, 3);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/trellis.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_full_config() {
        let config = load_toml(
            r#"
[server]
host = "0.0.0.0"
port = 9000

[content]
source_dir = "content"
extension = "markdown"

[cache]
enabled = false
ttl_secs = 120

[nav]
menu_slot = "primary"
max_depth = 5
"#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.content_resolved.extension, "markdown");
        assert!(config.content_resolved.source_dir.is_some());
        assert!(!config.cache_resolved.enabled);
        assert_eq!(config.cache_resolved.ttl_secs, Some(120));
        assert_eq!(config.nav.menu_slot, "primary");
        assert_eq!(config.nav.max_depth, 5);
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[content]\nsource_dir = \"content\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(
            config.content_resolved.source_dir,
            Some(temp_dir.path().join("content"))
        );
        assert_eq!(
            config.cache_resolved.dir,
            temp_dir.path().join(".trellis/cache")
        );
    }

    #[test]
    fn test_cli_settings_override_file_values() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[server]\nhost = \"10.0.0.1\"\nport = 9000\n").unwrap();

        let settings = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(4000),
            source_dir: Some(PathBuf::from("/srv/content")),
            cache_enabled: Some(false),
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(
            config.content_resolved.source_dir,
            Some(PathBuf::from("/srv/content"))
        );
        assert!(!config.cache_resolved.enabled);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[server]\nport = 0\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[content]\nextension = \".md\"\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_nav_depth() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[nav]\nmax_depth = 0\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_content_root_state_unset() {
        let config = Config::default();
        assert_eq!(config.content_root_state(), ContentRootState::Unset);
    }

    #[test]
    fn test_content_root_state_missing_vs_ready() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing = temp_dir.path().join("content");
        fs::create_dir(&existing).unwrap();

        let mut config = Config::default();
        config.content_resolved.source_dir = Some(existing.clone());
        assert_eq!(
            config.content_root_state(),
            ContentRootState::Ready(existing)
        );

        let missing = temp_dir.path().join("absent");
        config.content_resolved.source_dir = Some(missing.clone());
        assert_eq!(
            config.content_root_state(),
            ContentRootState::Missing(missing)
        );
    }

    #[test]
    fn test_cache_dir_none_when_disabled() {
        let mut config = Config::default();
        assert!(config.cache_dir().is_some());

        config.cache_resolved.enabled = false;
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn test_wrong_value_type_is_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[content]\nsource_dir = 42\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }
}
