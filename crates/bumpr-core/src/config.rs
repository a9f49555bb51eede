//! Configuration loading and discovery.
//!
//! Settings are layered, highest precedence last:
//! 1. Built-in defaults
//! 2. User config from the XDG config directory
//! 3. Project config found by walking up from the working tree
//! 4. Explicit files (`--config`)
//! 5. `BUMPR_*` environment variables
//! 6. Explicit overrides (CLI flags)
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `.bumpr.<ext>` in current directory or any parent
//! - `bumpr.<ext>` in current directory or any parent
//! - `~/.config/bumpr/config.<ext>` (user config)
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use bumpr_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("package type: {}", config.package_type);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Resolved configuration for a single bumpr run.
///
/// Engines read this by value when they are constructed and never write
/// back to it; ecosystem defaults live in each engine's typed settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for log files. Logging goes to stderr only when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Ecosystem identifier selecting the version engine.
    pub package_type: String,
    /// Source control identifier (`default`, `github`, `bitbucket`).
    pub scm: String,
    /// Bump interval: `major`, `minor` or `patch`.
    pub version_bump_type: String,
    /// Version file path, relative to the working tree.
    ///
    /// When unset each engine applies its own default.
    pub version_metadata_path: Option<String>,
    /// `printf`-style template used by the generic engine.
    pub generic_version_template: Option<String>,
    /// Replace only the templated line instead of rewriting the whole file.
    pub generic_merge_version_file: bool,
    /// `owner/name` of the repository on the hosting service.
    pub scm_repo_full_name: Option<String>,
    /// Import path of the Go package (e.g. `github.com/owner/name`).
    pub engine_golang_package_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            package_type: "generic".to_string(),
            scm: "default".to_string(),
            version_bump_type: "patch".to_string(),
            version_metadata_path: None,
            generic_version_template: None,
            generic_merge_version_file: false,
            scm_repo_full_name: None,
            engine_golang_package_path: None,
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::lookup`].
    pub const KEYS: &[&str] = &[
        "log_level",
        "log_dir",
        "package_type",
        "scm",
        "version_bump_type",
        "version_metadata_path",
        "generic_version_template",
        "generic_merge_version_file",
        "scm_repo_full_name",
        "engine_golang_package_path",
    ];

    /// Look up a setting by its string key.
    ///
    /// Returns `None` for unknown keys and unset optional values.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        match value.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Explicit overrides, typically from command-line flags.
///
/// Unset fields leave the lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    /// Override `package_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    /// Override `scm`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm: Option<String>,
    /// Override `version_bump_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_bump_type: Option<String>,
}

impl ConfigOverrides {
    const fn is_empty(&self) -> bool {
        self.package_type.is_none() && self.scm.is_none() && self.version_bump_type.is_none()
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "bumpr";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "BUMPR_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Whether to read `BUMPR_*` environment variables.
    include_env: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load.
    explicit_files: Vec<Utf8PathBuf>,
    /// Highest-precedence values.
    overrides: ConfigOverrides,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            include_env: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
            overrides: ConfigOverrides::default(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/bumpr/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set whether `BUMPR_*` environment variables are applied.
    pub const fn with_env(mut self, include: bool) -> Self {
        self.include_env = include;
        self
    }

    /// Set a boundary marker to stop directory traversal. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Apply explicit overrides on top of every other source.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load configuration, merging all sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            tracing::debug!(path = %project_config, "found project config");
            figment = Self::merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        if self.include_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX));
        }

        if !self.overrides.is_empty() {
            figment = figment.merge(Serialized::defaults(&self.overrides));
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            package_type = %config.package_type,
            scm = %config.scm,
            version_bump_type = %config.version_bump_type,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // the repository root is the last directory searched
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
///
/// Uses the same search as [`ConfigLoader::load`], `.git` boundary included.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new().find_project_config(start.as_ref())
}

/// Get the user config directory path.
///
/// Returns `~/.config/bumpr/` on Linux, `~/Library/Application Support/bumpr/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
