//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (platform config dir, or an explicit `--config` path)
//! 3. `DUPFIND_*` environment variables (e.g. `DUPFIND_WORKERS=4`)
//!
//! Command-line flags are applied on top by the driver.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{Strategy, DEFAULT_WORKERS};
use crate::scanner::PREFIX_SIZE;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Errors that can occur while loading or saving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The merged configuration could not be extracted.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The platform configuration directory is unknown.
    #[error("Failed to determine project directories")]
    NoConfigDir,

    /// Reading or writing the config file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serializing the configuration failed.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent workers per stage.
    pub workers: usize,
    /// Bytes covered by a partial signature.
    pub prefix_size: usize,
    /// Strategy used in find mode.
    pub strategy: Strategy,
    /// Repetitions per strategy in test mode.
    pub bench_iterations: u32,
    /// Follow symbolic links while enumerating files.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            prefix_size: PREFIX_SIZE,
            strategy: Strategy::Progressive,
            bench_iterations: 2,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults (plus environment) on any error.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from_path(path),
            Err(e) => {
                log::debug!("No config directory ({}), using defaults", e);
                Self::figment(None).extract().unwrap_or_default()
            }
        }
    }

    /// Load the configuration from `path`, falling back to defaults on error.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        match Self::try_load_from_path(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from `path`, reporting errors.
    ///
    /// A missing file is not an error; defaults and environment apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the file or environment holds
    /// values of the wrong type.
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(Some(path))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Save the configuration as TOML to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] when no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("com", "dupfind", "dupfind").ok_or(ConfigError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
