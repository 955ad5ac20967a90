//! Layered configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given
//!    with `--config`
//! 3. `DUPESCAN_*` environment variables (e.g. `DUPESCAN_IO_THREADS=8`)
//! 4. Command-line flags

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::duplicates::{default_io_threads, DEFAULT_PROGRESS_BATCH};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Errors raised while assembling the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or had a wrongly typed value.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing worker threads; 0 picks the machine's available parallelism.
    pub io_threads: usize,
    /// Cache file location; unset means the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
    /// Skip loading and saving the cache.
    pub no_cache: bool,
    /// Completions between progress updates.
    pub progress_batch: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 0,
            cache_path: None,
            no_cache: false,
            progress_batch: DEFAULT_PROGRESS_BATCH,
        }
    }
}

/// Values set on the command line. `None` leaves lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
}

impl Config {
    /// Platform config file location, e.g. `~/.config/dupescan/config.toml`.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupescan", "dupescan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit_path` the file must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any source is invalid.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_overrides(explicit_path, &ConfigOverrides::default())
    }

    /// Like [`load`](Self::load), with command-line values merged last.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any source is invalid.
    pub fn load_with_overrides(
        explicit_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let file = match explicit_path {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_config_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(ref file) = file {
            log::debug!("Reading config from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    /// Worker count with 0 resolved to the machine default.
    #[must_use]
    pub fn resolved_io_threads(&self) -> usize {
        if self.io_threads == 0 {
            default_io_threads()
        } else {
            self.io_threads
        }
    }

    /// Render as TOML, the format the config file uses.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
