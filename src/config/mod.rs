//! Application configuration loading and validation.
//!
//! Configuration is read from a TOML file. Every section is optional:
//!
//! ```toml
//! [pool]
//! name = "club"
//!
//! [store]
//! type = "sqlite"          # memory | file | sqlite
//! path = "/var/lib/sharepool/club.db"
//!
//! [logging]
//! level = "info"
//! format = "json"          # pretty | json
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};

mod logging;
pub mod paths;

pub use logging::{LogFormat, LoggingConfig};

/// Pool identity and presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Display name used in logs and reports.
    pub name: String,
    /// Default number of events shown by `history`.
    pub history_limit: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            history_limit: 20,
        }
    }
}

/// Where the pool state is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process memory only. Nothing survives exit.
    Memory,
    /// JSON document replaced atomically on every commit.
    File {
        #[serde(default = "paths::default_state_file")]
        path: PathBuf,
    },
    /// Single-row SQLite database.
    Sqlite {
        #[serde(default = "paths::default_database")]
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::File {
            path: paths::default_state_file(),
        }
    }
}

impl StoreConfig {
    /// Backing path for persistent stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreConfig::Memory => None,
            StoreConfig::File { path } | StoreConfig::Sqlite { path } => Some(path),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Read, parse and validate the config file at `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if parsing or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given; otherwise the default config file if it
    /// exists, or built-in defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if an explicit or existing file is invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = paths::default_config();
        if default_path.is_file() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.pool.name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "pool.name" }.into());
        }
        if self.pool.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.history_limit",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if let Some(path) = self.store.path() {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingField { field: "store.path" }.into());
            }
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: e.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
