//! Default locations for sharepool data.
//!
//! Everything lives under `~/.sharepool/`:
//! - `~/.sharepool/config.toml` - configuration
//! - `~/.sharepool/pool.json` - file store
//! - `~/.sharepool/pool.db` - SQLite store

use std::path::PathBuf;

/// Returns the sharepool home directory (`~/.sharepool/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sharepool")
}

/// Returns the default config file path (`~/.sharepool/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default file store path (`~/.sharepool/pool.json`).
pub fn default_state_file() -> PathBuf {
    home_dir().join("pool.json")
}

/// Returns the default database path (`~/.sharepool/pool.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("pool.db")
}
