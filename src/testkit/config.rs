//! Canonical test configurations.

use std::path::Path;

use crate::config::{Config, StoreConfig};

/// Config persisting to a JSON file at `path`.
pub fn file_store(path: &Path) -> Config {
    Config {
        store: StoreConfig::File {
            path: path.to_path_buf(),
        },
        ..Config::default()
    }
}

/// Config persisting to a SQLite database at `path`.
pub fn sqlite_store(path: &Path) -> Config {
    Config {
        store: StoreConfig::Sqlite {
            path: path.to_path_buf(),
        },
        ..Config::default()
    }
}

/// TOML text selecting `store_type` at `path`, for CLI tests.
pub fn store_toml(store_type: &str, path: &Path) -> String {
    // Literal string: backslashes in Windows paths are kept verbatim.
    format!(
        "[pool]\nname = \"test\"\n\n[store]\ntype = \"{store_type}\"\npath = '{}'\n",
        path.display()
    )
}
