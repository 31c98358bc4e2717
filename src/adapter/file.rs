//! JSON file store with atomic replacement.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::PoolState;
use crate::error::{Error, Result};
use crate::port::LedgerStore;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// On-disk envelope around the pool state.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPool {
    version: u32,
    saved_at: DateTime<Utc>,
    state: PoolState,
}

/// Persists the pool as a pretty-printed JSON document.
///
/// Writes go to a sibling temp file which is synced and then renamed over
/// the target, so readers never observe a partially written ledger. A
/// sibling `.lock` file, created exclusively, keeps concurrent writers from
/// interleaving their check and rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Take the advisory write lock, failing if another writer holds it.
    fn lock(&self) -> Result<WriteLock> {
        let path = self.lock_path();
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(WriteLock { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::StoreLocked { path }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Lock file held for the duration of a save. Removed on drop.
struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove ledger lock file");
        }
    }
}

impl LedgerStore for FileStore {
    fn load(&self) -> Result<PoolState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger file yet, starting empty");
                return Ok(PoolState::default());
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredPool = serde_json::from_str(&contents)?;
        if stored.version != FORMAT_VERSION {
            return Err(Error::Database(format!(
                "unsupported ledger file version {} in {}",
                stored.version,
                self.path.display()
            )));
        }
        Ok(stored.state)
    }

    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()> {
        let stored = StoredPool {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = self.lock()?;
        let found = self.load()?.history.len();
        if found != expected_events {
            return Err(Error::StoreConflict {
                expected: expected_events,
                found,
            });
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, &self.path).map_err(cleanup_and_err)?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
