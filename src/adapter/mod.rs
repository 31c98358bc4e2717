//! Outbound persistence adapters implementing [`LedgerStore`].
//!
//! [`LedgerStore`]: crate::port::LedgerStore

mod file;
mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::port::LedgerStore;

/// Build the store selected by configuration.
///
/// # Errors
/// Returns an error if the backing file or database cannot be prepared.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn LedgerStore>> {
    let store: Box<dyn LedgerStore> = match config {
        StoreConfig::Memory => Box::new(MemoryStore::new()),
        StoreConfig::File { path } => Box::new(FileStore::new(path.clone())),
        StoreConfig::Sqlite { path } => Box::new(SqliteStore::open(path)?),
    };
    debug!(store = %store.describe(), "Store ready");
    Ok(store)
}
