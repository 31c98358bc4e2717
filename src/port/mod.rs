//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The ledger core talks to persistence only through [`LedgerStore`], so the
//! same transaction logic runs against memory, a JSON file, or SQLite.

mod store;

pub use store::LedgerStore;
