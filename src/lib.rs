//! Sharepool - a share-based pool ledger.
//!
//! Participants deposit cash into a common pool and receive shares priced at
//! the pool's net asset value (NAV). The pool can commit cash to one
//! position at a time; when the position closes, the realized gain or loss
//! changes the NAV and is shared pro-rata by every holder. Redemptions burn
//! shares at the prevailing NAV and are paid from liquid cash only.
//!
//! # Modules
//!
//! - [`domain`] - Pool state, NAV, reports, history replay. No I/O.
//! - [`ledger`] - Transactional operations with a single-writer commit path
//! - [`port`] - The [`LedgerStore`](port::LedgerStore) persistence trait
//! - [`adapter`] - Memory, JSON file and SQLite stores
//! - [`config`] - TOML configuration and logging setup
//! - [`cli`] - The `sharepool` command-line front end
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use sharepool::adapter::MemoryStore;
//! use sharepool::ledger::Ledger;
//!
//! let ledger = Ledger::open(MemoryStore::new())?;
//! ledger.deposit("alice", dec!(100))?;
//! let summary = ledger.pool_summary()?;
//! assert_eq!(summary.nav, dec!(1));
//! # Ok::<(), sharepool::error::Error>(())
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
