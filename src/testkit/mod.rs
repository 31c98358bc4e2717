//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`ledger`] - Ledgers pre-loaded with common scenarios.
//! - [`config`] - Canonical test configurations and TOML snippets.

pub mod config;
pub mod ledger;
