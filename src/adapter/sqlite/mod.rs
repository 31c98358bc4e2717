//! SQLite persistence using Diesel ORM.
//!
//! The whole pool state lives in one row that is replaced inside an
//! immediate transaction, which gives the same all-or-nothing save as the
//! file store while letting several processes share a database.

pub mod connection;
pub mod model;
pub mod schema;
mod store;

pub use store::SqliteStore;
