//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::pool_state;

/// The single row holding the serialized pool.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = pool_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PoolStateRow {
    pub id: i32,
    /// JSON-encoded `PoolState`.
    pub body: String,
    pub version: i32,
    /// History length, kept in a column for inspection with the sqlite shell.
    pub event_count: i64,
    pub updated_at: String,
}
