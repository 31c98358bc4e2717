//! SQLite ledger store implementation.

use std::fs;
use std::path::Path;

use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::connection::{configure_sqlite_connection, create_pool, run_migrations, DbPool};
use super::model::PoolStateRow;
use super::schema::pool_state;
use crate::domain::PoolState;
use crate::error::{Error, Result};
use crate::port::LedgerStore;

/// Primary key of the only row.
const ROW_ID: i32 = 1;

/// Current body format version.
const BODY_VERSION: i32 = 1;

/// SQLite-backed ledger store.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
    location: String,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the directory, pool, or migrations fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let url = path.to_string_lossy().into_owned();
        let pool = create_pool(&url)?;
        Self::with_pool(pool, url)
    }

    /// Private in-memory database, mostly for tests.
    ///
    /// # Errors
    /// Returns an error if the pool or migrations fail.
    pub fn in_memory() -> Result<Self> {
        let pool = create_pool(":memory:")?;
        Self::with_pool(pool, ":memory:".to_string())
    }

    /// Wrap an existing pool, applying pending migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub fn with_pool(pool: DbPool, location: impl Into<String>) -> Result<Self> {
        run_migrations(&pool)?;
        Ok(Self {
            pool,
            location: location.into(),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut SqliteConnection) -> Result<T>) -> Result<T> {
        let mut conn = self.pool.get()?;
        configure_sqlite_connection(&mut conn)?;
        f(&mut conn)
    }

    fn to_row(state: &PoolState) -> Result<PoolStateRow> {
        Ok(PoolStateRow {
            id: ROW_ID,
            body: serde_json::to_string(state)?,
            version: BODY_VERSION,
            event_count: i64::try_from(state.history.len())
                .map_err(|e| Error::Database(e.to_string()))?,
            updated_at: Utc::now().to_rfc3339(),
        })
    }

    fn from_row(row: PoolStateRow) -> Result<PoolState> {
        if row.version != BODY_VERSION {
            return Err(Error::Database(format!(
                "unsupported pool_state version {}",
                row.version
            )));
        }
        Ok(serde_json::from_str(&row.body)?)
    }
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> Result<PoolState> {
        let row = self.with_conn(|conn| {
            Ok(pool_state::table
                .find(ROW_ID)
                .select(PoolStateRow::as_select())
                .first(conn)
                .optional()?)
        })?;

        row.map(Self::from_row)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()> {
        let row = Self::to_row(state)?;
        self.with_conn(|conn| {
            // The immediate transaction takes the write lock before the
            // check, so no other writer can slip in between.
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let stored: Option<i64> = pool_state::table
                    .find(ROW_ID)
                    .select(pool_state::event_count)
                    .first(conn)
                    .optional()?;
                let found = stored
                    .map(usize::try_from)
                    .transpose()
                    .map_err(|e| Error::Database(e.to_string()))?
                    .unwrap_or(0);
                if found != expected_events {
                    return Err(Error::StoreConflict {
                        expected: expected_events,
                        found,
                    });
                }

                diesel::replace_into(pool_state::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}
