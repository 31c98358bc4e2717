//! Store port for persisting pool state.

use std::sync::Arc;

use crate::domain::PoolState;
use crate::error::Result;

/// Durable home of one pool's state.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `save` replaces the whole state atomically: after a crash, `load`
///   returns either the previous state or the new one, never a mix
/// - `load` on a store that has never been written returns the empty pool
/// - `save` is conditional: several ledgers may share one store, and a
///   writer working from an outdated state must not overwrite a newer one
pub trait LedgerStore: Send + Sync {
    /// Load the last saved state.
    fn load(&self) -> Result<PoolState>;

    /// Replace the stored state with `state`, provided the stored history
    /// still holds `expected_events` events (zero for a fresh store).
    ///
    /// # Errors
    /// [`Error::StoreConflict`](crate::error::Error::StoreConflict) when
    /// the stored history has a different length; I/O or database errors
    /// otherwise.
    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()>;

    /// Short name used in logs.
    fn describe(&self) -> String {
        "store".to_string()
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Box<T> {
    fn load(&self) -> Result<PoolState> {
        (**self).load()
    }

    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()> {
        (**self).save(state, expected_events)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn load(&self) -> Result<PoolState> {
        (**self).load()
    }

    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()> {
        (**self).save(state, expected_events)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
