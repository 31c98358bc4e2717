//! In-memory store, for tests and throwaway sessions.

use parking_lot::Mutex;

use crate::domain::PoolState;
use crate::error::{Error, Result};
use crate::port::LedgerStore;

/// Keeps the last saved state in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PoolState>,
    saves: Mutex<u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, e.g. one built by a test fixture.
    #[must_use]
    pub fn with_state(state: PoolState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful saves since creation.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        *self.saves.lock()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<PoolState> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, state: &PoolState, expected_events: usize) -> Result<()> {
        let mut stored = self.state.lock();
        let found = stored.history.len();
        if found != expected_events {
            return Err(Error::StoreConflict {
                expected: expected_events,
                found,
            });
        }
        *stored = state.clone();
        *self.saves.lock() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
