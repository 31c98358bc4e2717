//! Ledger errors for rejected operations and broken invariants.
//!
//! Every variant except [`LedgerError::CorruptLedger`] is an ordinary rejected
//! operation: the ledger state is untouched and the message is safe to show
//! to the participant who made the request. `CorruptLedger` means an
//! invariant was found broken at read time and the pool must be reconciled
//! by hand before it accepts further mutations.
//!
//! # Examples
//!
//! ```
//! use sharepool::domain::error::LedgerError;
//! use sharepool::domain::{compute_nav, PoolState};
//! use rust_decimal_macros::dec;
//!
//! let mut state = PoolState::default();
//! state.cash = dec!(5); // assets with no shares outstanding
//!
//! let result = compute_nav(&state);
//! assert!(matches!(result, Err(LedgerError::CorruptLedger { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by ledger operations and invariant checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A cash amount or share count was not strictly positive (or negative
    /// where zero is allowed).
    #[error("invalid amount for {field}: {value}")]
    InvalidAmount {
        field: &'static str,
        value: Decimal,
    },

    /// Participant identifiers must be non-empty.
    #[error("participant id cannot be empty")]
    InvalidParticipant,

    #[error("participant not found: {participant}")]
    ParticipantNotFound { participant: String },

    #[error("insufficient shares for {participant}: requested {requested}, held {held}")]
    InsufficientShares {
        participant: String,
        requested: Decimal,
        held: Decimal,
    },

    /// The pool cannot pay out value locked in an open position.
    #[error("insufficient liquidity: required {required}, available cash {available}")]
    InsufficientLiquidity { required: Decimal, available: Decimal },

    #[error("a position is already open (opened at event #{opened_seq})")]
    PositionAlreadyOpen { opened_seq: u64 },

    #[error("no position is open")]
    NoOpenPosition,

    /// The caller's view of the external cash balance disagrees with the ledger.
    #[error("state mismatch: expected cash {expected}, ledger cash {actual}")]
    StateMismatch { expected: Decimal, actual: Decimal },

    /// A close was addressed to a position other than the one currently open.
    #[error("stale close: position #{supplied} is not open (open position is #{current})")]
    StaleClose { supplied: u64, current: u64 },

    /// Shares are outstanding but the pool is worth nothing, so no price exists.
    #[error("pool is insolvent: {total_shares} shares outstanding at zero net asset value")]
    PoolInsolvent { total_shares: Decimal },

    /// No shares are outstanding, so nobody would own what a position returns.
    #[error("pool has no shares outstanding")]
    EmptyPool,

    #[error("decimal overflow computing {field}")]
    Overflow { field: &'static str },

    /// An invariant violation. Fatal for the pool instance.
    #[error("corrupt ledger: {reason}")]
    CorruptLedger { reason: String },
}

impl LedgerError {
    /// Build a [`LedgerError::CorruptLedger`] from any displayable reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        LedgerError::CorruptLedger {
            reason: reason.into(),
        }
    }

    /// Returns true if this error must halt further mutation of the pool.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::CorruptLedger { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_corrupt_ledger_is_fatal() {
        assert!(LedgerError::corrupt("shares drifted").is_fatal());
        assert!(!LedgerError::NoOpenPosition.is_fatal());
        assert!(!LedgerError::EmptyPool.is_fatal());
        assert!(!LedgerError::InsufficientLiquidity {
            required: dec!(10),
            available: dec!(5),
        }
        .is_fatal());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = LedgerError::InsufficientShares {
            participant: "alice".into(),
            requested: dec!(12.5),
            held: dec!(10),
        };
        assert_eq!(
            err.to_string(),
            "insufficient shares for alice: requested 12.5, held 10"
        );
    }
}
