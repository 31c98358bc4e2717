//! Receipts returned by committed ledger operations.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Account, Amount, EventKind, LedgerEvent, Nav, PositionState, Shares};

/// Proof of a committed mutation: the appended event plus the balances it
/// left behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub event: LedgerEvent,
    /// The participant's account after the operation, for deposits and
    /// withdrawals.
    pub account: Option<Account>,
    pub cash: Amount,
    pub position: PositionState,
}

impl Receipt {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.event.seq
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// NAV the operation executed at.
    #[must_use]
    pub fn price(&self) -> Nav {
        self.event.price
    }

    /// NAV after the operation.
    #[must_use]
    pub fn nav(&self) -> Nav {
        self.event.resulting_nav
    }

    /// Cash moved: deposited, paid out, committed, or realized.
    #[must_use]
    pub fn amount(&self) -> Amount {
        self.event.amount_or_zero()
    }

    /// Signed share change for the participant.
    #[must_use]
    pub fn shares_delta(&self) -> Shares {
        self.event.shares_delta_or_zero()
    }

    #[must_use]
    pub fn realized_pnl(&self) -> Option<Decimal> {
        self.event.realized_pnl
    }

    #[must_use]
    pub fn total_shares(&self) -> Shares {
        self.event.resulting_total_shares
    }
}
