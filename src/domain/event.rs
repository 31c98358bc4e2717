//! Append-only audit records.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, Nav, ParticipantId, Shares};

/// Kind of ledger mutation an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Deposit,
    Withdraw,
    OpenPosition,
    ClosePosition,
}

impl EventKind {
    /// Stable label used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Deposit => "DEPOSIT",
            EventKind::Withdraw => "WITHDRAW",
            EventKind::OpenPosition => "OPEN_POSITION",
            EventKind::ClosePosition => "CLOSE_POSITION",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one committed mutation.
///
/// Field meaning per kind:
///
/// | kind             | `amount`          | `shares_delta` | `realized_pnl` |
/// |------------------|-------------------|----------------|----------------|
/// | `Deposit`        | cash deposited    | `+minted`      | -              |
/// | `Withdraw`       | cash paid out     | `-burned`      | -              |
/// | `OpenPosition`   | liquidity added   | -              | -              |
/// | `ClosePosition`  | realized balance  | -              | gain or loss   |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    /// 1-based position in the history.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_delta: Option<Shares>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<Decimal>,
    /// NAV the operation executed at.
    pub price: Nav,
    pub resulting_nav: Nav,
    pub resulting_total_shares: Shares,
}

impl LedgerEvent {
    /// Cash amount or zero.
    #[must_use]
    pub fn amount_or_zero(&self) -> Amount {
        self.amount.unwrap_or(Decimal::ZERO)
    }

    /// Share delta or zero.
    #[must_use]
    pub fn shares_delta_or_zero(&self) -> Shares {
        self.shares_delta.unwrap_or(Decimal::ZERO)
    }
}
