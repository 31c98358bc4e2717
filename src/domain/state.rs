//! Pool state and its invariants.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::{Account, Amount, EventKind, LedgerEvent, ParticipantId, Shares};

/// Whether the pool has capital committed to its single position.
///
/// A tagged state instead of a flag plus a mark value, so an idle pool can
/// never carry a non-zero mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Idle,
    Open {
        /// Mark value of the position, in cash units.
        mark: Amount,
        /// Sequence number of the event that opened it.
        opened_seq: u64,
    },
}

impl PositionState {
    /// Returns true if a position is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open { .. })
    }

    /// Mark value of the open position, zero when idle.
    #[must_use]
    pub fn mark(&self) -> Amount {
        match self {
            PositionState::Idle => Decimal::ZERO,
            PositionState::Open { mark, .. } => *mark,
        }
    }

    /// Sequence number of the opening event, if open.
    #[must_use]
    pub fn opened_seq(&self) -> Option<u64> {
        match self {
            PositionState::Idle => None,
            PositionState::Open { opened_seq, .. } => Some(*opened_seq),
        }
    }
}

/// Complete state of one pool. Stores persist and replace it as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub cash: Amount,
    #[serde(default)]
    pub position: PositionState,
    pub total_shares: Shares,
    #[serde(default)]
    pub accounts: BTreeMap<ParticipantId, Account>,
    #[serde(default)]
    pub history: Vec<LedgerEvent>,
}

impl PoolState {
    /// Mark value of the open position, zero when idle.
    #[must_use]
    pub fn position_mark(&self) -> Amount {
        self.position.mark()
    }

    #[must_use]
    pub fn has_open_position(&self) -> bool {
        self.position.is_open()
    }

    #[must_use]
    pub fn account(&self, participant: &ParticipantId) -> Option<&Account> {
        self.accounts.get(participant)
    }

    /// Sequence number the next appended event will carry.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.history.len() as u64 + 1
    }

    /// Most recent `limit` events, oldest first.
    #[must_use]
    pub fn recent_history(&self, limit: usize) -> &[LedgerEvent] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    /// Check the structural invariants of the state.
    ///
    /// Verifies share conservation and non-negativity of every balance. Also
    /// checks history sequence contiguity, that the position state agrees
    /// with the last open/close event, and that NAV is defined.
    ///
    /// # Errors
    /// Returns [`LedgerError::CorruptLedger`] naming the first violation.
    pub fn verify(&self) -> Result<(), LedgerError> {
        if self.cash < Decimal::ZERO {
            return Err(LedgerError::corrupt(format!("negative cash {}", self.cash)));
        }
        let mark = self.position_mark();
        if mark < Decimal::ZERO {
            return Err(LedgerError::corrupt(format!("negative position mark {mark}")));
        }
        if self.total_shares < Decimal::ZERO {
            return Err(LedgerError::corrupt(format!(
                "negative total shares {}",
                self.total_shares
            )));
        }

        let mut sum = Decimal::ZERO;
        for (participant, account) in &self.accounts {
            for (field, value) in [
                ("shares", account.shares),
                ("total_deposited", account.total_deposited),
                ("total_withdrawn", account.total_withdrawn),
            ] {
                if value < Decimal::ZERO {
                    return Err(LedgerError::corrupt(format!(
                        "negative {field} {value} for {participant}"
                    )));
                }
            }
            sum = sum
                .checked_add(account.shares)
                .ok_or_else(|| LedgerError::corrupt("share sum overflows"))?;
        }
        if sum != self.total_shares {
            return Err(LedgerError::corrupt(format!(
                "total shares {} does not equal sum of account shares {sum}",
                self.total_shares
            )));
        }

        for (index, event) in self.history.iter().enumerate() {
            let expected = index as u64 + 1;
            if event.seq != expected {
                return Err(LedgerError::corrupt(format!(
                    "history out of order: event at position {expected} has seq {}",
                    event.seq
                )));
            }
        }

        let last_position_event = self.history.iter().rev().find(|e| {
            matches!(e.kind, EventKind::OpenPosition | EventKind::ClosePosition)
        });
        let expected_open = match last_position_event {
            Some(event) if event.kind == EventKind::OpenPosition => Some(event.seq),
            _ => None,
        };
        if expected_open != self.position.opened_seq() {
            return Err(LedgerError::corrupt(format!(
                "position state {:?} disagrees with history (expected open at {:?})",
                self.position, expected_open
            )));
        }

        // Assets nobody owns make the share price undefined.
        super::nav::compute_nav(self)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn event(seq: u64, kind: EventKind) -> LedgerEvent {
        LedgerEvent {
            id: Uuid::new_v4(),
            seq,
            timestamp: Utc::now(),
            kind,
            participant: None,
            amount: None,
            shares_delta: None,
            realized_pnl: None,
            price: dec!(1),
            resulting_nav: dec!(1),
            resulting_total_shares: dec!(0),
        }
    }

    fn funded_state() -> PoolState {
        let mut state = PoolState {
            cash: dec!(300),
            total_shares: dec!(300),
            ..PoolState::default()
        };
        state.accounts.insert(
            ParticipantId::new("alice"),
            Account {
                shares: dec!(100),
                total_deposited: dec!(100),
                total_withdrawn: dec!(0),
            },
        );
        state.accounts.insert(
            ParticipantId::new("bob"),
            Account {
                shares: dec!(200),
                total_deposited: dec!(200),
                total_withdrawn: dec!(0),
            },
        );
        state.history = vec![event(1, EventKind::Deposit), event(2, EventKind::Deposit)];
        state
    }

    #[test]
    fn default_state_is_seeded_and_valid() {
        let state = PoolState::default();
        assert_eq!(state.cash, dec!(0));
        assert!(!state.has_open_position());
        assert_eq!(state.position_mark(), dec!(0));
        assert_eq!(state.next_seq(), 1);
        assert!(state.verify().is_ok());
    }

    #[test]
    fn funded_state_verifies() {
        assert!(funded_state().verify().is_ok());
    }

    #[test]
    fn verify_rejects_share_drift() {
        let mut state = funded_state();
        state.total_shares = dec!(301);
        let err = state.verify().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("sum of account shares"));
    }

    #[test]
    fn verify_rejects_negative_cash() {
        let mut state = funded_state();
        state.cash = dec!(-0.01);
        assert!(state.verify().unwrap_err().to_string().contains("negative cash"));
    }

    #[test]
    fn verify_rejects_negative_account_fields() {
        let mut state = funded_state();
        if let Some(account) = state.accounts.get_mut(&ParticipantId::new("alice")) {
            account.total_withdrawn = dec!(-1);
        }
        assert!(state
            .verify()
            .unwrap_err()
            .to_string()
            .contains("negative total_withdrawn"));
    }

    #[test]
    fn verify_rejects_gapped_history() {
        let mut state = funded_state();
        state.history[1].seq = 5;
        assert!(state.verify().unwrap_err().to_string().contains("out of order"));
    }

    #[test]
    fn verify_requires_position_to_match_history() {
        let mut state = funded_state();
        state.history.push(event(3, EventKind::OpenPosition));
        assert!(state.verify().is_err());

        state.cash = dec!(180);
        state.position = PositionState::Open {
            mark: dec!(120),
            opened_seq: 3,
        };
        assert!(state.verify().is_ok());

        state.position = PositionState::Open {
            mark: dec!(120),
            opened_seq: 2,
        };
        assert!(state.verify().is_err());
    }

    #[test]
    fn verify_rejects_unowned_assets() {
        let state = PoolState {
            cash: dec!(10),
            ..PoolState::default()
        };
        assert!(state.verify().unwrap_err().to_string().contains("no shares outstanding"));
    }

    #[test]
    fn position_state_accessors() {
        let open = PositionState::Open {
            mark: dec!(50),
            opened_seq: 7,
        };
        assert!(open.is_open());
        assert_eq!(open.mark(), dec!(50));
        assert_eq!(open.opened_seq(), Some(7));
        assert_eq!(PositionState::Idle.mark(), dec!(0));
        assert_eq!(PositionState::Idle.opened_seq(), None);
    }

    #[test]
    fn recent_history_returns_tail() {
        let state = funded_state();
        assert_eq!(state.recent_history(1).len(), 1);
        assert_eq!(state.recent_history(1)[0].seq, 2);
        assert_eq!(state.recent_history(10).len(), 2);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = funded_state();
        state.history.push(event(3, EventKind::OpenPosition));
        state.position = PositionState::Open {
            mark: dec!(120),
            opened_seq: 3,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: PoolState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
