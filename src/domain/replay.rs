//! Rebuilding pool state from its event history.
//!
//! The history is the audit trail: replaying it from an empty pool must
//! reproduce the live balances exactly. [`audit`] does that and reports the
//! first field that diverges.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::money::{checked_add, checked_sub};
use super::{EventKind, LedgerEvent, PoolState, PositionState};

/// Rebuild a pool state by applying every event in order.
///
/// # Errors
/// Returns [`LedgerError::CorruptLedger`] if an event is malformed for its
/// kind (missing participant or amount, close without open, ...).
pub fn replay(history: &[LedgerEvent]) -> Result<PoolState, LedgerError> {
    let mut state = PoolState::default();

    for event in history {
        apply(&mut state, event).map_err(|err| match err {
            LedgerError::CorruptLedger { reason } => {
                LedgerError::corrupt(format!("event #{}: {reason}", event.seq))
            }
            other => other,
        })?;
        state.history.push(event.clone());
    }

    Ok(state)
}

/// Replay `state.history` and compare the result with `state`.
///
/// # Errors
/// Returns [`LedgerError::CorruptLedger`] naming the first divergent field.
pub fn audit(state: &PoolState) -> Result<(), LedgerError> {
    let rebuilt = replay(&state.history)?;

    if rebuilt.cash != state.cash {
        return Err(LedgerError::corrupt(format!(
            "cash {} does not match history ({})",
            state.cash, rebuilt.cash
        )));
    }
    if rebuilt.position != state.position {
        return Err(LedgerError::corrupt(format!(
            "position {:?} does not match history ({:?})",
            state.position, rebuilt.position
        )));
    }
    if rebuilt.total_shares != state.total_shares {
        return Err(LedgerError::corrupt(format!(
            "total shares {} does not match history ({})",
            state.total_shares, rebuilt.total_shares
        )));
    }
    for (participant, account) in &state.accounts {
        if rebuilt.accounts.get(participant) != Some(account) {
            return Err(LedgerError::corrupt(format!(
                "account {participant} does not match history"
            )));
        }
    }
    if rebuilt.accounts.len() != state.accounts.len() {
        return Err(LedgerError::corrupt(
            "history names participants missing from the ledger",
        ));
    }

    Ok(())
}

fn apply(state: &mut PoolState, event: &LedgerEvent) -> Result<(), LedgerError> {
    let amount = || {
        event
            .amount
            .ok_or_else(|| LedgerError::corrupt(format!("{} without amount", event.kind)))
    };

    match event.kind {
        EventKind::Deposit | EventKind::Withdraw => {
            let participant = event.participant.clone().ok_or_else(|| {
                LedgerError::corrupt(format!("{} without participant", event.kind))
            })?;
            let delta = event.shares_delta.ok_or_else(|| {
                LedgerError::corrupt(format!("{} without shares delta", event.kind))
            })?;
            let amount = amount()?;

            let account = state.accounts.entry(participant).or_default();
            account.shares = checked_add(account.shares, delta, "shares")?;
            state.total_shares = checked_add(state.total_shares, delta, "total shares")?;

            if event.kind == EventKind::Deposit {
                account.total_deposited = checked_add(account.total_deposited, amount, "deposited")?;
                state.cash = checked_add(state.cash, amount, "cash")?;
            } else {
                account.total_withdrawn = checked_add(account.total_withdrawn, amount, "withdrawn")?;
                state.cash = checked_sub(state.cash, amount, "cash")?;
            }
        }
        EventKind::OpenPosition => {
            if state.position.is_open() {
                return Err(LedgerError::corrupt("open while a position is open"));
            }
            let amount = amount()?;
            state.cash = checked_sub(state.cash, amount, "cash")?;
            state.position = PositionState::Open {
                mark: amount,
                opened_seq: event.seq,
            };
        }
        EventKind::ClosePosition => {
            if !state.position.is_open() {
                return Err(LedgerError::corrupt("close without an open position"));
            }
            state.cash = amount()?;
            state.position = PositionState::Idle;
        }
    }

    if state.cash < Decimal::ZERO {
        return Err(LedgerError::corrupt(format!("cash goes negative ({})", state.cash)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParticipantId;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn event(
        seq: u64,
        kind: EventKind,
        participant: Option<&str>,
        amount: Decimal,
        shares_delta: Option<Decimal>,
    ) -> LedgerEvent {
        LedgerEvent {
            id: Uuid::new_v4(),
            seq,
            timestamp: Utc::now(),
            kind,
            participant: participant.map(ParticipantId::from),
            amount: Some(amount),
            shares_delta,
            realized_pnl: None,
            price: dec!(1),
            resulting_nav: dec!(1),
            resulting_total_shares: dec!(0),
        }
    }

    fn scenario_history() -> Vec<LedgerEvent> {
        vec![
            event(1, EventKind::Deposit, Some("alice"), dec!(100), Some(dec!(100))),
            event(2, EventKind::Deposit, Some("bob"), dec!(200), Some(dec!(200))),
            event(3, EventKind::OpenPosition, None, dec!(120), None),
            event(4, EventKind::ClosePosition, None, dec!(324), None),
            event(5, EventKind::Withdraw, Some("alice"), dec!(54), Some(dec!(-50))),
        ]
    }

    #[test]
    fn replay_rebuilds_balances() {
        let state = replay(&scenario_history()).unwrap();
        assert_eq!(state.cash, dec!(270));
        assert_eq!(state.total_shares, dec!(250));
        assert!(!state.has_open_position());

        let alice = state.account(&"alice".into()).unwrap();
        assert_eq!(alice.shares, dec!(50));
        assert_eq!(alice.total_withdrawn, dec!(54));
        assert_eq!(state.history.len(), 5);
    }

    #[test]
    fn replay_tracks_open_position() {
        let history = &scenario_history()[..3];
        let state = replay(history).unwrap();
        assert_eq!(
            state.position,
            PositionState::Open {
                mark: dec!(120),
                opened_seq: 3
            }
        );
        assert_eq!(state.cash, dec!(180));
    }

    #[test]
    fn replay_rejects_close_without_open() {
        let history = vec![event(1, EventKind::ClosePosition, None, dec!(0), None)];
        let err = replay(&history).unwrap_err();
        assert!(err.to_string().contains("event #1"));
    }

    #[test]
    fn audit_accepts_consistent_state() {
        let state = replay(&scenario_history()).unwrap();
        assert!(audit(&state).is_ok());
    }

    #[test]
    fn audit_detects_tampered_cash() {
        let mut state = replay(&scenario_history()).unwrap();
        state.cash = dec!(1000);
        let err = audit(&state).unwrap_err();
        assert!(err.to_string().contains("cash"));
    }

    #[test]
    fn audit_detects_phantom_account() {
        let mut state = replay(&scenario_history()).unwrap();
        state.accounts.insert("mallory".into(), Default::default());
        assert!(audit(&state).is_err());
    }
}
