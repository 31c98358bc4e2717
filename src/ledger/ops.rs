//! State transitions for the four ledger mutations.
//!
//! Each function validates against the current state, then builds the next
//! state on a copy. Nothing is mutated on failure, so a rejected operation
//! never needs a rollback.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::Receipt;
use crate::domain::error::LedgerError;
use crate::domain::{
    checked_add, checked_div, checked_mul, checked_sub, compute_nav, exceeds_share_scale,
    pool_assets, quantize, within_epsilon, Amount, EventKind, LedgerEvent, Nav, ParticipantId,
    PoolState, PositionState, Shares, EPSILON,
};

/// Result of a successful transition.
pub(crate) type Transition = (PoolState, Receipt);

/// Mint shares for `amount` of cash at the prevailing NAV.
pub(crate) fn deposit(
    state: &PoolState,
    participant: &ParticipantId,
    amount: Amount,
    now: DateTime<Utc>,
) -> Result<Transition, LedgerError> {
    require_participant(participant)?;
    require_positive("amount", amount)?;

    let nav = compute_nav(state)?;
    if nav <= Decimal::ZERO {
        return Err(LedgerError::PoolInsolvent {
            total_shares: state.total_shares,
        });
    }
    let minted = quantize(checked_div(amount, nav, "minted shares")?);
    if minted <= Decimal::ZERO {
        // Too small to buy a single share unit at this price.
        return Err(LedgerError::InvalidAmount {
            field: "amount",
            value: amount,
        });
    }

    let mut next = state.clone();
    next.cash = checked_add(next.cash, amount, "cash")?;
    next.total_shares = checked_add(next.total_shares, minted, "total shares")?;
    let account = next.accounts.entry(participant.clone()).or_default();
    account.shares = checked_add(account.shares, minted, "shares")?;
    account.total_deposited = checked_add(account.total_deposited, amount, "total deposited")?;

    let draft = Draft {
        kind: EventKind::Deposit,
        participant: Some(participant.clone()),
        amount,
        shares_delta: Some(minted),
        realized_pnl: None,
        price: nav,
    };
    finish(next, draft, now)
}

/// Burn `shares` and pay out their value from liquid cash.
pub(crate) fn withdraw(
    state: &PoolState,
    participant: &ParticipantId,
    shares: Shares,
    now: DateTime<Utc>,
) -> Result<Transition, LedgerError> {
    require_participant(participant)?;
    require_positive("shares", shares)?;
    if exceeds_share_scale(shares) {
        return Err(LedgerError::InvalidAmount {
            field: "shares",
            value: shares,
        });
    }

    let held = state
        .account(participant)
        .map(|a| a.shares)
        .ok_or_else(|| LedgerError::ParticipantNotFound {
            participant: participant.to_string(),
        })?;
    if shares > held {
        return Err(LedgerError::InsufficientShares {
            participant: participant.to_string(),
            requested: shares,
            held,
        });
    }

    let nav = compute_nav(state)?;
    let mut payout = quantize(checked_mul(shares, nav, "payout")?);
    if payout > state.cash {
        // Rounding of shares * (assets / shares) can overshoot by a few ulps.
        if payout - state.cash > EPSILON {
            return Err(LedgerError::InsufficientLiquidity {
                required: payout,
                available: state.cash,
            });
        }
        payout = state.cash;
    }

    let mut next = state.clone();
    next.cash = checked_sub(next.cash, payout, "cash")?;
    next.total_shares = checked_sub(next.total_shares, shares, "total shares")?;
    let account = next.accounts.entry(participant.clone()).or_default();
    account.shares = checked_sub(account.shares, shares, "shares")?;
    account.total_withdrawn = checked_add(account.total_withdrawn, payout, "total withdrawn")?;

    let draft = Draft {
        kind: EventKind::Withdraw,
        participant: Some(participant.clone()),
        amount: payout,
        shares_delta: Some(-shares),
        realized_pnl: None,
        price: nav,
    };
    finish(next, draft, now)
}

/// Move `added_liquidity` from cash into a newly opened position.
pub(crate) fn open_position(
    state: &PoolState,
    expected_cash: Amount,
    added_liquidity: Amount,
    now: DateTime<Utc>,
) -> Result<Transition, LedgerError> {
    require_positive("expected cash", expected_cash)?;
    require_positive("added liquidity", added_liquidity)?;

    if let PositionState::Open { opened_seq, .. } = state.position {
        return Err(LedgerError::PositionAlreadyOpen { opened_seq });
    }
    if state.total_shares.is_zero() {
        return Err(LedgerError::EmptyPool);
    }
    if !within_epsilon(expected_cash, state.cash) {
        return Err(LedgerError::StateMismatch {
            expected: expected_cash,
            actual: state.cash,
        });
    }
    if added_liquidity > state.cash {
        return Err(LedgerError::InsufficientLiquidity {
            required: added_liquidity,
            available: state.cash,
        });
    }

    let nav = compute_nav(state)?;

    let mut next = state.clone();
    next.cash = checked_sub(next.cash, added_liquidity, "cash")?;
    next.position = PositionState::Open {
        mark: added_liquidity,
        opened_seq: state.next_seq(),
    };

    let draft = Draft {
        kind: EventKind::OpenPosition,
        participant: None,
        amount: added_liquidity,
        shares_delta: None,
        realized_pnl: None,
        price: nav,
    };
    finish(next, draft, now)
}

/// Settle the open position at the externally observed `realized_balance`.
///
/// When `expected_open` is given it must name the open position's opening
/// event, otherwise the close is rejected as stale.
pub(crate) fn close_position(
    state: &PoolState,
    expected_open: Option<u64>,
    realized_balance: Amount,
    now: DateTime<Utc>,
) -> Result<Transition, LedgerError> {
    if realized_balance < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            field: "realized balance",
            value: realized_balance,
        });
    }

    let PositionState::Open { opened_seq, .. } = state.position else {
        return Err(LedgerError::NoOpenPosition);
    };
    if let Some(supplied) = expected_open {
        if supplied != opened_seq {
            return Err(LedgerError::StaleClose {
                supplied,
                current: opened_seq,
            });
        }
    }

    // With nobody holding shares the realized balance would be unowned.
    if state.total_shares.is_zero() && realized_balance > EPSILON {
        return Err(LedgerError::EmptyPool);
    }

    let nav = compute_nav(state)?;
    let pre_close_assets = pool_assets(state)?;
    let realized_pnl = checked_sub(realized_balance, pre_close_assets, "realized pnl")?;

    let mut next = state.clone();
    next.cash = realized_balance;
    next.position = PositionState::Idle;

    let draft = Draft {
        kind: EventKind::ClosePosition,
        participant: None,
        amount: realized_balance,
        shares_delta: None,
        realized_pnl: Some(realized_pnl),
        price: nav,
    };
    finish(next, draft, now)
}

struct Draft {
    kind: EventKind,
    participant: Option<ParticipantId>,
    amount: Amount,
    shares_delta: Option<Shares>,
    realized_pnl: Option<Decimal>,
    price: Nav,
}

/// Append the event for `draft` to `next` and build the receipt.
fn finish(mut next: PoolState, draft: Draft, now: DateTime<Utc>) -> Result<Transition, LedgerError> {
    let resulting_nav = compute_nav(&next)?;
    let event = LedgerEvent {
        id: Uuid::new_v4(),
        seq: next.next_seq(),
        timestamp: now,
        kind: draft.kind,
        participant: draft.participant,
        amount: Some(draft.amount),
        shares_delta: draft.shares_delta,
        realized_pnl: draft.realized_pnl,
        price: draft.price,
        resulting_nav,
        resulting_total_shares: next.total_shares,
    };
    next.history.push(event.clone());

    let account = event
        .participant
        .as_ref()
        .and_then(|p| next.account(p))
        .cloned();
    let receipt = Receipt {
        event,
        account,
        cash: next.cash,
        position: next.position,
    };
    Ok((next, receipt))
}

fn require_positive(field: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount { field, value });
    }
    Ok(())
}

fn require_participant(participant: &ParticipantId) -> Result<(), LedgerError> {
    if participant.is_blank() {
        return Err(LedgerError::InvalidParticipant);
    }
    Ok(())
}
