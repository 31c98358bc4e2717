//! Read-only statistics derived from a pool snapshot.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::LedgerError;
use super::money::{checked_add, checked_div, checked_mul, checked_sub};
use super::nav::{compute_nav, pool_assets};
use super::{Account, Amount, Nav, ParticipantId, PoolState, Shares};

/// Statistics for one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStats {
    pub participant: ParticipantId,
    pub shares: Shares,
    /// Share of the pool in percent, zero for an empty pool.
    pub percent_of_pool: Decimal,
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
    pub current_value: Amount,
    /// Withdrawn plus current value minus deposited.
    pub profit_loss: Decimal,
}

/// Pool-wide summary with per-account statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    pub pool_assets: Amount,
    pub cash: Amount,
    pub position_mark: Amount,
    pub position_open: bool,
    pub nav: Nav,
    pub total_shares: Shares,
    /// Largest holders first; ties broken by participant id.
    pub accounts: Vec<AccountStats>,
}

impl PoolSummary {
    /// Sum of profit/loss across all accounts.
    #[must_use]
    pub fn total_profit_loss(&self) -> Decimal {
        self.accounts.iter().map(|a| a.profit_loss).sum()
    }
}

/// Statistics for a single participant.
///
/// # Errors
/// [`LedgerError::ParticipantNotFound`] for unknown participants, or
/// [`LedgerError::CorruptLedger`] propagated from the NAV computation.
pub fn account_stats(
    state: &PoolState,
    participant: &ParticipantId,
) -> Result<AccountStats, LedgerError> {
    let account = state
        .account(participant)
        .ok_or_else(|| LedgerError::ParticipantNotFound {
            participant: participant.to_string(),
        })?;
    let nav = compute_nav(state)?;
    stats_for(state, nav, participant, account)
}

/// Summary of the whole pool.
///
/// # Errors
/// [`LedgerError::CorruptLedger`] propagated from the NAV computation.
pub fn pool_summary(state: &PoolState) -> Result<PoolSummary, LedgerError> {
    let nav = compute_nav(state)?;

    let mut accounts = state
        .accounts
        .iter()
        .map(|(participant, account)| stats_for(state, nav, participant, account))
        .collect::<Result<Vec<_>, _>>()?;
    accounts.sort_by(|a, b| {
        b.shares
            .cmp(&a.shares)
            .then_with(|| a.participant.cmp(&b.participant))
    });

    Ok(PoolSummary {
        pool_assets: pool_assets(state)?,
        cash: state.cash,
        position_mark: state.position_mark(),
        position_open: state.has_open_position(),
        nav,
        total_shares: state.total_shares,
        accounts,
    })
}

fn stats_for(
    state: &PoolState,
    nav: Nav,
    participant: &ParticipantId,
    account: &Account,
) -> Result<AccountStats, LedgerError> {
    let current_value = checked_mul(account.shares, nav, "current value")?;
    let percent_of_pool = if state.total_shares > Decimal::ZERO {
        checked_mul(
            checked_div(account.shares, state.total_shares, "percent of pool")?,
            Decimal::ONE_HUNDRED,
            "percent of pool",
        )?
    } else {
        Decimal::ZERO
    };
    let profit_loss = checked_sub(
        checked_add(account.total_withdrawn, current_value, "profit/loss")?,
        account.total_deposited,
        "profit/loss",
    )?;

    Ok(AccountStats {
        participant: participant.clone(),
        shares: account.shares,
        percent_of_pool,
        total_deposited: account.total_deposited,
        total_withdrawn: account.total_withdrawn,
        current_value,
        profit_loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(shares: Decimal, deposited: Decimal, withdrawn: Decimal) -> Account {
        Account {
            shares,
            total_deposited: deposited,
            total_withdrawn: withdrawn,
        }
    }

    fn closed_at_gain() -> PoolState {
        let mut state = PoolState {
            cash: dec!(324),
            total_shares: dec!(300),
            ..PoolState::default()
        };
        state
            .accounts
            .insert("alice".into(), account(dec!(100), dec!(100), dec!(0)));
        state
            .accounts
            .insert("bob".into(), account(dec!(200), dec!(200), dec!(0)));
        state
    }

    #[test]
    fn account_stats_after_gain() {
        let stats = account_stats(&closed_at_gain(), &"alice".into()).unwrap();
        assert_eq!(stats.current_value, dec!(108));
        assert_eq!(stats.profit_loss, dec!(8));
        assert_eq!(stats.shares, dec!(100));
        assert_eq!(stats.percent_of_pool.round_dp(4), dec!(33.3333));
    }

    #[test]
    fn account_stats_unknown_participant() {
        let err = account_stats(&closed_at_gain(), &"mallory".into()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ParticipantNotFound {
                participant: "mallory".into()
            }
        );
    }

    #[test]
    fn redeemed_account_keeps_totals() {
        let mut state = closed_at_gain();
        state
            .accounts
            .insert("carol".into(), account(dec!(0), dec!(50), dec!(55)));

        let stats = account_stats(&state, &"carol".into()).unwrap();
        assert_eq!(stats.current_value, dec!(0));
        assert_eq!(stats.percent_of_pool, dec!(0));
        assert_eq!(stats.profit_loss, dec!(5));
    }

    #[test]
    fn summary_orders_by_shares_then_id() {
        let mut state = closed_at_gain();
        state
            .accounts
            .insert("aaron".into(), account(dec!(0), dec!(10), dec!(10)));
        state
            .accounts
            .insert("zed".into(), account(dec!(0), dec!(10), dec!(10)));

        let summary = pool_summary(&state).unwrap();
        let order: Vec<_> = summary
            .accounts
            .iter()
            .map(|a| a.participant.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["bob", "alice", "aaron", "zed"]);
        assert_eq!(summary.nav, dec!(1.08));
        assert_eq!(summary.pool_assets, dec!(324));
        assert!(!summary.position_open);
        assert_eq!(summary.total_profit_loss(), dec!(24));
    }

    #[test]
    fn summary_of_empty_pool() {
        let summary = pool_summary(&PoolState::default()).unwrap();
        assert!(summary.accounts.is_empty());
        assert_eq!(summary.nav, dec!(1));
        assert_eq!(summary.total_shares, dec!(0));
    }

    #[test]
    fn summary_propagates_corruption() {
        let mut state = PoolState::default();
        state.cash = dec!(10);
        assert!(pool_summary(&state).unwrap_err().is_fatal());
    }
}
