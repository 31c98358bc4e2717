//! Per-participant account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, Shares};

/// A participant's ownership and cumulative cash flows.
///
/// Accounts are created on first deposit and never removed, so history stays
/// attributable after a participant has redeemed everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub shares: Shares,
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
}

impl Account {
    /// Returns true if the participant holds no shares.
    #[must_use]
    pub fn is_fully_redeemed(&self) -> bool {
        self.shares.is_zero()
    }

    /// Net cash contributed (deposited minus withdrawn). Negative once the
    /// participant has taken out more than they put in.
    #[must_use]
    pub fn net_contributed(&self) -> Decimal {
        self.total_deposited - self.total_withdrawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_account_is_zeroed_and_redeemed() {
        let account = Account::default();
        assert!(account.is_fully_redeemed());
        assert_eq!(account.net_contributed(), dec!(0));
    }

    #[test]
    fn net_contributed_can_go_negative() {
        let account = Account {
            shares: dec!(0),
            total_deposited: dec!(100),
            total_withdrawn: dec!(108),
        };
        assert_eq!(account.net_contributed(), dec!(-8));
    }
}
