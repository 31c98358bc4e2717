//! Net asset value computation.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::money::{checked_add, checked_div, EPSILON, SEED_PRICE};
use super::{Amount, Nav, PoolState};

/// Cash plus the mark value of any open position.
///
/// # Errors
/// Returns [`LedgerError::Overflow`] if the sum leaves the decimal range.
pub fn pool_assets(state: &PoolState) -> Result<Amount, LedgerError> {
    checked_add(state.cash, state.position_mark(), "pool assets")
}

/// Price of one share.
///
/// With no shares outstanding the pool reseeds at [`SEED_PRICE`]. Residual
/// dust up to [`EPSILON`] left behind by a full redemption is tolerated;
/// anything larger means value exists that nobody owns.
///
/// # Errors
/// Returns [`LedgerError::CorruptLedger`] for unowned assets above the
/// tolerance.
pub fn compute_nav(state: &PoolState) -> Result<Nav, LedgerError> {
    let assets = pool_assets(state)?;

    if state.total_shares.is_zero() {
        if assets > EPSILON {
            return Err(LedgerError::corrupt(format!(
                "pool holds {assets} in assets with no shares outstanding"
            )));
        }
        return Ok(SEED_PRICE);
    }

    if state.total_shares < Decimal::ZERO {
        return Err(LedgerError::corrupt(format!(
            "negative total shares {}",
            state.total_shares
        )));
    }

    checked_div(assets, state.total_shares, "nav")
}
