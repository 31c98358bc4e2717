//! Monetary types for cash, share and price representation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::LedgerError;

/// Cash amount represented as a Decimal for precision.
pub type Amount = Decimal;

/// Ownership units represented as a Decimal for precision.
pub type Shares = Decimal;

/// Price of one share in cash units.
pub type Nav = Decimal;

/// Rounding tolerance, one billionth of a cash unit.
///
/// Only used to compare against externally observed balances and to absorb
/// residual dust after full redemption; internal arithmetic is exact.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Decimal places kept for minted and burned shares and for payouts.
///
/// Share balances only ever move by amounts at this scale, so sums of them
/// stay exact and `total_shares` always equals the sum of the accounts.
pub const SHARE_SCALE: u32 = 12;

/// NAV used when no shares are outstanding.
pub const SEED_PRICE: Nav = Decimal::ONE;

/// Returns true if `a` and `b` differ by no more than [`EPSILON`].
#[must_use]
pub fn within_epsilon(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= EPSILON
}

/// Truncate `value` to [`SHARE_SCALE`] places, rounding toward zero.
///
/// Truncation keeps the remainder in the pool, so a participant is never
/// issued more shares or paid more cash than they are owed.
#[must_use]
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::ToZero)
}

/// Returns true if `value` needs more than [`SHARE_SCALE`] places.
#[must_use]
pub fn exceeds_share_scale(value: Decimal) -> bool {
    value.normalize().scale() > SHARE_SCALE
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Overflow { field })
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::Overflow { field })
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_mul(b).ok_or(LedgerError::Overflow { field })
}

pub(crate) fn checked_div(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_div(b).ok_or(LedgerError::Overflow { field })
}
