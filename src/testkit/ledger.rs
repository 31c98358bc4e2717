//! Ledgers pre-loaded with common scenarios.
//!
//! Every fixture runs on a [`MemoryStore`] and goes through the public
//! ledger operations, so the resulting history is genuine and audits clean.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::adapter::MemoryStore;
use crate::ledger::Ledger;

/// Empty pool on a memory store.
pub fn empty() -> Ledger<MemoryStore> {
    Ledger::open(MemoryStore::new()).expect("memory store always opens")
}

/// Alice deposits 100, Bob deposits 200. Cash 300, NAV 1.
pub fn funded() -> Ledger<MemoryStore> {
    let ledger = empty();
    ledger.deposit("alice", dec!(100)).expect("deposit alice");
    ledger.deposit("bob", dec!(200)).expect("deposit bob");
    ledger
}

/// [`funded`], then 120 goes into a position that is still open.
pub fn with_open_position() -> Ledger<MemoryStore> {
    let ledger = funded();
    ledger
        .open_position(dec!(300), dec!(120))
        .expect("open position");
    ledger
}

/// [`with_open_position`], closed at 324: a 24 gain, NAV 1.08.
pub fn closed_at_gain() -> Ledger<MemoryStore> {
    let ledger = with_open_position();
    ledger.close_position(dec!(324)).expect("close position");
    ledger
}

/// Assert two decimals are within `tolerance` of each other.
pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
