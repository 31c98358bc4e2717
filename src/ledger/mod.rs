//! The pool ledger: transactional operations over a persisted [`PoolState`].
//!
//! A [`Ledger`] serializes every mutation through a single writer lock. Each
//! operation validates against the committed state, builds the next state on
//! a copy, checks its invariants, persists it, and only then publishes it.
//! Readers take a cheap [`Arc`] snapshot and never block writers for longer
//! than a pointer swap.
//!
//! Saves are conditional: the store must still hold the state this ledger
//! last committed. When another writer sharing the store got there first the
//! operation fails with [`Error::StoreConflict`], the ledger reloads, and the
//! caller may retry.
//!
//! If an invariant is ever found broken the ledger halts: every mutation is
//! refused with [`LedgerError::CorruptLedger`] until [`Ledger::reconcile`]
//! installs a state that passes both structural checks and a history audit.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use sharepool::adapter::MemoryStore;
//! use sharepool::ledger::Ledger;
//!
//! let ledger = Ledger::open(MemoryStore::new()).unwrap();
//! ledger.deposit("alice", dec!(100)).unwrap();
//! ledger.deposit("bob", dec!(200)).unwrap();
//!
//! ledger.open_position(dec!(300), dec!(120)).unwrap();
//! let close = ledger.close_position(dec!(324)).unwrap();
//! assert_eq!(close.realized_pnl(), Some(dec!(24)));
//!
//! let alice = ledger.account_stats("alice").unwrap();
//! assert_eq!(alice.current_value, dec!(108));
//! ```

mod ops;
mod receipt;

pub use receipt::Receipt;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::domain::error::LedgerError;
use crate::domain::{
    self, AccountStats, Amount, LedgerEvent, ParticipantId, PoolState, PoolSummary, Shares,
};
use crate::error::{Error, Result};
use crate::port::LedgerStore;

/// Single-pool ledger backed by a [`LedgerStore`].
pub struct Ledger<S> {
    store: S,
    /// Last committed state. Replaced wholesale on commit.
    committed: RwLock<Arc<PoolState>>,
    /// Serializes mutations. Held across validate, persist and publish.
    writer: Mutex<()>,
    /// Reason the ledger stopped accepting mutations, if it did.
    halted: RwLock<Option<String>>,
}

impl<S: LedgerStore> Ledger<S> {
    /// Load the pool from `store`.
    ///
    /// The stored state is verified and its history replayed. A state that
    /// fails either check still opens, but halted, so it can be inspected
    /// and reconciled.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn open(store: S) -> Result<Self> {
        let state = store.load()?;
        let halted = match state.verify().and_then(|()| domain::audit(&state)) {
            Ok(()) => None,
            Err(err) => {
                error!(store = %store.describe(), error = %err, "Loaded ledger is corrupt, halting");
                Some(halt_reason_of(&err))
            }
        };
        info!(
            store = %store.describe(),
            events = state.history.len(),
            participants = state.accounts.len(),
            "Ledger opened"
        );

        Ok(Self {
            store,
            committed: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            halted: RwLock::new(halted),
        })
    }

    /// Deposit `amount` of cash for `participant`, minting shares at NAV.
    ///
    /// # Errors
    /// `InvalidParticipant`, `InvalidAmount` or `PoolInsolvent` on
    /// rejection; store errors if the commit cannot be persisted.
    pub fn deposit(&self, participant: impl Into<ParticipantId>, amount: Amount) -> Result<Receipt> {
        let participant = participant.into();
        self.commit("deposit", |state, now| {
            ops::deposit(state, &participant, amount, now)
        })
    }

    /// Redeem `shares` for `participant`, paying out from liquid cash.
    ///
    /// # Errors
    /// `InvalidAmount`, `ParticipantNotFound`, `InsufficientShares` or
    /// `InsufficientLiquidity` on rejection.
    pub fn withdraw(&self, participant: impl Into<ParticipantId>, shares: Shares) -> Result<Receipt> {
        let participant = participant.into();
        self.commit("withdraw", |state, now| {
            ops::withdraw(state, &participant, shares, now)
        })
    }

    /// Commit `added_liquidity` of cash to a new position.
    ///
    /// `expected_cash` is the caller's view of the pool's cash and must match
    /// the ledger within [`EPSILON`](crate::domain::EPSILON).
    ///
    /// # Errors
    /// `InvalidAmount`, `PositionAlreadyOpen`, `StateMismatch` or
    /// `InsufficientLiquidity` on rejection.
    pub fn open_position(&self, expected_cash: Amount, added_liquidity: Amount) -> Result<Receipt> {
        self.commit("open_position", |state, now| {
            ops::open_position(state, expected_cash, added_liquidity, now)
        })
    }

    /// Close the open position; `realized_balance` becomes the pool's cash.
    ///
    /// # Errors
    /// `InvalidAmount` or `NoOpenPosition` on rejection.
    pub fn close_position(&self, realized_balance: Amount) -> Result<Receipt> {
        self.commit("close_position", |state, now| {
            ops::close_position(state, None, realized_balance, now)
        })
    }

    /// Like [`close_position`](Self::close_position), but only if the open
    /// position was opened by event `opened_seq`. Protects against a close
    /// being applied twice, or to a later position.
    ///
    /// # Errors
    /// Additionally `StaleClose` if a different position is open.
    pub fn close_position_checked(&self, opened_seq: u64, realized_balance: Amount) -> Result<Receipt> {
        self.commit("close_position", |state, now| {
            ops::close_position(state, Some(opened_seq), realized_balance, now)
        })
    }

    /// Statistics for one participant.
    ///
    /// # Errors
    /// `ParticipantNotFound`, or `CorruptLedger` if NAV cannot be computed.
    pub fn account_stats(&self, participant: impl Into<ParticipantId>) -> Result<AccountStats> {
        let participant = participant.into();
        let state = self.snapshot();
        Ok(domain::account_stats(&state, &participant)?)
    }

    /// Pool-wide summary.
    ///
    /// # Errors
    /// `CorruptLedger` if NAV cannot be computed.
    pub fn pool_summary(&self) -> Result<PoolSummary> {
        let state = self.snapshot();
        Ok(domain::pool_summary(&state)?)
    }

    /// The most recent `limit` events, oldest first.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<LedgerEvent> {
        self.snapshot().recent_history(limit).to_vec()
    }

    /// Consistent view of the last committed state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PoolState> {
        Arc::clone(&self.committed.read())
    }

    /// Check invariants and replay the history against the live balances.
    ///
    /// A failed audit halts the ledger.
    ///
    /// # Errors
    /// `CorruptLedger` describing the first problem found.
    pub fn audit(&self) -> Result<()> {
        let state = self.snapshot();
        let result = state.verify().and_then(|()| domain::audit(&state));
        if let Err(err) = result {
            self.halt("audit", &err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Why the ledger is halted, if it is.
    #[must_use]
    pub fn halt_reason(&self) -> Option<String> {
        self.halted.read().clone()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.read().is_some()
    }

    /// Replace the ledger state with a hand-repaired one and resume.
    ///
    /// # Errors
    /// `CorruptLedger` if `state` fails verification or audit, leaving the
    /// ledger as it was; store errors if it cannot be persisted.
    pub fn reconcile(&self, state: PoolState) -> Result<()> {
        let _guard = self.writer.lock();
        state.verify()?;
        domain::audit(&state)?;

        let expected_events = self.snapshot().history.len();
        self.store.save(&state, expected_events)?;
        let events = state.history.len();
        *self.committed.write() = Arc::new(state);
        let previous = self.halted.write().take();
        warn!(events, previous_halt = ?previous, "Ledger reconciled");
        Ok(())
    }

    fn commit<F>(&self, op: &'static str, transition: F) -> Result<Receipt>
    where
        F: FnOnce(&PoolState, DateTime<Utc>) -> std::result::Result<(PoolState, Receipt), LedgerError>,
    {
        let _guard = self.writer.lock();
        if let Some(reason) = self.halt_reason() {
            warn!(op, %reason, "Mutation refused, ledger halted");
            return Err(LedgerError::CorruptLedger { reason }.into());
        }

        let current = self.snapshot();
        let outcome = transition(&*current, Utc::now()).and_then(|(next, receipt)| {
            next.verify()?;
            Ok((next, receipt))
        });
        let (next, receipt) = match outcome {
            Ok(committed) => committed,
            Err(err) if err.is_fatal() => {
                self.halt(op, &err);
                return Err(err.into());
            }
            Err(err) => {
                warn!(op, error = %err, "Operation rejected");
                return Err(err.into());
            }
        };

        match self.store.save(&next, current.history.len()) {
            Ok(()) => {}
            Err(err @ Error::StoreConflict { .. }) => {
                warn!(op, error = %err, "Store changed underneath, reloading");
                self.reload();
                return Err(err);
            }
            Err(err) => {
                error!(op, error = %err, "Failed to persist ledger, state unchanged");
                return Err(err);
            }
        }
        *self.committed.write() = Arc::new(next);

        info!(
            op,
            seq = receipt.seq(),
            participant = receipt.event.participant.as_ref().map(ParticipantId::as_str),
            amount = %receipt.amount(),
            shares_delta = %receipt.shares_delta(),
            nav = %receipt.nav(),
            "Committed"
        );
        Ok(receipt)
    }

    /// Pick up commits another writer made to the store. Caller holds the
    /// writer lock.
    fn reload(&self) {
        let state = match self.store.load() {
            Ok(state) => state,
            Err(err) => {
                error!(error = %err, "Failed to reload ledger");
                return;
            }
        };
        if let Err(err) = state.verify().and_then(|()| domain::audit(&state)) {
            self.halt("reload", &err);
            return;
        }
        info!(events = state.history.len(), "Ledger reloaded from store");
        *self.committed.write() = Arc::new(state);
    }

    fn halt(&self, op: &str, err: &LedgerError) {
        error!(op, error = %err, "Invariant violated, halting ledger");
        let mut halted = self.halted.write();
        if halted.is_none() {
            *halted = Some(halt_reason_of(err));
        }
    }
}

/// Reason recorded when `err` halts the ledger. Refused mutations wrap it
/// in a fresh `CorruptLedger`, so the prefix is left off.
fn halt_reason_of(err: &LedgerError) -> String {
    match err {
        LedgerError::CorruptLedger { reason } => reason.clone(),
        other => other.to_string(),
    }
}
