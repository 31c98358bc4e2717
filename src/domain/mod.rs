//! Storage-agnostic ledger domain: state, pricing, reporting and audit.

mod account;
mod event;
mod ids;
mod money;
mod nav;
mod replay;
mod report;
mod state;

pub mod error;

// Core domain types
pub use account::Account;
pub use event::{EventKind, LedgerEvent};
pub use ids::ParticipantId;
pub use money::{
    exceeds_share_scale, quantize, within_epsilon, Amount, Nav, Shares, EPSILON, SEED_PRICE,
    SHARE_SCALE,
};
pub use state::{PoolState, PositionState};

// Pricing, reporting and audit
pub use nav::{compute_nav, pool_assets};
pub use replay::{audit, replay};
pub use report::{account_stats, pool_summary, AccountStats, PoolSummary};

pub(crate) use money::{checked_add, checked_div, checked_mul, checked_sub};
