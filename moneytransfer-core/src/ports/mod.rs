//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod account_store;
mod deadline;

pub use account_store::{
    plan_balances, AccountStore, CommitPlan, LockedPair, PairDecision, PairOutcome,
};
pub use deadline::{CancelHandle, Deadline};
