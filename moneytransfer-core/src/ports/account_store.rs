//! Account store port - transactional account storage

use crate::domain::result::{Error, Result};
use crate::domain::{Account, BalanceDelta, DeltaError, Rejection, TransferRecord};

use super::Deadline;

/// Both accounts of a transfer as read inside the locked transaction
///
/// `first` and `second` follow the caller's argument order, not lock order.
/// When both names are the same, both hold the same account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPair {
    pub first: Account,
    pub second: Account,
}

/// Work to commit atomically once the pair is locked
#[derive(Debug, Clone, Default)]
pub struct CommitPlan {
    pub deltas: Vec<BalanceDelta>,
    /// Journal row written in the same transaction as the deltas
    pub journal: Option<TransferRecord>,
}

/// What the locked callback wants the store to do
#[derive(Debug, Clone)]
pub enum PairDecision {
    Commit(CommitPlan),
    Reject(Rejection),
}

/// How a locked unit of work ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// Committed; the pair carries post-commit balances
    Committed(LockedPair),
    /// Rolled back with zero mutation
    Rejected(Rejection),
}

/// Transactional account store
///
/// Implementations must guarantee that a committed plan is visible to readers
/// either completely or not at all, and that no balance is ever stored below
/// zero.
pub trait AccountStore: Send + Sync {
    // === Accounts ===

    /// Point lookup by exact, case-sensitive name
    fn get_by_name(&self, name: &str) -> Result<Account>;

    /// All accounts sorted by id ascending
    fn list_all(&self) -> Result<Vec<Account>>;

    /// Provision a new account (seeding only, not part of a transfer)
    fn create_account(&self, name: &str, opening_balance: i64) -> Result<Account>;

    // === Locked work ===

    /// Lock both accounts in name order, then run `f` on a fresh snapshot
    ///
    /// Missing accounts fail with `Error::NotFound` before `f` runs, checking
    /// `a` first. Lock waits and the commit both respect `deadline`.
    fn with_locked_pair<F>(&self, a: &str, b: &str, deadline: &Deadline, f: F) -> Result<PairOutcome>
    where
        F: FnOnce(&LockedPair) -> PairDecision;

    // === Journal ===

    /// Most recent committed transfers, newest first
    ///
    /// Ordered by journal insertion. Transfers over disjoint accounts that
    /// commit at the same time may be listed in either order relative to
    /// each other; transfers sharing an account are always in commit order.
    fn recent_transfers(&self, limit: usize) -> Result<Vec<TransferRecord>>;
}

/// Check a plan against the locked pair and produce post-commit balances
///
/// Shared by adapters so every store enforces the same rules before writing.
/// A plan that cannot apply is `Error::Validation`: retrying it unchanged
/// fails the same way.
pub fn plan_balances(pair: &LockedPair, plan: &CommitPlan) -> Result<LockedPair> {
    let mut next = pair.clone();
    for delta in &plan.deltas {
        let target = if delta.account_id == next.first.id {
            &mut next.first
        } else if delta.account_id == next.second.id {
            &mut next.second
        } else {
            return Err(Error::validation(format!(
                "delta targets account {} outside the locked pair",
                delta.account_id
            )));
        };
        target.balance = delta.apply_to(target.balance).map_err(|e| match e {
            DeltaError::Overdraft => {
                Error::validation(format!("balance of {} would go negative", target.name))
            }
            DeltaError::Overflow => {
                Error::validation(format!("balance of {} would overflow", target.name))
            }
        })?;
    }
    // Same-name pair: every delta landed on `first`
    if next.first.id == next.second.id {
        next.second = next.first.clone();
    }
    Ok(next)
}
