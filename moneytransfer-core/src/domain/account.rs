//! Account domain model

use serde::{Deserialize, Serialize};

/// A named account in the shared ledger
///
/// `balance` is held in minor currency units and never goes below zero.
/// `id` and `name` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance: i64,
}

impl Account {
    pub fn new(id: i64, name: impl Into<String>, balance: i64) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
        }
    }
}

/// Checks shared by every store when a new account is seeded
pub fn validate_opening(name: &str, balance: i64) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("account name cannot be empty");
    }
    if balance < 0 {
        return Err("opening balance cannot be negative");
    }
    Ok(())
}

/// Why a delta cannot be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaError {
    /// Result would be below zero
    Overdraft,
    /// Result would not fit in `i64`
    Overflow,
}

/// Balance change requested for one account inside a locked transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_id: i64,
    pub delta: i64,
}

impl BalanceDelta {
    pub fn debit(account_id: i64, amount: i64) -> Self {
        Self {
            account_id,
            delta: -amount,
        }
    }

    pub fn credit(account_id: i64, amount: i64) -> Self {
        Self {
            account_id,
            delta: amount,
        }
    }

    /// Apply to a balance; the result is never negative
    pub fn apply_to(&self, balance: i64) -> Result<i64, DeltaError> {
        match balance.checked_add(self.delta) {
            None => Err(DeltaError::Overflow),
            Some(next) if next < 0 => Err(DeltaError::Overdraft),
            Some(next) => Ok(next),
        }
    }
}
