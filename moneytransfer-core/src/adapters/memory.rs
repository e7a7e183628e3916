//! In-memory account store
//!
//! Same contract as the DuckDB store, for tests and embedding. A transfer's
//! writes land under one write lock, so readers see both deltas or neither.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::result::{Error, Result};
use crate::domain::{validate_opening, Account, TransferRecord};
use crate::ports::{
    plan_balances, AccountStore, Deadline, LockedPair, PairDecision, PairOutcome,
};

use super::lock_table::LockTable;

#[derive(Debug, Default)]
struct Ledger {
    accounts: HashMap<String, Account>,
    journal: Vec<TransferRecord>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    ledger: RwLock<Ledger>,
    locks: LockTable,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with `(name, balance)` pairs, ids in order
    pub fn with_accounts<'a>(accounts: impl IntoIterator<Item = (&'a str, i64)>) -> Result<Self> {
        let store = Self::new();
        for (name, balance) in accounts {
            store.create_account(name, balance)?;
        }
        Ok(store)
    }

    pub fn lock_table(&self) -> &LockTable {
        &self.locks
    }

    fn snapshot(&self, name: &str) -> Result<Account> {
        let ledger = self.ledger.read()?;
        ledger
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get_by_name(&self, name: &str) -> Result<Account> {
        self.snapshot(name)
    }

    fn list_all(&self) -> Result<Vec<Account>> {
        let ledger = self.ledger.read()?;
        let mut accounts: Vec<Account> = ledger.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    fn create_account(&self, name: &str, opening_balance: i64) -> Result<Account> {
        validate_opening(name, opening_balance).map_err(Error::validation)?;

        let mut ledger = self.ledger.write()?;
        if ledger.accounts.contains_key(name) {
            return Err(Error::validation(format!("account already exists: {}", name)));
        }
        ledger.next_id += 1;
        let account = Account::new(ledger.next_id, name, opening_balance);
        ledger.accounts.insert(name.to_string(), account.clone());
        Ok(account)
    }

    fn with_locked_pair<F>(&self, a: &str, b: &str, deadline: &Deadline, f: F) -> Result<PairOutcome>
    where
        F: FnOnce(&LockedPair) -> PairDecision,
    {
        let _guard = self.locks.lock_pair(a, b, deadline)?;

        let pair = LockedPair {
            first: self.snapshot(a)?,
            second: self.snapshot(b)?,
        };

        let plan = match f(&pair) {
            PairDecision::Reject(reason) => return Ok(PairOutcome::Rejected(reason)),
            PairDecision::Commit(plan) => plan,
        };

        let next = plan_balances(&pair, &plan)?;
        deadline.check()?;

        let mut ledger = self.ledger.write()?;
        ledger.accounts.insert(next.first.name.clone(), next.first.clone());
        ledger.accounts.insert(next.second.name.clone(), next.second.clone());
        if let Some(record) = plan.journal {
            ledger.journal.push(record);
        }

        Ok(PairOutcome::Committed(next))
    }

    fn recent_transfers(&self, limit: usize) -> Result<Vec<TransferRecord>> {
        let ledger = self.ledger.read()?;
        Ok(ledger.journal.iter().rev().take(limit).cloned().collect())
    }
}
