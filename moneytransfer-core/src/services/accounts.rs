//! Account service - listing, seeding, and transfer history

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Account;
use crate::ports::AccountStore;

/// Read-side access to the ledger plus account provisioning
pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All accounts ordered by id, for display
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.store.list_all()
    }

    /// Sum of every balance; constant across transfers
    pub fn total_balance(&self) -> Result<i128> {
        Ok(self
            .store
            .list_all()?
            .iter()
            .map(|a| i128::from(a.balance))
            .sum())
    }

    /// Seed a new account with an opening balance
    pub fn open_account(&self, name: &str, opening_balance: i64) -> Result<Account> {
        let account = self.store.create_account(name, opening_balance)?;
        tracing::info!(account_id = account.id, name = %account.name, "account opened");
        Ok(account)
    }

    /// Recent committed transfers with account names resolved
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let names: HashMap<i64, String> = self
            .store
            .list_all()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let name_of = |id: i64| names.get(&id).cloned().unwrap_or_else(|| format!("#{}", id));

        Ok(self
            .store
            .recent_transfers(limit)?
            .into_iter()
            .map(|r| HistoryEntry {
                transfer_id: r.transfer_id,
                sender: name_of(r.sender_id),
                receiver: name_of(r.receiver_id),
                amount: r.amount,
                committed_at: r.committed_at,
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub transfer_id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub amount: i64,
    pub committed_at: DateTime<Utc>,
}
