//! Money Transfer Core - shared account ledger with atomic transfers
//!
//! This crate implements the transfer core following hexagonal architecture:
//!
//! - **domain**: Accounts, transfer requests/results, and the pure business rules
//! - **ports**: The `AccountStore` trait the core depends on
//! - **services**: Transfer execution and account listing/seeding
//! - **adapters**: DuckDB and in-memory stores, plus the ordered lock table

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbAccountStore;
use config::Config;
use services::{AccountService, TransferService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    Account, Outcome, Rejection, TransferReceipt, TransferRecord, TransferRequest, TransferResult,
};
pub use ports::{AccountStore, CancelHandle};
pub use services::{HistoryEntry, TransferOptions};

/// Main context for ledger operations
///
/// Holds the store and the services built on it. Front ends create one per
/// process and share it across threads.
pub struct MoneyTransferContext {
    pub config: Config,
    pub store: Arc<DuckDbAccountStore>,
    pub transfer_service: TransferService<DuckDbAccountStore>,
    pub account_service: AccountService<DuckDbAccountStore>,
}

impl MoneyTransferContext {
    /// Open the ledger stored in `data_dir`, creating the schema if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir).context("Failed to load settings")?;

        let db_path = data_dir.join(&config.database_file);
        let store = Arc::new(
            DuckDbAccountStore::new(&db_path)
                .with_context(|| format!("Failed to open database {}", db_path.display()))?,
        );
        store.ensure_schema().context("Failed to initialize schema")?;

        Ok(Self::with_store(config, store))
    }

    /// Build services over an already opened store
    pub fn with_store(config: Config, store: Arc<DuckDbAccountStore>) -> Self {
        let transfer_service = TransferService::new(Arc::clone(&store), config.lock_timeout);
        let account_service = AccountService::new(Arc::clone(&store));

        Self {
            config,
            store,
            transfer_service,
            account_service,
        }
    }
}
