//! CLI command implementations

pub mod accounts;
pub mod history;
pub mod new;
pub mod transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use moneytransfer_core::MoneyTransferContext;

/// Environment override for the data directory
const DATA_DIR_ENV: &str = "MONEYTRANSFER_DIR";

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".moneytransfer"))
}

/// Get or create the ledger context
pub fn get_context() -> Result<MoneyTransferContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    MoneyTransferContext::new(&data_dir).context("Failed to initialize ledger")
}
