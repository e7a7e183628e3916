//! Integration tests for moneytransfer-core services
//!
//! These tests run the transfer core against a real DuckDB file.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use moneytransfer_core::adapters::duckdb::DuckDbAccountStore;
use moneytransfer_core::config::{Config, LOCK_TIMEOUT_ENV, SETTINGS_FILE};
use moneytransfer_core::services::{AccountService, TransferService};
use moneytransfer_core::{
    AccountStore, Error, MoneyTransferContext, Outcome, Rejection, TransferRequest,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    _dir: TempDir,
    store: Arc<DuckDbAccountStore>,
    transfers: TransferService<DuckDbAccountStore>,
    accounts: AccountService<DuckDbAccountStore>,
}

/// Create a file-backed store seeded with `(name, balance)` pairs
fn fixture(seed: &[(&str, i64)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = DuckDbAccountStore::new(&dir.path().join("test.duckdb"))
        .expect("Failed to create store");
    store.ensure_schema().expect("Failed to initialize schema");
    let store = Arc::new(store);

    let accounts = AccountService::new(Arc::clone(&store));
    for (name, balance) in seed {
        accounts.open_account(name, *balance).unwrap();
    }

    Fixture {
        _dir: dir,
        transfers: TransferService::new(Arc::clone(&store), Duration::from_secs(5)),
        accounts,
        store,
    }
}

fn balances(f: &Fixture) -> Vec<(String, i64)> {
    f.accounts
        .list_accounts()
        .unwrap()
        .into_iter()
        .map(|a| (a.name, a.balance))
        .collect()
}

// ============================================================================
// Transfer Outcomes
// ============================================================================

#[test]
fn test_happy_path_moves_funds() {
    let f = fixture(&[("Alice", 100), ("Bob", 50)]);

    let result = f.transfers.transfer_funds("Alice", "Bob", 30).unwrap();

    assert_eq!(result.outcome(), Outcome::Committed);
    assert!(result.reason().is_none());
    assert_eq!(
        balances(&f),
        vec![("Alice".to_string(), 70), ("Bob".to_string(), 80)]
    );
}

#[test]
fn test_self_transfer_rejected_without_mutation() {
    let f = fixture(&[("Alice", 100), ("Bob", 50)]);
    let before = balances(&f);

    for amount in [1, 50, 1_000] {
        let result = f.transfers.transfer_funds("Alice", "Alice", amount).unwrap();
        assert_eq!(result.reason(), Some(&Rejection::SelfTransfer));
    }

    assert_eq!(balances(&f), before);
}

#[test]
fn test_non_positive_amount_rejected_without_mutation() {
    let f = fixture(&[("Alice", 100), ("Bob", 50)]);
    let before = balances(&f);

    for amount in [0, -1, -100] {
        let result = f.transfers.transfer_funds("Alice", "Bob", amount).unwrap();
        assert_eq!(result.reason(), Some(&Rejection::InvalidAmount));
    }

    assert_eq!(balances(&f), before);
}

#[test]
fn test_malformed_amount_is_invalid_not_zero() {
    let f = fixture(&[("Alice", 100), ("Bob", 50)]);

    let parsed = TransferRequest::parse("Alice", "Bob", "thirty");
    assert_eq!(parsed, Err(Rejection::InvalidAmount));

    let request = TransferRequest::parse("Alice", "Bob", "30").unwrap();
    assert!(f.transfers.execute(&request).unwrap().is_committed());
}

#[test]
fn test_insufficient_funds_rejected_without_mutation() {
    let f = fixture(&[("Alice", 100), ("Bob", 50)]);

    let result = f.transfers.transfer_funds("Alice", "Bob", 101).unwrap();

    assert_eq!(
        result.reason(),
        Some(&Rejection::InsufficientFunds {
            name: "Alice".to_string(),
            balance: 100,
            requested: 101,
        })
    );
    assert_eq!(f.store.get_by_name("Alice").unwrap().balance, 100);
    assert_eq!(f.store.get_by_name("Bob").unwrap().balance, 50);
}

#[test]
fn test_unknown_accounts_rejected() {
    let f = fixture(&[("Alice", 100)]);

    let missing_sender = f.transfers.transfer_funds("Ghost", "Alice", 5).unwrap();
    assert_eq!(
        missing_sender.reason(),
        Some(&Rejection::AccountNotFound { name: "Ghost".to_string() })
    );

    let missing_receiver = f.transfers.transfer_funds("Alice", "Ghost", 5).unwrap();
    assert_eq!(
        missing_receiver.reason(),
        Some(&Rejection::AccountNotFound { name: "Ghost".to_string() })
    );

    // Sender is reported when both are missing
    let both = f.transfers.transfer_funds("Nobody", "Ghost", 5).unwrap();
    assert_eq!(
        both.reason(),
        Some(&Rejection::AccountNotFound { name: "Nobody".to_string() })
    );

    assert_eq!(f.store.get_by_name("Alice").unwrap().balance, 100);
}

#[test]
fn test_rejection_retried_unchanged_is_identical() {
    let f = fixture(&[("Alice", 10), ("Bob", 0)]);

    let results: Vec<_> = (0..5)
        .map(|_| f.transfers.transfer_funds("Alice", "Bob", 11).unwrap())
        .collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(f.store.get_by_name("Alice").unwrap().balance, 10);
    assert!(f.store.recent_transfers(10).unwrap().is_empty());
}

#[test]
fn test_draining_to_exactly_zero() {
    let f = fixture(&[("Alice", 100), ("Bob", 0)]);

    assert!(f.transfers.transfer_funds("Alice", "Bob", 100).unwrap().is_committed());
    let again = f.transfers.transfer_funds("Alice", "Bob", 1).unwrap();
    assert!(matches!(again.reason(), Some(Rejection::InsufficientFunds { balance: 0, .. })));
}

#[test]
fn test_credit_overflow_fails_without_retry_or_mutation() {
    let f = fixture(&[("Sam", 10), ("Rich", i64::MAX)]);

    let err = f.transfers.transfer_funds("Sam", "Rich", 5).unwrap_err();

    assert!(matches!(&err, Error::Validation(msg) if msg.contains("overflow")));
    assert!(!err.is_retryable());
    assert_eq!(f.store.get_by_name("Sam").unwrap().balance, 10);
    assert_eq!(f.store.get_by_name("Rich").unwrap().balance, i64::MAX);
    assert!(f.store.recent_transfers(10).unwrap().is_empty());
}

// ============================================================================
// Journal and Persistence
// ============================================================================

#[test]
fn test_journal_has_one_row_per_commit() {
    let f = fixture(&[("Alice", 100), ("Bob", 50), ("Carol", 0)]);

    let first = f.transfers.transfer_funds("Alice", "Bob", 10).unwrap();
    f.transfers.transfer_funds("Alice", "Alice", 10).unwrap();
    f.transfers.transfer_funds("Carol", "Bob", 10).unwrap();
    let last = f.transfers.transfer_funds("Bob", "Carol", 25).unwrap();

    let history = f.accounts.history(10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].transfer_id, last.receipt().unwrap().transfer_id);
    assert_eq!(history[1].transfer_id, first.receipt().unwrap().transfer_id);
    assert_eq!(
        (history[0].sender.as_str(), history[0].receiver.as_str(), history[0].amount),
        ("Bob", "Carol", 25)
    );
}

#[test]
fn test_balances_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let ctx = MoneyTransferContext::new(dir.path()).unwrap();
        ctx.account_service.open_account("Alice", 100).unwrap();
        ctx.account_service.open_account("Bob", 50).unwrap();
        ctx.transfer_service.transfer_funds("Alice", "Bob", 30).unwrap();
    }

    let ctx = MoneyTransferContext::new(dir.path()).unwrap();
    let accounts = ctx.account_service.list_accounts().unwrap();
    assert_eq!(accounts[0].balance, 70);
    assert_eq!(accounts[1].balance, 80);
    assert_eq!(ctx.account_service.history(5).unwrap().len(), 1);
}

#[test]
fn test_context_honours_settings_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(SETTINGS_FILE),
        r#"{"lockTimeoutMs":1234,"databaseFile":"custom.duckdb"}"#,
    )
    .unwrap();

    let ctx = MoneyTransferContext::new(dir.path()).unwrap();
    assert_eq!(ctx.config.database_file, "custom.duckdb");
    assert!(dir.path().join("custom.duckdb").exists());
    if std::env::var(LOCK_TIMEOUT_ENV).is_err() {
        assert_eq!(ctx.transfer_service.lock_timeout(), Duration::from_millis(1234));
    }
    assert_ne!(ctx.config, Config::default());
}
