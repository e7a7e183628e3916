//! DuckDB account store implementation

use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{validate_opening, Account, TransferRecord};
use crate::ports::{
    plan_balances, AccountStore, CommitPlan, Deadline, LockedPair, PairDecision, PairOutcome,
};
use crate::services::{MigrationResult, MigrationService};

use super::lock_table::LockTable;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_open_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
}

const SELECT_ACCOUNT: &str = "SELECT id, name, balance FROM accounts WHERE name = ?";

fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        balance: row.get(2)?,
    })
}

fn fetch_account(conn: &Connection, name: &str) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(SELECT_ACCOUNT)?;
    let mut rows = stmt.query_map(params![name], row_to_account)?;
    let account = rows.next().transpose()?;
    Ok(account)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::storage(format!("bad timestamp {:?}: {}", s, e)))
}

/// DuckDB-backed account store
///
/// One connection is opened up front; each locked unit of work runs on its
/// own clone so transfers over disjoint accounts commit concurrently.
pub struct DuckDbAccountStore {
    conn: Mutex<Connection>,
    locks: LockTable,
}

impl DuckDbAccountStore {
    /// Open (or create) the database file
    ///
    /// Retries with exponential backoff while another process holds the
    /// file lock.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => return Ok(Self::from_connection(conn)),
                Err(e) => {
                    let err_msg = e.to_string();
                    attempt += 1;
                    if !is_retryable_open_error(&err_msg) || attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                    tracing::warn!(
                        path = %db_path.display(),
                        attempt,
                        max_attempts = MAX_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        error = %err_msg,
                        "database busy, retrying open"
                    );
                    thread::sleep(delay);
                }
            }
        }
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            locks: LockTable::new(),
        }
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extensions are never needed; autoloading them only adds failure modes
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn lock_table(&self) -> &LockTable {
        &self.locks
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            tracing::debug!(applied = ?result.applied, "applied migrations");
        }
        Ok(())
    }

    /// Fresh connection sharing the same database instance
    fn connection(&self) -> Result<Connection> {
        let conn = self.conn.lock()?;
        Ok(conn.try_clone()?)
    }

    fn commit_plan(
        tx: &duckdb::Transaction<'_>,
        pair: &LockedPair,
        plan: &CommitPlan,
    ) -> Result<LockedPair> {
        let next = plan_balances(pair, plan)?;

        for delta in &plan.deltas {
            // CHECK (balance >= 0) backs up plan_balances at the storage level
            let updated = tx.execute(
                "UPDATE accounts SET balance = balance + ? WHERE id = ?",
                params![delta.delta, delta.account_id],
            )?;
            if updated != 1 {
                return Err(Error::storage(format!(
                    "account {} vanished during transfer",
                    delta.account_id
                )));
            }
        }

        if let Some(record) = &plan.journal {
            tx.execute(
                "INSERT INTO transfers (transfer_id, sender_id, receiver_id, amount, committed_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    record.transfer_id.to_string(),
                    record.sender_id,
                    record.receiver_id,
                    record.amount,
                    record.committed_at.to_rfc3339(),
                ],
            )?;
        }

        Ok(next)
    }
}

impl AccountStore for DuckDbAccountStore {
    fn get_by_name(&self, name: &str) -> Result<Account> {
        let conn = self.connection()?;
        fetch_account(&conn, name)?.ok_or_else(|| Error::not_found(name))
    }

    fn list_all(&self) -> Result<Vec<Account>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT id, name, balance FROM accounts ORDER BY id ASC")?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    fn create_account(&self, name: &str, opening_balance: i64) -> Result<Account> {
        validate_opening(name, opening_balance).map_err(Error::validation)?;

        let conn = self.connection()?;
        if fetch_account(&conn, name)?.is_some() {
            return Err(Error::validation(format!("account already exists: {}", name)));
        }

        let id: i64 = conn.query_row(
            "INSERT INTO accounts (name, balance) VALUES (?, ?) RETURNING id",
            params![name, opening_balance],
            |row| row.get(0),
        )?;

        Ok(Account::new(id, name, opening_balance))
    }

    fn with_locked_pair<F>(&self, a: &str, b: &str, deadline: &Deadline, f: F) -> Result<PairOutcome>
    where
        F: FnOnce(&LockedPair) -> PairDecision,
    {
        let _guard = self.locks.lock_pair(a, b, deadline)?;

        let mut conn = self.connection()?;
        // Begun after locking, so the snapshot already reflects every
        // transfer that held these accounts before us
        let tx = conn.transaction()?;

        let first = fetch_account(&tx, a)?.ok_or_else(|| Error::not_found(a))?;
        let second = fetch_account(&tx, b)?.ok_or_else(|| Error::not_found(b))?;
        let pair = LockedPair { first, second };

        let plan = match f(&pair) {
            PairDecision::Reject(reason) => {
                tx.rollback()?;
                return Ok(PairOutcome::Rejected(reason));
            }
            PairDecision::Commit(plan) => plan,
        };

        // Dropping `tx` on any error below rolls everything back
        let next = Self::commit_plan(&tx, &pair, &plan)?;
        deadline.check()?;
        tx.commit()?;

        Ok(PairOutcome::Committed(next))
    }

    fn recent_transfers(&self, limit: usize) -> Result<Vec<TransferRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT transfer_id, sender_id, receiver_id, amount, committed_at
             FROM transfers ORDER BY seq DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, sender_id, receiver_id, amount, committed_at)| {
                Ok(TransferRecord {
                    transfer_id: Uuid::parse_str(&id)
                        .map_err(|e| Error::storage(format!("bad transfer id {:?}: {}", id, e)))?,
                    sender_id,
                    receiver_id,
                    amount,
                    committed_at: parse_timestamp(&committed_at)?,
                })
            })
            .collect()
    }
}
