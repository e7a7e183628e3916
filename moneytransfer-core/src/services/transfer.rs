//! Transfer service - validated, locked, atomic funds movement
//!
//! A transfer walks `Received -> Validating -> LockAcquired -> Revalidating ->
//! Committing -> Committed`, leaving early as `Rejected` on a business rule or
//! `Aborted` on an infrastructure failure. The balance check that decides a
//! transfer always runs on the snapshot read while both account locks are
//! held, and the two balance updates commit in the same transaction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::validation::{self, Validation};
use crate::domain::{
    BalanceDelta, Rejection, TransferReceipt, TransferRecord, TransferRequest, TransferResult,
    TransferState,
};
use crate::ports::{
    AccountStore, CancelHandle, CommitPlan, Deadline, LockedPair, PairDecision, PairOutcome,
};

/// Per-call overrides for [`TransferService::execute_with`]
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Longest time to wait for both account locks and reach commit
    pub timeout: Duration,
    pub cancel: Option<CancelHandle>,
}

impl TransferOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    pub fn cancellable(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

fn enter(state: TransferState) {
    tracing::debug!(state = state.as_str(), terminal = state.is_terminal(), "transfer state");
}

/// Executes transfers against any [`AccountStore`]
pub struct TransferService<S> {
    store: Arc<S>,
    lock_timeout: Duration,
}

impl<S: AccountStore> TransferService<S> {
    pub fn new(store: Arc<S>, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Move `amount` minor units from `sender` to `receiver`
    ///
    /// Blocks until committed, rejected, or the configured lock timeout
    /// elapses.
    pub fn transfer_funds(&self, sender: &str, receiver: &str, amount: i64) -> Result<TransferResult> {
        self.execute(&TransferRequest::new(sender, receiver, amount))
    }

    pub fn execute(&self, request: &TransferRequest) -> Result<TransferResult> {
        self.execute_with(request, TransferOptions::with_timeout(self.lock_timeout))
    }

    /// Execute with an explicit timeout and optional cancellation handle
    ///
    /// Business-rule failures come back as `Ok(TransferResult::Rejected)`.
    /// `Err` means storage failure, timeout, or cancellation; in every case no
    /// balance changed.
    pub fn execute_with(&self, request: &TransferRequest, options: TransferOptions) -> Result<TransferResult> {
        let span = tracing::debug_span!(
            "transfer",
            sender = %request.sender,
            receiver = %request.receiver,
            amount = request.amount,
        );
        let _entered = span.enter();

        enter(TransferState::Received);
        enter(TransferState::Validating);
        if let Validation::Rejected(reason) = validation::check_shape(request) {
            return Ok(Self::rejected(reason));
        }

        let mut deadline = Deadline::after(options.timeout);
        if let Some(cancel) = options.cancel {
            deadline = deadline.with_cancel(cancel);
        }

        let mut journal: Option<TransferRecord> = None;
        let outcome = self.store.with_locked_pair(
            &request.sender,
            &request.receiver,
            &deadline,
            |pair| {
                enter(TransferState::LockAcquired);
                enter(TransferState::Revalidating);
                match validation::validate(request, Some(&pair.first)) {
                    Validation::Rejected(reason) => PairDecision::Reject(reason),
                    Validation::Approved => {
                        enter(TransferState::Committing);
                        let plan = Self::plan(request, pair);
                        journal = plan.journal.clone();
                        PairDecision::Commit(plan)
                    }
                }
            },
        );

        match outcome {
            Ok(PairOutcome::Committed(pair)) => {
                let record = journal
                    .ok_or_else(|| Error::storage("commit reported without a journal entry"))?;
                enter(TransferState::Committed);
                tracing::info!(
                    transfer_id = %record.transfer_id,
                    sender_balance = pair.first.balance,
                    receiver_balance = pair.second.balance,
                    "transfer committed"
                );
                Ok(TransferResult::Committed(TransferReceipt {
                    transfer_id: record.transfer_id,
                    sender: pair.first.name,
                    receiver: pair.second.name,
                    amount: record.amount,
                    sender_balance: pair.first.balance,
                    receiver_balance: pair.second.balance,
                    committed_at: record.committed_at,
                }))
            }
            Ok(PairOutcome::Rejected(reason)) => Ok(Self::rejected(reason)),
            Err(Error::NotFound(name)) => Ok(Self::rejected(Rejection::AccountNotFound { name })),
            Err(err) => {
                enter(TransferState::Aborted);
                tracing::debug!(error = %err, retryable = err.is_retryable(), "transfer aborted");
                Err(err)
            }
        }
    }

    fn plan(request: &TransferRequest, pair: &LockedPair) -> CommitPlan {
        CommitPlan {
            deltas: vec![
                BalanceDelta::debit(pair.first.id, request.amount),
                BalanceDelta::credit(pair.second.id, request.amount),
            ],
            journal: Some(TransferRecord {
                transfer_id: Uuid::new_v4(),
                sender_id: pair.first.id,
                receiver_id: pair.second.id,
                amount: request.amount,
                committed_at: Utc::now(),
            }),
        }
    }

    fn rejected(reason: Rejection) -> TransferResult {
        enter(TransferState::Rejected);
        // Expected user input, never an error-level event
        tracing::debug!(kind = reason.kind(), reason = %reason, "transfer rejected");
        TransferResult::Rejected(reason)
    }
}
