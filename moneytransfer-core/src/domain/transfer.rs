//! Transfer domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A request to move `amount` minor units from `sender` to `receiver`
///
/// Built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender: String,
    pub receiver: String,
    pub amount: i64,
}

impl TransferRequest {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Build a request from raw form or command-line input
    ///
    /// Malformed amount text is an `InvalidAmount` rejection; it is never
    /// coerced to zero.
    pub fn parse(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: &str,
    ) -> Result<Self, Rejection> {
        let amount = amount
            .trim()
            .parse::<i64>()
            .map_err(|_| Rejection::InvalidAmount)?;
        Ok(Self::new(sender, receiver, amount))
    }
}

/// Business-rule rejection of a transfer
///
/// Rejections never mutate state and are safe to retry with corrected input.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    #[error("Self-transfer not allowed")]
    SelfTransfer,

    #[error("Enter non-zero positive amount")]
    InvalidAmount,

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("Insufficient funds in {name}'s account")]
    InsufficientFunds {
        name: String,
        balance: i64,
        requested: i64,
    },
}

impl Rejection {
    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::SelfTransfer => "self_transfer",
            Rejection::InvalidAmount => "invalid_amount",
            Rejection::AccountNotFound { .. } => "account_not_found",
            Rejection::InsufficientFunds { .. } => "insufficient_funds",
        }
    }
}

/// What a committed transfer did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub amount: i64,
    /// Sender balance right after commit
    pub sender_balance: i64,
    /// Receiver balance right after commit
    pub receiver_balance: i64,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Committed,
    Rejected,
}

/// Final result of a transfer, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum TransferResult {
    Committed(TransferReceipt),
    Rejected(Rejection),
}

impl TransferResult {
    pub fn outcome(&self) -> Outcome {
        match self {
            TransferResult::Committed(_) => Outcome::Committed,
            TransferResult::Rejected(_) => Outcome::Rejected,
        }
    }

    /// Present iff the transfer was rejected
    pub fn reason(&self) -> Option<&Rejection> {
        match self {
            TransferResult::Committed(_) => None,
            TransferResult::Rejected(reason) => Some(reason),
        }
    }

    pub fn receipt(&self) -> Option<&TransferReceipt> {
        match self {
            TransferResult::Committed(receipt) => Some(receipt),
            TransferResult::Rejected(_) => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.outcome() == Outcome::Committed
    }
}

/// Journal row written in the same transaction as the balance deltas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transfer_id: Uuid,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub amount: i64,
    pub committed_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn from_receipt(receipt: &TransferReceipt, sender_id: i64, receiver_id: i64) -> Self {
        Self {
            transfer_id: receipt.transfer_id,
            sender_id,
            receiver_id,
            amount: receipt.amount,
            committed_at: receipt.committed_at,
        }
    }
}

/// Lifecycle of a single transfer inside the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Received,
    Validating,
    LockAcquired,
    Revalidating,
    Committing,
    Committed,
    Rejected,
    Aborted,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Committed | TransferState::Rejected | TransferState::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Received => "received",
            TransferState::Validating => "validating",
            TransferState::LockAcquired => "lock_acquired",
            TransferState::Revalidating => "revalidating",
            TransferState::Committing => "committing",
            TransferState::Committed => "committed",
            TransferState::Rejected => "rejected",
            TransferState::Aborted => "aborted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        let request = TransferRequest::parse("Alice", "Bob", " 30 ").unwrap();
        assert_eq!(request.amount, 30);

        // Malformed input is rejected, not defaulted
        for bad in ["", "abc", "1.5", "10$"] {
            assert_eq!(
                TransferRequest::parse("Alice", "Bob", bad),
                Err(Rejection::InvalidAmount)
            );
        }

        // Parsing accepts negatives; the validator rejects them
        assert_eq!(TransferRequest::parse("Alice", "Bob", "-5").unwrap().amount, -5);
    }

    #[test]
    fn test_reason_present_iff_rejected() {
        let rejected = TransferResult::Rejected(Rejection::SelfTransfer);
        assert_eq!(rejected.outcome(), Outcome::Rejected);
        assert_eq!(rejected.reason(), Some(&Rejection::SelfTransfer));
        assert!(rejected.receipt().is_none());

        let committed = TransferResult::Committed(TransferReceipt {
            transfer_id: Uuid::new_v4(),
            sender: "Alice".into(),
            receiver: "Bob".into(),
            amount: 30,
            sender_balance: 70,
            receiver_balance: 80,
            committed_at: Utc::now(),
        });
        assert_eq!(committed.outcome(), Outcome::Committed);
        assert!(committed.reason().is_none());
    }

    #[test]
    fn test_rejection_messages() {
        let insufficient = Rejection::InsufficientFunds {
            name: "Alice".into(),
            balance: 5,
            requested: 10,
        };
        assert_eq!(insufficient.to_string(), "Insufficient funds in Alice's account");
        assert_eq!(insufficient.kind(), "insufficient_funds");

        let json = serde_json::to_value(&TransferResult::Rejected(Rejection::InvalidAmount)).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["detail"]["kind"], "invalid_amount");
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Committed.is_terminal());
        assert!(TransferState::Aborted.is_terminal());
        assert!(!TransferState::LockAcquired.is_terminal());
    }
}
