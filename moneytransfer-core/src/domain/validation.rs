//! Transfer business rules
//!
//! Pure functions over a request and an account snapshot. Rules run in a
//! fixed order and the first failure wins.

use super::account::Account;
use super::transfer::{Rejection, TransferRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Approved,
    Rejected(Rejection),
}

impl Validation {
    pub fn is_approved(&self) -> bool {
        matches!(self, Validation::Approved)
    }
}

/// Request-shape rules that need no storage access
pub fn check_shape(request: &TransferRequest) -> Validation {
    if request.sender == request.receiver {
        return Validation::Rejected(Rejection::SelfTransfer);
    }
    if request.amount <= 0 {
        return Validation::Rejected(Rejection::InvalidAmount);
    }
    Validation::Approved
}

/// Full rule set against the sender's current balance
pub fn validate(request: &TransferRequest, sender: Option<&Account>) -> Validation {
    if let Validation::Rejected(reason) = check_shape(request) {
        return Validation::Rejected(reason);
    }

    let Some(sender) = sender else {
        return Validation::Rejected(Rejection::AccountNotFound {
            name: request.sender.clone(),
        });
    };

    if sender.balance < request.amount {
        return Validation::Rejected(Rejection::InsufficientFunds {
            name: sender.name.clone(),
            balance: sender.balance,
            requested: request.amount,
        });
    }

    Validation::Approved
}
