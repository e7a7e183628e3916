//! Core domain entities
//!
//! Pure data structures and business rules - no I/O or storage access.

mod account;
mod transfer;
pub mod result;
pub mod validation;

pub use account::{validate_opening, Account, BalanceDelta, DeltaError};
pub use transfer::{
    Outcome, Rejection, TransferReceipt, TransferRecord, TransferRequest, TransferResult,
    TransferState,
};
pub use validation::Validation;
