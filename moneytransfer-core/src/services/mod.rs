//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod accounts;
pub mod migration;
mod transfer;

pub use accounts::{AccountService, HistoryEntry};
pub use migration::{MigrationResult, MigrationService};
pub use transfer::{TransferOptions, TransferService};
