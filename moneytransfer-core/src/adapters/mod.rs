//! Adapter implementations (hexagonal architecture)
//!
//! Adapters implement the port traits with concrete storage.

pub mod duckdb;
pub mod lock_table;
pub mod memory;

pub use self::duckdb::DuckDbAccountStore;
pub use self::lock_table::LockTable;
pub use self::memory::InMemoryAccountStore;
