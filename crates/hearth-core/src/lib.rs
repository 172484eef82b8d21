//! hearth-core
//!
//! Scheduling and budgeting logic for hearth.
//! Depends on hearth-domain. No CLI, no terminal I/O, no direct filesystem access.

pub mod account_service;
pub mod aggregate_service;
pub mod budget_service;
pub mod calendar;
pub mod error;
pub mod exception_service;
pub mod scheduler;
pub mod series_service;
pub mod storage;
pub mod time;
pub mod transaction_service;

pub use account_service::AccountService;
pub use aggregate_service::*;
pub use budget_service::*;
pub use error::CoreError;
pub use exception_service::*;
pub use scheduler::*;
pub use series_service::*;
pub use storage::{household_warnings, HouseholdBackupInfo, HouseholdStore, MemoryStore};
pub use time::{Clock, FixedClock};
pub use transaction_service::TransactionService;
