//! hearth-domain
//!
//! Pure household finance models (series, transactions, budgets, exceptions).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod household;
pub mod series;
pub mod transaction;

pub use account::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use household::*;
pub use series::*;
pub use transaction::*;
