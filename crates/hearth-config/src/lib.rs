//! hearth-config
//!
//! Persistent household preferences: locale, currency, category catalog,
//! scheduler tuning and where household data lives.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, SchedulerConfig};
