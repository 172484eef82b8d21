#![doc(test(attr(deny(warnings))))]

//! hearth schedules recurring household obligations and reports spending
//! against anchor-aligned budget periods.
//!
//! The library crate hosts the command shell; scheduling and budgeting logic
//! lives in `hearth-core`.

pub mod cli;
pub mod errors;
pub mod utils;

pub use errors::{CliError, HearthError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "hearth tracing initialized");
    });
}
