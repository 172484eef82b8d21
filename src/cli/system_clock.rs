use std::env;

use chrono::{DateTime, NaiveDate, Utc};

use hearth_core::{Clock, FixedClock};

use crate::CliError;

/// Environment variable that pins "today" for the shell (YYYY-MM-DD).
pub const TODAY_ENV: &str = "HEARTH_TODAY";

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The clock the shell should use: pinned by `HEARTH_TODAY` when set, the system clock otherwise.
pub fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let today = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{TODAY_ENV} must be YYYY-MM-DD, got `{raw}`"))
            })?;
            Ok(Box::new(FixedClock::new(today)))
        }
        _ => Ok(Box::new(SystemClock)),
    }
}
