use thiserror::Error;

use hearth_config::ConfigError;
use hearth_core::CoreError;
use hearth_domain::CategoryKeyError;

/// Unified error type for the service, configuration and domain layers.
#[derive(Error, Debug)]
pub enum HearthError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid category: {0}")]
    Category(#[from] CategoryKeyError),
}

impl HearthError {
    /// Failures caused by what the user typed rather than by the environment.
    pub fn is_user_input(&self) -> bool {
        match self {
            HearthError::Core(err) => err.is_user_input(),
            HearthError::Category(_) => true,
            HearthError::Config(ConfigError::Invalid(_)) => true,
            HearthError::Config(_) => false,
        }
    }
}

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] HearthError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Core(HearthError::Core(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Core(HearthError::Config(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn user_input_classification() {
        let window = HearthError::from(CoreError::InvalidExceptionWindow {
            date: NaiveDate::from_ymd_opt(2024, 3, 27).unwrap(),
            start: NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 26).unwrap(),
        });
        assert!(window.is_user_input());

        let storage = HearthError::from(CoreError::Storage("disk full".into()));
        assert!(!storage.is_user_input());

        let invalid = HearthError::from(ConfigError::Invalid("currency".into()));
        assert!(invalid.is_user_input());
    }
}
