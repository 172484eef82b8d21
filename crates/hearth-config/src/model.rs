use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_CATEGORIES: &[&str] = &[
    "housing",
    "utilities",
    "groceries",
    "dining",
    "transport",
    "health",
    "insurance",
    "entertainment",
    "subscriptions",
    "education",
    "savings",
    "salary",
    "other",
];

/// Stores household preferences shared by every command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    /// Anchor day offered to new household members.
    #[serde(default = "Config::default_anchor_day_value")]
    pub default_anchor_day: u32,
    /// Category keys transactions, series and budgets may use.
    #[serde(default = "Config::default_categories")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for household data. Defaults to the platform data directory.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            default_anchor_day: Self::default_anchor_day_value(),
            categories: Self::default_categories(),
            scheduler: SchedulerConfig::default(),
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "en-US".into()
    }

    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_anchor_day_value() -> u32 {
        1
    }

    pub fn default_categories() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|key| key.to_string()).collect()
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("hearth")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=31).contains(&self.default_anchor_day) {
            return Err(ConfigError::Invalid(format!(
                "default_anchor_day must be between 1 and 31, got {}",
                self.default_anchor_day
            )));
        }
        if self.currency.trim().len() != 3 {
            return Err(ConfigError::Invalid(format!(
                "currency must be a three-letter code, got '{}'",
                self.currency
            )));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one category must be configured".into(),
            ));
        }
        if self.scheduler.catch_up_limit == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.catch_up_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Tuning for the recurring-series runner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_conflict_retries")]
    pub conflict_retries: u32,
    #[serde(default = "SchedulerConfig::default_catch_up_limit")]
    pub catch_up_limit: usize,
    #[serde(default = "SchedulerConfig::default_run_on_startup")]
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            conflict_retries: Self::default_conflict_retries(),
            catch_up_limit: Self::default_catch_up_limit(),
            run_on_startup: Self::default_run_on_startup(),
        }
    }
}

impl SchedulerConfig {
    fn default_conflict_retries() -> u32 {
        3
    }

    fn default_catch_up_limit() -> usize {
        1024
    }

    fn default_run_on_startup() -> bool {
        true
    }
}
