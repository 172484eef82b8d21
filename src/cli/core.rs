//! Core CLI dispatch, error reporting and shell context helpers.

use std::{env, io, path::PathBuf};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use thiserror::Error;
use uuid::Uuid;

use hearth_config::{Config, ConfigError, ConfigManager};
use hearth_core::{
    household_warnings, Clock, CoreError, HouseholdStore, Scheduler, SchedulerOptions,
};
use hearth_domain::{
    Account, CategoryCatalog, CategoryKey, CategoryKeyError, ParseEnumError, Person,
    RecurringSeries,
};
use hearth_storage_json::{JsonHouseholdStore, StoragePaths};

use super::commands;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
use super::system_clock;
pub use super::shell_context::{CliMode, ShellContext};
use crate::errors::{CliError, HearthError};

/// Overrides the directory holding config and household data.
pub const HOME_ENV: &str = "HEARTH_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base_dir = match env::var_os(HOME_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Config::default().resolve_data_root(),
        };
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        let data_root = config.data_root.clone().unwrap_or_else(|| base_dir.clone());
        let store = JsonHouseholdStore::new(StoragePaths::under(&data_root))?;
        let clock = system_clock::clock_from_env()?;

        let mut context = Self::with_parts(
            mode,
            base_dir,
            config_manager,
            config,
            Box::new(store),
            clock,
        )?;
        context.startup()?;
        Ok(context)
    }

    /// Assembles a context from already-opened parts without running startup work.
    pub fn with_parts(
        mode: CliMode,
        base_dir: PathBuf,
        config_manager: ConfigManager,
        config: Config,
        store: Box<dyn HouseholdStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        let catalog = CategoryCatalog::from_raw(&config.categories).map_err(HearthError::from)?;

        output::set_preferences(OutputPreferences {
            color: config.ui_color_enabled && mode == CliMode::Interactive,
            quiet: false,
        });

        Ok(ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            store,
            config_manager,
            config,
            catalog,
            clock,
            base_dir,
            last_command: None,
            running: true,
        })
    }

    fn startup(&mut self) -> Result<(), CliError> {
        let household = self.store.snapshot()?;
        for warning in household_warnings(&household) {
            cli_io::print_warning(warning);
        }
        if self.config.scheduler.run_on_startup && !household.series.is_empty() {
            let today = self.today();
            let report = self.scheduler().run_all(today)?;
            if report.executed_count() > 0 {
                cli_io::print_info(format!(
                    "Caught up {} scheduled transaction(s) through {}.",
                    report.executed_count(),
                    today
                ));
            }
            for failure in &report.failures {
                cli_io::print_warning(format!(
                    "Series {} could not run: {}",
                    failure.series_id, failure.error
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn store(&self) -> &dyn HouseholdStore {
        self.store.as_ref()
    }

    pub(crate) fn scheduler(&self) -> Scheduler<'_> {
        Scheduler::new(
            self.store.as_ref(),
            SchedulerOptions {
                conflict_retries: self.config.scheduler.conflict_retries,
                catch_up_limit: self.config.scheduler.catch_up_limit,
            },
        )
    }

    pub(crate) fn currency(&self) -> &str {
        &self.config.currency
    }

    pub(crate) fn prompt(&self) -> String {
        format!("hearth [{}]> ", self.today())
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn completion_entries(&self) -> Vec<(&'static str, &'static [&'static str])> {
        self.registry.completion_table()
    }

    /// Saves `updated` and swaps it in; the running config is untouched when validation fails.
    pub(crate) fn apply_config(&mut self, updated: Config) -> CommandResult {
        let catalog = CategoryCatalog::from_raw(&updated.categories).map_err(HearthError::from)?;
        self.config_manager.save(&updated)?;
        self.config = updated;
        self.catalog = catalog;
        output::set_preferences(OutputPreferences {
            color: self.config.ui_color_enabled && self.mode == CliMode::Interactive,
            quiet: false,
        });
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, raw, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        if let Some(best) = self.registry.closest(input) {
            cli_io::print_info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true)
            .map_err(|err| CliError::Command(err.to_string()))
    }

    /// Asks before a change that cannot be undone; script mode proceeds without asking.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        match self.mode {
            CliMode::Script => Ok(true),
            CliMode::Interactive => cli_io::confirm_action(&self.theme, prompt, true),
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Hearth(HearthError::Core(core)) if core.is_conflict() => {
                cli_io::print_warning(format!(
                    "{core}. Another session changed this record; run the command again."
                ));
            }
            CommandError::Hearth(hearth) if hearth.is_user_input() => {
                cli_io::print_error(&hearth);
                if let HearthError::Core(CoreError::ExceptionAlreadyOpen { .. }) = hearth {
                    cli_io::print_hint("Use `exception status <person>` to see the open window.");
                }
            }
            other => cli_io::print_error(other),
        }
        Ok(())
    }

    pub(crate) fn resolve_person(&self, key: &str) -> Result<Person, CommandError> {
        Ok(self.store.find_person(key)?)
    }

    pub(crate) fn resolve_account(&self, key: &str) -> Result<Account, CommandError> {
        Ok(self.store.find_account(key)?)
    }

    pub(crate) fn resolve_category(&self, raw: &str) -> Result<CategoryKey, CommandError> {
        Ok(self.catalog.resolve(raw)?)
    }

    /// Resolves a series by full id, unique id prefix or case-insensitive description.
    pub(crate) fn resolve_series(&self, key: &str) -> Result<RecurringSeries, CommandError> {
        if let Ok(id) = Uuid::parse_str(key) {
            return Ok(self.store.series(id)?);
        }
        let needle = key.trim().to_lowercase();
        let all = self.store.list_series()?;
        let matches: Vec<&RecurringSeries> = all
            .iter()
            .filter(|series| {
                series.id.simple().to_string().starts_with(&needle)
                    || series.description.to_lowercase() == needle
            })
            .collect();
        match matches.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(CommandError::InvalidArguments(format!(
                "no series matches `{key}`"
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "`{key}` matches {} series; use a longer id",
                matches.len()
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Hearth(#[from] HearthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::Hearth(HearthError::Core(err))
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::Hearth(HearthError::Config(err))
    }
}

impl From<CategoryKeyError> for CommandError {
    fn from(err: CategoryKeyError) -> Self {
        CommandError::Hearth(HearthError::Category(err))
    }
}

impl From<ParseEnumError> for CommandError {
    fn from(err: ParseEnumError) -> Self {
        CommandError::InvalidArguments(err.to_string())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Hearth(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hearth_core::{FixedClock, MemoryStore};

    pub(crate) fn script_context(today: NaiveDate) -> (tempfile::TempDir, ShellContext) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let context = ShellContext::with_parts(
            CliMode::Script,
            dir.path().to_path_buf(),
            manager,
            Config::default(),
            Box::new(MemoryStore::new()),
            Box::new(FixedClock::new(today)),
        )
        .unwrap();
        (dir, context)
    }

    pub(crate) fn run(context: &mut ShellContext, lines: &[&str]) {
        for line in lines {
            context.process_line(line).unwrap();
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exit_stops_the_loop() {
        let (_dir, mut context) = script_context(date(2024, 3, 15));
        assert_eq!(context.process_line("exit").unwrap(), LoopControl::Exit);
        assert_eq!(
            context.process_line("nonsense").unwrap(),
            LoopControl::Continue
        );
    }

    #[test]
    fn series_resolves_by_prefix_and_description() {
        let (_dir, mut context) = script_context(date(2024, 3, 15));
        run(
            &mut context,
            &[
                "person add Ana 27",
                "account add Main checking",
                "series add Rent 1200 housing Main monthly 2024-04-01",
            ],
        );
        let series = context.resolve_series("rent").unwrap();
        let prefix = series.id.simple().to_string()[..6].to_string();
        assert_eq!(context.resolve_series(&prefix).unwrap().id, series.id);
        assert!(context.resolve_series("gym").is_err());
    }

    #[test]
    fn unknown_category_is_user_input() {
        let (_dir, context) = script_context(date(2024, 3, 15));
        let err = context.resolve_category("yachts").unwrap_err();
        match err {
            CommandError::Hearth(hearth) => assert!(hearth.is_user_input()),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
