use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use hearth_config::{Config, ConfigManager};
use hearth_core::{Clock, HouseholdStore};
use hearth_domain::CategoryCatalog;

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub store: Box<dyn HouseholdStore>,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub catalog: CategoryCatalog,
    pub clock: Box<dyn Clock>,
    /// Directory holding `config/` and, unless overridden, household data.
    pub base_dir: PathBuf,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, base_dir: {} }}",
            self.running,
            self.last_command,
            self.base_dir.display()
        )
    }
}
