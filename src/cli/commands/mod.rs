pub mod account;
pub mod backup;
pub mod budget;
pub mod config;
pub mod exception;
pub mod person;
pub mod series;
pub mod system;
pub mod transaction;

use crate::cli::registry::{CommandEntry, CommandRegistry};

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(person::definitions());
    commands.extend(account::definitions());
    commands.extend(series::definitions());
    commands.extend(transaction::definitions());
    commands.extend(budget::definitions());
    commands.extend(exception::definitions());
    commands.extend(config::definitions());
    commands.extend(backup::definitions());
    commands
}

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in all_definitions() {
        registry.register(entry);
    }
}
