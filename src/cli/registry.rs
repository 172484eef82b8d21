use std::collections::HashMap;

use strsim::levenshtein;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Largest edit distance still offered as a "did you mean" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    /// Subcommands offered by tab completion.
    pub subcommands: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            subcommands: &[],
            handler,
        }
    }

    pub fn with_subcommands(mut self, subcommands: &'static [&'static str]) -> Self {
        self.subcommands = subcommands;
        self
    }
}

/// Shell commands in registration order, looked up case-insensitively.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing a command of the same name in place.
    ///
    /// Returns `true` when the name was new.
    pub fn register(&mut self, entry: CommandEntry) -> bool {
        match self.index.get(entry.name) {
            Some(&slot) => {
                self.entries[slot] = entry;
                false
            }
            None => {
                self.index.insert(entry.name, self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        let name = name.trim().to_ascii_lowercase();
        self.index.get(name.as_str()).map(|&slot| &self.entries[slot])
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter()
    }

    /// The registered name closest to `input`, if any is near enough to suggest.
    ///
    /// Ties go to the command registered first.
    pub fn closest(&self, input: &str) -> Option<&'static str> {
        let input = input.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .map(|entry| (levenshtein(entry.name, &input), entry.name))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    /// Command names paired with their subcommands, for line completion.
    pub fn completion_table(&self) -> Vec<(&'static str, &'static [&'static str])> {
        self.entries
            .iter()
            .map(|entry| (entry.name, entry.subcommands))
            .collect()
    }
}
