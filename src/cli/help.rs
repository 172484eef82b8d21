use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    for entry in registry.list() {
        output::row(format!("  {:<12} {}", entry.name, entry.description));
    }
    io::print_hint("Use `help <command>` for usage details.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    output::row(format!("  {}", entry.description));
    for line in entry.usage.lines() {
        output::row(format!("  usage: {}", line.trim()));
    }
}
