use uuid::Uuid;

use hearth_core::{AccountService, BudgetService};

use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "person add <name> [anchor-day] | person list | person anchor <name> <day>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "person",
        "Manage household members and their budget anchor day",
        USAGE,
        cmd_person,
    )
    .with_subcommands(&["add", "list", "anchor"])]
}

fn cmd_person(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &[])?;
    match sub.to_lowercase().as_str() {
        "add" => add_person(context, &parsed),
        "list" => list_people(context),
        "anchor" => set_anchor(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown person subcommand `{other}`"
        ))),
    }
}

fn add_person(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let name = args.require(0, "person add <name> [anchor-day]")?;
    let anchor_day = match args.positional(1) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            CommandError::InvalidArguments(format!("anchor day must be a number, got `{raw}`"))
        })?,
        None => context.config.default_anchor_day,
    };
    let person = AccountService::add_person(context.store(), name, Uuid::new_v4(), anchor_day)?;
    io::print_success(format!(
        "Added {} (anchor day {}).",
        person.name, person.anchor_day
    ));
    Ok(())
}

fn list_people(context: &mut ShellContext) -> CommandResult {
    let people = context.store().people()?;
    if people.is_empty() {
        io::print_info("No household members yet. Use `person add <name>`.");
        return Ok(());
    }
    let today = context.today();
    output::section("People");
    for person in people {
        let resolved = BudgetService::resolve_for_person(context.store(), person.id, today)?;
        output::row(format!(
            "  {:<16} anchor {:>2}  period {}  [{}]",
            person.name,
            person.anchor_day,
            formatters::window(&resolved.current),
            formatters::short_id(person.id)
        ));
    }
    Ok(())
}

fn set_anchor(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "person anchor <name> <day>";
    let person = context.resolve_person(args.require(0, usage)?)?;
    let raw = args.require(1, usage)?;
    let day = raw.parse::<u32>().map_err(|_| {
        CommandError::InvalidArguments(format!("anchor day must be a number, got `{raw}`"))
    })?;
    let updated = AccountService::set_anchor_day(context.store(), person.id, day)?;
    io::print_success(format!(
        "{} now starts budget periods on day {}.",
        updated.name, updated.anchor_day
    ));
    Ok(())
}
