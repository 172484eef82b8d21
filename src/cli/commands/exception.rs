use chrono::Months;

use hearth_core::{BudgetService, ExceptionPreview, ExceptionResolver, ExceptionStatus};

use crate::cli::args::{parse_date, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "exception preview <person> <date>
exception add <person> <date> [reason]
exception status <person>";

const PERIODS_USAGE: &str = "periods <person> [from] [to]";

/// Months of history `periods` shows when no range is given.
const DEFAULT_HISTORY_MONTHS: u32 = 6;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "exception",
            "Move one budget period boundary to an earlier date",
            USAGE,
            cmd_exception,
        )
        .with_subcommands(&["preview", "add", "status"]),
        CommandEntry::new(
            "periods",
            "List a person's budget periods including exception shifts",
            PERIODS_USAGE,
            cmd_periods,
        ),
    ]
}

fn cmd_exception(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &[])?;
    match sub.to_lowercase().as_str() {
        "preview" => preview_exception(context, &parsed),
        "add" => add_exception(context, &parsed),
        "status" => exception_status(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown exception subcommand `{other}`"
        ))),
    }
}

fn print_preview(preview: &ExceptionPreview) {
    output::row(format!(
        "  Truncated: {}",
        formatters::window(&preview.shift.truncated)
    ));
    output::row(format!(
        "  Following: {}",
        formatters::window(&preview.shift.following)
    ));
    output::row(format!(
        "  Current after change: {}",
        formatters::window(&preview.resolved.current)
    ));
    if !preview.moves_boundary {
        io::print_hint(format!(
            "{} is already the period's last day; nothing shifts, but no new exception is allowed until {}.",
            preview.exception_date, preview.shift.following.end
        ));
    }
}

fn preview_exception(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "exception preview <person> <date>";
    let person = context.resolve_person(args.require(0, usage)?)?;
    let date = parse_date(args.require(1, usage)?)?;
    let preview = BudgetService::preview_exception(context.store(), person.id, date, context.today())?;
    output::section(format!("Exception preview: {} on {}", person.name, date));
    print_preview(&preview);
    io::print_hint(format!(
        "Run `exception add {} {}` to apply it.",
        person.name, date
    ));
    Ok(())
}

fn add_exception(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "exception add <person> <date> [reason]";
    let person = context.resolve_person(args.require(0, usage)?)?;
    let date = parse_date(args.require(1, usage)?)?;
    let reason = args.rest(2);
    let today = context.today();

    let preview = BudgetService::preview_exception(context.store(), person.id, date, today)?;
    output::section(format!("Exception for {} on {}", person.name, date));
    print_preview(&preview);
    if !context.confirm("Apply this exception? It cannot be undone.")? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }

    let (exception, committed) =
        BudgetService::create_exception(context.store(), person.id, date, reason, today)?;
    io::print_success(format!(
        "{}'s period now ends {}; the next runs {}.",
        person.name,
        exception.exception_date,
        formatters::window(&committed.shift.following)
    ));
    Ok(())
}

fn exception_status(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let person = context.resolve_person(args.require(0, "exception status <person>")?)?;
    let today = context.today();
    let resolved = BudgetService::resolve_for_person(context.store(), person.id, today)?;
    let history = context.store().exceptions_for_person(person.id)?;

    output::section(format!("Exceptions: {}", person.name));
    output::row(format!(
        "  Current period: {}",
        formatters::window(&resolved.current)
    ));
    output::row(format!(
        "  New exception allowed: {}",
        if resolved.can_add_exception { "yes" } else { "no" }
    ));
    if history.is_empty() {
        io::print_info("No exceptions recorded.");
        return Ok(());
    }
    for exception in history.iter().rev() {
        let status = match ExceptionResolver::exception_status(person.anchor_day, today, exception)
        {
            ExceptionStatus::Pending => "pending",
            ExceptionStatus::Open => "open",
            ExceptionStatus::Consumed => "consumed",
        };
        output::row(format!(
            "  {}  {:<8} {}",
            exception.exception_date,
            status,
            exception.reason.as_deref().unwrap_or("")
        ));
    }
    Ok(())
}

fn cmd_periods(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let person = context.resolve_person(parsed.require(0, PERIODS_USAGE)?)?;
    let today = context.today();
    let from = match parsed.positional(1) {
        Some(raw) => parse_date(raw)?,
        None => today
            .checked_sub_months(Months::new(DEFAULT_HISTORY_MONTHS))
            .unwrap_or(today),
    };
    let to = match parsed.positional(2) {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let windows = BudgetService::period_history(context.store(), person.id, from, to)?;
    output::section(format!("Periods: {} ({} .. {})", person.name, from, to));
    for window in &windows {
        let marker = if window.contains(today) { "*" } else { " " };
        output::row(format!(
            "{marker} {}  {:>3} day(s)",
            formatters::window(window),
            window.days()
        ));
    }
    Ok(())
}
