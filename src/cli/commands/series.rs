use hearth_core::SeriesLifecycle;
use hearth_domain::{Frequency, NewSeries, SeriesState, TransactionType};

use crate::cli::args::{parse_amount, parse_date, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "series add <description> <amount> <category> <account> <frequency> <start> [--end D] [--first-due D] [--person NAME] [--income]
series list
series pause <id> | series resume <id>
series run [id]
series forecast <id> [count]";

const ADD_USAGE: &str = "series add <description> <amount> <category> <account> <frequency> <start> [--end D] [--first-due D] [--person NAME] [--income]";

const DEFAULT_FORECAST: usize = 6;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "series",
        "Schedule recurring obligations and run catch-up",
        USAGE,
        cmd_series,
    )
    .with_subcommands(&["add", "list", "pause", "resume", "run", "forecast"])]
}

fn cmd_series(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &["income"])?;
    match sub.to_lowercase().as_str() {
        "add" => add_series(context, &parsed),
        "list" => list_series(context),
        "pause" => pause_series(context, &parsed),
        "resume" => resume_series(context, &parsed),
        "run" => run_series(context, &parsed),
        "forecast" => forecast_series(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown series subcommand `{other}`"
        ))),
    }
}

fn add_series(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let description = args.require(0, ADD_USAGE)?;
    let amount = parse_amount(args.require(1, ADD_USAGE)?)?;
    let category = context.resolve_category(args.require(2, ADD_USAGE)?)?;
    let account = context.resolve_account(args.require(3, ADD_USAGE)?)?;
    let frequency: Frequency = args.require(4, ADD_USAGE)?.parse()?;
    let start_date = parse_date(args.require(5, ADD_USAGE)?)?;
    let person_id = args
        .option("person")
        .map(|key| context.resolve_person(key).map(|person| person.id))
        .transpose()?;

    let series = context.scheduler().register(NewSeries {
        description: description.to_string(),
        amount,
        kind: if args.flag("income") {
            TransactionType::Income
        } else {
            TransactionType::Expense
        },
        category,
        account_id: account.id,
        user_id: account.user_id,
        person_id,
        frequency,
        start_date,
        end_date: args.date_option("end")?,
        first_due: args.date_option("first-due")?,
    })?;
    io::print_success(format!(
        "Scheduled `{}` {} {}, first due {} [{}].",
        series.description,
        series.frequency.label().to_lowercase(),
        formatters::money(series.amount, context.currency()),
        series.due_date,
        formatters::short_id(series.id)
    ));
    Ok(())
}

fn list_series(context: &mut ShellContext) -> CommandResult {
    let all = context.store().list_series()?;
    if all.is_empty() {
        io::print_info("No recurring series yet. Use `series add`.");
        return Ok(());
    }
    let today = context.today();
    output::section("Recurring series");
    for series in &all {
        let marker = if series.is_due(today) { "*" } else { " " };
        output::row(format!(
            "{marker} {:<8} {:<20} {:>14} {:<9} due {}  {:<7} runs {:>3}  ends {}",
            formatters::short_id(series.id),
            series.description,
            formatters::money(series.amount, context.currency()),
            series.frequency.label(),
            series.due_date,
            series.state().to_string(),
            series.total_executions,
            formatters::optional_date(series.end_date)
        ));
    }
    io::print_hint("`*` marks series due today or earlier; `series run` catches them up.");
    Ok(())
}

fn pause_series(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let series = context.resolve_series(args.require(0, "series pause <id>")?)?;
    if context.scheduler().pause(series.id)? {
        io::print_success(format!("Paused `{}`.", series.description));
    } else {
        io::print_info(format!("`{}` was already paused.", series.description));
    }
    Ok(())
}

fn resume_series(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let series = context.resolve_series(args.require(0, "series resume <id>")?)?;
    if !context.scheduler().resume(series.id)? {
        io::print_info(format!("`{}` is already active.", series.description));
        return Ok(());
    }
    io::print_success(format!("Resumed `{}`.", series.description));
    let limit = context.config.scheduler.catch_up_limit;
    let backlog = SeriesLifecycle::pending_occurrences(&series, context.today(), limit);
    if !backlog.is_empty() {
        io::print_hint(format!(
            "{} missed occurrence(s) since {} run on the next `series run`.",
            backlog.len(),
            series.due_date
        ));
    }
    Ok(())
}

fn run_series(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let today = context.today();
    if let Some(key) = args.positional(0) {
        let series = context.resolve_series(key)?;
        let run = context.scheduler().run_series(series.id, today)?;
        for txn in &run.executed {
            output::row(format!(
                "  {}  {:<20} {:>14}",
                txn.date,
                txn.description,
                formatters::money(txn.amount, context.currency())
            ));
        }
        io::print_success(format!(
            "`{}`: {} transaction(s) created, next due {} ({}).",
            series.description,
            run.executed.len(),
            run.due_date,
            run.state
        ));
        if run.limited {
            io::print_warning("Catch-up limit reached; run again to continue.");
        }
        return Ok(());
    }

    let report = context.scheduler().run_all(today)?;
    for run in report.runs.iter().filter(|run| !run.executed.is_empty()) {
        let description = context
            .store()
            .series(run.series_id)
            .map(|series| series.description)
            .unwrap_or_else(|_| formatters::short_id(run.series_id));
        output::row(format!(
            "  {:<20} {:>3} created  next due {}  {}",
            description,
            run.executed.len(),
            run.due_date,
            if run.state == SeriesState::Expired {
                "expired"
            } else {
                ""
            }
        ));
        if run.limited {
            io::print_warning(format!(
                "`{description}` hit the catch-up limit; run again to continue."
            ));
        }
    }
    for failure in &report.failures {
        io::print_error(format!(
            "Series {} failed: {}",
            formatters::short_id(failure.series_id),
            failure.error
        ));
    }
    io::print_success(format!(
        "Catch-up through {today} created {} transaction(s).",
        report.executed_count()
    ));
    Ok(())
}

fn forecast_series(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let series = context.resolve_series(args.require(0, "series forecast <id> [count]")?)?;
    let count = match args.positional(1) {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            CommandError::InvalidArguments(format!("count must be a number, got `{raw}`"))
        })?,
        None => DEFAULT_FORECAST,
    };
    let dates = SeriesLifecycle::forecast(&series, count);
    if dates.is_empty() {
        io::print_info(format!(
            "`{}` is {} and has no upcoming occurrences.",
            series.description,
            series.state().to_string().to_lowercase()
        ));
        return Ok(());
    }
    output::section(format!("Upcoming: {}", series.description));
    for date in dates {
        output::row(format!(
            "  {}  {}",
            date,
            formatters::money(series.amount, context.currency())
        ));
    }
    Ok(())
}
