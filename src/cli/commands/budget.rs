use hearth_core::BudgetService;

use crate::cli::args::{parse_amount, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "budget add <person> <description> <amount> <category[,category...]>
budget show <person> [--json]";

const ADD_USAGE: &str = "budget add <person> <description> <amount> <category[,category...]>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Define budgets and report spending for the current period",
        USAGE,
        cmd_budget,
    )
    .with_subcommands(&["add", "show"])]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &["json"])?;
    match sub.to_lowercase().as_str() {
        "add" => add_budget(context, &parsed),
        "show" => show_budget(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown budget subcommand `{other}`"
        ))),
    }
}

fn add_budget(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let person = context.resolve_person(args.require(0, ADD_USAGE)?)?;
    let description = args.require(1, ADD_USAGE)?;
    let amount = parse_amount(args.require(2, ADD_USAGE)?)?;
    let categories = args
        .require(3, ADD_USAGE)?
        .split(',')
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| context.resolve_category(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let budget =
        BudgetService::add_budget(context.store(), person.id, description, amount, categories)?;
    let tracked: Vec<&str> = budget.categories.iter().map(|key| key.as_str()).collect();
    io::print_success(format!(
        "Budget `{}` of {} per period for {} tracking {}.",
        budget.description,
        formatters::money(budget.amount, context.currency()),
        person.name,
        tracked.join(", ")
    ));
    Ok(())
}

fn show_budget(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let person = context.resolve_person(args.require(0, "budget show <person> [--json]")?)?;
    let report = BudgetService::current_report(context.store(), person.id, context.today())?;

    if args.flag("json") {
        let json = serde_json::to_string_pretty(&report.periods)
            .map_err(|err| CommandError::Message(err.to_string()))?;
        output::row(json);
        return Ok(());
    }

    let resolved = &report.resolved;
    output::section(format!("Budgets: {}", report.person.name));
    output::row(format!(
        "  Period   : {} .. {} (ongoing, {} day(s))",
        resolved.start(),
        resolved.current.end,
        resolved.current.days()
    ));
    output::row(format!("  Next     : {}", formatters::window(&resolved.next)));
    if let Some(shift) = &resolved.shift {
        output::row(format!(
            "  Exception: boundary moved to {} (then {})",
            shift.exception_date,
            formatters::window(&shift.following)
        ));
    }

    if report.periods.is_empty() {
        io::print_info(format!(
            "{} has no budgets yet. Use `budget add`.",
            report.person.name
        ));
        return Ok(());
    }
    let budgets = context.store().budgets_for_person(person.id)?;
    for period in &report.periods {
        let label = budgets
            .iter()
            .find(|budget| budget.id == period.budget_id)
            .map(|budget| budget.description.as_str())
            .unwrap_or("budget");
        output::row(formatters::period_line(label, period, context.currency()));
        for (category, spent) in &period.category_spending {
            output::row(format!(
                "      {:<16} {:>14}",
                category.as_str(),
                formatters::money(*spent, context.currency())
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use hearth_core::BudgetService;
    use hearth_domain::BudgetStatus;

    use crate::cli::core::tests::{run, script_context};

    #[test]
    fn report_aggregates_tracked_categories_only() {
        let (_dir, mut context) = script_context(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        run(
            &mut context,
            &[
                "person add Ana 27",
                "account add Main",
                "budget add Ana Food 300 groceries,dining",
                "txn add Market 120 groceries Main 2024-03-01 --person Ana",
                "txn add Bistro 45.5 dining Main 2024-02-27 --person Ana",
                "txn add Earlier 80 groceries Main 2024-02-26 --person Ana",
                "txn add Bus 20 transport Main 2024-03-02 --person Ana",
                "budget show Ana",
                "budget show Ana --json",
            ],
        );
        let person = context.resolve_person("ana").unwrap();
        let report =
            BudgetService::current_report(context.store(), person.id, context.today()).unwrap();
        let period = &report.periods[0];
        assert_eq!(period.total_spent, 165.5);
        assert_eq!(period.status, BudgetStatus::UnderBudget);
        assert_eq!(period.category_spending.len(), 2);
    }

    #[test]
    fn budget_rejects_unknown_category() {
        let (_dir, mut context) = script_context(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        run(&mut context, &["person add Ana 27"]);
        assert!(context
            .process_line("budget add Ana Fun 100 yachts")
            .is_err());
    }
}
