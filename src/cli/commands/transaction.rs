use hearth_core::TransactionService;
use hearth_domain::{TransactionRequest, TransactionType};

use crate::cli::args::{parse_amount, parse_date, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "txn add <description> <amount> <category> <account> [date] [--person NAME] [--income]
txn list [--person NAME] [--from D] [--to D]";

const ADD_USAGE: &str =
    "txn add <description> <amount> <category> <account> [date] [--person NAME] [--income]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("txn", "Record and list one-off transactions", USAGE, cmd_txn)
            .with_subcommands(&["add", "list"]),
    ]
}

fn cmd_txn(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &["income"])?;
    match sub.to_lowercase().as_str() {
        "add" => add_transaction(context, &parsed),
        "list" => list_transactions(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown txn subcommand `{other}`"
        ))),
    }
}

fn add_transaction(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let description = args.require(0, ADD_USAGE)?;
    let amount = parse_amount(args.require(1, ADD_USAGE)?)?;
    let category = context.resolve_category(args.require(2, ADD_USAGE)?)?;
    let account = context.resolve_account(args.require(3, ADD_USAGE)?)?;
    let date = match args.positional(4) {
        Some(raw) => parse_date(raw)?,
        None => context.today(),
    };
    let person_id = args
        .option("person")
        .map(|key| context.resolve_person(key).map(|person| person.id))
        .transpose()?;

    let txn = TransactionService::record(
        context.store(),
        TransactionRequest {
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
            date,
            series_id: None,
        },
    )?;
    io::print_success(format!(
        "Recorded {} `{}` of {} on {}.",
        txn.kind.to_string().to_lowercase(),
        txn.description,
        formatters::money(txn.amount, context.currency()),
        txn.date
    ));
    Ok(())
}

fn list_transactions(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let from = args.date_option("from")?;
    let to = args.date_option("to")?;
    let person = args
        .option("person")
        .map(|key| context.resolve_person(key))
        .transpose()?;

    let mut txns = context.store().transactions()?;
    txns.retain(|txn| {
        from.map_or(true, |from| txn.date >= from)
            && to.map_or(true, |to| txn.date <= to)
            && person
                .as_ref()
                .map_or(true, |person| txn.person_id == Some(person.id))
    });
    txns.sort_by_key(|txn| (txn.date, txn.created_at));

    if txns.is_empty() {
        io::print_info("No transactions match.");
        return Ok(());
    }
    output::section("Transactions");
    let mut net = 0.0;
    for txn in &txns {
        let signed = if txn.is_expense() {
            -txn.amount
        } else {
            txn.amount
        };
        net += signed;
        output::row(format!(
            "  {}  {:<20} {:<14} {:>14}{}",
            txn.date,
            txn.description,
            txn.category.as_str(),
            formatters::money(signed, context.currency()),
            if txn.series_id.is_some() { "  (scheduled)" } else { "" }
        ));
    }
    output::row(format!(
        "  {} transaction(s), net {}",
        txns.len(),
        formatters::money(net, context.currency())
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::cli::core::tests::{run, script_context};

    #[test]
    fn add_defaults_to_today_and_validates_category() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (_dir, mut context) = script_context(today);
        run(
            &mut context,
            &[
                "person add Ana 27",
                "account add Main",
                "txn add \"Corner shop\" 12.40 groceries Main --person Ana",
            ],
        );
        let txns = context.store().transactions().unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, today);
        assert_eq!(txns[0].description, "Corner shop");
        assert!(txns[0].person_id.is_some());

        assert!(context
            .process_line("txn add Boat 900 yachts Main")
            .is_err());
        assert!(context.process_line("txn add Refund -5 groceries Main").is_err());
    }
}
