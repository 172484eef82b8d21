use hearth_core::AccountService;
use hearth_domain::AccountKind;

use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "account add <name> [kind] [--owner <person>] | account list";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("account", "Manage accounts entries draw on", USAGE, cmd_account)
            .with_subcommands(&["add", "list"]),
    ]
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {USAGE}")));
    };
    let parsed = ParsedArgs::parse(&args[1..], &[])?;
    match sub.to_lowercase().as_str() {
        "add" => add_account(context, &parsed),
        "list" => list_accounts(context),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown account subcommand `{other}`"
        ))),
    }
}

fn add_account(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let name = args.require(0, "account add <name> [kind] [--owner <person>]")?;
    let kind = match args.positional(1) {
        Some(raw) => raw.parse::<AccountKind>()?,
        None => AccountKind::default(),
    };
    let owner = match args.option("owner") {
        Some(key) => context.resolve_person(key)?,
        None => context
            .store()
            .people()?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CommandError::InvalidArguments(
                    "add a person first; accounts belong to a household member".into(),
                )
            })?,
    };
    let account = AccountService::add_account(context.store(), name, kind, owner.user_id)?;
    io::print_success(format!(
        "Added {} account `{}` for {}.",
        account.kind, account.name, owner.name
    ));
    Ok(())
}

fn list_accounts(context: &mut ShellContext) -> CommandResult {
    let household = context.store().snapshot()?;
    if household.accounts.is_empty() {
        io::print_info("No accounts yet. Use `account add <name> [kind]`.");
        return Ok(());
    }
    output::section("Accounts");
    for account in &household.accounts {
        let owner = household
            .people
            .iter()
            .find(|person| person.user_id == account.user_id)
            .map(|person| person.name.as_str())
            .unwrap_or("-");
        output::row(format!(
            "  {:<16} {:<11} owner {:<12} [{}]",
            account.name,
            account.kind.to_string(),
            owner,
            formatters::short_id(account.id)
        ));
    }
    Ok(())
}
