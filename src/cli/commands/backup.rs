use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "backup [create [note] | list | restore <name|index>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        "Snapshot, list and restore the household file",
        USAGE,
        cmd_backup,
    )
    .with_subcommands(&["create", "list", "restore"])]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let sub = args.first().map(|s| s.to_lowercase());
    match sub.as_deref() {
        None | Some("create") => {
            let note = if args.len() > 1 {
                Some(args[1..].join(" "))
            } else {
                None
            };
            let info = context.store().backup(note.as_deref())?;
            io::print_success(format!("Backup written: {}", info.id));
            Ok(())
        }
        Some("list") => {
            let backups = context.store().list_backups()?;
            if backups.is_empty() {
                io::print_info("No backups yet. Use `backup create [note]`.");
                return Ok(());
            }
            output::section("Backups");
            for (index, info) in backups.iter().enumerate() {
                output::row(format!("  {:>2}. {}  ({})", index + 1, info.id, info.created_at));
            }
            Ok(())
        }
        Some("restore") => {
            let reference = args.get(1).ok_or_else(|| {
                CommandError::InvalidArguments("usage: backup restore <name|index>".into())
            })?;
            let backups = context.store().list_backups()?;
            let chosen = match reference.parse::<usize>() {
                Ok(index) if index >= 1 => backups.get(index - 1),
                _ => backups
                    .iter()
                    .find(|info| info.id == *reference || info.id.starts_with(*reference)),
            }
            .cloned()
            .ok_or_else(|| CommandError::Message(format!("backup `{reference}` not found")))?;

            if !context.confirm(&format!(
                "Replace the current household with `{}`?",
                chosen.id
            ))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.store().restore_backup(&chosen)?;
            io::print_success(format!("Restored household from {}.", chosen.id));
            Ok(())
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown backup subcommand `{other}` (usage: {USAGE})"
        ))),
    }
}
