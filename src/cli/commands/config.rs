use std::path::PathBuf;

use hearth_config::Config;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const KEYS: &str = "locale|currency|color|default_anchor_day|categories|scheduler.conflict_retries|scheduler.catch_up_limit|scheduler.run_on_startup|data_root";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change household preferences",
        "config [show|set <key> <value>]",
        cmd_config,
    )
    .with_subcommands(&["show", "set"])]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show_config(context);
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{KEYS}> <value>"
                )));
            }
            let key = args[1].to_lowercase();
            let value = args[2..].join(" ");
            let mut updated = context.config.clone();
            set_value(&mut updated, &key, value.trim())?;
            context.apply_config(updated)?;
            io::print_success(format!("Updated {key}."));
            if key == "data_root" {
                io::print_hint("Restart the shell to open the household at the new location.");
            }
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{other}`"
        ))),
    }
}

fn show_config(context: &ShellContext) {
    let config = &context.config;
    output::section("Configuration");
    output::row(format!("  locale                     : {}", config.locale));
    output::row(format!("  currency                   : {}", config.currency));
    output::row(format!("  color                      : {}", on_off(config.ui_color_enabled)));
    output::row(format!("  default_anchor_day         : {}", config.default_anchor_day));
    output::row(format!("  categories                 : {}", config.categories.join(", ")));
    output::row(format!(
        "  scheduler.conflict_retries : {}",
        config.scheduler.conflict_retries
    ));
    output::row(format!(
        "  scheduler.catch_up_limit   : {}",
        config.scheduler.catch_up_limit
    ));
    output::row(format!(
        "  scheduler.run_on_startup   : {}",
        on_off(config.scheduler.run_on_startup)
    ));
    output::row(format!(
        "  data_root                  : {}",
        config
            .data_root
            .as_ref()
            .unwrap_or(&context.base_dir)
            .display()
    ));
    output::row(format!(
        "  config file                : {}",
        context.config_manager.config_path().display()
    ));
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn parse_switch(value: &str) -> Result<bool, CommandError> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(CommandError::InvalidArguments(format!(
            "expected on/off, got `{other}`"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("{key} expects a number")))
}

fn set_value(config: &mut Config, key: &str, value: &str) -> Result<(), CommandError> {
    match key {
        "locale" => config.locale = value.to_string(),
        "currency" => config.currency = value.to_uppercase(),
        "color" | "ui_color_enabled" => config.ui_color_enabled = parse_switch(value)?,
        "default_anchor_day" => config.default_anchor_day = parse_number(key, value)?,
        "categories" => {
            config.categories = value
                .split(',')
                .map(|raw| raw.trim().to_lowercase())
                .filter(|raw| !raw.is_empty())
                .collect();
        }
        "scheduler.conflict_retries" => {
            config.scheduler.conflict_retries = parse_number(key, value)?
        }
        "scheduler.catch_up_limit" => config.scheduler.catch_up_limit = parse_number(key, value)?,
        "scheduler.run_on_startup" => config.scheduler.run_on_startup = parse_switch(value)?,
        "data_root" => {
            config.data_root = if value.is_empty() || value.eq_ignore_ascii_case("default") {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown config key `{other}` (expected {KEYS})"
            )))
        }
    }
    Ok(())
}
