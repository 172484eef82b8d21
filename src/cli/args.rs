//! Splits command arguments into positionals, `--key value` options and bare switches.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::cli::core::CommandError;

#[derive(Debug, Default)]
pub struct ParsedArgs {
    positional: Vec<String>,
    options: HashMap<String, String>,
    switches: HashSet<String>,
}

impl ParsedArgs {
    /// `switches` names the options that take no value.
    pub fn parse(args: &[&str], switches: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let Some(key) = arg.strip_prefix("--") else {
                parsed.positional.push((*arg).to_string());
                continue;
            };
            let key = key.to_ascii_lowercase();
            if switches.contains(&key.as_str()) {
                parsed.switches.insert(key);
                continue;
            }
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("option `--{key}` expects a value"))
            })?;
            parsed.options.insert(key, (*value).to_string());
        }
        Ok(parsed)
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn require(&self, index: usize, usage: &str) -> Result<&str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
    }

    /// Positionals from `index` on, joined with spaces.
    pub fn rest(&self, index: usize) -> Option<String> {
        let rest = self.positional.get(index..)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.switches.contains(key)
    }

    pub fn date_option(&self, key: &str) -> Result<Option<NaiveDate>, CommandError> {
        self.option(key).map(parse_date).transpose()
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{raw}` (use YYYY-MM-DD)"))
    })
}

pub fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{raw}`")))?;
    if !value.is_finite() {
        return Err(CommandError::InvalidArguments(format!(
            "invalid amount `{raw}`"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_positionals_options_and_switches() {
        let parsed = ParsedArgs::parse(
            &["Rent", "1200", "--end", "2024-12-01", "--income", "housing"],
            &["income"],
        )
        .unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.positional(2), Some("housing"));
        assert_eq!(parsed.option("end"), Some("2024-12-01"));
        assert!(parsed.flag("income"));
        assert_eq!(
            parsed.date_option("end").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }

    #[test]
    fn dangling_option_is_rejected() {
        let err = ParsedArgs::parse(&["x", "--person"], &[]).unwrap_err();
        assert!(err.to_string().contains("--person"));
    }

    #[test]
    fn rest_joins_trailing_words() {
        let parsed = ParsedArgs::parse(&["Ana", "2024-03-20", "early", "payday"], &[]).unwrap();
        assert_eq!(parsed.rest(2).as_deref(), Some("early payday"));
        assert_eq!(parsed.rest(4), None);
    }
}
