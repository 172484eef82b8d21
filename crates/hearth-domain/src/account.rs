//! Household members and the accounts that fund their entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A household member whose budgets follow a monthly anchor day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    /// Day of month (1..=31) on which this person's budget periods start.
    pub anchor_day: u32,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn new(name: impl Into<String>, user_id: Uuid, anchor_day: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_id,
            anchor_day,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for Person {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Person {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Versioned for Person {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Represents a financial account that series and transactions draw on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub user_id: Uuid,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            user_id,
        }
    }
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Supported account types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Checking => "Checking",
            AccountKind::Savings => "Savings",
            AccountKind::Credit => "Credit",
            AccountKind::Cash => "Cash",
            AccountKind::Investment => "Investment",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for AccountKind {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "checking" | "bank" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit" | "card" => Ok(AccountKind::Credit),
            "cash" => Ok(AccountKind::Cash),
            "investment" | "brokerage" => Ok(AccountKind::Investment),
            other => Err(ParseEnumError {
                kind: "account kind",
                value: other.to_string(),
            }),
        }
    }
}
