//! Recurring obligation templates and their lifecycle state.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category::CategoryKey, common::*};

/// A recurring obligation that periodically materializes into a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringSeries {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: CategoryKey,
    pub account_id: Uuid,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Uuid>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub is_active: bool,
    #[serde(default)]
    pub total_executions: u32,
    #[serde(default)]
    pub transaction_ids: Vec<Uuid>,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringSeries {
    /// Returns the lifecycle state derived from the activity flag and the end date.
    ///
    /// Expiry wins over pausing: a series whose due date has moved past its end date
    /// never executes again regardless of `is_active`.
    pub fn state(&self) -> SeriesState {
        if self.is_expired() {
            SeriesState::Expired
        } else if self.is_active {
            SeriesState::Active
        } else {
            SeriesState::Paused
        }
    }

    pub fn is_expired(&self) -> bool {
        self.end_date.is_some_and(|end| self.due_date > end)
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.state() == SeriesState::Active && self.due_date <= today
    }

    pub fn last_transaction(&self) -> Option<Uuid> {
        self.transaction_ids.last().copied()
    }
}

impl Identifiable for RecurringSeries {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for RecurringSeries {
    fn name(&self) -> &str {
        &self.description
    }
}

impl Amounted for RecurringSeries {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Versioned for RecurringSeries {
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

/// User-supplied values for creating a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSeries {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub category: CategoryKey,
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub person_id: Option<Uuid>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Explicit first due date; defaults to `start_date`.
    pub first_due: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Lifecycle states of a recurring series. `Expired` is terminal.
pub enum SeriesState {
    Active,
    Paused,
    Expired,
}

impl fmt::Display for SeriesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeriesState::Active => "Active",
            SeriesState::Paused => "Paused",
            SeriesState::Expired => "Expired",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> RecurringSeries {
        let now = Utc::now();
        RecurringSeries {
            id: Uuid::new_v4(),
            description: "Rent".into(),
            amount: 1200.0,
            kind: TransactionType::Expense,
            category: CategoryKey::parse("housing").unwrap(),
            account_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            person_id: None,
            frequency: Frequency::Monthly,
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 6, 1)),
            due_date: date(2024, 1, 1),
            is_active: true,
            total_executions: 0,
            transaction_ids: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn paused_is_not_expired() {
        let mut series = sample();
        series.is_active = false;
        assert_eq!(series.state(), SeriesState::Paused);
        assert!(!series.is_expired());
    }

    #[test]
    fn due_date_past_end_means_expired_even_when_paused() {
        let mut series = sample();
        series.is_active = false;
        series.due_date = date(2024, 7, 1);
        assert_eq!(series.state(), SeriesState::Expired);
    }

    #[test]
    fn serializes_type_field_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["frequency"], "monthly");
    }
}
