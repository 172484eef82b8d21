//! Budgets, budget exceptions and the derived per-period report.

use std::{cmp::Ordering, collections::BTreeMap, collections::BTreeSet, fmt};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category::CategoryKey, common::*};

/// A per-period allowance over a set of tracked categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    pub categories: BTreeSet<CategoryKey>,
    pub person_id: Uuid,
}

impl Budget {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        categories: impl IntoIterator<Item = CategoryKey>,
        person_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            categories: categories.into_iter().collect(),
            person_id,
        }
    }

    pub fn tracks(&self, category: &CategoryKey) -> bool {
        self.categories.contains(category)
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Budget {
    fn name(&self) -> &str {
        &self.description
    }
}

impl Amounted for Budget {
    fn amount(&self) -> f64 {
        self.amount
    }
}

/// A one-time shift of a person's budget period boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetException {
    pub id: Uuid,
    pub person_id: Uuid,
    pub exception_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BudgetException {
    pub fn new(person_id: Uuid, exception_date: NaiveDate, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            exception_date,
            reason: reason.filter(|text| !text.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

impl Identifiable for BudgetException {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// An inclusive date range `[start, end]` covering one budget period.
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The end date as callers should report it: `None` while the period is ongoing.
    pub fn reported_end(&self, today: NaiveDate) -> Option<NaiveDate> {
        if today <= self.end {
            None
        } else {
            Some(self.end)
        }
    }

    /// The first day after this window.
    pub fn following_day(&self) -> NaiveDate {
        self.end + Duration::days(1)
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Describes how spending compares with the allowance.
pub enum BudgetStatus {
    UnderBudget,
    OnTrack,
    OverBudget,
    Empty,
}

impl BudgetStatus {
    pub fn from_parts(allowance: f64, spent: f64) -> Self {
        if allowance.abs() < f64::EPSILON && spent.abs() < f64::EPSILON {
            return BudgetStatus::Empty;
        }
        match spent.partial_cmp(&allowance).unwrap_or(Ordering::Equal) {
            Ordering::Greater => BudgetStatus::OverBudget,
            Ordering::Less => BudgetStatus::UnderBudget,
            Ordering::Equal => BudgetStatus::OnTrack,
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetStatus::UnderBudget => "Under Budget",
            BudgetStatus::OnTrack => "On Track",
            BudgetStatus::OverBudget => "Over Budget",
            BudgetStatus::Empty => "Empty",
        };
        f.write_str(label)
    }
}

/// Aggregated spending for one budget over one period. Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetPeriod {
    pub budget_id: Uuid,
    pub start_date: NaiveDate,
    /// `None` while the period is still ongoing.
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub allowance: f64,
    pub total_spent: f64,
    /// Allowance minus spending; negative on overrun.
    pub total_saved: f64,
    pub percent_used: Option<f64>,
    pub status: BudgetStatus,
    pub category_spending: BTreeMap<CategoryKey, f64>,
}
