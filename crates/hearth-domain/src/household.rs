//! The household aggregate persisted by storage backends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    account::{Account, Person},
    budget::{Budget, BudgetException},
    series::RecurringSeries,
    transaction::Transaction,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Every record a household owns, in one serialisable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    #[serde(default = "Household::schema_version_default")]
    pub schema_version: u8,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub series: Vec<RecurringSeries>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub exceptions: Vec<BudgetException>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Household {
    fn default() -> Self {
        Self::new()
    }
}

impl Household {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            people: Vec::new(),
            accounts: Vec::new(),
            series: Vec::new(),
            transactions: Vec::new(),
            budgets: Vec::new(),
            exceptions: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn person(&self, id: Uuid) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn series(&self, id: Uuid) -> Option<&RecurringSeries> {
        self.series.iter().find(|series| series.id == id)
    }

    pub fn series_mut(&mut self, id: Uuid) -> Option<&mut RecurringSeries> {
        self.series.iter_mut().find(|series| series.id == id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    /// Transactions attributed to `person_id` dated within `[start, end]`.
    pub fn transactions_for_person(
        &self,
        person_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Transaction> {
        let mut matches: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|txn| txn.person_id == Some(person_id) && txn.falls_within(start, end))
            .cloned()
            .collect();
        matches.sort_by_key(|txn| txn.date);
        matches
    }

    pub fn budgets_for_person(&self, person_id: Uuid) -> Vec<Budget> {
        self.budgets
            .iter()
            .filter(|budget| budget.person_id == person_id)
            .cloned()
            .collect()
    }

    /// The most recently created exception for `person_id`.
    pub fn latest_exception(&self, person_id: Uuid) -> Option<&BudgetException> {
        self.exceptions
            .iter()
            .filter(|exception| exception.person_id == person_id)
            .max_by_key(|exception| (exception.created_at, exception.exception_date))
    }

    pub fn exceptions_for_person(&self, person_id: Uuid) -> Vec<BudgetException> {
        let mut list: Vec<BudgetException> = self
            .exceptions
            .iter()
            .filter(|exception| exception.person_id == person_id)
            .cloned()
            .collect();
        list.sort_by_key(|exception| exception.exception_date);
        list
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
