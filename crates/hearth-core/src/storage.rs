use std::{
    collections::HashSet,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use hearth_domain::{
    Account, Budget, BudgetException, Household, Person, RecurringSeries, Transaction, Versioned,
};

use crate::CoreError;

/// Describes a persisted backup artifact for a household.
#[derive(Debug, Clone)]
pub struct HouseholdBackupInfo {
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends holding one household document.
///
/// Backends only provide a consistent read and an all-or-nothing write; every
/// record-level operation is built on those two. A closure passed to `mutate`
/// that returns an error must leave the stored household untouched.
pub trait HouseholdStore: Send + Sync {
    fn snapshot(&self) -> Result<Household, CoreError>;

    fn mutate(
        &self,
        apply: &mut dyn FnMut(&mut Household) -> Result<(), CoreError>,
    ) -> Result<(), CoreError>;

    fn backup(&self, _note: Option<&str>) -> Result<HouseholdBackupInfo, CoreError> {
        Err(CoreError::Storage(
            "backups are not supported by this store".into(),
        ))
    }

    fn list_backups(&self) -> Result<Vec<HouseholdBackupInfo>, CoreError> {
        Ok(Vec::new())
    }

    fn restore_backup(&self, _backup: &HouseholdBackupInfo) -> Result<(), CoreError> {
        Err(CoreError::Storage(
            "backups are not supported by this store".into(),
        ))
    }

    fn person(&self, id: Uuid) -> Result<Person, CoreError> {
        self.snapshot()?
            .person(id)
            .cloned()
            .ok_or_else(|| CoreError::PersonNotFound(id.to_string()))
    }

    /// Looks a person up by id or case-insensitive name.
    fn find_person(&self, key: &str) -> Result<Person, CoreError> {
        let household = self.snapshot()?;
        let found = match Uuid::parse_str(key) {
            Ok(id) => household.person(id).cloned(),
            Err(_) => household
                .people
                .iter()
                .find(|person| person.name.eq_ignore_ascii_case(key.trim()))
                .cloned(),
        };
        found.ok_or_else(|| CoreError::PersonNotFound(key.to_string()))
    }

    fn people(&self) -> Result<Vec<Person>, CoreError> {
        Ok(self.snapshot()?.people)
    }

    /// Inserts a new person (version 0) or updates an existing one after a version check.
    fn save_person(&self, person: Person) -> Result<Person, CoreError> {
        let mut saved = None;
        self.mutate(&mut |household| {
            let mut next = person.clone();
            match household.people.iter_mut().find(|p| p.id == person.id) {
                Some(stored) => {
                    advance_version(stored, &mut next, "person", person.id)?;
                    *stored = next.clone();
                }
                None => {
                    if household
                        .people
                        .iter()
                        .any(|p| p.name.eq_ignore_ascii_case(&person.name))
                    {
                        return Err(CoreError::Validation(format!(
                            "a person named '{}' already exists",
                            person.name
                        )));
                    }
                    household.people.push(next.clone());
                }
            }
            saved = Some(next);
            Ok(())
        })?;
        saved.ok_or_else(|| CoreError::Storage("person was not saved".into()))
    }

    fn accounts(&self) -> Result<Vec<Account>, CoreError> {
        Ok(self.snapshot()?.accounts)
    }

    /// Looks an account up by id or case-insensitive name.
    fn find_account(&self, key: &str) -> Result<Account, CoreError> {
        let household = self.snapshot()?;
        let found = match Uuid::parse_str(key) {
            Ok(id) => household.account(id).cloned(),
            Err(_) => household
                .accounts
                .iter()
                .find(|account| account.name.eq_ignore_ascii_case(key.trim()))
                .cloned(),
        };
        found.ok_or_else(|| CoreError::AccountNotFound(key.to_string()))
    }

    fn insert_account(&self, account: Account) -> Result<(), CoreError> {
        self.mutate(&mut |household| {
            if household
                .accounts
                .iter()
                .any(|a| a.name.eq_ignore_ascii_case(&account.name))
            {
                return Err(CoreError::Validation(format!(
                    "an account named '{}' already exists",
                    account.name
                )));
            }
            household.accounts.push(account.clone());
            Ok(())
        })
    }

    fn series(&self, id: Uuid) -> Result<RecurringSeries, CoreError> {
        self.snapshot()?
            .series(id)
            .cloned()
            .ok_or(CoreError::SeriesNotFound(id))
    }

    fn list_series(&self) -> Result<Vec<RecurringSeries>, CoreError> {
        Ok(self.snapshot()?.series)
    }

    fn insert_series(&self, series: RecurringSeries) -> Result<(), CoreError> {
        self.mutate(&mut |household| {
            if household.account(series.account_id).is_none() {
                return Err(CoreError::AccountNotFound(series.account_id.to_string()));
            }
            if let Some(person_id) = series.person_id {
                if household.person(person_id).is_none() {
                    return Err(CoreError::PersonNotFound(person_id.to_string()));
                }
            }
            if household.series(series.id).is_some() {
                return Err(CoreError::Validation(format!(
                    "series {} already exists",
                    series.id
                )));
            }
            household.series.push(series.clone());
            Ok(())
        })
    }

    /// Replaces a series when the stored version still matches `series.version`.
    ///
    /// Returns the stored record with its bumped version.
    fn update_series(&self, series: &RecurringSeries) -> Result<RecurringSeries, CoreError> {
        let mut saved = None;
        self.mutate(&mut |household| {
            let stored = household
                .series_mut(series.id)
                .ok_or(CoreError::SeriesNotFound(series.id))?;
            let mut next = series.clone();
            advance_version(stored, &mut next, "series", series.id)?;
            *stored = next.clone();
            saved = Some(next);
            Ok(())
        })?;
        saved.ok_or(CoreError::SeriesNotFound(series.id))
    }

    /// Persists an executed occurrence: the new transaction and the advanced series.
    ///
    /// Both writes land together or not at all. `series` carries the version it was
    /// read at; a mismatch means another writer got there first.
    fn record_execution(
        &self,
        series: &RecurringSeries,
        transaction: Transaction,
    ) -> Result<RecurringSeries, CoreError> {
        let mut saved = None;
        self.mutate(&mut |household| {
            if household.transaction(transaction.id).is_some() {
                return Err(CoreError::Validation(format!(
                    "transaction {} already exists",
                    transaction.id
                )));
            }
            let stored = household
                .series_mut(series.id)
                .ok_or(CoreError::SeriesNotFound(series.id))?;
            let mut next = series.clone();
            advance_version(stored, &mut next, "series", series.id)?;
            *stored = next.clone();
            household.transactions.push(transaction.clone());
            saved = Some(next);
            Ok(())
        })?;
        saved.ok_or(CoreError::SeriesNotFound(series.id))
    }

    fn insert_transaction(&self, transaction: Transaction) -> Result<(), CoreError> {
        self.mutate(&mut |household| {
            if household.account(transaction.account_id).is_none() {
                return Err(CoreError::AccountNotFound(
                    transaction.account_id.to_string(),
                ));
            }
            household.transactions.push(transaction.clone());
            Ok(())
        })
    }

    fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.snapshot()?.transactions)
    }

    fn transactions_for_person(
        &self,
        person_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .snapshot()?
            .transactions_for_person(person_id, start, end))
    }

    fn insert_budget(&self, budget: Budget) -> Result<(), CoreError> {
        self.mutate(&mut |household| {
            if household.person(budget.person_id).is_none() {
                return Err(CoreError::PersonNotFound(budget.person_id.to_string()));
            }
            household.budgets.push(budget.clone());
            Ok(())
        })
    }

    fn budgets_for_person(&self, person_id: Uuid) -> Result<Vec<Budget>, CoreError> {
        Ok(self.snapshot()?.budgets_for_person(person_id))
    }

    fn latest_exception(&self, person_id: Uuid) -> Result<Option<BudgetException>, CoreError> {
        Ok(self.snapshot()?.latest_exception(person_id).cloned())
    }

    fn exceptions_for_person(&self, person_id: Uuid) -> Result<Vec<BudgetException>, CoreError> {
        Ok(self.snapshot()?.exceptions_for_person(person_id))
    }

    /// Appends an exception if the person's latest exception is still `expected_latest`.
    fn insert_exception(
        &self,
        exception: BudgetException,
        expected_latest: Option<Uuid>,
    ) -> Result<(), CoreError> {
        self.mutate(&mut |household| {
            if household.person(exception.person_id).is_none() {
                return Err(CoreError::PersonNotFound(exception.person_id.to_string()));
            }
            let latest = household
                .latest_exception(exception.person_id)
                .map(|existing| existing.id);
            if latest != expected_latest {
                return Err(CoreError::ConcurrentModification {
                    entity: "budget exception",
                    id: exception.person_id,
                });
            }
            household.exceptions.push(exception.clone());
            Ok(())
        })
    }
}

/// Checks `stored` is still at the version `next` was read from and stamps `next` as its successor.
fn advance_version<T: Versioned>(
    stored: &T,
    next: &mut T,
    entity: &'static str,
    id: Uuid,
) -> Result<(), CoreError> {
    if stored.version() != next.version() {
        return Err(CoreError::ConcurrentModification { entity, id });
    }
    next.set_version(stored.version() + 1);
    next.touch(Utc::now());
    Ok(())
}

/// In-process store used by tests and by callers that do not need persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    household: Mutex<Household>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_household(household: Household) -> Self {
        Self {
            household: Mutex::new(household),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Household>, CoreError> {
        self.household
            .lock()
            .map_err(|_| CoreError::Storage("household lock poisoned".into()))
    }
}

impl HouseholdStore for MemoryStore {
    fn snapshot(&self) -> Result<Household, CoreError> {
        Ok(self.lock()?.clone())
    }

    fn mutate(
        &self,
        apply: &mut dyn FnMut(&mut Household) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        apply(&mut working)?;
        working.touch();
        *guard = working;
        Ok(())
    }
}

/// Detects dangling references and other anomalies within a household snapshot.
pub fn household_warnings(household: &Household) -> Vec<String> {
    let account_ids: HashSet<_> = household.accounts.iter().map(|a| a.id).collect();
    let person_ids: HashSet<_> = household.people.iter().map(|p| p.id).collect();
    let transaction_ids: HashSet<_> = household.transactions.iter().map(|t| t.id).collect();
    let mut warnings = Vec::new();

    for txn in &household.transactions {
        if !account_ids.contains(&txn.account_id) {
            warnings.push(format!(
                "transaction {} references unknown account {}",
                txn.id, txn.account_id
            ));
        }
    }
    for series in &household.series {
        if !account_ids.contains(&series.account_id) {
            warnings.push(format!(
                "series {} references unknown account {}",
                series.id, series.account_id
            ));
        }
        if let Some(person) = series.person_id {
            if !person_ids.contains(&person) {
                warnings.push(format!(
                    "series {} references unknown person {}",
                    series.id, person
                ));
            }
        }
        if series.transaction_ids.len() != series.total_executions as usize {
            warnings.push(format!(
                "series {} counts {} executions but lists {} transactions",
                series.id,
                series.total_executions,
                series.transaction_ids.len()
            ));
        }
        for id in &series.transaction_ids {
            if !transaction_ids.contains(id) {
                warnings.push(format!(
                    "series {} references missing transaction {}",
                    series.id, id
                ));
            }
        }
    }
    for budget in &household.budgets {
        if !person_ids.contains(&budget.person_id) {
            warnings.push(format!(
                "budget {} references unknown person {}",
                budget.id, budget.person_id
            ));
        }
    }
    for person in &household.people {
        if !(1..=31).contains(&person.anchor_day) {
            warnings.push(format!(
                "person {} has out-of-range anchor day {}",
                person.name, person.anchor_day
            ));
        }
    }
    warnings
}
