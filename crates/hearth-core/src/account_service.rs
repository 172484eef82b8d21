use tracing::info;
use uuid::Uuid;

use hearth_domain::{Account, AccountKind, Person};

use crate::{storage::HouseholdStore, CoreError};

/// Registers household members and the accounts their entries draw on.
pub struct AccountService;

impl AccountService {
    pub fn add_person(
        store: &dyn HouseholdStore,
        name: &str,
        user_id: Uuid,
        anchor_day: u32,
    ) -> Result<Person, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("person name cannot be empty".into()));
        }
        if !(1..=31).contains(&anchor_day) {
            return Err(CoreError::Validation(format!(
                "anchor day must be between 1 and 31, got {anchor_day}"
            )));
        }
        let person = store.save_person(Person::new(name, user_id, anchor_day))?;
        info!(person = %person.id, anchor_day, "person added");
        Ok(person)
    }

    /// Changes a person's anchor day. Takes effect from the next period resolution.
    pub fn set_anchor_day(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        anchor_day: u32,
    ) -> Result<Person, CoreError> {
        if !(1..=31).contains(&anchor_day) {
            return Err(CoreError::Validation(format!(
                "anchor day must be between 1 and 31, got {anchor_day}"
            )));
        }
        let mut person = store.person(person_id)?;
        person.anchor_day = anchor_day;
        store.save_person(person)
    }

    pub fn add_account(
        store: &dyn HouseholdStore,
        name: &str,
        kind: AccountKind,
        user_id: Uuid,
    ) -> Result<Account, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("account name cannot be empty".into()));
        }
        let account = Account::new(name, kind, user_id);
        store.insert_account(account.clone())?;
        info!(account = %account.id, kind = ?kind, "account added");
        Ok(account)
    }
}
