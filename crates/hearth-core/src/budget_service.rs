use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use hearth_domain::{
    Budget, BudgetException, BudgetPeriod, CategoryKey, Person, PeriodWindow,
};

use crate::{
    aggregate_service::PeriodAggregator,
    exception_service::{ExceptionPreview, ExceptionResolver, ResolvedPeriod},
    storage::HouseholdStore,
    CoreError,
};

/// Spending against every budget of one person over their current period.
#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub person: Person,
    pub resolved: ResolvedPeriod,
    pub periods: Vec<BudgetPeriod>,
}

/// Store-backed budget operations for a single person.
pub struct BudgetService;

impl BudgetService {
    pub fn add_budget(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        description: &str,
        amount: f64,
        categories: Vec<CategoryKey>,
    ) -> Result<Budget, CoreError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(CoreError::Validation(
                "budget description cannot be empty".into(),
            ));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::Validation(format!(
                "budget amount must be zero or more, got {amount}"
            )));
        }
        if categories.is_empty() {
            return Err(CoreError::Validation(
                "a budget must track at least one category".into(),
            ));
        }
        let budget = Budget::new(description, amount, categories, person_id);
        store.insert_budget(budget.clone())?;
        info!(budget = %budget.id, person = %person_id, amount, "budget created");
        Ok(budget)
    }

    pub fn resolve_for_person(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        today: NaiveDate,
    ) -> Result<ResolvedPeriod, CoreError> {
        let person = store.person(person_id)?;
        let latest = store.latest_exception(person_id)?;
        Ok(ExceptionResolver::resolve(
            person.anchor_day,
            today,
            latest.as_ref(),
        ))
    }

    /// Resolves the current period and aggregates each of the person's budgets over it.
    pub fn current_report(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        today: NaiveDate,
    ) -> Result<BudgetReport, CoreError> {
        let person = store.person(person_id)?;
        let latest = store.latest_exception(person_id)?;
        let resolved = ExceptionResolver::resolve(person.anchor_day, today, latest.as_ref());
        let window = resolved.current;
        let transactions = store.transactions_for_person(person_id, window.start, window.end)?;
        let budgets = store.budgets_for_person(person_id)?;
        let periods = PeriodAggregator::aggregate_all(window, today, &budgets, &transactions);
        Ok(BudgetReport {
            person,
            resolved,
            periods,
        })
    }

    pub fn preview_exception(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        exception_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<ExceptionPreview, CoreError> {
        let person = store.person(person_id)?;
        let latest = store.latest_exception(person_id)?;
        ExceptionResolver::preview_exception(
            person.anchor_day,
            today,
            latest.as_ref(),
            exception_date,
        )
    }

    /// Validates and persists a new exception.
    ///
    /// The insert only succeeds while the person's latest exception is the one the
    /// validation saw, so of two racing callers at most one commits.
    pub fn create_exception(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        exception_date: NaiveDate,
        reason: Option<String>,
        today: NaiveDate,
    ) -> Result<(BudgetException, ExceptionPreview), CoreError> {
        let person = store.person(person_id)?;
        let latest = store.latest_exception(person_id)?;
        let preview = ExceptionResolver::preview_exception(
            person.anchor_day,
            today,
            latest.as_ref(),
            exception_date,
        )?;
        let exception = BudgetException::new(person_id, exception_date, reason);
        store.insert_exception(exception.clone(), latest.map(|existing| existing.id))?;
        info!(
            person = %person_id,
            exception_date = %exception_date,
            truncated = %preview.shift.truncated,
            following = %preview.shift.following,
            "budget exception created"
        );
        Ok((exception, preview))
    }

    /// Period windows for the person intersecting `[from, to]`, oldest first.
    pub fn period_history(
        store: &dyn HouseholdStore,
        person_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PeriodWindow>, CoreError> {
        if from > to {
            return Err(CoreError::Validation(format!(
                "period range start {from} is after its end {to}"
            )));
        }
        let person = store.person(person_id)?;
        let exceptions = store.exceptions_for_person(person_id)?;
        Ok(ExceptionResolver::periods(
            person.anchor_day,
            from,
            to,
            &exceptions,
        ))
    }
}
