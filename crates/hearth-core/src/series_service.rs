//! Lifecycle of recurring series: creation, execution, pause and resume.

use chrono::{NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use hearth_domain::{NewSeries, RecurringSeries, SeriesState, TransactionRequest};

use crate::{calendar, CoreError};

/// The result of evaluating a due series: what to record and how the series advances.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub series_id: Uuid,
    /// Version of the series the plan was computed from.
    pub expected_version: u64,
    /// The due date being materialized.
    pub occurrence: NaiveDate,
    pub request: TransactionRequest,
    pub next_due: NaiveDate,
    /// `true` when `next_due` passes the series end date.
    pub expires: bool,
}

/// Stateless operations over [`RecurringSeries`] values.
pub struct SeriesLifecycle;

impl SeriesLifecycle {
    /// Validates a draft and builds an active series due on its first occurrence.
    pub fn create(draft: NewSeries) -> Result<RecurringSeries, CoreError> {
        let description = draft.description.trim().to_string();
        if description.is_empty() {
            return Err(CoreError::Validation(
                "series description cannot be empty".into(),
            ));
        }
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(CoreError::Validation(format!(
                "series amount must be positive, got {}",
                draft.amount
            )));
        }
        let due_date = draft.first_due.unwrap_or(draft.start_date);
        if due_date < draft.start_date {
            return Err(CoreError::Validation(format!(
                "first due date {} is before start date {}",
                due_date, draft.start_date
            )));
        }
        if let Some(end) = draft.end_date {
            if end < due_date {
                return Err(CoreError::Validation(format!(
                    "end date {} is before first due date {}",
                    end, due_date
                )));
            }
        }

        let now = Utc::now();
        Ok(RecurringSeries {
            id: Uuid::new_v4(),
            description,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            account_id: draft.account_id,
            user_id: draft.user_id,
            person_id: draft.person_id,
            frequency: draft.frequency,
            start_date: draft.start_date,
            end_date: draft.end_date,
            due_date,
            is_active: true,
            total_executions: 0,
            transaction_ids: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decides whether `series` executes on `today` without mutating it.
    ///
    /// Paused, expired and not-yet-due series yield the matching steady-state error.
    /// Callers catching up on missed days invoke this once per occurrence, applying
    /// each plan before evaluating again.
    pub fn evaluate(series: &RecurringSeries, today: NaiveDate) -> Result<ExecutionPlan, CoreError> {
        match series.state() {
            SeriesState::Expired => return Err(CoreError::SeriesExpired(series.id)),
            SeriesState::Paused => return Err(CoreError::SeriesPaused(series.id)),
            SeriesState::Active => {}
        }
        if series.due_date > today {
            return Err(CoreError::NotDue {
                id: series.id,
                due_date: series.due_date,
            });
        }

        let next_due = calendar::next_due_date(series.due_date, series.frequency);
        let expires = series.end_date.is_some_and(|end| next_due > end);
        debug!(
            series = %series.id,
            occurrence = %series.due_date,
            next_due = %next_due,
            expires,
            "series due"
        );

        Ok(ExecutionPlan {
            series_id: series.id,
            expected_version: series.version,
            occurrence: series.due_date,
            request: TransactionRequest {
                description: series.description.clone(),
                amount: series.amount,
                kind: series.kind,
                category: series.category.clone(),
                account_id: series.account_id,
                user_id: series.user_id,
                person_id: series.person_id,
                date: series.due_date,
                series_id: Some(series.id),
            },
            next_due,
            expires,
        })
    }

    /// Commits a plan once the transaction it requested has been created.
    pub fn apply(
        series: &mut RecurringSeries,
        plan: &ExecutionPlan,
        transaction_id: Uuid,
    ) -> Result<(), CoreError> {
        if series.id != plan.series_id
            || series.version != plan.expected_version
            || series.due_date != plan.occurrence
        {
            return Err(CoreError::ConcurrentModification {
                entity: "series",
                id: plan.series_id,
            });
        }
        series.transaction_ids.push(transaction_id);
        series.total_executions += 1;
        series.due_date = plan.next_due;
        Ok(())
    }

    /// Evaluates and applies in one step, returning the plan that ran.
    pub fn execute(
        series: &mut RecurringSeries,
        today: NaiveDate,
        transaction_id: Uuid,
    ) -> Result<ExecutionPlan, CoreError> {
        let plan = Self::evaluate(series, today)?;
        Self::apply(series, &plan, transaction_id)?;
        Ok(plan)
    }

    /// Pauses an active series. Returns `false` when it was already paused.
    pub fn pause(series: &mut RecurringSeries) -> Result<bool, CoreError> {
        match series.state() {
            SeriesState::Expired => Err(CoreError::SeriesExpired(series.id)),
            SeriesState::Paused => Ok(false),
            SeriesState::Active => {
                series.is_active = false;
                Ok(true)
            }
        }
    }

    /// Resumes a paused series with its due date untouched.
    ///
    /// Occurrences missed while paused are executed on the next catch-up run.
    pub fn resume(series: &mut RecurringSeries) -> Result<bool, CoreError> {
        match series.state() {
            SeriesState::Expired => Err(CoreError::SeriesExpired(series.id)),
            SeriesState::Active => Ok(false),
            SeriesState::Paused => {
                series.is_active = true;
                Ok(true)
            }
        }
    }

    /// Occurrence dates a catch-up run on `today` would materialize, capped at `limit`.
    pub fn pending_occurrences(
        series: &RecurringSeries,
        today: NaiveDate,
        limit: usize,
    ) -> Vec<NaiveDate> {
        if series.state() != SeriesState::Active {
            return Vec::new();
        }
        let mut dates = Vec::new();
        let mut due = series.due_date;
        while due <= today && dates.len() < limit {
            dates.push(due);
            due = calendar::next_due_date(due, series.frequency);
            if series.end_date.is_some_and(|end| due > end) {
                break;
            }
        }
        dates
    }

    /// The next `count` dates an active series would execute on.
    pub fn forecast(series: &RecurringSeries, count: usize) -> Vec<NaiveDate> {
        if series.state() != SeriesState::Active {
            return Vec::new();
        }
        let mut dates = Vec::with_capacity(count);
        let mut due = series.due_date;
        while dates.len() < count {
            if series.end_date.is_some_and(|end| due > end) {
                break;
            }
            dates.push(due);
            due = calendar::next_due_date(due, series.frequency);
        }
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::{CategoryKey, Frequency, TransactionType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(start: NaiveDate, end: Option<NaiveDate>, frequency: Frequency) -> NewSeries {
        NewSeries {
            description: "Gym".into(),
            amount: 45.0,
            kind: TransactionType::Expense,
            category: CategoryKey::parse("health").unwrap(),
            account_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            person_id: None,
            frequency,
            start_date: start,
            end_date: end,
            first_due: None,
        }
    }

    #[test]
    fn create_starts_due_on_start_date() {
        let series = SeriesLifecycle::create(draft(date(2024, 5, 1), None, Frequency::Weekly))
            .expect("valid draft");
        assert_eq!(series.due_date, date(2024, 5, 1));
        assert!(series.is_active);
        assert_eq!(series.total_executions, 0);
    }

    #[test]
    fn create_rejects_inconsistent_dates() {
        let mut bad = draft(date(2024, 5, 1), Some(date(2024, 4, 1)), Frequency::Weekly);
        assert!(matches!(
            SeriesLifecycle::create(bad.clone()),
            Err(CoreError::Validation(_))
        ));
        bad.end_date = None;
        bad.first_due = Some(date(2024, 4, 30));
        assert!(matches!(
            SeriesLifecycle::create(bad),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let mut bad = draft(date(2024, 5, 1), None, Frequency::Weekly);
        bad.amount = 0.0;
        assert!(SeriesLifecycle::create(bad).is_err());
    }

    #[test]
    fn not_due_is_idempotent() {
        let series =
            SeriesLifecycle::create(draft(date(2024, 5, 10), None, Frequency::Weekly)).unwrap();
        let before = series.clone();
        for _ in 0..3 {
            let err = SeriesLifecycle::evaluate(&series, date(2024, 5, 9)).unwrap_err();
            assert!(matches!(err, CoreError::NotDue { due_date, .. } if due_date == date(2024, 5, 10)));
        }
        assert_eq!(series, before);
    }

    #[test]
    fn execution_records_request_and_advances() {
        let mut series =
            SeriesLifecycle::create(draft(date(2024, 5, 1), None, Frequency::Biweekly)).unwrap();
        let txn = Uuid::new_v4();
        let plan = SeriesLifecycle::execute(&mut series, date(2024, 5, 1), txn).unwrap();

        assert_eq!(plan.request.date, date(2024, 5, 1));
        assert_eq!(plan.request.series_id, Some(series.id));
        assert_eq!(plan.request.amount, 45.0);
        assert_eq!(series.due_date, date(2024, 5, 15));
        assert_eq!(series.total_executions, 1);
        assert_eq!(series.transaction_ids, vec![txn]);
    }

    #[test]
    fn month_end_series_expires_after_passing_end_date() {
        let mut series = SeriesLifecycle::create(draft(
            date(2024, 1, 31),
            Some(date(2024, 3, 15)),
            Frequency::Monthly,
        ))
        .unwrap();
        let today = date(2024, 6, 1);

        SeriesLifecycle::execute(&mut series, today, Uuid::new_v4()).unwrap();
        assert_eq!(series.due_date, date(2024, 2, 29));
        assert_eq!(series.state(), SeriesState::Active);

        let plan = SeriesLifecycle::execute(&mut series, today, Uuid::new_v4()).unwrap();
        assert!(plan.expires);
        assert_eq!(series.due_date, date(2024, 3, 29));
        assert_eq!(series.state(), SeriesState::Expired);

        let err = SeriesLifecycle::evaluate(&series, today).unwrap_err();
        assert!(matches!(err, CoreError::SeriesExpired(_)));
        assert_eq!(series.total_executions, 2);
    }

    #[test]
    fn paused_series_keeps_due_date_and_refuses_execution() {
        let mut series =
            SeriesLifecycle::create(draft(date(2024, 1, 1), None, Frequency::Monthly)).unwrap();
        assert!(SeriesLifecycle::pause(&mut series).unwrap());
        assert!(!SeriesLifecycle::pause(&mut series).unwrap());
        let err = SeriesLifecycle::evaluate(&series, date(2024, 4, 1)).unwrap_err();
        assert!(matches!(err, CoreError::SeriesPaused(_)));

        assert!(SeriesLifecycle::resume(&mut series).unwrap());
        assert_eq!(series.due_date, date(2024, 1, 1));
        assert_eq!(
            SeriesLifecycle::pending_occurrences(&series, date(2024, 4, 1), 100),
            vec![
                date(2024, 1, 1),
                date(2024, 2, 1),
                date(2024, 3, 1),
                date(2024, 4, 1)
            ]
        );
    }

    #[test]
    fn expired_series_cannot_be_paused_or_resumed() {
        let mut series = SeriesLifecycle::create(draft(
            date(2024, 1, 1),
            Some(date(2024, 1, 1)),
            Frequency::Yearly,
        ))
        .unwrap();
        SeriesLifecycle::execute(&mut series, date(2024, 1, 1), Uuid::new_v4()).unwrap();
        assert!(matches!(
            SeriesLifecycle::pause(&mut series),
            Err(CoreError::SeriesExpired(_))
        ));
        assert!(matches!(
            SeriesLifecycle::resume(&mut series),
            Err(CoreError::SeriesExpired(_))
        ));
    }

    #[test]
    fn stale_plan_is_rejected() {
        let mut series =
            SeriesLifecycle::create(draft(date(2024, 1, 1), None, Frequency::Weekly)).unwrap();
        let plan = SeriesLifecycle::evaluate(&series, date(2024, 1, 1)).unwrap();
        SeriesLifecycle::apply(&mut series, &plan, Uuid::new_v4()).unwrap();
        let err = SeriesLifecycle::apply(&mut series, &plan, Uuid::new_v4()).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(series.total_executions, 1);
    }

    #[test]
    fn forecast_stops_at_end_date() {
        let series = SeriesLifecycle::create(draft(
            date(2024, 1, 1),
            Some(date(2024, 1, 20)),
            Frequency::Weekly,
        ))
        .unwrap();
        assert_eq!(
            SeriesLifecycle::forecast(&series, 10),
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]
        );
    }
}
