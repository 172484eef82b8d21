//! Drives due series through the store, one committed occurrence at a time.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use hearth_domain::{NewSeries, RecurringSeries, SeriesState, Transaction};

use crate::{series_service::SeriesLifecycle, storage::HouseholdStore, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// How many times a conflicting commit is re-evaluated before giving up.
    pub conflict_retries: u32,
    /// Upper bound on occurrences materialized for one series in one run.
    pub catch_up_limit: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
            catch_up_limit: 1024,
        }
    }
}

/// Outcome of running one series.
#[derive(Debug, Clone)]
pub struct SeriesRun {
    pub series_id: Uuid,
    pub executed: Vec<Transaction>,
    pub state: SeriesState,
    pub due_date: NaiveDate,
    pub conflicts: u32,
    /// Set when the run stopped at the catch-up limit with occurrences still due.
    pub limited: bool,
}

#[derive(Debug)]
pub struct SeriesFailure {
    pub series_id: Uuid,
    pub error: CoreError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub runs: Vec<SeriesRun>,
    pub failures: Vec<SeriesFailure>,
}

impl RunReport {
    pub fn executed_count(&self) -> usize {
        self.runs.iter().map(|run| run.executed.len()).sum()
    }
}

pub struct Scheduler<'a> {
    store: &'a dyn HouseholdStore,
    options: SchedulerOptions,
}

impl<'a> Scheduler<'a> {
    pub fn new(store: &'a dyn HouseholdStore, options: SchedulerOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Validates a draft and stores the resulting active series.
    pub fn register(&self, draft: NewSeries) -> Result<RecurringSeries, CoreError> {
        let series = SeriesLifecycle::create(draft)?;
        self.store.insert_series(series.clone())?;
        info!(
            series = %series.id,
            frequency = %series.frequency,
            due = %series.due_date,
            "series registered"
        );
        Ok(series)
    }

    /// Active series with an occurrence due on or before `today`.
    pub fn due_series(&self, today: NaiveDate) -> Result<Vec<RecurringSeries>, CoreError> {
        Ok(self
            .store
            .list_series()?
            .into_iter()
            .filter(|series| series.is_due(today))
            .collect())
    }

    /// Executes every occurrence of `id` due on or before `today`.
    ///
    /// Each occurrence is committed on its own; a version conflict refetches the
    /// series and re-evaluates it, so an occurrence another writer already recorded
    /// is never recorded twice.
    pub fn run_series(&self, id: Uuid, today: NaiveDate) -> Result<SeriesRun, CoreError> {
        let mut series = self.store.series(id)?;
        let mut executed = Vec::new();
        let mut conflicts = 0;
        let mut limited = false;

        loop {
            if executed.len() >= self.options.catch_up_limit {
                limited = series.is_due(today);
                if limited {
                    warn!(
                        series = %id,
                        limit = self.options.catch_up_limit,
                        due = %series.due_date,
                        "catch-up limit reached"
                    );
                }
                break;
            }

            let plan = match SeriesLifecycle::evaluate(&series, today) {
                Ok(plan) => plan,
                Err(err) if err.is_steady_state() => {
                    debug!(series = %id, reason = %err, "series idle");
                    break;
                }
                Err(err) => return Err(err),
            };

            let transaction_id = Uuid::new_v4();
            let mut advanced = series.clone();
            SeriesLifecycle::apply(&mut advanced, &plan, transaction_id)?;
            let transaction = plan
                .request
                .clone()
                .into_transaction(transaction_id, Utc::now());

            match self.store.record_execution(&advanced, transaction.clone()) {
                Ok(saved) => {
                    info!(
                        series = %id,
                        occurrence = %plan.occurrence,
                        transaction = %transaction_id,
                        next_due = %saved.due_date,
                        expired = plan.expires,
                        "series executed"
                    );
                    executed.push(transaction);
                    series = saved;
                }
                Err(err) if err.is_conflict() => {
                    conflicts += 1;
                    if conflicts > self.options.conflict_retries {
                        warn!(series = %id, conflicts, "giving up after repeated conflicts");
                        return Err(err);
                    }
                    warn!(series = %id, conflicts, "series changed concurrently, retrying");
                    series = self.store.series(id)?;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(SeriesRun {
            series_id: id,
            executed,
            state: series.state(),
            due_date: series.due_date,
            conflicts,
            limited,
        })
    }

    /// Runs every stored series. A failing series is reported and the rest still run.
    pub fn run_all(&self, today: NaiveDate) -> Result<RunReport, CoreError> {
        let mut report = RunReport::default();
        for series in self.store.list_series()? {
            match self.run_series(series.id, today) {
                Ok(run) => report.runs.push(run),
                Err(error) => {
                    warn!(series = %series.id, error = %error, "series run failed");
                    report.failures.push(SeriesFailure {
                        series_id: series.id,
                        error,
                    });
                }
            }
        }
        info!(
            today = %today,
            executed = report.executed_count(),
            failures = report.failures.len(),
            "scheduler run finished"
        );
        Ok(report)
    }

    pub fn pause(&self, id: Uuid) -> Result<bool, CoreError> {
        self.transition(id, "paused", SeriesLifecycle::pause)
    }

    pub fn resume(&self, id: Uuid) -> Result<bool, CoreError> {
        self.transition(id, "resumed", SeriesLifecycle::resume)
    }

    fn transition(
        &self,
        id: Uuid,
        label: &'static str,
        change: fn(&mut RecurringSeries) -> Result<bool, CoreError>,
    ) -> Result<bool, CoreError> {
        let mut attempts = 0;
        loop {
            let mut series = self.store.series(id)?;
            if !change(&mut series)? {
                return Ok(false);
            }
            match self.store.update_series(&series) {
                Ok(_) => {
                    info!(series = %id, "series {label}");
                    return Ok(true);
                }
                Err(err) if err.is_conflict() && attempts < self.options.conflict_retries => {
                    attempts += 1;
                    warn!(series = %id, attempts, "series changed concurrently, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}
