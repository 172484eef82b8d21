use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Series {id} is not due until {due_date}")]
    NotDue { id: Uuid, due_date: NaiveDate },
    #[error("Series {0} is paused")]
    SeriesPaused(Uuid),
    #[error("Series {0} has expired")]
    SeriesExpired(Uuid),
    #[error("Exception date {date} must fall after {start} and no later than {end}")]
    InvalidExceptionWindow {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("A budget exception is already open until {open_until}")]
    ExceptionAlreadyOpen { open_until: NaiveDate },
    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification { entity: &'static str, id: Uuid },
    #[error("Series not found: {0}")]
    SeriesNotFound(Uuid),
    #[error("Person not found: {0}")]
    PersonNotFound(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Outcomes that describe a series simply not needing work right now.
    pub fn is_steady_state(&self) -> bool {
        matches!(
            self,
            CoreError::NotDue { .. } | CoreError::SeriesPaused(_) | CoreError::SeriesExpired(_)
        )
    }

    /// Validation failures that should be shown to the user as a message.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidExceptionWindow { .. }
                | CoreError::ExceptionAlreadyOpen { .. }
                | CoreError::Validation(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::ConcurrentModification { .. })
    }
}
