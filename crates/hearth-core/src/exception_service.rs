//! Resolves anchor-aligned budget periods and one-shot boundary exceptions.

use chrono::NaiveDate;
use tracing::debug;

use hearth_domain::{BudgetException, PeriodWindow};

use crate::{calendar, CoreError};

const MAX_PERIODS: usize = 1200;

/// The pair of periods produced by shifting one boundary to an exception date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftedPeriods {
    pub exception_date: NaiveDate,
    /// The period containing the exception, ending exactly on the exception date.
    pub truncated: PeriodWindow,
    /// Starts the day after the exception and runs to the day before the next anchor.
    pub following: PeriodWindow,
}

/// The budget period in effect on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub today: NaiveDate,
    /// The period that contains `today`.
    pub current: PeriodWindow,
    /// The period immediately after `current`.
    pub next: PeriodWindow,
    pub can_add_exception: bool,
    /// Present while the latest exception has not been consumed yet.
    pub shift: Option<ShiftedPeriods>,
}

impl ResolvedPeriod {
    pub fn start(&self) -> NaiveDate {
        self.current.start
    }

    /// `None` while the current period is ongoing, which it is by construction.
    pub fn reported_end(&self) -> Option<NaiveDate> {
        self.current.reported_end(self.today)
    }
}

/// What committing an exception on `exception_date` would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionPreview {
    pub exception_date: NaiveDate,
    pub shift: ShiftedPeriods,
    /// How the period would resolve once the exception exists.
    pub resolved: ResolvedPeriod,
    /// False when the date is already the period's last day, so no boundary moves.
    pub moves_boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where an exception stands relative to today.
pub enum ExceptionStatus {
    /// The period it shifts has not started yet.
    Pending,
    /// Today falls within the truncated or following period.
    Open,
    /// The following period has ended; normal anchor cadence applies again.
    Consumed,
}

/// Stateless period computations over a person's anchor day.
pub struct ExceptionResolver;

impl ExceptionResolver {
    /// Resolves the period containing `today`, honouring `last_exception` while it is open.
    pub fn resolve(
        anchor_day: u32,
        today: NaiveDate,
        last_exception: Option<&BudgetException>,
    ) -> ResolvedPeriod {
        Self::resolve_on(
            anchor_day,
            today,
            last_exception.map(|exception| exception.exception_date),
        )
    }

    /// Computes the shifted periods for a candidate date without persisting anything.
    ///
    /// Fails with `ExceptionAlreadyOpen` while another exception is open and with
    /// `InvalidExceptionWindow` unless the candidate falls after the current
    /// period's start and before the next anchor occurrence.
    pub fn preview_exception(
        anchor_day: u32,
        today: NaiveDate,
        last_exception: Option<&BudgetException>,
        candidate: NaiveDate,
    ) -> Result<ExceptionPreview, CoreError> {
        let resolved = Self::resolve(anchor_day, today, last_exception);
        if !resolved.can_add_exception {
            let open_until = resolved
                .shift
                .map(|shift| shift.following.end)
                .unwrap_or(resolved.current.end);
            return Err(CoreError::ExceptionAlreadyOpen { open_until });
        }
        let current = resolved.current;
        if candidate <= current.start || candidate > current.end {
            return Err(CoreError::InvalidExceptionWindow {
                date: candidate,
                start: current.start,
                end: current.end,
            });
        }
        Ok(ExceptionPreview {
            exception_date: candidate,
            shift: Self::shift_for(anchor_day, candidate),
            resolved: Self::resolve_on(anchor_day, today, Some(candidate)),
            moves_boundary: candidate < current.end,
        })
    }

    pub fn exception_status(
        anchor_day: u32,
        today: NaiveDate,
        exception: &BudgetException,
    ) -> ExceptionStatus {
        let shift = Self::shift_for(anchor_day, exception.exception_date);
        if today > shift.following.end {
            ExceptionStatus::Consumed
        } else if today < shift.truncated.start {
            ExceptionStatus::Pending
        } else {
            ExceptionStatus::Open
        }
    }

    /// The truncated and following periods an exception on `exception_date` produces.
    pub fn shift_for(anchor_day: u32, exception_date: NaiveDate) -> ShiftedPeriods {
        let start = calendar::anchor_on_or_before(exception_date, anchor_day);
        let following_start = exception_date.succ_opt().unwrap_or(exception_date);
        ShiftedPeriods {
            exception_date,
            truncated: PeriodWindow::new(start, exception_date),
            following: PeriodWindow::new(
                following_start,
                calendar::anchor_period_end(following_start, anchor_day),
            ),
        }
    }

    /// The unshifted anchor-aligned period containing `date`.
    pub fn anchor_window(anchor_day: u32, date: NaiveDate) -> PeriodWindow {
        let start = calendar::anchor_on_or_before(date, anchor_day);
        PeriodWindow::new(start, calendar::anchor_period_end(start, anchor_day))
    }

    /// Every period intersecting `[from, to]`, oldest first.
    ///
    /// Each exception moves exactly one boundary: the period containing it ends on the
    /// exception date and the next one starts the following day.
    pub fn periods(
        anchor_day: u32,
        from: NaiveDate,
        to: NaiveDate,
        exceptions: &[BudgetException],
    ) -> Vec<PeriodWindow> {
        let mut shifts: Vec<NaiveDate> = exceptions
            .iter()
            .map(|exception| exception.exception_date)
            .collect();
        shifts.sort();
        shifts.dedup();

        let mut windows = Vec::new();
        let mut start = calendar::anchor_on_or_before(from, anchor_day);
        while start <= to && windows.len() < MAX_PERIODS {
            let natural_end = calendar::anchor_period_end(start, anchor_day);
            let end = shifts
                .iter()
                .copied()
                .find(|date| *date > start && *date <= natural_end)
                .unwrap_or(natural_end);
            if end >= from {
                windows.push(PeriodWindow::new(start, end));
            }
            match end.succ_opt() {
                Some(next) => start = next,
                None => break,
            }
        }
        windows
    }

    fn resolve_on(
        anchor_day: u32,
        today: NaiveDate,
        exception_date: Option<NaiveDate>,
    ) -> ResolvedPeriod {
        let base = Self::anchor_window(anchor_day, today);
        let base_next = Self::anchor_window(anchor_day, base.following_day());

        let resolved = match exception_date.map(|date| Self::shift_for(anchor_day, date)) {
            Some(shift) if today <= shift.following.end => {
                let (current, next) = if today < shift.truncated.start {
                    (base, base_next)
                } else if today <= shift.truncated.end {
                    (shift.truncated, shift.following)
                } else {
                    (
                        shift.following,
                        Self::anchor_window(anchor_day, shift.following.following_day()),
                    )
                };
                ResolvedPeriod {
                    today,
                    current,
                    next,
                    can_add_exception: false,
                    shift: Some(shift),
                }
            }
            _ => ResolvedPeriod {
                today,
                current: base,
                next: base_next,
                can_add_exception: true,
                shift: None,
            },
        };
        debug!(
            anchor_day,
            %today,
            current = %resolved.current,
            can_add_exception = resolved.can_add_exception,
            "resolved budget period"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exception_on(day: NaiveDate) -> BudgetException {
        BudgetException::new(Uuid::new_v4(), day, None)
    }

    #[test]
    fn resolves_anchor_period_without_exception() {
        let resolved = ExceptionResolver::resolve(27, date(2024, 3, 15), None);
        assert_eq!(
            resolved.current,
            PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 26))
        );
        assert_eq!(
            resolved.next,
            PeriodWindow::new(date(2024, 3, 27), date(2024, 4, 26))
        );
        assert!(resolved.can_add_exception);
        assert_eq!(resolved.reported_end(), None);
    }

    #[test]
    fn open_exception_truncates_and_shifts_next_start() {
        let exception = exception_on(date(2024, 3, 10));
        let resolved = ExceptionResolver::resolve(27, date(2024, 3, 5), Some(&exception));
        assert_eq!(
            resolved.current,
            PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 10))
        );
        assert_eq!(
            resolved.next,
            PeriodWindow::new(date(2024, 3, 11), date(2024, 3, 26))
        );
        assert!(!resolved.can_add_exception);
    }

    #[test]
    fn following_period_is_current_after_exception_date() {
        let exception = exception_on(date(2024, 3, 10));
        let resolved = ExceptionResolver::resolve(27, date(2024, 3, 15), Some(&exception));
        let shift = resolved.shift.expect("exception still open");
        assert_eq!(shift.truncated.end, date(2024, 3, 10));
        assert_eq!(shift.following.start, date(2024, 3, 11));
        assert_eq!(resolved.current, shift.following);
        assert_eq!(
            resolved.next,
            PeriodWindow::new(date(2024, 3, 27), date(2024, 4, 26))
        );
        assert!(!resolved.can_add_exception);
    }

    #[test]
    fn cadence_resumes_once_following_period_closes() {
        let exception = exception_on(date(2024, 3, 10));
        let resolved = ExceptionResolver::resolve(27, date(2024, 3, 27), Some(&exception));
        assert!(resolved.can_add_exception);
        assert!(resolved.shift.is_none());
        assert_eq!(
            resolved.current,
            PeriodWindow::new(date(2024, 3, 27), date(2024, 4, 26))
        );
        assert_eq!(
            ExceptionResolver::exception_status(27, date(2024, 3, 27), &exception),
            ExceptionStatus::Consumed
        );
    }

    #[test]
    fn preview_matches_worked_example() {
        let preview =
            ExceptionResolver::preview_exception(27, date(2024, 3, 15), None, date(2024, 3, 10))
                .expect("valid window");
        assert_eq!(
            preview.shift.truncated,
            PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 10))
        );
        assert_eq!(
            preview.shift.following,
            PeriodWindow::new(date(2024, 3, 11), date(2024, 3, 26))
        );
        assert!(!preview.resolved.can_add_exception);
    }

    #[test]
    fn preview_rejects_dates_outside_current_period() {
        let today = date(2024, 3, 15);
        for candidate in [date(2024, 2, 27), date(2024, 2, 26), date(2024, 3, 27)] {
            let err =
                ExceptionResolver::preview_exception(27, today, None, candidate).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidExceptionWindow { .. }),
                "{candidate} should be rejected"
            );
        }
        assert!(ExceptionResolver::preview_exception(27, today, None, date(2024, 3, 26)).is_ok());
    }

    #[test]
    fn exception_on_last_day_moves_no_boundary() {
        let today = date(2024, 3, 15);
        let last_day =
            ExceptionResolver::preview_exception(27, today, None, date(2024, 3, 26)).unwrap();
        assert!(!last_day.moves_boundary);
        assert_eq!(
            last_day.shift.truncated,
            PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 26))
        );
        assert_eq!(
            last_day.shift.following,
            PeriodWindow::new(date(2024, 3, 27), date(2024, 4, 26))
        );
        assert!(!last_day.resolved.can_add_exception);

        let earlier =
            ExceptionResolver::preview_exception(27, today, None, date(2024, 3, 25)).unwrap();
        assert!(earlier.moves_boundary);
    }

    #[test]
    fn second_exception_rejected_until_window_closes() {
        let exception = exception_on(date(2024, 3, 10));
        let err = ExceptionResolver::preview_exception(
            27,
            date(2024, 3, 26),
            Some(&exception),
            date(2024, 3, 20),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExceptionAlreadyOpen { open_until } if open_until == date(2024, 3, 26)
        ));
        assert!(ExceptionResolver::preview_exception(
            27,
            date(2024, 3, 27),
            Some(&exception),
            date(2024, 4, 2),
        )
        .is_ok());
    }

    #[test]
    fn pending_exception_blocks_new_ones() {
        let exception = exception_on(date(2024, 4, 5));
        let resolved = ExceptionResolver::resolve(27, date(2024, 3, 15), Some(&exception));
        assert_eq!(resolved.current.start, date(2024, 2, 27));
        assert!(!resolved.can_add_exception);
        assert_eq!(
            ExceptionResolver::exception_status(27, date(2024, 3, 15), &exception),
            ExceptionStatus::Pending
        );
    }

    #[test]
    fn periods_apply_each_exception_once() {
        let exceptions = vec![exception_on(date(2024, 3, 10))];
        let windows =
            ExceptionResolver::periods(27, date(2024, 2, 1), date(2024, 5, 1), &exceptions);
        assert_eq!(
            windows,
            vec![
                PeriodWindow::new(date(2024, 1, 27), date(2024, 2, 26)),
                PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 10)),
                PeriodWindow::new(date(2024, 3, 11), date(2024, 3, 26)),
                PeriodWindow::new(date(2024, 3, 27), date(2024, 4, 26)),
                PeriodWindow::new(date(2024, 4, 27), date(2024, 5, 26)),
            ]
        );
    }
}
