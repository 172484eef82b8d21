//! Deterministic date stepping for recurring series and anchor-aligned budget periods.
//!
//! Every function here is total over chrono's supported date range: month and
//! year steps clamp the day-of-month to the last valid day of the target month.

use chrono::{Datelike, Duration, NaiveDate};

use hearth_domain::Frequency;

/// Computes the next due date after `current` for the given frequency.
pub fn next_due_date(current: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => add_days(current, 7),
        Frequency::Biweekly => add_days(current, 14),
        Frequency::Monthly => shift_month(current, 1),
        Frequency::Yearly => shift_year(current, 1),
    }
}

/// The day before the next occurrence of `anchor_day` strictly after `start`.
pub fn anchor_period_end(start: NaiveDate, anchor_day: u32) -> NaiveDate {
    let next = next_anchor_after(start, anchor_day);
    next.pred_opt().unwrap_or(start)
}

/// The first occurrence of `anchor_day` strictly after `date`.
pub fn next_anchor_after(date: NaiveDate, anchor_day: u32) -> NaiveDate {
    let candidate = clamped_date(date.year(), date.month(), anchor_day);
    if candidate > date {
        return candidate;
    }
    let (year, month) = month_offset(date.year(), date.month(), 1);
    clamped_date(year, month, anchor_day)
}

/// The latest occurrence of `anchor_day` on or before `date`.
pub fn anchor_on_or_before(date: NaiveDate, anchor_day: u32) -> NaiveDate {
    let candidate = clamped_date(date.year(), date.month(), anchor_day);
    if candidate <= date {
        return candidate;
    }
    let (year, month) = month_offset(date.year(), date.month(), -1);
    clamped_date(year, month, anchor_day)
}

/// Moves `date` by `months`, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let (year, month) = month_offset(date.year(), date.month(), months);
    clamped_date(year, month, date.day())
}

/// Moves `date` by `years`; Feb 29 becomes Feb 28 in non-leap target years.
pub fn shift_year(date: NaiveDate, years: i32) -> NaiveDate {
    clamped_date(date.year() + years, date.month(), date.day())
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn month_offset(year: i32, month: u32, months: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + months;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_and_biweekly_add_fixed_days() {
        assert_eq!(
            next_due_date(date(2024, 12, 28), Frequency::Weekly),
            date(2025, 1, 4)
        );
        assert_eq!(
            next_due_date(date(2024, 2, 20), Frequency::Biweekly),
            date(2024, 3, 5)
        );
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(
            next_due_date(date(2024, 1, 31), Frequency::Monthly),
            date(2024, 2, 29)
        );
        assert_eq!(
            next_due_date(date(2023, 1, 31), Frequency::Monthly),
            date(2023, 2, 28)
        );
        assert_eq!(
            next_due_date(date(2024, 2, 29), Frequency::Monthly),
            date(2024, 3, 29)
        );
        assert_eq!(
            next_due_date(date(2024, 12, 15), Frequency::Monthly),
            date(2025, 1, 15)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            next_due_date(date(2024, 2, 29), Frequency::Yearly),
            date(2025, 2, 28)
        );
        assert_eq!(
            next_due_date(date(2023, 3, 1), Frequency::Yearly),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn every_step_moves_strictly_forward() {
        let mut day = date(2023, 1, 1);
        let last = date(2025, 12, 31);
        while day <= last {
            for frequency in Frequency::ALL {
                let next = next_due_date(day, frequency);
                assert!(next > day, "{frequency} from {day} produced {next}");
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn anchor_period_end_is_day_before_next_anchor() {
        assert_eq!(anchor_period_end(date(2024, 2, 27), 27), date(2024, 3, 26));
        assert_eq!(anchor_period_end(date(2024, 3, 11), 27), date(2024, 3, 26));
        assert_eq!(anchor_period_end(date(2024, 12, 1), 1), date(2024, 12, 31));
    }

    #[test]
    fn anchor_clamps_in_short_months() {
        assert_eq!(next_anchor_after(date(2024, 1, 31), 31), date(2024, 2, 29));
        assert_eq!(anchor_period_end(date(2024, 1, 31), 31), date(2024, 2, 28));
        assert_eq!(anchor_period_end(date(2024, 2, 29), 31), date(2024, 3, 30));
        assert_eq!(anchor_on_or_before(date(2023, 2, 28), 30), date(2023, 2, 28));
        assert_eq!(anchor_on_or_before(date(2023, 2, 27), 30), date(2023, 1, 30));
    }

    #[test]
    fn anchor_on_or_before_wraps_years() {
        assert_eq!(anchor_on_or_before(date(2024, 1, 10), 27), date(2023, 12, 27));
        assert_eq!(anchor_on_or_before(date(2024, 3, 15), 27), date(2024, 2, 27));
        assert_eq!(anchor_on_or_before(date(2024, 3, 27), 27), date(2024, 3, 27));
    }

    #[test]
    fn consecutive_anchor_periods_tile_the_calendar() {
        for anchor in [1, 15, 28, 29, 30, 31] {
            let mut start = anchor_on_or_before(date(2023, 1, 1), anchor);
            for _ in 0..30 {
                let end = anchor_period_end(start, anchor);
                assert!(end >= start);
                let next = end.succ_opt().unwrap();
                assert_eq!(anchor_on_or_before(next, anchor), next);
                start = next;
            }
        }
    }

    #[test]
    fn shift_month_handles_negative_offsets() {
        assert_eq!(shift_month(date(2024, 3, 31), -1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2024, 1, 15), -13), date(2022, 12, 15));
    }
}
