//! Payroll cutoff periods: the 16th of one month through the 15th of the next.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Inclusive date-time bounds of a reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CutoffPeriod {
    #[schema(example = "2026-01-16T00:00:00", value_type = String)]
    pub start: NaiveDateTime,
    #[schema(example = "2026-02-15T23:59:59.999999", value_type = String)]
    pub end: NaiveDateTime,
    #[schema(example = "2026-01-16 - 2026-02-15")]
    pub label: String,
}

impl CutoffPeriod {
    fn new(first: NaiveDate, last: NaiveDate) -> Self {
        CutoffPeriod {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day()),
            label: format!("{first} - {last}"),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

fn invalid(msg: &str) -> AppError {
    AppError::Validation(msg.to_string())
}

/// The cutoff period `date` falls in. Days 1 to 15 close the period that
/// started on the previous month's 16th; later days open a new one.
pub fn period_containing(date: NaiveDate) -> Result<CutoffPeriod, AppError> {
    let first_of_month = date
        .with_day(1)
        .ok_or_else(|| invalid("invalid calendar date"))?;

    let (first, last) = if date.day() <= 15 {
        let prev = first_of_month
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| invalid("date out of range"))?;
        (prev.with_day(16), date.with_day(15))
    } else {
        let next = first_of_month
            .checked_add_months(Months::new(1))
            .ok_or_else(|| invalid("date out of range"))?;
        (date.with_day(16), next.with_day(15))
    };

    match (first, last) {
        (Some(first), Some(last)) => Ok(CutoffPeriod::new(first, last)),
        _ => Err(invalid("date out of range")),
    }
}

/// The period closing on the 15th of `month`.
pub fn period_for_year_month(year: i32, month: u32) -> Result<CutoffPeriod, AppError> {
    if !(1..=12).contains(&month) {
        return Err(invalid("month must be between 1 and 12"));
    }
    let reference =
        NaiveDate::from_ymd_opt(year, month, 15).ok_or_else(|| invalid("year out of range"))?;
    period_containing(reference)
}

/// January 1st through December 31st.
pub fn year_period(year: i32) -> Result<CutoffPeriod, AppError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    match (first, last) {
        (Some(first), Some(last)) => Ok(CutoffPeriod::new(first, last)),
        _ => Err(invalid("year out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fifteenth_closes_the_period() {
        let p = period_containing(d(2026, 3, 15)).unwrap();
        assert_eq!(p.start, d(2026, 2, 16).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(p.end.date(), d(2026, 3, 15));
        assert_eq!(p.label, "2026-02-16 - 2026-03-15");
    }

    #[test]
    fn sixteenth_opens_the_next_period() {
        let p = period_containing(d(2026, 3, 16)).unwrap();
        assert_eq!(p.start.date(), d(2026, 3, 16));
        assert_eq!(p.end.date(), d(2026, 4, 15));
    }

    #[test]
    fn new_year_day_belongs_to_the_december_period() {
        let p = period_containing(d(2026, 1, 1)).unwrap();
        assert_eq!(p.start.date(), d(2025, 12, 16));
        assert_eq!(p.end.date(), d(2026, 1, 15));

        let p = period_containing(d(2025, 12, 31)).unwrap();
        assert_eq!(p.start.date(), d(2025, 12, 16));
        assert_eq!(p.end.date(), d(2026, 1, 15));
    }

    #[test]
    fn end_is_the_last_instant_of_the_day() {
        let p = period_containing(d(2026, 2, 20)).unwrap();
        assert!(p.contains(d(2026, 3, 15).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!p.contains(d(2026, 3, 16).and_hms_opt(0, 0, 0).unwrap()));
        assert!(p.contains(p.start));
    }

    #[test]
    fn year_month_uses_the_fifteenth() {
        assert_eq!(
            period_for_year_month(2026, 1).unwrap(),
            period_containing(d(2026, 1, 15)).unwrap()
        );
        assert_eq!(period_for_year_month(2026, 3).unwrap().start.date(), d(2026, 2, 16));
        assert!(period_for_year_month(2026, 0).is_err());
        assert!(period_for_year_month(2026, 13).is_err());
    }

    #[test]
    fn whole_year() {
        let p = year_period(2024).unwrap();
        assert_eq!(p.start.date(), d(2024, 1, 1));
        assert_eq!(p.end.date(), d(2024, 12, 31));
        assert!(year_period(i32::MAX).is_err());
    }
}
