//! Calendar week helpers. Weeks start on Monday.

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// The Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Validate that a caller-supplied week start is a Monday.
pub fn validate_week_start(date: NaiveDate) -> Result<(), CoreError> {
    if week_start(date) != date {
        return Err(CoreError::Validation(format!(
            "week_start must be a Monday, got {date} ({})",
            date.weekday()
        )));
    }
    Ok(())
}

/// Half-open UTC range `[monday 00:00, next monday 00:00)` for a week.
pub fn week_bounds(monday: NaiveDate) -> (Timestamp, Timestamp) {
    let start = Utc.from_utc_datetime(&monday.and_time(chrono::NaiveTime::MIN));
    (start, start + Duration::days(7))
}

/// Day of week 1 (Monday) ..= 7 (Sunday).
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().number_from_monday() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_rolls_back_to_monday() {
        // 2026-10-17 is a Saturday.
        assert_eq!(week_start(date(2026, 10, 17)), date(2026, 10, 12));
        assert_eq!(week_start(date(2026, 10, 12)), date(2026, 10, 12));
        assert_eq!(week_start(date(2026, 10, 18)), date(2026, 10, 12));
    }

    #[test]
    fn non_monday_week_start_is_rejected() {
        assert!(validate_week_start(date(2026, 10, 12)).is_ok());
        assert!(validate_week_start(date(2026, 10, 13)).is_err());
    }

    #[test]
    fn bounds_span_seven_days() {
        let (start, end) = week_bounds(date(2026, 10, 12));
        assert_eq!((end - start).num_days(), 7);
        assert_eq!(start.date_naive(), date(2026, 10, 12));
    }

    #[test]
    fn day_numbers_start_at_monday() {
        assert_eq!(day_of_week(date(2026, 10, 12)), 1);
        assert_eq!(day_of_week(date(2026, 10, 18)), 7);
    }
}
