//! # Week Helper
//!
//! Suggests a week number for the collection form.
//!
//! ```text
//! week = floor(day_of_year_zero_based / 7) + 1
//!
//!   Jan 1 - Jan 7   → 1
//!   Jan 8 - Jan 14  → 2
//!   Dec 31          → 53 (53 in leap years too)
//! ```
//!
//! This is a suggestion only. Stored records keep whatever week the
//! operator submitted; nothing cross-checks it against the date.

use chrono::{Datelike, NaiveDate};

use crate::clock::Clock;

/// Week number of `date` counted from January 1.
pub fn week_number_of(date: NaiveDate) -> u32 {
    date.ordinal0() / 7 + 1
}

/// Week number of today according to `clock`.
pub fn current_week_number(clock: &dyn Clock) -> u32 {
    week_number_of(clock.today())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_boundaries() {
        assert_eq!(week_number_of(day(2024, 1, 1)), 1);
        assert_eq!(week_number_of(day(2024, 1, 7)), 1);
        assert_eq!(week_number_of(day(2024, 1, 8)), 2);
        assert_eq!(week_number_of(day(2023, 12, 31)), 53);
        assert_eq!(week_number_of(day(2024, 12, 31)), 53);
    }

    #[test]
    fn test_current_week_uses_clock() {
        let clock = FixedClock(day(2024, 3, 1));
        // 2024-03-01 is day 61 (zero-based 60)
        assert_eq!(current_week_number(&clock), 9);
    }
}
