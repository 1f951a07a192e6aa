//! # Clock
//!
//! The only way core code learns what day it is. Production uses the
//! machine's local calendar; tests pin a date.

use chrono::{Local, NaiveDate};

/// Source of "today" for date rules and the current-week helper.
pub trait Clock: Send + Sync {
    /// Today's calendar date in the operator's local time.
    fn today(&self) -> NaiveDate;
}

/// Reads the host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_fixed() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let clock = FixedClock(day);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.today(), clock.today());
    }

    #[test]
    fn test_clocks_are_object_safe() {
        let clocks: Vec<Box<dyn Clock>> = vec![
            Box::new(SystemClock),
            Box::new(FixedClock(NaiveDate::MIN)),
        ];
        assert_eq!(clocks[1].today(), NaiveDate::MIN);
    }
}
