//! Period cache keys
//!
//! Keys are plain zero-padded decimal strings so they stay compatible with
//! entries written by earlier deployments of the same store:
//!
//! | period        | key               |
//! |---------------|-------------------|
//! | day           | `YYMMDD`          |
//! | month         | `monthly-YYYYMM`  |
//! | year          | `yearly-YYYY`     |
//! | year snapshot | `YYYY`            |

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::period::{Period, PeriodKind};

/// Deterministic key for one cached period
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Daily window key for the window ending on `date`
    pub fn day(date: NaiveDate) -> Self {
        Self(format!(
            "{:02}{:02}{:02}",
            date.year().rem_euclid(100),
            date.month(),
            date.day()
        ))
    }

    /// Monthly aggregate key
    pub fn monthly(year: i32, month: u32) -> Self {
        Self(format!("monthly-{:04}{:02}", year, month))
    }

    /// Yearly aggregate key
    pub fn yearly(year: i32) -> Self {
        Self(format!("yearly-{:04}", year))
    }

    /// Raw full-year snapshot key
    pub fn year_snapshot(year: i32) -> Self {
        Self(format!("{:04}", year))
    }

    /// Aggregate key for any period
    pub fn for_period(period: &Period) -> Self {
        match period.kind() {
            PeriodKind::Day => Self::day(period.first_day()),
            PeriodKind::Month => Self::monthly(period.year_number(), period.month_number()),
            PeriodKind::Year => Self::yearly(period.year_number()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PeriodKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
