//! Calendar periods and the clock
//!
//! Every aggregator asks the same question before touching the cache: is this
//! period closed? That answer lives here, in [`Period::is_closed`], so monthly,
//! yearly and daily paths can never disagree on where "now" ends.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::error::PeriodError;

/// Granularity of a calendar period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Day,
    Month,
    Year,
}

/// A UTC calendar day, month or year.
///
/// Stored as the half-open day range `[first_day, next_first_day)` so boundary
/// arithmetic never has to re-validate dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    kind: PeriodKind,
    first_day: NaiveDate,
    next_first_day: NaiveDate,
}

impl Period {
    /// A single calendar day
    pub fn day(date: NaiveDate) -> Result<Self, PeriodError> {
        let next = date
            .succ_opt()
            .ok_or_else(|| PeriodError::InvalidDate(date.to_string()))?;
        Ok(Self {
            kind: PeriodKind::Day,
            first_day: date,
            next_first_day: next,
        })
    }

    /// A calendar month, `month` in `1..=12`
    pub fn month(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        let (next_year, next_month) = if month == 12 {
            (following_year(year)?, 1)
        } else {
            (year, month + 1)
        };
        Ok(Self {
            kind: PeriodKind::Month,
            first_day: first_of_month(year, month)?,
            next_first_day: first_of_month(next_year, next_month)?,
        })
    }

    /// A calendar year
    pub fn year(year: i32) -> Result<Self, PeriodError> {
        Ok(Self {
            kind: PeriodKind::Year,
            first_day: first_of_month(year, 1)?,
            next_first_day: first_of_month(following_year(year)?, 1)?,
        })
    }

    /// The month containing `instant`
    pub fn month_containing(instant: DateTime<Utc>) -> Result<Self, PeriodError> {
        Self::month(instant.year(), instant.month())
    }

    /// The year containing `instant`
    pub fn year_containing(instant: DateTime<Utc>) -> Result<Self, PeriodError> {
        Self::year(instant.year())
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn year_number(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month_number(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// First second of the period (00:00:00 UTC)
    pub fn start(&self) -> DateTime<Utc> {
        midnight(self.first_day)
    }

    /// Last second of the period
    pub fn end(&self) -> DateTime<Utc> {
        midnight(self.next_first_day) - chrono::Duration::seconds(1)
    }

    /// Length of the period in hours, from the true calendar length
    pub fn hours(&self) -> f64 {
        (midnight(self.next_first_day) - self.start()).num_seconds() as f64 / 3600.0
    }

    /// A period is closed once its last second lies strictly before the
    /// start of the current UTC day. Open and future periods are never closed.
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.end() < start_of_day(now)
    }

    /// Whether `instant` falls inside this period
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start() <= instant && instant <= self.end()
    }

    /// The same kind of period shifted by `count` months (months only) or
    /// `count` years (years only). Days shift by `count` days.
    pub fn shift(&self, count: i32) -> Result<Self, PeriodError> {
        match self.kind {
            PeriodKind::Day => {
                let date = self
                    .first_day
                    .checked_add_signed(chrono::Duration::days(count as i64))
                    .ok_or_else(|| PeriodError::InvalidDate(self.first_day.to_string()))?;
                Self::day(date)
            }
            PeriodKind::Month => {
                let index = self.year_number() * 12 + self.month_number() as i32 - 1 + count;
                Self::month(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
            }
            PeriodKind::Year => Self::year(self.year_number() + count),
        }
    }

    /// Display label: `15 Jun` for days, `Jun 2025` for months, `2025` for years
    pub fn label(&self) -> String {
        match self.kind {
            PeriodKind::Day => self.first_day.format("%-d %b").to_string(),
            PeriodKind::Month => self.first_day.format("%b %Y").to_string(),
            PeriodKind::Year => self.year_number().to_string(),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, PeriodError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| PeriodError::InvalidDate(format!("{:04}-{:02}-01", year, month)))
}

fn following_year(year: i32) -> Result<i32, PeriodError> {
    year
        .checked_add(1)
        .ok_or_else(|| PeriodError::InvalidDate(format!("{}-12-31", year)))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `instant` truncated to 00:00:00 UTC of its day
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    midnight(instant.date_naive())
}

/// Source of "now" for every aggregator
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant (`--as-of` and tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to noon UTC on `date`.
    ///
    /// Dates after `today` are rejected; "now" may never run ahead of the
    /// wall clock.
    pub fn at_date(date: NaiveDate, today: NaiveDate) -> Result<Self, PeriodError> {
        if date > today {
            return Err(PeriodError::FutureDate(date.to_string()));
        }
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        Ok(Self(date.and_time(noon).and_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
