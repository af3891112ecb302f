//! Rolling window of the last 30 complete days

use chrono::{Duration, NaiveDate};
use log::{debug, warn};
use serde::Serialize;

use super::Aggregator;
use crate::cache::PeriodKey;
use crate::client::models::{DailyRecord, parse_performance};
use crate::client::TelemetryApi;
use crate::error::Result;
use crate::period::start_of_day;

/// Number of complete days in the window
pub const WINDOW_DAYS: i64 = 30;

/// Daily records for the 30 complete UTC days ending yesterday
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub records: Vec<DailyRecord>,
    /// Upstream body, byte for byte
    #[serde(skip)]
    pub raw: String,
}

impl DailyWindow {
    /// Calendar day of each record: its own `date` when that parses,
    /// otherwise its position counted from `first_day`
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &DailyRecord)> {
        self.first_day
            .iter_days()
            .zip(self.records.iter())
            .map(|(positional, record)| (record.calendar_day().unwrap_or(positional), record))
    }
}

impl<C: TelemetryApi> Aggregator<C> {
    /// The last 30 complete days.
    ///
    /// The window is stored under the key of its last day. When a new window
    /// is fetched, the entry for the day that just fell out of range is
    /// deleted, so at most one window per day is ever kept.
    pub async fn last_30_days(&self) -> Result<DailyWindow> {
        let today = start_of_day(self.now());
        let start = today - Duration::days(WINDOW_DAYS);
        let end = today - Duration::seconds(1);

        let first_day = start.date_naive();
        let last_day = end.date_naive();
        let key = PeriodKey::day(last_day);

        if let Some(bytes) = self.load(&key) {
            match parse_performance(&bytes) {
                Ok(report) => {
                    return Ok(DailyWindow {
                        first_day,
                        last_day,
                        records: report.data,
                        raw: String::from_utf8_lossy(&bytes).into_owned(),
                    });
                }
                Err(e) => warn!("Cached {} is unreadable, refetching: {}", key, e),
            }
        }

        debug!("Fetching daily window {}..{}", first_day, last_day);
        let payload = self
            .api
            .fetch_performance(start.timestamp(), end.timestamp())
            .await?;
        let report = payload.performance()?;

        self.persist(&key, payload.body.as_bytes());
        let expired = (start - Duration::seconds(1)).date_naive();
        self.evict(&PeriodKey::day(expired));

        Ok(DailyWindow {
            first_day,
            last_day,
            records: report.data,
            raw: payload.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::testing::{aggregator_at, noon, same_store_at};
    use crate::cache::PeriodStore;
    use crate::client::MockTelemetryClient;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june_2025() -> MockTelemetryClient {
        let may = (1..=31).map(|d| (date(2025, 5, d), 1000.0 + d as f64));
        let june = (1..=30).map(|d| (date(2025, 6, d), 2000.0 + d as f64));
        may.chain(june)
            .fold(MockTelemetryClient::new(), |mock, (day, kwh)| {
                mock.with_daily_yield(day, kwh)
            })
    }

    #[tokio::test]
    async fn test_window_bounds() {
        let (api, _store, agg) = aggregator_at(june_2025(), noon(2025, 6, 15));

        let window = agg.last_30_days().await.unwrap();

        assert_eq!(window.first_day, date(2025, 5, 16));
        assert_eq!(window.last_day, date(2025, 6, 14));
        // 2025-05-16T00:00:00Z .. 2025-06-14T23:59:59Z
        assert_eq!(api.ranges(), vec![(1_747_353_600, 1_749_945_599)]);
        assert_eq!(window.records.len(), 30);
        assert_eq!(window.records[0].energy_yield, 1016.0);
        assert_eq!(window.records[29].energy_yield, 2014.0);
    }

    #[tokio::test]
    async fn test_cached_under_last_day_key() {
        let (api, store, agg) = aggregator_at(june_2025(), noon(2025, 6, 15));

        let first = agg.last_30_days().await.unwrap();
        let second = agg.last_30_days().await.unwrap();

        assert_eq!(api.performance_calls(), 1);
        assert_eq!(first, second);
        let key = PeriodKey::day(date(2025, 6, 14));
        assert_eq!(key.as_str(), "250614");
        let stored = store.lookup(&key).unwrap().unwrap();
        assert_eq!(stored, first.raw.as_bytes());
    }

    #[tokio::test]
    async fn test_consecutive_days_evict_expired_key() {
        let (api, store, day_one) = aggregator_at(june_2025(), noon(2025, 6, 15));
        day_one.last_30_days().await.unwrap();

        // Simulate an entry written 30 days before the next window's start
        store.insert(&PeriodKey::day(date(2025, 5, 16)), b"{}").unwrap();

        let day_two = same_store_at(&api, &store, noon(2025, 6, 16));
        let window = day_two.last_30_days().await.unwrap();

        assert_eq!(window.first_day, date(2025, 5, 17));
        assert!(store.contains(&PeriodKey::day(date(2025, 6, 14))));
        assert!(store.contains(&PeriodKey::day(date(2025, 6, 15))));
        assert!(!store.contains(&PeriodKey::day(date(2025, 5, 16))));
    }

    #[tokio::test]
    async fn test_eviction_failure_is_not_fatal() {
        let (_api, store, agg) = aggregator_at(june_2025(), noon(2025, 6, 15));
        store.reject_writes();

        let window = agg.last_30_days().await.unwrap();
        assert_eq!(window.records.len(), 30);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_not_cached() {
        let mock = MockTelemetryClient::new().with_body_override("{\"data\": [");
        let (_api, store, agg) = aggregator_at(mock, noon(2025, 6, 15));

        assert!(agg.last_30_days().await.is_err());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_days_pairs_records_with_dates() {
        let (_api, _store, agg) = aggregator_at(june_2025(), noon(2025, 6, 15));
        let window = agg.last_30_days().await.unwrap();

        let days: Vec<NaiveDate> = window.days().map(|(d, _)| d).collect();
        assert_eq!(days.first(), Some(&date(2025, 5, 16)));
        assert_eq!(days.last(), Some(&date(2025, 6, 14)));
    }

    #[tokio::test]
    async fn test_days_survive_a_missing_upstream_day() {
        let mock = (1..=30)
            .map(|d| date(2025, 5, 16) + Duration::days(d - 1))
            .filter(|day| *day != date(2025, 6, 13))
            .fold(MockTelemetryClient::new(), |mock, day| {
                mock.with_daily_yield(day, 1000.0)
            });
        let (_api, _store, agg) = aggregator_at(mock, noon(2025, 6, 15));
        let window = agg.last_30_days().await.unwrap();

        assert_eq!(window.records.len(), 29);
        let days: Vec<NaiveDate> = window.days().map(|(d, _)| d).collect();
        assert_eq!(days[27], date(2025, 6, 12));
        assert_eq!(days[28], date(2025, 6, 14));
        assert!(!days.contains(&date(2025, 6, 13)));
    }
}
