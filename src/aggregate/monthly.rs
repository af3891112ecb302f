//! Monthly energy yield

use log::warn;
use serde::{Deserialize, Serialize};

use super::Aggregator;
use crate::cache::PeriodKey;
use crate::client::TelemetryApi;
use crate::error::Result;
use crate::period::Period;

/// Energy produced in one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    #[serde(rename = "energyYieldMWh")]
    pub energy_yield_mwh: f64,
    /// Whether the month was still open when computed
    pub is_current_period: bool,
}

/// Stored form: `{"data":[{"month":"YYYYMM","energyYield":<MWh>}]}`
#[derive(Debug, Serialize, Deserialize)]
struct StoredMonthly {
    data: Vec<StoredMonth>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMonth {
    month: String,
    #[serde(rename = "energyYield")]
    energy_yield: f64,
}

impl StoredMonthly {
    fn new(year: i32, month: u32, mwh: f64) -> Self {
        Self {
            data: vec![StoredMonth {
                month: format!("{:04}{:02}", year, month),
                energy_yield: mwh,
            }],
        }
    }

    fn decode(bytes: &[u8]) -> Option<f64> {
        serde_json::from_slice::<StoredMonthly>(bytes)
            .ok()?
            .data
            .first()
            .map(|m| m.energy_yield)
    }
}

impl<C: TelemetryApi> Aggregator<C> {
    /// Energy yield (MWh) of one calendar month, `month` in `1..=12`.
    ///
    /// Closed months are served from the store when present and stored after
    /// computation; the open month is fetched on every call.
    pub async fn monthly_yield(&self, year: i32, month: u32) -> Result<f64> {
        let period = Period::month(year, month)?;
        let closed = period.is_closed(self.now());
        let key = PeriodKey::for_period(&period);

        if closed && let Some(bytes) = self.load(&key) {
            match StoredMonthly::decode(&bytes) {
                Some(mwh) => return Ok(mwh),
                None => warn!("Cached {} is unreadable, recomputing", key),
            }
        }

        let report = self.fetch_period(&period).await?.performance()?;
        let mwh = report.total_energy_kwh() / 1000.0;

        if closed {
            let stored = serde_json::to_vec(&StoredMonthly::new(year, month, mwh))?;
            self.persist(&key, &stored);
        }

        Ok(mwh)
    }

    /// [`Aggregator::monthly_yield`] together with its period metadata
    pub async fn monthly_aggregate(&self, year: i32, month: u32) -> Result<MonthlyAggregate> {
        let energy_yield_mwh = self.monthly_yield(year, month).await?;
        let period = Period::month(year, month)?;
        Ok(MonthlyAggregate {
            year,
            month,
            energy_yield_mwh,
            is_current_period: period.contains(self.now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::testing::{aggregator_at, noon};
    use crate::cache::PeriodStore;
    use crate::client::MockTelemetryClient;
    use crate::error::{ApiError, Error, PeriodError};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn april_2024() -> MockTelemetryClient {
        // 30 days x 2500 kWh = 75,000 kWh
        (1..=30).fold(MockTelemetryClient::new(), |mock, d| {
            mock.with_daily_yield(day(2024, 4, d), 2500.0)
        })
    }

    #[tokio::test]
    async fn test_closed_month_sums_and_persists() {
        let (api, store, agg) = aggregator_at(april_2024(), noon(2025, 6, 15));

        let mwh = agg.monthly_yield(2024, 4).await.unwrap();

        assert_eq!(mwh, 75.0);
        assert_eq!(api.performance_calls(), 1);
        let stored = store
            .lookup(&PeriodKey::monthly(2024, 4))
            .unwrap()
            .expect("monthly-202404 stored");
        let json: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(json["data"][0]["month"], "202404");
        assert_eq!(json["data"][0]["energyYield"], 75.0);
    }

    #[tokio::test]
    async fn test_closed_month_second_call_skips_upstream() {
        let (api, _store, agg) = aggregator_at(april_2024(), noon(2025, 6, 15));

        let first = agg.monthly_yield(2024, 4).await.unwrap();
        let second = agg.monthly_yield(2024, 4).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.performance_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetches_exact_month_bounds() {
        let (api, _store, agg) = aggregator_at(april_2024(), noon(2025, 6, 15));
        agg.monthly_yield(2024, 4).await.unwrap();

        // 2024-04-01T00:00:00Z .. 2024-04-30T23:59:59Z
        assert_eq!(api.ranges(), vec![(1_711_929_600, 1_714_521_599)]);
    }

    #[tokio::test]
    async fn test_open_month_never_cached() {
        let mock = MockTelemetryClient::new().with_daily_yield(day(2025, 6, 3), 4000.0);
        let (api, store, agg) = aggregator_at(mock, noon(2025, 6, 15));

        for _ in 0..3 {
            assert_eq!(agg.monthly_yield(2025, 6).await.unwrap(), 4.0);
        }

        assert_eq!(api.performance_calls(), 3);
        assert_eq!(store.insert_count(), 0);
        assert!(!store.contains(&PeriodKey::monthly(2025, 6)));
    }

    #[tokio::test]
    async fn test_future_month_never_cached() {
        let (_api, store, agg) = aggregator_at(MockTelemetryClient::new(), noon(2025, 6, 15));

        assert_eq!(agg.monthly_yield(2025, 9).await.unwrap(), 0.0);
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn test_month_closes_on_first_day_of_next_month() {
        let (_api, store, agg) = aggregator_at(april_2024(), noon(2024, 5, 1));

        agg.monthly_yield(2024, 4).await.unwrap();
        assert!(store.contains(&PeriodKey::monthly(2024, 4)));
    }

    #[tokio::test]
    async fn test_empty_month_is_zero() {
        let (_api, store, agg) = aggregator_at(MockTelemetryClient::new(), noon(2025, 6, 15));

        assert_eq!(agg.monthly_yield(2023, 2).await.unwrap(), 0.0);
        assert!(store.contains(&PeriodKey::monthly(2023, 2)));
    }

    #[tokio::test]
    async fn test_invalid_month_rejected_before_fetch() {
        let (api, _store, agg) = aggregator_at(MockTelemetryClient::new(), noon(2025, 6, 15));

        let err = agg.monthly_yield(2024, 13).await.unwrap_err();
        assert!(matches!(err, Error::Period(PeriodError::InvalidMonth(13))));
        assert_eq!(api.performance_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_and_is_not_cached() {
        let mock = MockTelemetryClient::new().failing_year(2024);
        let (_api, store, agg) = aggregator_at(mock, noon(2025, 6, 15));

        let err = agg.monthly_yield(2024, 4).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::UpstreamStatus(_))));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_error() {
        let mock = MockTelemetryClient::new().with_body_override("<html>");
        let (_api, store, agg) = aggregator_at(mock, noon(2025, 6, 15));

        let err = agg.monthly_yield(2024, 4).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Parse(_))));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_not_fatal() {
        let (_api, store, agg) = aggregator_at(april_2024(), noon(2025, 6, 15));
        store.reject_writes();

        assert_eq!(agg.monthly_yield(2024, 4).await.unwrap(), 75.0);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_recomputed() {
        let (api, store, agg) = aggregator_at(april_2024(), noon(2025, 6, 15));
        let key = PeriodKey::monthly(2024, 4);
        store.insert(&key, b"not json").unwrap();

        assert_eq!(agg.monthly_yield(2024, 4).await.unwrap(), 75.0);
        assert_eq!(api.performance_calls(), 1);

        let repaired = store.lookup(&key).unwrap().unwrap();
        assert_eq!(StoredMonthly::decode(&repaired), Some(75.0));
    }

    #[tokio::test]
    async fn test_monthly_aggregate_flags_open_month() {
        let (_api, _store, agg) = aggregator_at(MockTelemetryClient::new(), noon(2025, 6, 15));

        let open = agg.monthly_aggregate(2025, 6).await.unwrap();
        let closed = agg.monthly_aggregate(2025, 5).await.unwrap();

        assert!(open.is_current_period);
        assert!(!closed.is_current_period);
        assert_eq!((closed.year, closed.month), (2025, 5));
    }
}
