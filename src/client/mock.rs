//! Mock telemetry API client for testing
//!
//! Serves daily records from an in-memory calendar so aggregator tests can
//! check both the numbers they compute and how often they went upstream.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::TelemetryApi;
use super::models::{DailyRecord, Freshness, PerformanceReport, RawPayload};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockTelemetryClient::new().with_daily_yield(date(2024, 4, 1), 2500.0);
/// let payload = mock.fetch_performance(from, to).await?;
/// assert_eq!(mock.performance_calls(), 1);
/// ```
#[derive(Default)]
pub struct MockTelemetryClient {
    /// Daily records served by range queries
    records: Mutex<BTreeMap<NaiveDate, DailyRecord>>,
    /// Body returned verbatim instead of the calendar (malformed payload tests)
    body_override: Mutex<Option<String>>,
    /// Latest performance body and its Age header
    latest: Mutex<Option<(String, Option<u32>)>>,
    /// Mean telemetry body
    mean: Mutex<Option<String>>,
    /// Range queries starting in these years fail with 503
    failing_years: Mutex<HashSet<i32>>,
    /// Track number of calls for verification
    performance_calls: AtomicUsize,
    mean_calls: AtomicUsize,
    /// Captured (from, to) of every range query
    ranges: Mutex<Vec<(i64, i64)>>,
}

impl MockTelemetryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a full record for one day
    pub fn with_record(self, date: NaiveDate, record: DailyRecord) -> Self {
        self.records.lock().unwrap().insert(date, record);
        self
    }

    /// Add a day with only an energy yield (kWh)
    pub fn with_daily_yield(self, date: NaiveDate, kwh: f64) -> Self {
        self.with_record(
            date,
            DailyRecord {
                date: date.to_string(),
                energy_yield: kwh,
                ..Default::default()
            },
        )
    }

    /// Put a month's whole yield (kWh) on its first day
    pub fn with_month_yield(self, year: i32, month: u32, kwh: f64) -> Self {
        self.with_daily_yield(NaiveDate::from_ymd_opt(year, month, 1).unwrap(), kwh)
    }

    /// Serve `body` for every range query
    pub fn with_body_override(self, body: &str) -> Self {
        *self.body_override.lock().unwrap() = Some(body.to_string());
        self
    }

    pub fn with_latest(self, body: &str, age_secs: Option<u32>) -> Self {
        *self.latest.lock().unwrap() = Some((body.to_string(), age_secs));
        self
    }

    pub fn with_mean(self, body: &str) -> Self {
        *self.mean.lock().unwrap() = Some(body.to_string());
        self
    }

    /// Fail every range query whose start falls in `year`
    pub fn failing_year(self, year: i32) -> Self {
        self.failing_years.lock().unwrap().insert(year);
        self
    }

    pub fn performance_calls(&self) -> usize {
        self.performance_calls.load(Ordering::SeqCst)
    }

    pub fn mean_calls(&self) -> usize {
        self.mean_calls.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<(i64, i64)> {
        self.ranges.lock().unwrap().clone()
    }

    fn in_range(date: &NaiveDate, from: i64, to: i64) -> bool {
        let ts = date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        from <= ts && ts <= to
    }
}

#[async_trait]
impl TelemetryApi for MockTelemetryClient {
    async fn fetch_performance(&self, from: i64, to: i64) -> Result<RawPayload> {
        self.performance_calls.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push((from, to));

        if from > to {
            return Err(ApiError::InvalidRange { from, to }.into());
        }

        let start_year = DateTime::<Utc>::from_timestamp(from, 0)
            .map(|d| d.year())
            .unwrap_or_default();
        if self.failing_years.lock().unwrap().contains(&start_year) {
            return Err(ApiError::UpstreamStatus("Service Unavailable".to_string()).into());
        }

        if let Some(body) = self.body_override.lock().unwrap().clone() {
            return Ok(RawPayload::new(body));
        }

        let data: Vec<DailyRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(date, _)| Self::in_range(date, from, to))
            .map(|(_, record)| record.clone())
            .collect();

        let body = serde_json::to_string(&PerformanceReport { data }).unwrap();
        Ok(RawPayload::new(body))
    }

    async fn latest_performance(&self) -> Result<RawPayload> {
        match self.latest.lock().unwrap().clone() {
            Some((body, age_secs)) => Ok(RawPayload {
                body,
                freshness: Freshness { age_secs },
            }),
            None => Err(ApiError::UpstreamStatus("Not Found".to_string()).into()),
        }
    }

    async fn fetch_mean(&self, _from: i64, _to: i64) -> Result<RawPayload> {
        self.mean_calls.fetch_add(1, Ordering::SeqCst);
        match self.mean.lock().unwrap().clone() {
            Some(body) => Ok(RawPayload::new(body)),
            None => Err(ApiError::UpstreamStatus("Not Found".to_string()).into()),
        }
    }
}
