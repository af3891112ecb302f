//! Live turbine status from the latest upstream samples

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Aggregator;
use crate::client::{Freshness, TelemetryApi};
use crate::error::Result;

/// Mean telemetry is sampled in 10-minute buckets
const MEAN_BUCKET_SECS: i64 = 600;

/// Latest performance and mean-telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    /// Energy yield of the latest sample (kWh)
    pub energy_yield_kwh: f64,
    /// Average power (kW)
    pub power_avg_kw: f64,
    /// Average power against nameplate power (%)
    pub power_avg_pct: f64,
    /// Average wind speed (m/s)
    pub wind_avg: f64,
    /// Generator speed (rpm)
    pub generator_speed_rpm: f64,
    /// Upstream `Age` of the performance sample
    pub freshness: Freshness,
    /// `now` minus the upstream age
    pub last_update: DateTime<Utc>,
}

/// The `[From, To]` window of the latest mean sample: `now` rounded to the
/// nearest 10 minutes, then 70 to 60 minutes back.
pub fn mean_window(now: DateTime<Utc>) -> (i64, i64) {
    let ts = now.timestamp();
    let rounded = (ts + MEAN_BUCKET_SECS / 2).div_euclid(MEAN_BUCKET_SECS) * MEAN_BUCKET_SECS;
    (rounded - 70 * 60, rounded - 60 * 60)
}

impl<C: TelemetryApi> Aggregator<C> {
    pub async fn live_status(&self) -> Result<LiveStatus> {
        let now = self.now();
        let (from, to) = mean_window(now);

        let (performance, mean) = tokio::try_join!(
            self.api.latest_performance(),
            self.api.fetch_mean(from, to)
        )?;

        let report = performance.performance()?;
        let sample = report.data.first().cloned().unwrap_or_default();
        let generator_speed_rpm = mean.mean()?.generator_speed_avg();

        let age = performance.freshness.age_secs.unwrap_or(0);
        let nominal_kw = self.settings.nominal_power_kw;

        Ok(LiveStatus {
            energy_yield_kwh: sample.energy_yield,
            power_avg_kw: sample.power_avg,
            power_avg_pct: if nominal_kw > 0.0 {
                sample.power_avg / nominal_kw * 100.0
            } else {
                0.0
            },
            wind_avg: sample.wind_avg,
            generator_speed_rpm,
            freshness: performance.freshness,
            last_update: now - Duration::seconds(age as i64),
        })
    }
}
