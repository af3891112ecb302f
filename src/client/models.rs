//! Telemetry API payload types

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// One day of turbine performance as reported upstream.
///
/// The upstream omits fields freely; anything missing decodes as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    /// Day the record covers, as sent by the provider
    #[serde(default)]
    pub date: String,

    /// Energy produced (kWh)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub energy_yield: f64,

    /// Mean wind speed (m/s)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub wind_avg: f64,

    /// Peak wind speed (m/s)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub wind_max: f64,

    /// Technical availability (%)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub availability: f64,

    /// Time below cut-in wind speed (seconds)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub low_wind_time: f64,

    /// Mean power output (kW); only set on the latest-sample endpoint
    #[serde(default, deserialize_with = "null_as_zero")]
    pub power_avg: f64,
}

/// Numeric field that may be absent or `null`; both read as zero
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl DailyRecord {
    /// Calendar day named by `date`, when it starts with `YYYY-MM-DD`
    pub fn calendar_day(&self) -> Option<NaiveDate> {
        let day = self.date.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Share of the day spent below cut-in wind speed (%)
    pub fn low_wind_pct(&self) -> f64 {
        self.low_wind_time / 86_400.0 * 100.0
    }
}

/// Performance endpoint payload: `{"data": [DailyRecord, ...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    #[serde(default)]
    pub data: Vec<DailyRecord>,
}

impl PerformanceReport {
    /// Total energy yield across all records (kWh)
    pub fn total_energy_kwh(&self) -> f64 {
        self.data.iter().map(|r| r.energy_yield).sum()
    }
}

/// One mean-telemetry sample: a nested object of named channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanSample {
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl MeanSample {
    /// Numeric value of a telemetry channel, zero when absent
    pub fn channel(&self, name: &str) -> f64 {
        self.data.get(name).and_then(Value::as_f64).unwrap_or(0.0)
    }
}

/// MeanData endpoint payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanReport {
    #[serde(default)]
    pub data: Vec<MeanSample>,
}

impl MeanReport {
    /// Generator speed of the first sample (rpm)
    pub fn generator_speed_avg(&self) -> f64 {
        self.data
            .first()
            .map(|s| s.channel("GeneratorSpeedAvg"))
            .unwrap_or(0.0)
    }
}

/// Upstream freshness hint, taken verbatim from the `Age` response header.
///
/// Whether it measures the age of an edge-cached response or of the
/// telemetry itself is up to the provider; it is passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    pub age_secs: Option<u32>,
}

/// Undecoded response body plus its freshness hint
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub body: String,
    pub freshness: Freshness,
}

impl RawPayload {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            freshness: Freshness::default(),
        }
    }

    /// Decode a performance payload
    pub fn performance(&self) -> Result<PerformanceReport, ApiError> {
        parse_performance(self.body.as_bytes())
    }

    /// Decode a mean-telemetry payload
    pub fn mean(&self) -> Result<MeanReport, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Decode performance bytes, as fetched or as stored in the cache
pub fn parse_performance(bytes: &[u8]) -> Result<PerformanceReport, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Parse(e.to_string()))
}
