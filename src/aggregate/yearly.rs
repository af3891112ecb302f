//! Yearly energy yield and raw year snapshots

use log::warn;
use serde::{Deserialize, Serialize};

use super::Aggregator;
use crate::cache::PeriodKey;
use crate::client::TelemetryApi;
use crate::client::models::{PerformanceReport, parse_performance};
use crate::client::parallel::try_fan_out;
use crate::error::Result;
use crate::period::Period;

/// Energy produced in one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyAggregate {
    pub year: i32,
    #[serde(rename = "energyYieldMWh")]
    pub energy_yield_mwh: f64,
    pub is_current_period: bool,
}

/// Every daily record of one year, as returned upstream
#[derive(Debug, Clone, PartialEq)]
pub struct YearSnapshot {
    pub year: i32,
    pub report: PerformanceReport,
    /// Upstream body, byte for byte
    pub raw: String,
}

/// Stored form: `{"data":[{"year":"YYYY","energyYield":<MWh>}]}`
#[derive(Debug, Serialize, Deserialize)]
struct StoredYearly {
    data: Vec<StoredYear>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredYear {
    year: String,
    #[serde(rename = "energyYield")]
    energy_yield: f64,
}

impl StoredYearly {
    fn new(year: i32, mwh: f64) -> Self {
        Self {
            data: vec![StoredYear {
                year: format!("{:04}", year),
                energy_yield: mwh,
            }],
        }
    }

    fn decode(bytes: &[u8]) -> Option<f64> {
        serde_json::from_slice::<StoredYearly>(bytes)
            .ok()?
            .data
            .first()
            .map(|y| y.energy_yield)
    }
}

impl<C: TelemetryApi> Aggregator<C> {
    /// Energy yield (MWh) of one calendar year: the sum of its twelve months.
    ///
    /// Any failing month fails the whole year and nothing is stored.
    pub async fn yearly_yield(&self, year: i32) -> Result<f64> {
        let period = Period::year(year)?;
        let closed = period.is_closed(self.now());
        let key = PeriodKey::for_period(&period);

        if closed && let Some(bytes) = self.load(&key) {
            match StoredYearly::decode(&bytes) {
                Some(mwh) => return Ok(mwh),
                None => warn!("Cached {} is unreadable, recomputing", key),
            }
        }

        let months: Vec<u32> = (1..=12).collect();
        let monthly = try_fan_out(
            months,
            |month| self.monthly_yield(year, month),
            self.settings.max_concurrent,
        )
        .await?;
        let mwh: f64 = monthly.iter().sum();

        if closed {
            let stored = serde_json::to_vec(&StoredYearly::new(year, mwh))?;
            self.persist(&key, &stored);
        }

        Ok(mwh)
    }

    pub async fn yearly_aggregate(&self, year: i32) -> Result<YearlyAggregate> {
        let energy_yield_mwh = self.yearly_yield(year).await?;
        Ok(YearlyAggregate {
            year,
            energy_yield_mwh,
            is_current_period: Period::year(year)?.contains(self.now()),
        })
    }

    /// Raw performance payload for a whole year, stored under `YYYY` once the
    /// year is closed.
    pub async fn year_snapshot(&self, year: i32) -> Result<YearSnapshot> {
        let period = Period::year(year)?;
        let closed = period.is_closed(self.now());
        let key = PeriodKey::year_snapshot(year);

        if closed && let Some(bytes) = self.load(&key) {
            match parse_performance(&bytes) {
                Ok(report) => {
                    return Ok(YearSnapshot {
                        year,
                        report,
                        raw: String::from_utf8_lossy(&bytes).into_owned(),
                    });
                }
                Err(e) => warn!("Cached {} is unreadable, refetching: {}", key, e),
            }
        }

        let payload = self.fetch_period(&period).await?;
        let report = payload.performance()?;

        if closed {
            self.persist(&key, payload.body.as_bytes());
        }

        Ok(YearSnapshot {
            year,
            report,
            raw: payload.body,
        })
    }
}
