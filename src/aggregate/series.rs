//! Trailing-12-month and yearly rollup series

use log::{debug, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{Aggregator, capacity_factor, yoy_change};
use crate::client::TelemetryApi;
use crate::client::parallel::fan_out;
use crate::error::Result;
use crate::period::Period;

/// Months in the trailing series
pub const TRAILING_MONTHS: i32 = 12;

/// Period granularity of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Yearly,
}

/// Unit of `RollupPoint::energy_yield`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    MWh,
    GWh,
}

impl std::fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyUnit::MWh => write!(f, "MWh"),
            EnergyUnit::GWh => write!(f, "GWh"),
        }
    }
}

/// One period of a rollup series
#[derive(Debug, Clone, PartialEq)]
pub struct RollupPoint {
    /// `Jul 2024` or `2024`
    pub label: String,
    /// Yield in the series unit
    pub energy_yield: f64,
    /// Yield against nameplate output over the period (%)
    pub capacity_factor: f64,
    /// Change against the same period one year earlier (%)
    pub yoy_change: f64,
    pub is_current_period: bool,
}

/// Ordered series of rollup points, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct RollupSeries {
    pub granularity: Granularity,
    pub unit: EnergyUnit,
    pub points: Vec<RollupPoint>,
}

impl RollupSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }
}

/// Column-oriented form:
/// `{"months": [...], "energyYield": [...], "isCurrentMonth": [...], "capacityFactor": [...], "yoyChange": [...]}`.
/// Yearly series use `years` and carry no current-period column.
impl Serialize for RollupSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let labels = self.labels();
        let yields: Vec<f64> = self.points.iter().map(|p| p.energy_yield).collect();
        let factors: Vec<f64> = self.points.iter().map(|p| p.capacity_factor).collect();
        let changes: Vec<f64> = self.points.iter().map(|p| p.yoy_change).collect();

        let mut map = serializer.serialize_map(None)?;
        match self.granularity {
            Granularity::Monthly => {
                let current: Vec<bool> = self.points.iter().map(|p| p.is_current_period).collect();
                map.serialize_entry("months", &labels)?;
                map.serialize_entry("energyYield", &yields)?;
                map.serialize_entry("isCurrentMonth", &current)?;
            }
            Granularity::Yearly => {
                map.serialize_entry("years", &labels)?;
                map.serialize_entry("energyYield", &yields)?;
            }
        }
        map.serialize_entry("capacityFactor", &factors)?;
        map.serialize_entry("yoyChange", &changes)?;
        map.end()
    }
}

/// A prior-period value that failed to compute counts as unavailable
fn comparator(result: Result<f64>, label: &str) -> Option<f64> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("No prior-year value for {}, YoY set to 0: {}", label, e);
            None
        }
    }
}

impl<C: TelemetryApi> Aggregator<C> {
    /// The 12 months ending with the current (open) month, oldest first.
    ///
    /// The 12 months before them are computed alongside as year-over-year
    /// comparators.
    pub async fn trailing_12_months(&self) -> Result<RollupSeries> {
        let now = self.now();
        let current = Period::month_containing(now)?;

        // 24 consecutive months: comparators first, then the series itself
        let months = (1 - 2 * TRAILING_MONTHS..=0)
            .map(|offset| current.shift(offset))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            "Trailing series {} .. {}",
            months[TRAILING_MONTHS as usize].label(),
            current.label()
        );

        let mut results = fan_out(
            months.clone(),
            |m| self.monthly_yield(m.year_number(), m.month_number()),
            self.settings.max_concurrent,
        )
        .await;

        let primaries = results.split_off(TRAILING_MONTHS as usize);
        let nominal_kw = self.settings.nominal_power_kw;
        let mut points = Vec::with_capacity(primaries.len());

        for (i, (result, prior)) in primaries.into_iter().zip(results).enumerate() {
            let month = &months[TRAILING_MONTHS as usize + i];
            let energy_yield = result?;
            let prior = comparator(prior, &month.label());

            points.push(RollupPoint {
                label: month.label(),
                energy_yield,
                capacity_factor: capacity_factor(energy_yield, nominal_kw, month.hours()),
                yoy_change: yoy_change(energy_yield, prior),
                is_current_period: month.contains(now),
            });
        }

        Ok(RollupSeries {
            granularity: Granularity::Monthly,
            unit: EnergyUnit::MWh,
            points,
        })
    }

    /// One point per year from the configured start year through the current
    /// year, yields in GWh. Empty when the start year lies in the future.
    pub async fn yearly_series(&self) -> Result<RollupSeries> {
        let now = self.now();
        let current = Period::year_containing(now)?;
        let start_year = self.settings.series_start_year;

        if start_year > current.year_number() {
            return Ok(RollupSeries {
                granularity: Granularity::Yearly,
                unit: EnergyUnit::GWh,
                points: Vec::new(),
            });
        }

        // The year before the start only serves as the first comparator
        let years = (start_year - 1..=current.year_number())
            .map(Period::year)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let results = fan_out(
            years.clone(),
            |y| self.yearly_yield(y.year_number()),
            self.settings.max_concurrent,
        )
        .await;

        let nominal_kw = self.settings.nominal_power_kw;
        let mut results = results.into_iter();
        let mut prior = results.next().and_then(|r| comparator(r, &years[0].label()));
        let mut points = Vec::with_capacity(years.len() - 1);

        for (year, result) in years.iter().skip(1).zip(results) {
            let mwh = result?;
            points.push(RollupPoint {
                label: year.label(),
                energy_yield: mwh / 1000.0,
                capacity_factor: capacity_factor(mwh, nominal_kw, year.hours()),
                yoy_change: yoy_change(mwh, prior),
                is_current_period: year.contains(now),
            });
            prior = Some(mwh);
        }

        Ok(RollupSeries {
            granularity: Granularity::Yearly,
            unit: EnergyUnit::GWh,
            points,
        })
    }

    /// Series for a granularity
    pub async fn series(&self, granularity: Granularity) -> Result<RollupSeries> {
        match granularity {
            Granularity::Monthly => self.trailing_12_months().await,
            Granularity::Yearly => self.yearly_series().await,
        }
    }
}
