//! Temporal aggregation over turbine telemetry
//!
//! Every aggregate is computed from daily performance records. Closed periods
//! are computed once and read back from the [`PeriodStore`]; the open period
//! is always recomputed from upstream and never stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::cache::{PeriodKey, PeriodStore};
use crate::client::{RawPayload, TelemetryApi};
use crate::error::Result;
use crate::period::{Clock, Period};

pub mod daily;
pub mod live;
pub mod monthly;
pub mod series;
pub mod yearly;
pub mod ytd;

pub use daily::DailyWindow;
pub use live::LiveStatus;
pub use monthly::MonthlyAggregate;
pub use series::{Granularity, RollupPoint, RollupSeries};
pub use yearly::{YearSnapshot, YearlyAggregate};
pub use ytd::YearToDate;

/// Default turbine nameplate power (kW)
pub const DEFAULT_NOMINAL_POWER_KW: f64 = 2500.0;

/// Default first year of the yearly series
pub const DEFAULT_SERIES_START_YEAR: i32 = 2022;

/// Default fan-out width
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Tunables shared by every aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorSettings {
    /// Nameplate power used as the capacity-factor denominator (kW)
    pub nominal_power_kw: f64,
    /// First year of the yearly series
    pub series_start_year: i32,
    /// Upper bound on concurrent period computations per fan-out
    pub max_concurrent: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            nominal_power_kw: DEFAULT_NOMINAL_POWER_KW,
            series_start_year: DEFAULT_SERIES_START_YEAR,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Period aggregation engine.
///
/// Holds the upstream client, the period store and the clock. All "is this
/// period closed?" decisions read the clock through [`Aggregator::now`].
pub struct Aggregator<C: TelemetryApi> {
    api: C,
    store: Arc<dyn PeriodStore>,
    clock: Arc<dyn Clock>,
    settings: AggregatorSettings,
}

impl<C: TelemetryApi> Aggregator<C> {
    pub fn new(
        api: C,
        store: Arc<dyn PeriodStore>,
        clock: Arc<dyn Clock>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            api,
            store,
            clock,
            settings,
        }
    }

    /// Current instant according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetch every daily record of `period` from upstream
    async fn fetch_period(&self, period: &Period) -> Result<RawPayload> {
        let (from, to) = (period.start().timestamp(), period.end().timestamp());
        debug!("Fetching {} ({}..{})", period.label(), from, to);
        self.api.fetch_performance(from, to).await
    }

    /// Read a stored payload. Store failures count as a miss.
    fn load(&self, key: &PeriodKey) -> Option<Vec<u8>> {
        match self.store.lookup(key) {
            Ok(Some(bytes)) => {
                debug!("Cache hit: {}", key);
                Some(bytes)
            }
            Ok(None) => {
                debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                warn!("Cache lookup for {} failed, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Store a payload. Failures are logged and otherwise ignored.
    fn persist(&self, key: &PeriodKey, payload: &[u8]) {
        match self.store.insert(key, payload) {
            Ok(()) => debug!("Cached {} ({} bytes)", key, payload.len()),
            Err(e) => warn!("Failed to cache {}: {}", key, e),
        }
    }

    /// Remove a payload. Failures are logged and otherwise ignored.
    fn evict(&self, key: &PeriodKey) {
        match self.store.delete(key) {
            Ok(()) => debug!("Evicted {}", key),
            Err(e) => warn!("Failed to evict {}: {}", key, e),
        }
    }
}

/// Capacity factor (%) of `yield_mwh` produced over `hours` at `nominal_kw`.
///
/// Zero when the theoretical maximum is not positive.
pub fn capacity_factor(yield_mwh: f64, nominal_kw: f64, hours: f64) -> f64 {
    let theoretical_max_mwh = nominal_kw / 1000.0 * hours;
    if theoretical_max_mwh > 0.0 {
        yield_mwh / theoretical_max_mwh * 100.0
    } else {
        0.0
    }
}

/// Year-over-year change (%) against `prior`.
///
/// Zero when the comparator is unavailable or not positive.
pub fn yoy_change(current: f64, prior: Option<f64>) -> f64 {
    match prior {
        Some(p) if p > 0.0 => (current - p) / p * 100.0,
        _ => 0.0,
    }
}
