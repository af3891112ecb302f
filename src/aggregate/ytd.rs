//! Year-to-date totals

use chrono::Datelike;
use log::warn;
use serde::Serialize;

use super::{Aggregator, yoy_change};
use crate::client::TelemetryApi;
use crate::client::parallel::try_fan_out;
use crate::error::{PeriodError, Result};

/// Year-to-date total with the same point one year earlier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearToDate {
    pub year: i32,
    pub up_to_month: u32,
    #[serde(rename = "totalMWh")]
    pub total_mwh: f64,
    #[serde(rename = "priorYearTotalMWh")]
    pub prior_year_total_mwh: Option<f64>,
    pub yoy_change: f64,
}

impl<C: TelemetryApi> Aggregator<C> {
    /// Yield (MWh) of the current year through the current month, inclusive
    pub async fn year_to_date(&self) -> Result<f64> {
        let now = self.now();
        self.year_to_date_for(now.year(), now.month()).await
    }

    /// Yield (MWh) of `year` from January through `up_to_month`, inclusive
    pub async fn year_to_date_for(&self, year: i32, up_to_month: u32) -> Result<f64> {
        if !(1..=12).contains(&up_to_month) {
            return Err(PeriodError::InvalidMonth(up_to_month).into());
        }

        let months: Vec<u32> = (1..=up_to_month).collect();
        let yields = try_fan_out(
            months,
            |month| self.monthly_yield(year, month),
            self.settings.max_concurrent,
        )
        .await?;

        Ok(yields.iter().sum())
    }

    /// This year's total next to last year's total over the same months
    pub async fn year_to_date_with_comparison(&self) -> Result<YearToDate> {
        let now = self.now();
        let (year, up_to_month) = (now.year(), now.month());

        let total_mwh = self.year_to_date().await?;
        let prior_year_total_mwh = match self.year_to_date_for(year - 1, up_to_month).await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!("No year-to-date comparator for {}: {}", year - 1, e);
                None
            }
        };

        Ok(YearToDate {
            year,
            up_to_month,
            total_mwh,
            prior_year_total_mwh,
            yoy_change: yoy_change(total_mwh, prior_year_total_mwh),
        })
    }
}
