//! Turbine telemetry API client

use async_trait::async_trait;

use crate::error::Result;

pub mod credential;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod parallel;
pub mod vensys;

pub use credential::{Credential, KeySource};
#[cfg(test)]
pub use mock::MockTelemetryClient;
pub use models::{DailyRecord, Freshness, RawPayload};
pub use vensys::{ClientOptions, VensysClient};

/// Telemetry API client trait
///
/// Every call is a single request: no retries happen at this layer.
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Daily performance records between two Unix timestamps (inclusive)
    async fn fetch_performance(&self, from: i64, to: i64) -> Result<RawPayload>;

    /// The most recent performance sample
    async fn latest_performance(&self) -> Result<RawPayload>;

    /// Mean telemetry between two Unix timestamps
    async fn fetch_mean(&self, from: i64, to: i64) -> Result<RawPayload>;
}

#[async_trait]
impl<C: TelemetryApi + ?Sized> TelemetryApi for std::sync::Arc<C> {
    async fn fetch_performance(&self, from: i64, to: i64) -> Result<RawPayload> {
        (**self).fetch_performance(from, to).await
    }

    async fn latest_performance(&self) -> Result<RawPayload> {
        (**self).latest_performance().await
    }

    async fn fetch_mean(&self, from: i64, to: i64) -> Result<RawPayload> {
        (**self).fetch_mean(from, to).await
    }
}
