//! Vensys customer API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::Client as HttpClient;

use super::credential::Credential;
use super::models::{Freshness, RawPayload};
use super::TelemetryApi;
use crate::error::{ApiError, Result};

/// Production API host
pub const DEFAULT_API_HOST: &str = "api.vensys.de:8443";

/// Tenant identifier sent with every request
pub const DEFAULT_TENANT_ID: &str = "277";

const API_PATH: &str = "/api/v1.0/Customer";

/// Connection settings for [`VensysClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Host (`api.example.com:8443`) or full base URL (`http://127.0.0.1:1234`)
    pub api_host: Option<String>,
    pub tenant_id: String,
    pub timeout: Duration,
    pub rate_limit_per_second: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_host: None,
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_per_second: 10,
        }
    }
}

/// Vensys telemetry API client
pub struct VensysClient {
    http: HttpClient,
    base_url: String,
    tenant_id: String,
    credential: Arc<Credential>,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl VensysClient {
    /// Create a new client. The credential is not read until the first request.
    pub fn new(credential: Arc<Credential>, options: ClientOptions) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(options.rate_limit_per_second).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            http,
            base_url: base_url(options.api_host.as_deref()),
            tenant_id: options.tenant_id,
            credential,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an authenticated GET against a customer endpoint
    async fn get(&self, endpoint: &str, range: Option<(i64, i64)>) -> Result<RawPayload> {
        if let Some((from, to)) = range
            && from > to
        {
            return Err(ApiError::InvalidRange { from, to }.into());
        }

        self.rate_limiter.until_ready().await;
        let api_key = self.credential.get().await?;

        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self
            .http
            .get(&url)
            .header("ApiKey", api_key)
            .header("TID", &self.tenant_id);

        if let Some((from, to)) = range {
            debug!("GET {} From={} To={}", endpoint, from, to);
            request = request.query(&[("From", from.to_string()), ("To", to.to_string())]);
        } else {
            debug!("GET {}", endpoint);
        }

        let response = request.send().await.map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(ApiError::UpstreamStatus(text).into());
        }

        let age_secs = match response.headers().get("age") {
            Some(value) => {
                let parsed = value
                    .to_str()
                    .ok()
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .ok_or_else(|| ApiError::Parse(format!("Invalid Age header: {:?}", value)))?;
                Some(parsed)
            }
            None => None,
        };

        let body = response.text().await.map_err(ApiError::from)?;

        Ok(RawPayload {
            body,
            freshness: Freshness { age_secs },
        })
    }
}

/// Build the customer API base URL from a host override
fn base_url(api_host: Option<&str>) -> String {
    let host = api_host.unwrap_or(DEFAULT_API_HOST).trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{}", host, API_PATH)
    } else {
        format!("https://{}{}", host, API_PATH)
    }
}

#[async_trait]
impl TelemetryApi for VensysClient {
    async fn fetch_performance(&self, from: i64, to: i64) -> Result<RawPayload> {
        self.get("Performance", Some((from, to))).await
    }

    async fn latest_performance(&self) -> Result<RawPayload> {
        self.get("Performance", None).await
    }

    async fn fetch_mean(&self, from: i64, to: i64) -> Result<RawPayload> {
        self.get("MeanData", Some((from, to))).await
    }
}
