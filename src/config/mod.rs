//! Configuration management for windstat

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::{
    AggregatorSettings, DEFAULT_MAX_CONCURRENT, DEFAULT_NOMINAL_POWER_KW,
    DEFAULT_SERIES_START_YEAR,
};
use crate::client::vensys::DEFAULT_TENANT_ID;
use crate::client::{ClientOptions, KeySource};
use crate::error::{ConfigError, Result};

/// Environment variable holding the API key; checked before any file source
pub const API_KEY_ENV: &str = "WINDSTAT_API_KEY";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Telemetry API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// File containing the API key (e.g. a mounted secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,

    /// Tenant identifier sent as the `TID` header
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    /// API host override: a bare host or a full base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Turbine nameplate power (kW)
    #[serde(default = "default_nominal_power_kw")]
    pub nominal_power_kw: f64,

    /// First year of the yearly series
    #[serde(default = "default_series_start_year")]
    pub series_start_year: i32,

    /// Maximum concurrent period computations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upstream requests per second
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: u32,

    /// Cache directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

fn default_nominal_power_kw() -> f64 {
    DEFAULT_NOMINAL_POWER_KW
}

fn default_series_start_year() -> i32 {
    DEFAULT_SERIES_START_YEAR
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_per_second() -> u32 {
    10
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".windstat").join("config.yaml"))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load_from(path) {
            Err(crate::error::Error::Config(ConfigError::NotFound)) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject values no computation can work with
    pub fn validate(&self) -> Result<()> {
        if self.nominal_power_kw.is_nan() || self.nominal_power_kw <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "nominal_power_kw must be positive, got {}",
                self.nominal_power_kw
            ))
            .into());
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid("max_concurrent must be at least 1".to_string()).into());
        }
        if self.rate_limit_per_second == 0 {
            return Err(
                ConfigError::Invalid("rate_limit_per_second must be at least 1".to_string()).into(),
            );
        }
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_id must not be empty".to_string()).into());
        }
        Ok(())
    }

    /// API key sources in priority order: environment, secret file, config file
    pub fn key_sources(&self) -> Vec<KeySource> {
        let mut sources = vec![KeySource::Env(API_KEY_ENV.to_string())];
        if let Some(ref path) = self.api_key_file {
            sources.push(KeySource::File(path.clone()));
        }
        if let Some(ref key) = self.api_key {
            sources.push(KeySource::Inline(key.clone()));
        }
        sources
    }

    /// Whether a key is configured in the file itself (env is not consulted)
    pub fn has_file_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) || self.api_key_file.is_some()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_host: self.api_host.clone(),
            tenant_id: self.tenant_id.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            rate_limit_per_second: self.rate_limit_per_second,
        }
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            nominal_power_kw: self.nominal_power_kw,
            series_start_year: self.series_start_year,
            max_concurrent: self.max_concurrent,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_file: None,
            tenant_id: default_tenant_id(),
            api_host: None,
            nominal_power_kw: default_nominal_power_kw(),
            series_start_year: default_series_start_year(),
            max_concurrent: default_max_concurrent(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_per_second: default_rate_limit_per_second(),
            cache_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.tenant_id, "277");
        assert_eq!(config.nominal_power_kw, 2500.0);
        assert_eq!(config.series_start_year, 2022);
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.rate_limit_per_second, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config =
            serde_yaml::from_str("api_key: abc\nnominal_power_kw: 3000\n").unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.nominal_power_kw, 3000.0);
        assert_eq!(config.series_start_year, 2022);
        assert_eq!(config.tenant_id, "277");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("config.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound)));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            api_key: Some("secret".to_string()),
            series_start_year: 2020,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "nominal_power_kw: [not, a, number]").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation() {
        let bad_power = Config {
            nominal_power_kw: 0.0,
            ..Default::default()
        };
        let bad_concurrency = Config {
            max_concurrent: 0,
            ..Default::default()
        };
        let bad_rate = Config {
            rate_limit_per_second: 0,
            ..Default::default()
        };

        for config in [bad_power, bad_concurrency, bad_rate] {
            assert!(matches!(
                config.validate(),
                Err(Error::Config(ConfigError::Invalid(_)))
            ));
        }
    }

    #[test]
    fn test_key_sources_order() {
        let config = Config {
            api_key: Some("inline".to_string()),
            api_key_file: Some(PathBuf::from("/run/secrets/windstat")),
            ..Default::default()
        };

        let sources = config.key_sources();
        assert_eq!(sources.len(), 3);
        assert!(matches!(&sources[0], KeySource::Env(name) if name == API_KEY_ENV));
        assert!(matches!(&sources[1], KeySource::File(_)));
        assert!(matches!(&sources[2], KeySource::Inline(k) if k == "inline"));
        assert!(config.has_file_credential());
        assert!(!Config::default().has_file_credential());
    }

    #[test]
    fn test_derived_settings() {
        let config = Config {
            request_timeout_secs: 5,
            max_concurrent: 3,
            ..Default::default()
        };
        assert_eq!(config.client_options().timeout, Duration::from_secs(5));
        assert_eq!(config.aggregator_settings().max_concurrent, 3);
    }
}
