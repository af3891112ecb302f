//! Error types for windstat

use thiserror::Error;

/// Result type alias for windstat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Prompt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Prompt(err.to_string())
    }
}

/// Errors reaching or decoding the upstream telemetry API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned {0}")]
    UpstreamStatus(String),

    #[error("Malformed upstream payload: {0}")]
    Parse(String),

    #[error("Invalid time range: from {from} is after to {to}")]
    InvalidRange { from: i64, to: i64 },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Transport("Failed to connect to telemetry API".to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Period cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Database(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `windstat init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error(
        "API key not configured. Set WINDSTAT_API_KEY or run `windstat init` to set up your API key."
    )]
    MissingApiKey,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Calendar period errors
#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Date {0} is in the future")]
    FutureDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_upstream_status_carries_text() {
        let err = ApiError::UpstreamStatus("503 Service Unavailable".to_string());
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[test]
    fn test_api_error_transport() {
        let err = ApiError::Transport("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
    }

    #[test]
    fn test_api_error_parse() {
        let err = ApiError::Parse("expected value at line 1".to_string());
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_api_error_invalid_range() {
        let err = ApiError::InvalidRange { from: 20, to: 10 };
        let msg = err.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_cache_error_messages() {
        assert!(CacheError::NoHome.to_string().contains("cache directory"));
        assert!(
            CacheError::Database("locked".to_string())
                .to_string()
                .contains("locked")
        );
    }

    #[test]
    fn test_config_error_missing_api_key() {
        let err = ConfigError::MissingApiKey;
        assert!(err.to_string().contains("WINDSTAT_API_KEY"));
        assert!(err.to_string().contains("windstat init"));
    }

    #[test]
    fn test_period_error_invalid_month() {
        let err = PeriodError::InvalidMonth(13);
        assert!(err.to_string().contains("13"));
    }

    #[test]
    fn test_error_from_api_error() {
        let err: Error = ApiError::UpstreamStatus("Not Found".to_string()).into();

        match err {
            Error::Api(ApiError::UpstreamStatus(msg)) => assert_eq!(msg, "Not Found"),
            _ => panic!("Expected Error::Api(ApiError::UpstreamStatus)"),
        }
    }

    #[test]
    fn test_error_from_cache_error() {
        let err: Error = CacheError::NoHome.into();

        match err {
            Error::Cache(CacheError::NoHome) => (),
            _ => panic!("Expected Error::Cache(CacheError::NoHome)"),
        }
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
