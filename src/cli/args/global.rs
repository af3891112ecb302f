//! Global CLI options shared across all commands

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// CLI flag > environment variable > config file > default. This struct
/// captures the CLI/env layer; config file values are merged in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.windstat/config.yaml)
    pub config: Option<String>,

    /// Cache directory override
    pub cache_dir: Option<PathBuf>,

    /// Keep computed periods in memory only
    pub no_cache: bool,

    /// Pin "now" to noon UTC of this day
    pub as_of: Option<NaiveDate>,

    /// Custom API host for development/testing
    pub api_host: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            cache_dir: cli.cache_dir.clone(),
            no_cache: cli.no_cache,
            as_of: cli.as_of,
            api_host: cli.api_host.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// The config file in effect: `--config` or the default location
    pub fn config_path(&self) -> Result<PathBuf> {
        match self.config_ref() {
            Some(path) => Ok(PathBuf::from(path)),
            None => Config::default_path(),
        }
    }
}
