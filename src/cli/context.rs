//! Command execution context
//!
//! Loads the config file, resolves the API credential sources, opens the
//! period store and pins the clock, so report handlers only deal with the
//! [`Aggregator`].

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};

use crate::aggregate::Aggregator;
use crate::cache::{CacheStorage, MemoryStore, PeriodStore};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{Credential, VensysClient};
use crate::config::Config;
use crate::error::Result;
use crate::period::{Clock, FixedClock, SystemClock};

/// Context for report commands: aggregator and output format.
pub struct CommandContext {
    /// Aggregation engine over the live telemetry client
    pub aggregator: Aggregator<VensysClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// The API key is not read here; the client resolves it on its first
    /// request, so cached-only reports never touch the secret sources.
    ///
    /// # Errors
    /// Returns error if the config file is invalid, `--as-of` lies in the
    /// future, or the HTTP client cannot be built.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = load_config(opts)?;

        let clock: Arc<dyn Clock> = match opts.as_of {
            Some(date) => Arc::new(FixedClock::at_date(date, Utc::now().date_naive())?),
            None => Arc::new(SystemClock),
        };

        let credential = Arc::new(Credential::new(config.key_sources()));
        let client = VensysClient::new(credential, config.client_options())?;
        debug!("Telemetry endpoint: {}", client.base_url());

        let store = open_store(opts, &config);
        let aggregator = Aggregator::new(client, store, clock, config.aggregator_settings());

        Ok(Self {
            aggregator,
            format: opts.format,
        })
    }
}

/// Config file contents with command-line overrides applied
fn load_config(opts: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load_or_default(&opts.config_path()?)?;

    if let Some(ref host) = opts.api_host {
        config.api_host = Some(host.clone());
    }

    Ok(config)
}

/// Cache directory in effect: `--cache-dir`, then `cache_dir` from the
/// config file, then the platform default.
pub fn resolve_cache_dir(opts: &GlobalOptions, config: &Config) -> Result<PathBuf> {
    if let Some(ref dir) = opts.cache_dir {
        return Ok(dir.clone());
    }
    if let Some(ref dir) = config.cache_dir {
        return Ok(dir.clone());
    }
    Ok(CacheStorage::cache_dir()?)
}

/// Open the period store; an unusable cache directory degrades to memory.
fn open_store(opts: &GlobalOptions, config: &Config) -> Arc<dyn PeriodStore> {
    if opts.no_cache {
        debug!("Period cache disabled, using in-memory store");
        return Arc::new(MemoryStore::new());
    }

    let opened = resolve_cache_dir(opts, config)
        .and_then(|dir| CacheStorage::open_at(&dir).map_err(Into::into));

    match opened {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!("Period cache unavailable, continuing without it: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}
