//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::context::resolve_cache_dir;
use crate::client::vensys::DEFAULT_API_HOST;
use crate::config::{API_KEY_ENV, Config};
use crate::error::{ConfigError, Error, Result};

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "windstat Configuration Status".bold());

    let config_path = opts.config_path()?;
    let config = match Config::load_from(&config_path) {
        Ok(config) => {
            println!("Config file: {}", config_path.display().to_string().cyan());
            config
        }
        Err(Error::Config(ConfigError::NotFound)) => {
            println!(
                "{} No config file at {} (using defaults)",
                "○".dimmed(),
                config_path.display()
            );
            Config::default()
        }
        Err(e) => {
            println!("{} Config file invalid: {}", "✗".red(), e);
            println!("  → Fix {} or run 'windstat init'", config_path.display());
            println!();
            return Ok(());
        }
    };

    println!();

    // API key status; the key itself is never read here
    let env_key = std::env::var(API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty());
    if env_key {
        println!("{} API key from {}", "✓".green(), API_KEY_ENV);
    } else if config.api_key_file.is_some() {
        println!("{} API key file configured", "✓".green());
    } else if config.has_file_credential() {
        println!("{} API key configured", "✓".green());
    } else {
        println!("{} API key not configured", "✗".red());
        println!("  → Set {} or run 'windstat init'", API_KEY_ENV);
    }

    let host = opts
        .api_host
        .as_deref()
        .or(config.api_host.as_deref())
        .unwrap_or(DEFAULT_API_HOST);
    println!("{} API host: {} (tenant {})", "○".dimmed(), host.cyan(), config.tenant_id);
    println!(
        "{} Nominal power: {} kW",
        "○".dimmed(),
        config.nominal_power_kw
    );
    println!(
        "{} Yearly series from: {}",
        "○".dimmed(),
        config.series_start_year
    );

    if opts.no_cache {
        println!("{} Period cache disabled (--no-cache)", "○".dimmed());
    } else {
        match resolve_cache_dir(opts, &config) {
            Ok(dir) => println!("{} Cache: {}", "○".dimmed(), dir.display()),
            Err(e) => println!("{} Cache unavailable: {}", "⚠".yellow(), e),
        }
    }

    println!();
    Ok(())
}
