//! CLI command definitions and handlers

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod context;
pub mod export;
pub mod init;
pub mod report;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

/// windstat - wind turbine production reports from live telemetry
#[derive(Parser, Debug)]
#[command(name = "windstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json, csv)
    #[arg(
        long,
        global = true,
        env = "WINDSTAT_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "WINDSTAT_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override cache directory
    #[arg(long, global = true, env = "WINDSTAT_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<PathBuf>,

    /// Keep computed periods in memory only (nothing read from or written to disk)
    #[arg(long, global = true, env = "WINDSTAT_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Report as of noon UTC on this day (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE", env = "WINDSTAT_AS_OF", hide_env = true)]
    pub as_of: Option<NaiveDate>,

    /// Custom API host (for development/testing)
    #[arg(long, global = true, env = "WINDSTAT_API_HOST", hide = true)]
    pub api_host: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "WINDSTAT_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize windstat configuration
    Init,

    /// Show configuration status
    Status,

    /// Display version information
    Version,

    /// Live turbine status
    Now,

    /// Daily production over the last 30 complete days
    #[command(name = "last30")]
    Last30,

    /// Trailing 12-month production series
    Months,

    /// Yearly production series
    Years,

    /// Year-to-date production against the same point last year
    Ytd,

    /// Production of one month
    #[command(after_help = "EXAMPLES:\n  \
            windstat month 2024-04\n  \
            windstat month 2024-04 --format json")]
    Month {
        /// Month as YYYY-MM
        month: MonthArg,
    },

    /// Production of one year
    Year {
        /// Calendar year
        year: i32,
    },

    /// Raw daily records of a whole year (JSON)
    Snapshot {
        /// Calendar year
        year: i32,
    },

    /// Export a series as CSV (default) or JSON (`--format json`)
    #[command(subcommand)]
    Export(ExportCommands),

    /// Manage local period cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Trailing 12-month series
    Monthly,

    /// Yearly series
    Yearly,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear all cached periods
    Clear,

    /// Print cache directory path
    Path,
}

/// A calendar month given as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthArg {
    pub year: i32,
    pub month: u32,
}

impl FromStr for MonthArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year '{}'", year))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month '{}'", month))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 01 and 12, got {}", month));
        }
        Ok(Self { year, month })
    }
}
