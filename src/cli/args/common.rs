//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - human-optimized rich formatting
    #[default]
    Pretty,
    /// Table format - one row per period
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
    /// CSV format - series and exports; other commands print a table
    Csv,
}
