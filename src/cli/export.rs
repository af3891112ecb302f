//! Series export commands
//!
//! Exports write CSV unless `--format json` is given, in which case the bare
//! column-oriented series is written without the metadata envelope.

use crate::aggregate::{Granularity, RollupSeries};
use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, ExportCommands, OutputFormat};
use crate::error::Result;
use crate::output::csv::format_series_csv;

impl From<&ExportCommands> for Granularity {
    fn from(command: &ExportCommands) -> Self {
        match command {
            ExportCommands::Monthly => Granularity::Monthly,
            ExportCommands::Yearly => Granularity::Yearly,
        }
    }
}

/// Export document for a series
pub fn render(series: &RollupSeries, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(series)?),
        _ => Ok(format_series_csv(series)),
    }
}

/// Run an export subcommand
pub async fn run(opts: &GlobalOptions, command: &ExportCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let series = ctx.aggregator.series(Granularity::from(command)).await?;

    print!("{}", render(&series, ctx.format)?);
    if ctx.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
