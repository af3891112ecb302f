//! Production report commands

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, MonthArg, OutputFormat};
use crate::error::Result;
use crate::output;

/// Await `work`, showing a spinner on stderr in pretty mode
pub(crate) async fn with_spinner<T, F>(format: OutputFormat, message: &str, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if format != OutputFormat::Pretty {
        return work.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = work.await;
    spinner.finish_and_clear();
    result
}

/// Live turbine status
pub async fn now(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let status = with_spinner(
        ctx.format,
        "Reading turbine status...",
        ctx.aggregator.live_status(),
    )
    .await?;
    output::print(&status, ctx.format)
}

/// Daily records of the last 30 complete days
pub async fn last30(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let window = with_spinner(
        ctx.format,
        "Fetching daily records...",
        ctx.aggregator.last_30_days(),
    )
    .await?;
    output::print(&window, ctx.format)
}

/// Trailing 12-month series
pub async fn months(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let series = with_spinner(
        ctx.format,
        "Computing monthly production...",
        ctx.aggregator.trailing_12_months(),
    )
    .await?;
    output::print(&series, ctx.format)
}

/// Yearly series since the configured start year
pub async fn years(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let series = with_spinner(
        ctx.format,
        "Computing yearly production...",
        ctx.aggregator.yearly_series(),
    )
    .await?;
    output::print(&series, ctx.format)
}

/// Year-to-date total against the same point last year
pub async fn ytd(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let ytd = with_spinner(
        ctx.format,
        "Computing year to date...",
        ctx.aggregator.year_to_date_with_comparison(),
    )
    .await?;
    output::print(&ytd, ctx.format)
}

pub async fn month(opts: &GlobalOptions, month: MonthArg) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let aggregate = with_spinner(
        ctx.format,
        "Computing month...",
        ctx.aggregator.monthly_aggregate(month.year, month.month),
    )
    .await?;
    output::print(&aggregate, ctx.format)
}

pub async fn year(opts: &GlobalOptions, year: i32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let aggregate = with_spinner(
        ctx.format,
        "Computing year...",
        ctx.aggregator.yearly_aggregate(year),
    )
    .await?;
    output::print(&aggregate, ctx.format)
}

/// Raw daily records of a whole year
pub async fn snapshot(opts: &GlobalOptions, year: i32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let snapshot = with_spinner(
        ctx.format,
        "Fetching year snapshot...",
        ctx.aggregator.year_snapshot(year),
    )
    .await?;
    output::print(&snapshot, ctx.format)
}
