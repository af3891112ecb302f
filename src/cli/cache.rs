//! Cache management commands

use std::path::PathBuf;

use crate::cache::CacheStorage;
use crate::cli::args::GlobalOptions;
use crate::cli::context::resolve_cache_dir;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::output::formatters::{format_size, format_timestamp};

fn cache_dir(opts: &GlobalOptions) -> Result<PathBuf> {
    let config = Config::load_or_default(&opts.config_path()?)?;
    resolve_cache_dir(opts, &config)
}

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let dir = cache_dir(opts)?;
    let cache = CacheStorage::open_at(&dir)?;
    let stats = cache.stats()?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total_entries": stats.total_entries,
                "monthly_entries": stats.monthly_entries,
                "yearly_entries": stats.yearly_entries,
                "daily_entries": stats.daily_entries,
                "snapshot_entries": stats.snapshot_entries,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "oldest_entry_timestamp": stats.oldest_entry,
                "newest_entry_timestamp": stats.newest_entry,
                "path": dir.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:        {}", dir.display());
            println!("Monthly:         {}", stats.monthly_entries);
            println!("Yearly:          {}", stats.yearly_entries);
            println!("Daily windows:   {}", stats.daily_entries);
            println!("Year snapshots:  {}", stats.snapshot_entries);
            println!("Total entries:   {}", stats.total_entries);
            println!("Total size:      {}", format_size(stats.total_size_bytes));

            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:    {}", format_timestamp(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:    {}", format_timestamp(newest));
            }
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let cache = CacheStorage::open_at(&cache_dir(opts)?)?;
    let stats = cache.clear_all()?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": stats.entries_removed,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cache entries", stats.entries_removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    println!("{}", cache_dir(opts)?.display());
    Ok(())
}
