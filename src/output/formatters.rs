//! Reusable formatting utilities for CLI output

use chrono::{DateTime, Local, Utc};

use crate::client::Freshness;

/// Fixed two-decimal rendering used by tables and CSV exports
pub fn two_decimals(value: f64) -> String {
    format!("{:.2}", value)
}

/// Percentage change with an explicit sign, e.g. `+12.50%` or `-3.10%`.
///
/// Zero renders without a sign.
pub fn signed_pct(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}%", value)
    } else if value < 0.0 {
        format!("{:.2}%", value)
    } else {
        "0.00%".to_string()
    }
}

/// Upstream data age, e.g. `42s`, `3m 5s`, `2h 10m`; `live` without an `Age`
pub fn format_age(freshness: &Freshness) -> String {
    let Some(secs) = freshness.age_secs else {
        return "live".to_string();
    };

    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}

/// Instant in the local timezone, `YYYY-MM-DD HH:MM`
pub fn format_local_time(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Unix timestamp (seconds) in the local timezone; `unknown` when out of range
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(format_local_time)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
