//! Output formatting for CLI results

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod csv;
pub mod formatters;
pub mod json;
pub mod table;

/// Trait for report values that can be rendered in every output format
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}
