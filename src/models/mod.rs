//! Display models for CLI output
//!
//! Row types and [`crate::output::Formattable`] implementations for every
//! report the CLI prints.

pub mod display;
