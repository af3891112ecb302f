//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};

/// Run the init command
///
/// Existing settings are kept; only the API key and turbine parameters are
/// prompted for. Nothing is sent upstream.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = opts.config_path()?;
    let mut config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(Error::Config(ConfigError::NotFound)) => Config::default(),
        Err(e) => return Err(e),
    };

    println!("{}", "Welcome to windstat!".bold().green());
    println!("Let's set up your telemetry configuration.\n");

    let theme = ColorfulTheme::default();

    let replace_key = match config.api_key {
        Some(_) => Confirm::with_theme(&theme)
            .with_prompt("An API key is already configured. Replace it?")
            .default(false)
            .interact()?,
        None => true,
    };

    if replace_key {
        let api_key: String = Password::with_theme(&theme)
            .with_prompt("Enter your telemetry API key")
            .interact()?;
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }
        config.api_key = Some(api_key);
    }

    config.nominal_power_kw = Input::with_theme(&theme)
        .with_prompt("Turbine nominal power (kW)")
        .default(config.nominal_power_kw)
        .validate_with(|v: &f64| {
            if v.is_finite() && *v > 0.0 {
                Ok(())
            } else {
                Err("must be a positive number")
            }
        })
        .interact_text()?;

    config.series_start_year = Input::with_theme(&theme)
        .with_prompt("First year of the yearly series")
        .default(config.series_start_year)
        .interact_text()?;

    config.save_to(&config_path)?;

    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "windstat status".cyan());
    println!("  {} - Live turbine status", "windstat now".cyan());
    println!("  {} - Last 12 months", "windstat months".cyan());

    Ok(())
}
