use anyhow::Context;
use inquire::{Confirm, CustomType, InquireError, Password, PasswordDisplayMode, Select};
use weather_core::{Config, LocationConfig, TemperatureUnit, notify::PermissionPrompt};

/// Interactive `weather configure`.
pub fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://www.weatherapi.com/my/")
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty.");
    }
    config.set_api_key(api_key);

    let units = vec!["fahrenheit", "celsius"];
    let start = if config.unit == TemperatureUnit::Celsius { 1 } else { 0 };
    let unit = Select::new("Default temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read unit")?;
    config.unit = TemperatureUnit::try_from(unit)?;

    let use_location = Confirm::new("Use a fixed location for \"weather here\"?")
        .with_default(config.location.is_some())
        .prompt()
        .context("Failed to read location choice")?;

    config.location = if use_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        Some(LocationConfig { enabled: true, latitude, longitude })
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Yes/no question on the terminal.
pub struct TerminalPermissionPrompt;

impl PermissionPrompt for TerminalPermissionPrompt {
    fn request(&self) -> Option<bool> {
        match Confirm::new("Allow weather notifications?").with_default(true).prompt() {
            Ok(answer) => Some(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => None,
            Err(err) => {
                tracing::debug!(error = %err, "notification prompt unavailable");
                None
            }
        }
    }
}
