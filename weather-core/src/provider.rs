use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, WeatherRecord},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod weatherapi;

/// Read side of the remote weather service.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_by_name(&self, city: &str) -> Result<WeatherRecord, WeatherError>;

    async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherRecord, WeatherError>;
}

/// Construct the WeatherAPI client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `weather configure` and enter your WeatherAPI key, \
                 or set WEATHER_API_KEY."
        )
    })?;

    let provider = WeatherApiProvider::with_base_url(
        api_key,
        config.base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `weather configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let cfg = Config { api_key: Some("KEY".to_string()), ..Config::default() };
        assert!(provider_from_config(&cfg).is_ok());
    }
}
