use async_trait::async_trait;

use crate::{config::LocationConfig, error::LocationError, model::Coordinates};

/// One-shot device position lookup.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Position taken from the `[location]` config section.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    config: LocationConfig,
}

impl ConfiguredLocation {
    pub fn new(config: LocationConfig) -> Self {
        Self { config }
    }

    /// `None` when no location is configured, i.e. geolocation is unsupported.
    pub fn from_config(config: Option<&LocationConfig>) -> Option<Self> {
        config.cloned().map(Self::new)
    }
}

#[async_trait]
impl Geolocator for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if !self.config.enabled {
            return Err(LocationError::PermissionDenied);
        }

        let coords = self.config.coordinates();
        if !(-90.0..=90.0).contains(&coords.lat) || !(-180.0..=180.0).contains(&coords.lon) {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {}",
                coords.as_query()
            )));
        }

        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(enabled: bool, latitude: f64, longitude: f64) -> ConfiguredLocation {
        ConfiguredLocation::new(LocationConfig { enabled, latitude, longitude })
    }

    #[tokio::test]
    async fn enabled_location_yields_coordinates() {
        let coords = location(true, 35.68, 139.69).current_position().await.unwrap();
        assert_eq!(coords, Coordinates { lat: 35.68, lon: 139.69 });
    }

    #[tokio::test]
    async fn disabled_location_is_denied() {
        let err = location(false, 35.68, 139.69).current_position().await.unwrap_err();
        assert!(matches!(err, LocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn out_of_range_is_unavailable() {
        let err = location(true, 123.0, 0.0).current_position().await.unwrap_err();
        assert!(matches!(err, LocationError::Unavailable(_)));
    }

    #[test]
    fn missing_config_means_unsupported() {
        assert!(ConfiguredLocation::from_config(None).is_none());
    }
}
