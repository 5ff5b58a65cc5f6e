use reqwest::StatusCode;

/// Message shown for any failed lookup by city name.
pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found. Please try again.";

/// Message shown when a lookup by coordinates fails.
pub const COORDINATES_FAILED_MESSAGE: &str = "Failed to fetch weather data";

/// Message shown when the device position could not be obtained.
pub const LOCATION_DENIED_MESSAGE: &str = "Location access denied";

/// Failures of the remote weather service.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("No matching location found for '{query}'")]
    NotFound { query: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("WeatherAPI request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse WeatherAPI response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl WeatherError {
    /// Text presented to the user. Lookup failures are not distinguished.
    pub fn user_message(&self) -> &'static str {
        CITY_NOT_FOUND_MESSAGE
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::NotFound { .. })
    }
}

/// Failures of the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode value for '{key}': {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Geolocation failures.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        LOCATION_DENIED_MESSAGE
    }
}
