use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::WeatherError,
    model::{Coordinates, WeatherRecord},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI error code for "No matching location found."
const NO_MATCHING_LOCATION: u32 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    async fn fetch_current(&self, q: &str) -> Result<WeatherRecord, WeatherError> {
        let url = format!("{}/current.json", self.base_url);

        tracing::debug!(q, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, "WeatherAPI returned an error");
            return Err(classify_failure(q, status, &body));
        }

        let record: WeatherRecord = serde_json::from_str(&body)?;
        Ok(record)
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: u32,
}

fn classify_failure(q: &str, status: StatusCode, body: &str) -> WeatherError {
    let code = serde_json::from_str::<WaErrorBody>(body).ok().map(|b| b.error.code);

    if status == StatusCode::NOT_FOUND || code == Some(NO_MATCHING_LOCATION) {
        return WeatherError::NotFound { query: q.to_string() };
    }

    WeatherError::Status { status, body: truncate_body(body) }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn fetch_by_name(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        self.fetch_current(city).await
    }

    async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherRecord, WeatherError> {
        self.fetch_current(&coords.as_query()).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
