//! Application controller: turns user input and connectivity changes into
//! weather lookups or queued requests, and owns the resulting view state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    connectivity::{Connectivity, ConnectivityTracker, Transition},
    error::{COORDINATES_FAILED_MESSAGE, StorageError, WeatherError},
    location::Geolocator,
    model::{QueueEntry, TemperatureUnit, WeatherRecord},
    notify::{NotificationPermission, PermissionPrompt, ensure_permission},
    provider::WeatherProvider,
    queue::{DrainReport, OfflineQueue, Replay},
    recent::RecentSearches,
    storage::KeyValueStore,
};

/// Shown immediately when a search is submitted while offline.
pub const QUEUED_ALERT: &str = "you are offline, the request will be queued";

pub const QUEUE_FAILED_MESSAGE: &str = "Could not save the request for later.";

/// Everything a frontend needs to draw the screen.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub weather: Option<WeatherRecord>,
    pub unit: TemperatureUnit,
    pub recent: Vec<String>,
    pub notification_visible: bool,
    /// Contents of the search field.
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Fetched,
    Failed,
    Queued(QueueEntry),
    QueueFailed,
    /// Out-of-range recent index.
    Ignored,
}

/// Identifies one issued request. Only the latest token's response is applied.
///
/// [`AppController::fetch_city`] holds `&mut self` across the await, so calls
/// through it never overlap. Frontends that run fetches concurrently pair
/// [`AppController::begin_request`] with `finish_city_request` or
/// `finish_coordinates_request` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug)]
pub struct AppController {
    client: Arc<dyn WeatherProvider>,
    store: Arc<dyn KeyValueStore>,
    queue: OfflineQueue,
    recent: RecentSearches,
    connectivity: ConnectivityTracker,
    latest_request: u64,
    view: ViewState,
}

impl AppController {
    pub fn new(
        client: Arc<dyn WeatherProvider>,
        store: Arc<dyn KeyValueStore>,
        initial: Connectivity,
        unit: TemperatureUnit,
    ) -> Self {
        Self {
            client,
            queue: OfflineQueue::new(store.clone()),
            recent: RecentSearches::new(store.clone()),
            store,
            connectivity: ConnectivityTracker::new(initial),
            latest_request: 0,
            view: ViewState { unit, ..ViewState::default() },
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity.current()
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Permission request, recent searches and geolocation, run once at launch.
    pub async fn startup(
        &mut self,
        geolocator: Option<&dyn Geolocator>,
        prompt: Option<&dyn PermissionPrompt>,
    ) -> NotificationPermission {
        let permission = ensure_permission(self.store.as_ref(), prompt).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read notification permission");
            NotificationPermission::Default
        });

        self.load_recent();
        self.locate(geolocator).await;
        permission
    }

    pub fn load_recent(&mut self) {
        match self.recent.load() {
            Ok(items) => self.view.recent = items.to_vec(),
            Err(err) => tracing::warn!(error = %err, "could not load recent searches"),
        }
    }

    /// Fetch weather for the device position. Without a geolocator this does nothing.
    pub async fn locate(&mut self, geolocator: Option<&dyn Geolocator>) {
        let Some(geolocator) = geolocator else {
            tracing::debug!("geolocation unsupported; skipping");
            return;
        };

        let coords = match geolocator.current_position().await {
            Ok(coords) => coords,
            Err(err) => {
                tracing::info!(error = %err, "geolocation failed");
                self.view.error = Some(err.user_message().to_string());
                return;
            }
        };

        let token = self.begin_request();
        let result = self.client.fetch_by_coordinates(coords).await;
        self.finish_coordinates_request(token, result).ok();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.view.input = text.into();
    }

    /// The search-field activation: fetch now when online, queue otherwise.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let city = self.view.input.clone();
        self.submit_city(city).await
    }

    pub async fn select_recent(&mut self, index: usize) -> SubmitOutcome {
        let Some(city) = self.recent.get(index).map(str::to_string) else {
            return SubmitOutcome::Ignored;
        };
        self.view.input = city.clone();
        self.submit_city(city).await
    }

    async fn submit_city(&mut self, city: String) -> SubmitOutcome {
        if self.connectivity.current().is_online() {
            return match self.fetch_city(&city).await {
                Ok(()) => SubmitOutcome::Fetched,
                Err(_) => SubmitOutcome::Failed,
            };
        }

        match self.queue.enqueue(&city) {
            Ok(entry) => SubmitOutcome::Queued(entry),
            Err(err) => {
                tracing::warn!(city = %city, error = %err, "failed to queue lookup");
                self.view.error = Some(QUEUE_FAILED_MESSAGE.to_string());
                SubmitOutcome::QueueFailed
            }
        }
    }

    pub async fn fetch_city(&mut self, city: &str) -> Result<(), WeatherError> {
        let token = self.begin_request();
        let result = self.client.fetch_by_name(city).await;
        self.finish_city_request(token, result)
    }

    /// Mark a request as in flight and supersede any earlier one.
    pub fn begin_request(&mut self) -> RequestToken {
        self.latest_request += 1;
        self.view.loading = true;
        self.view.error = None;
        RequestToken(self.latest_request)
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest_request
    }

    pub fn finish_city_request(
        &mut self,
        token: RequestToken,
        result: Result<WeatherRecord, WeatherError>,
    ) -> Result<(), WeatherError> {
        if !self.is_current(token) {
            tracing::debug!(token = token.0, latest = self.latest_request, "discarding stale response");
            return result.map(|_| ());
        }

        self.view.loading = false;
        match result {
            Ok(record) => {
                let name = record.location.name.clone();
                self.view.weather = Some(record);
                self.view.input.clear();
                self.remember(&name);
                Ok(())
            }
            Err(err) => {
                self.view.error = Some(err.user_message().to_string());
                self.view.weather = None;
                Err(err)
            }
        }
    }

    pub fn finish_coordinates_request(
        &mut self,
        token: RequestToken,
        result: Result<WeatherRecord, WeatherError>,
    ) -> Result<(), WeatherError> {
        if !self.is_current(token) {
            tracing::debug!(token = token.0, latest = self.latest_request, "discarding stale response");
            return result.map(|_| ());
        }

        self.view.loading = false;
        match result {
            Ok(record) => {
                self.view.weather = Some(record);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather by coordinates failed");
                self.view.error = Some(COORDINATES_FAILED_MESSAGE.to_string());
                self.view.weather = None;
                Err(err)
            }
        }
    }

    fn remember(&mut self, city: &str) {
        if let Err(err) = self.recent.push(city) {
            tracing::warn!(city, error = %err, "could not persist recent searches");
        }
        self.view.recent = self.recent.items().to_vec();
    }

    /// Feed a connectivity reading. Returns the drain report when this
    /// reading restored connectivity.
    pub async fn on_connectivity(
        &mut self,
        next: Connectivity,
    ) -> Option<Result<DrainReport, StorageError>> {
        match self.connectivity.observe(next)? {
            Transition::Restored => Some(self.drain().await),
            Transition::Lost => None,
        }
    }

    /// Replay and discard everything queued.
    pub async fn drain(&mut self) -> Result<DrainReport, StorageError> {
        let queue = self.queue.clone();
        let report = queue.drain_and_replay(self).await?;
        if !report.is_empty() {
            tracing::info!(
                attempted = report.attempted(),
                succeeded = report.succeeded(),
                "offline queue drained"
            );
        }
        Ok(report)
    }

    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.view.unit = self.view.unit.toggled();
        self.view.unit
    }

    /// Temperature of the current record in the selected unit, e.g. `"18 °C"`.
    pub fn temperature_display(&self) -> Option<String> {
        let current = &self.view.weather.as_ref()?.current;
        let value = match self.view.unit {
            TemperatureUnit::Celsius => current.temp_c,
            TemperatureUnit::Fahrenheit => current.temp_f,
        };
        Some(format!("{} {}", value, self.view.unit.symbol()))
    }

    pub fn set_notification_visible(&mut self, visible: bool) {
        self.view.notification_visible = visible;
    }
}

#[async_trait]
impl Replay for AppController {
    async fn replay(&mut self, city: &str) -> Result<(), WeatherError> {
        self.fetch_city(city).await
    }
}
