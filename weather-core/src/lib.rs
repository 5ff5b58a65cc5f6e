//! Core library for the `weather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI client behind the [`WeatherProvider`] trait
//! - Durable key-value storage for recent searches and the offline queue
//! - The offline queue and its replay on reconnect
//! - The application controller holding view state
//!
//! It is used by `weather-cli`, but can also be reused by other frontends.

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod notify;
pub mod provider;
pub mod queue;
pub mod recent;
pub mod storage;

pub use config::{Config, LocationConfig};
pub use connectivity::{Connectivity, ConnectivityTracker, Transition};
pub use controller::{AppController, SubmitOutcome, ViewState};
pub use error::{LocationError, StorageError, WeatherError};
pub use model::{Coordinates, QueueEntry, TemperatureUnit, WeatherRecord};
pub use provider::WeatherProvider;
pub use queue::{DrainReport, OfflineQueue, ReplayOutcome};
pub use recent::RecentSearches;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
