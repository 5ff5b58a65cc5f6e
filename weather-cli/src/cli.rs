use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_core::{
    AppController, Config, Connectivity, FileStore, KeyValueStore, MemoryStore, OfflineQueue,
    RecentSearches, SubmitOutcome, TemperatureUnit,
    connectivity::{ProbeTarget, probe},
    controller::QUEUED_ALERT,
    location::{ConfiguredLocation, Geolocator},
    provider::provider_from_config,
};

use crate::{prompt, render, session};

const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI with an offline request queue")]
pub struct Cli {
    /// Treat the network as unavailable; searches are queued for later.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Temperature unit to display: celsius or fahrenheit.
    #[arg(long, global = true)]
    pub unit: Option<String>,

    /// Keep recent searches and the queue in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the WeatherAPI key, display unit and a fixed location.
    Configure,

    /// Show weather for a city, or queue the lookup when offline.
    Show {
        /// City name.
        city: String,
    },

    /// Show weather for the configured location.
    Here,

    /// List recent searches.
    Recent,

    /// Inspect or replay the offline queue.
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Interactive session: type a city and press Enter.
    Run,
}

#[derive(Debug, Subcommand)]
pub enum QueueAction {
    /// List queued lookups.
    List,
    /// Drop all queued lookups.
    Clear,
    /// Replay queued lookups now.
    Sync,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if let Command::Configure = self.command {
            return prompt::configure();
        }

        let config = Config::load()?;
        let unit = match &self.unit {
            Some(u) => TemperatureUnit::try_from(u.as_str())?,
            None => config.unit,
        };
        let store = self.open_store()?;

        match &self.command {
            Command::Recent => {
                let mut recent = RecentSearches::new(store);
                let items = recent.load()?;
                print!("{}", render::recent_list(items));
                return Ok(());
            }
            Command::Queue { action: QueueAction::List } => {
                let pending = OfflineQueue::new(store).pending()?;
                print!("{}", render::queue_list(&pending));
                return Ok(());
            }
            Command::Queue { action: QueueAction::Clear } => {
                OfflineQueue::new(store).clear()?;
                println!("Offline queue cleared.");
                return Ok(());
            }
            _ => {}
        }

        let client = provider_from_config(&config)?;
        let initial = self.initial_connectivity(&config).await;
        let mut ctrl = AppController::new(client, store, initial, unit);

        match self.command {
            Command::Show { city } => {
                ctrl.load_recent();
                ctrl.set_input(city);
                if let SubmitOutcome::Queued(_) = ctrl.submit().await {
                    println!("{QUEUED_ALERT}");
                }
                print!("{}", render::view(ctrl.view(), ctrl.temperature_display().as_deref()));
            }
            Command::Here => {
                let geolocator = ConfiguredLocation::from_config(config.location.as_ref())
                    .context("No location configured. Hint: run `weather configure`.")?;
                ctrl.locate(Some(&geolocator as &dyn Geolocator)).await;
                print!("{}", render::view(ctrl.view(), ctrl.temperature_display().as_deref()));
            }
            Command::Queue { action: QueueAction::Sync } => {
                if !ctrl.connectivity().is_online() {
                    anyhow::bail!("Still offline; queued lookups were left in place.");
                }
                ctrl.load_recent();
                let report = ctrl.drain().await?;
                print!("{}", render::drain_report(&report));
            }
            Command::Run => {
                let options = session::SessionOptions {
                    geolocator: ConfiguredLocation::from_config(config.location.as_ref()),
                    probe: if self.offline { None } else { probe_target(&config) },
                    probe_interval: Duration::from_secs(config.probe_interval_secs.max(1)),
                };
                session::run(ctrl, options).await?;
            }
            Command::Configure | Command::Recent | Command::Queue { .. } => {}
        }

        Ok(())
    }

    fn open_store(&self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(FileStore::new(Config::data_dir()?)))
    }

    async fn initial_connectivity(&self, config: &Config) -> Connectivity {
        if self.offline {
            return Connectivity::Offline;
        }
        match probe_target(config) {
            Some(target) => probe(&target).await,
            None => Connectivity::Online,
        }
    }
}

fn probe_target(config: &Config) -> Option<ProbeTarget> {
    match config.probe_target() {
        Ok((host, port)) => Some(ProbeTarget { host, port, timeout: STARTUP_PROBE_TIMEOUT }),
        Err(err) => {
            tracing::warn!(error = %err, "cannot probe connectivity; assuming online");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_global_flags() {
        let cli = Cli::try_parse_from(["weather", "show", "Paris", "--offline", "--unit", "c"])
            .unwrap();
        assert!(cli.offline);
        assert_eq!(cli.unit.as_deref(), Some("c"));
        assert!(matches!(cli.command, Command::Show { ref city } if city == "Paris"));
    }

    #[test]
    fn parses_queue_actions() {
        let cli = Cli::try_parse_from(["weather", "queue", "sync"]).unwrap();
        assert!(matches!(cli.command, Command::Queue { action: QueueAction::Sync }));
    }
}
