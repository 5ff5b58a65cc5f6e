//! Online/offline state and a TCP reachability probe standing in for the
//! platform's network status events.

use std::time::Duration;

use tokio::{net::TcpStream, sync::watch, task::JoinHandle, time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        self == Connectivity::Online
    }
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// OFFLINE -> ONLINE; the queue should be drained once.
    Restored,
    Lost,
}

/// Two-state machine. Repeating the current state is not a transition.
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    current: Connectivity,
}

impl ConnectivityTracker {
    pub fn new(initial: Connectivity) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Connectivity {
        self.current
    }

    pub fn observe(&mut self, next: Connectivity) -> Option<Transition> {
        if next == self.current {
            return None;
        }
        self.current = next;
        tracing::info!(state = %next, "connectivity changed");
        Some(match next {
            Connectivity::Online => Transition::Restored,
            Connectivity::Offline => Transition::Lost,
        })
    }
}

/// Where and how often to check reachability.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

/// One connection attempt to `target`.
pub async fn probe(target: &ProbeTarget) -> Connectivity {
    let addr = (target.host.as_str(), target.port);
    match time::timeout(target.timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => Connectivity::Online,
        Ok(Err(err)) => {
            tracing::debug!(host = %target.host, error = %err, "probe failed");
            Connectivity::Offline
        }
        Err(_) => {
            tracing::debug!(host = %target.host, "probe timed out");
            Connectivity::Offline
        }
    }
}

/// Probe `target` every `interval`, publishing the result on a watch channel.
/// Receivers only wake when the state actually changes.
pub fn spawn_probe_loop(
    target: ProbeTarget,
    initial: Connectivity,
    interval: Duration,
) -> (watch::Receiver<Connectivity>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(initial);

    let handle = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial state is already known.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let state = probe(&target).await;
            tx.send_if_modified(|current| {
                if *current == state {
                    false
                } else {
                    *current = state;
                    true
                }
            });
            if tx.is_closed() {
                break;
            }
        }
    });

    (rx, handle)
}
