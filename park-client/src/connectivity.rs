//! Connectivity state and the reconnect edge
//!
//! [`ConnectivityObserver`] holds the current state and broadcasts
//! [`Reconnected`] only on a disconnected → connected transition.
//! [`ConnectionMonitor`] feeds it from a periodic [`ConnectivityProbe`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Capacity of the reconnect broadcast; lagging receivers coalesce
const EVENT_CAPACITY: usize = 16;

/// Emitted once per reconnect edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconnected {
    pub at: DateTime<Utc>,
}

/// Current connectivity plus edge-triggered reconnect events
pub struct ConnectivityObserver {
    state: watch::Sender<bool>,
    events: broadcast::Sender<Reconnected>,
}

impl ConnectivityObserver {
    pub fn new(initially_connected: bool) -> Self {
        let (state, _) = watch::channel(initially_connected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state, events }
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Record an observation; returns true when it was a reconnect edge
    pub fn report(&self, connected: bool) -> bool {
        let was_connected = self.state.send_replace(connected);
        if connected && !was_connected {
            tracing::info!("Connectivity restored");
            // No subscribers is fine
            let _ = self.events.send(Reconnected { at: Utc::now() });
            true
        } else {
            if was_connected && !connected {
                tracing::warn!("Connectivity lost");
            }
            false
        }
    }

    /// Reconnect events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Reconnected> {
        self.events.subscribe()
    }

    /// Level view of the state
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityObserver {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Something that can tell whether the backend is reachable
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

/// Reachability of an HTTP endpoint; any HTTP response counts as reachable
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn probe(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Probe failed");
                false
            }
        }
    }
}

/// Connection monitor
///
/// Probes at a fixed interval and reports every result to the observer.
pub struct ConnectionMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    observer: Arc<ConnectivityObserver>,
    check_interval: Duration,
    shutdown: CancellationToken,
}

impl ConnectionMonitor {
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        observer: Arc<ConnectivityObserver>,
        check_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            probe,
            observer,
            check_interval,
            shutdown,
        }
    }

    /// Run the probe loop until shutdown
    pub async fn run(self) {
        tracing::info!(interval_secs = self.check_interval.as_secs(), "ConnectionMonitor started");
        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("ConnectionMonitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let connected = self.probe.probe().await;
                    self.observer.report(connected);
                }
            }
        }
    }
}
