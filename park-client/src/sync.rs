//! SyncWorker: replays the offline queue on every reconnect edge

use crate::connectivity::{ConnectivityObserver, Reconnected};
use crate::queue::{OfflineMutationQueue, ReplayReport};
use crate::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

pub struct SyncWorker {
    queue: Arc<OfflineMutationQueue>,
    store: Arc<dyn DocumentStore>,
    events: broadcast::Receiver<Reconnected>,
    shutdown: CancellationToken,
    reports: Option<mpsc::UnboundedSender<ReplayReport>>,
}

impl SyncWorker {
    /// Subscribes immediately, so edges after construction are never missed
    pub fn new(
        queue: Arc<OfflineMutationQueue>,
        store: Arc<dyn DocumentStore>,
        observer: &ConnectivityObserver,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            queue,
            store,
            events: observer.subscribe(),
            shutdown,
            reports: None,
        }
    }

    /// Forward every replay report to `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<ReplayReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Run the sync worker
    ///
    /// One replay per reconnect event; a lagged receiver replays once for
    /// all missed events.
    pub async fn run(mut self) {
        tracing::info!(queued = self.queue.len(), "SyncWorker started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    break;
                }
                result = self.events.recv() => {
                    match result {
                        Ok(event) => {
                            tracing::debug!(at = %event.at, "Reconnect edge");
                            self.replay().await;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("SyncWorker lagged {n} reconnect events, replaying once");
                            self.replay().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Connectivity channel closed, SyncWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("SyncWorker stopped");
    }

    async fn replay(&self) {
        let report = self.queue.replay_all(self.store.as_ref()).await;
        if let Err(e) = report.outcome() {
            tracing::warn!(
                code = %e.code,
                applied = report.applied,
                failed = report.failed,
                "Some queued mutations are still pending"
            );
        }
        if let Some(tx) = &self.reports {
            let _ = tx.send(report);
        }
    }
}
