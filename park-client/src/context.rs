//! Explicit wiring of stores, queue, connectivity and services

use crate::availability::AvailabilityChecker;
use crate::connectivity::{ConnectionMonitor, ConnectivityObserver, ConnectivityProbe, HttpProbe};
use crate::local::LocalStore;
use crate::queue::OfflineMutationQueue;
use crate::services::{
    AccountService, ParkingLotService, PaymentProcessor, PaymentService, ReservationService,
    SimulatedProcessor,
};
use crate::store::{DocumentStore, FirestoreStore};
use crate::sync::SyncWorker;
use crate::{ClientConfig, ClientResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a client session needs, built once and shared by `Arc`
#[derive(Clone)]
pub struct ParkingContext {
    pub config: ClientConfig,
    pub store: Arc<dyn DocumentStore>,
    pub local: LocalStore,
    pub observer: Arc<ConnectivityObserver>,
    pub queue: Arc<OfflineMutationQueue>,
    pub availability: AvailabilityChecker,
    pub lots: ParkingLotService,
    pub reservations: ReservationService,
    pub accounts: AccountService,
    pub payments: PaymentService,
}

impl ParkingContext {
    /// Firestore-backed context with the local database under `data_dir`
    pub fn open(config: ClientConfig) -> ClientResult<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(FirestoreStore::new(&config)?);
        let local = LocalStore::open(config.db_path())?;
        let processor = Arc::new(SimulatedProcessor::new(config.payment_success_rate));
        Ok(Self::with_parts(config, store, local, processor))
    }

    /// Assemble from explicit collaborators
    pub fn with_parts(
        config: ClientConfig,
        store: Arc<dyn DocumentStore>,
        local: LocalStore,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        let offset = config.local_offset();
        let observer = Arc::new(ConnectivityObserver::new(config.initially_connected));
        let queue = Arc::new(OfflineMutationQueue::open(local.clone()));
        let availability = AvailabilityChecker::new(store.clone(), &config);
        let payments = PaymentService::new(local.clone(), processor);

        let lots = ParkingLotService::new(
            store.clone(),
            local.clone(),
            observer.clone(),
            queue.clone(),
        );
        let reservations = ReservationService::new(
            store.clone(),
            local.clone(),
            availability.clone(),
            payments.clone(),
            offset,
        );
        let accounts = AccountService::new(store.clone(), observer.clone(), queue.clone(), offset);

        Self {
            config,
            store,
            local,
            observer,
            queue,
            availability,
            lots,
            reservations,
            accounts,
            payments,
        }
    }

    /// Probe the documents root over HTTP
    pub fn http_probe(&self) -> ClientResult<Arc<dyn ConnectivityProbe>> {
        Ok(Arc::new(HttpProbe::new(
            self.config.base_url.clone(),
            self.config.request_timeout(),
        )?))
    }

    /// Spawn the connection monitor and the sync worker; both stop on `shutdown`
    pub fn spawn_background(
        &self,
        probe: Arc<dyn ConnectivityProbe>,
        shutdown: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let worker = SyncWorker::new(
            self.queue.clone(),
            self.store.clone(),
            &self.observer,
            shutdown.clone(),
        );
        let monitor = ConnectionMonitor::new(
            probe,
            self.observer.clone(),
            self.config.probe_period(),
            shutdown,
        );
        vec![tokio::spawn(worker.run()), tokio::spawn(monitor.run())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use shared::document::{FieldMap, field};
    use shared::models::parking_lot;
    use std::time::Duration;

    struct StoreProbe(Arc<InMemoryStore>);

    #[async_trait]
    impl ConnectivityProbe for StoreProbe {
        async fn probe(&self) -> bool {
            self.0.list("ping").await.is_ok()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_edit_is_replayed_after_reconnect() {
        let memory = Arc::new(InMemoryStore::new());
        memory.insert(
            parking_lot::COLLECTION,
            "lot-1",
            FieldMap::from([field(parking_lot::fields::AVAILABLE_SPOTS, 10u32)]),
        );
        let config = ClientConfig::new("memory://")
            .with_probe_interval(1)
            .with_initially_connected(false);
        let ctx = ParkingContext::with_parts(
            config,
            memory.clone(),
            LocalStore::open_in_memory().unwrap(),
            Arc::new(SimulatedProcessor::new(1.0)),
        );

        memory.set_offline(true);
        ctx.lots.save_capacity("lot-1", 4, 0).await.unwrap();
        assert_eq!(ctx.queue.len(), 1);

        let shutdown = CancellationToken::new();
        let handles = ctx.spawn_background(Arc::new(StoreProbe(memory.clone())), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(ctx.queue.len(), 1);

        memory.set_offline(false);
        for _ in 0..20 {
            if ctx.queue.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert!(ctx.queue.is_empty());
        let lot = memory.get(parking_lot::COLLECTION, "lot-1").await.unwrap();
        assert_eq!(lot.count(parking_lot::fields::AVAILABLE_SPOTS).unwrap(), 4);

        shutdown.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
