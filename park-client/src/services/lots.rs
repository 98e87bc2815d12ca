//! Parking lot listing, registration and capacity edits

use super::{DataSource, Listing};
use crate::connectivity::ConnectivityObserver;
use crate::local::{LocalStore, keys};
use crate::queue::OfflineMutationQueue;
use crate::store::DocumentStore;
use crate::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use shared::document::{FromDocument, ToFields, decode_all};
use shared::error::AppError;
use shared::models::parking_lot::{self, ParkingLot, ParkingLotRegistration};
use shared::models::pending::PendingUpdate;
use std::sync::Arc;
use validator::Validate;

/// Result of a capacity edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to the remote store
    Saved,
    /// Kept in the offline queue until the next reconnect
    Queued,
}

#[derive(Clone)]
pub struct ParkingLotService {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
    observer: Arc<ConnectivityObserver>,
    queue: Arc<OfflineMutationQueue>,
}

impl ParkingLotService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        local: LocalStore,
        observer: Arc<ConnectivityObserver>,
        queue: Arc<OfflineMutationQueue>,
    ) -> Self {
        Self {
            store,
            local,
            observer,
            queue,
        }
    }

    /// All lots; the cache answers when the remote list fails
    pub async fn list_lots(&self) -> Listing<ParkingLot> {
        match self.store.list(parking_lot::COLLECTION).await {
            Ok(docs) => {
                let lots: Vec<ParkingLot> = decode_all(&docs);
                self.cache_lots(&lots);
                Listing {
                    items: lots,
                    source: DataSource::Remote,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetching parking lots failed, using cache");
                Listing {
                    items: self.cached_lots(),
                    source: DataSource::Cache,
                }
            }
        }
    }

    /// One lot; a network failure falls back to the cached copy
    pub async fn get_lot(&self, id: &str) -> ClientResult<ParkingLot> {
        match self.store.get(parking_lot::COLLECTION, id).await {
            Ok(doc) => Ok(ParkingLot::from_document(&doc)?),
            Err(e) if e.is_network() => {
                tracing::warn!(lot_id = id, error = %e, "Fetching parking lot failed, using cache");
                self.cached_lots()
                    .into_iter()
                    .find(|lot| lot.id == id)
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate and create a lot; there is no offline path for registrations
    /// of lots
    pub async fn register_lot(
        &self,
        registration: &ParkingLotRegistration,
    ) -> ClientResult<ParkingLot> {
        registration.validate().map_err(AppError::from)?;

        let mut lot = registration.to_lot();
        let doc = self
            .store
            .create(parking_lot::COLLECTION, lot.to_fields())
            .await?;
        lot.id = doc.id().to_string();
        tracing::info!(lot_id = %lot.id, name = %lot.name, "Registered parking lot");

        self.update_cached(|lots| lots.push(lot.clone()));
        Ok(lot)
    }

    /// Write new spot counts, or queue them when offline
    pub async fn save_capacity(
        &self,
        lot_id: &str,
        available_spots: u32,
        available_ev_spots: u32,
    ) -> ClientResult<SaveOutcome> {
        if !self.observer.is_connected() {
            return self.queue_capacity(lot_id, available_spots, available_ev_spots);
        }

        let update = PendingUpdate::new(lot_id, available_spots, available_ev_spots);
        match self
            .store
            .patch(parking_lot::COLLECTION, lot_id, update.to_fields())
            .await
        {
            Ok(_) => {
                tracing::info!(lot_id, available_spots, available_ev_spots, "Saved capacity");
                self.update_cached(|lots| {
                    if let Some(lot) = lots.iter_mut().find(|l| l.id == lot_id) {
                        lot.available_spots = available_spots;
                        lot.available_ev_spots = available_ev_spots;
                    }
                });
                Ok(SaveOutcome::Saved)
            }
            Err(e) if e.is_network() => {
                tracing::warn!(lot_id, error = %e, "Saving capacity failed, queueing");
                self.queue_capacity(lot_id, available_spots, available_ev_spots)
            }
            Err(e) => Err(e),
        }
    }

    fn queue_capacity(
        &self,
        lot_id: &str,
        available_spots: u32,
        available_ev_spots: u32,
    ) -> ClientResult<SaveOutcome> {
        self.queue
            .enqueue_capacity_edit(lot_id, available_spots, available_ev_spots)
            .map_err(ClientError::from)?;
        Ok(SaveOutcome::Queued)
    }

    /// When lots were last fetched successfully
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.local.last_update().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Reading last update time failed");
            None
        })
    }

    pub fn cached_lots(&self) -> Vec<ParkingLot> {
        match self.local.get(keys::CACHED_PARKING_LOTS) {
            Ok(lots) => lots.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "Reading cached parking lots failed");
                Vec::new()
            }
        }
    }

    fn cache_lots(&self, lots: &[ParkingLot]) {
        let result = self
            .local
            .put(keys::CACHED_PARKING_LOTS, lots)
            .and_then(|_| self.local.touch_last_update(Utc::now()));
        if let Err(e) = result {
            tracing::error!(error = %e, "Caching parking lots failed");
        }
    }

    fn update_cached(&self, f: impl FnOnce(&mut Vec<ParkingLot>)) {
        if let Err(e) = self.local.update(keys::CACHED_PARKING_LOTS, f) {
            tracing::error!(error = %e, "Updating cached parking lots failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use shared::error::ErrorCode;

    struct Fixture {
        store: Arc<InMemoryStore>,
        observer: Arc<ConnectivityObserver>,
        queue: Arc<OfflineMutationQueue>,
        service: ParkingLotService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let local = LocalStore::open_in_memory().unwrap();
        let observer = Arc::new(ConnectivityObserver::new(true));
        let queue = Arc::new(OfflineMutationQueue::open(local.clone()));
        let service =
            ParkingLotService::new(store.clone(), local, observer.clone(), queue.clone());
        Fixture {
            store,
            observer,
            queue,
            service,
        }
    }

    fn registration(name: &str) -> ParkingLotRegistration {
        ParkingLotRegistration {
            name: name.into(),
            latitude: 4.6,
            longitude: -74.06,
            fare_per_day: 20_000,
            available_spots: 12,
            available_ev_spots: 2,
            open_time: "6:00am".into(),
            close_time: "9:00pm".into(),
        }
    }

    #[tokio::test]
    async fn test_list_falls_back_to_cache() {
        let f = fixture();
        f.service.register_lot(&registration("Lot A")).await.unwrap();

        let fresh = f.service.list_lots().await;
        assert_eq!(fresh.source, DataSource::Remote);
        assert_eq!(fresh.items.len(), 1);
        assert!(f.service.last_updated().is_some());

        f.store.set_offline(true);
        let cached = f.service.list_lots().await;
        assert!(cached.is_stale());
        assert_eq!(cached.items, fresh.items);
    }

    #[tokio::test]
    async fn test_list_skips_malformed_lots() {
        let f = fixture();
        f.service.register_lot(&registration("Lot A")).await.unwrap();
        f.store.insert(parking_lot::COLLECTION, "broken", Default::default());

        assert_eq!(f.service.list_lots().await.items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_registration_never_reaches_store() {
        let f = fixture();
        let mut bad = registration("Lot A");
        bad.fare_per_day = 0;

        let err = f.service.register_lot(&bad).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(f.store.calls().create, 0);
    }

    #[tokio::test]
    async fn test_save_capacity_online_and_offline() {
        let f = fixture();
        let lot = f.service.register_lot(&registration("Lot A")).await.unwrap();

        let outcome = f.service.save_capacity(&lot.id, 7, 1).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(f.service.get_lot(&lot.id).await.unwrap().available_spots, 7);

        f.observer.report(false);
        let outcome = f.service.save_capacity(&lot.id, 3, 0).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Queued);
        assert_eq!(f.queue.pending_updates(), vec![PendingUpdate::new(&lot.id, 3, 0)]);
        assert_eq!(f.store.calls().patch, 1);
    }

    #[tokio::test]
    async fn test_network_failure_queues_capacity() {
        let f = fixture();
        let lot = f.service.register_lot(&registration("Lot A")).await.unwrap();
        f.store.set_offline(true);

        let outcome = f.service.save_capacity(&lot.id, 5, 5).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Queued);
        assert_eq!(f.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_get_lot_uses_cache_when_offline() {
        let f = fixture();
        let lot = f.service.register_lot(&registration("Lot A")).await.unwrap();
        f.store.set_offline(true);

        assert_eq!(f.service.get_lot(&lot.id).await.unwrap(), lot);
        assert!(f.service.get_lot("unknown").await.is_err());
    }
}
