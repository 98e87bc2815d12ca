//! Reservation listing, cancellation and booking

use super::payments::PaymentService;
use super::{DataSource, Listing, local_today};
use crate::availability::{Availability, AvailabilityChecker};
use crate::local::{LocalStore, keys};
use crate::store::DocumentStore;
use crate::ClientResult;
use chrono::{DateTime, FixedOffset, Utc};
use shared::document::{FieldMap, ToFields, decode_all, field};
use shared::error::{AppError, ErrorCode};
use shared::models::payment::{PaymentRecord, PaymentRequest};
use shared::models::reservation::{
    self, NewReservation, Reservation, ReservationGroups, ReservationStatus,
};
use shared::models::ParkingLot;
use std::sync::Arc;

/// A confirmed, paid reservation
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub reservation: Reservation,
    pub receipt: PaymentRecord,
}

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
    availability: AvailabilityChecker,
    payments: PaymentService,
    offset: FixedOffset,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        local: LocalStore,
        availability: AvailabilityChecker,
        payments: PaymentService,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            local,
            availability,
            payments,
            offset,
        }
    }

    /// All reservations; the cache answers when the remote list fails
    pub async fn list_reservations(&self) -> Listing<Reservation> {
        match self.store.list(reservation::COLLECTION).await {
            Ok(docs) => {
                let reservations: Vec<Reservation> = decode_all(&docs);
                if let Err(e) = self.local.put(keys::CACHED_RESERVATIONS, &reservations) {
                    tracing::error!(error = %e, "Caching reservations failed");
                }
                Listing {
                    items: reservations,
                    source: DataSource::Remote,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetching reservations failed, using cache");
                Listing {
                    items: self.cached_reservations(),
                    source: DataSource::Cache,
                }
            }
        }
    }

    /// Reservations split into active, upcoming and past
    pub async fn grouped(&self) -> ReservationGroups {
        self.list_reservations().await.items.into_iter().collect()
    }

    pub fn cached_reservations(&self) -> Vec<Reservation> {
        self.local
            .get(keys::CACHED_RESERVATIONS)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Reading cached reservations failed");
                None
            })
            .unwrap_or_default()
    }

    /// Cancel an upcoming reservation
    pub async fn cancel(&self, current: &Reservation) -> ClientResult<Reservation> {
        let cancelled = current.cancelled()?;
        let fields = FieldMap::from([field(
            reservation::fields::STATUS,
            ReservationStatus::Cancelled.as_str(),
        )]);
        self.store
            .patch(reservation::COLLECTION, &current.id, fields)
            .await?;
        tracing::info!(reservation_id = %current.id, "Reservation cancelled");

        let updated = cancelled.clone();
        if let Err(e) = self
            .local
            .update(keys::CACHED_RESERVATIONS, |cached: &mut Vec<Reservation>| {
                if let Some(r) = cached.iter_mut().find(|r| r.id == updated.id) {
                    *r = updated;
                }
            })
        {
            tracing::error!(error = %e, "Updating cached reservations failed");
        }
        Ok(cancelled)
    }

    /// Check availability, charge and create the reservation
    pub async fn book(
        &self,
        lot: &ParkingLot,
        start: DateTime<Utc>,
        duration_hours: u32,
        payment: &PaymentRequest,
    ) -> ClientResult<Booking> {
        payment.check(local_today(self.offset))?;

        let availability = self.availability.check(lot, start, duration_hours).await?;
        if let Availability::Rejected(rejection) = availability {
            return Err(AppError::with_message(rejection.code(), rejection.to_string()).into());
        }
        if !availability.is_bookable() {
            return Err(AppError::new(ErrorCode::NoSpotsAvailable)
                .with_detail("lot_id", lot.id.as_str())
                .into());
        }

        let fare = self.payments.fare(lot, duration_hours);
        let draft = NewReservation::new(&lot.id, &lot.name, start, duration_hours, fare)?;

        self.payments.charge(payment, fare).await?;

        let doc = self
            .store
            .create(reservation::COLLECTION, draft.to_fields())
            .await?;
        let reservation = draft.into_reservation(doc.id());
        tracing::info!(
            reservation_id = %reservation.id,
            lot_id = %lot.id,
            %fare,
            "Reservation booked"
        );

        let receipt = self.payments.record(payment, &lot.name, fare);
        Ok(Booking {
            reservation,
            receipt,
        })
    }
}
