//! Lot, reservation, account and payment services
//!
//! Reads fall back to the local cache and writes with an offline path fall
//! back to the queue. Input validation errors always reach the caller.

pub mod accounts;
pub mod lots;
pub mod payments;
pub mod reservations;

pub use accounts::{AccountService, RegistrationOutcome};
pub use lots::{ParkingLotService, SaveOutcome};
pub use payments::{PaymentProcessor, PaymentService, SimulatedProcessor};
pub use reservations::{Booking, ReservationService};

use chrono::{FixedOffset, NaiveDate, Utc};

/// Where listed data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    /// Remote read failed; last cached copy (possibly empty)
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub source: DataSource,
}

impl<T> Listing<T> {
    pub fn is_stale(&self) -> bool {
        self.source == DataSource::Cache
    }
}

/// Today's date at the configured offset
pub(crate) fn local_today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}
