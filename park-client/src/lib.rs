//! Park Client - client core for the parking reservation backend
//!
//! Remote document store access, availability checks, the offline mutation
//! queue with reconnect-driven replay, and the lot / reservation / account /
//! payment services built on them.

pub mod availability;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod error;
pub mod local;
pub mod logger;
pub mod queue;
pub mod services;
pub mod store;
pub mod sync;

pub use availability::{Availability, AvailabilityChecker, CountSource, Rejection};
pub use config::ClientConfig;
pub use connectivity::{ConnectionMonitor, ConnectivityObserver, ConnectivityProbe, Reconnected};
pub use context::ParkingContext;
pub use error::{ClientError, ClientResult};
pub use local::{LocalStore, StorageError};
pub use queue::{OfflineMutationQueue, ReplayReport};
pub use store::{DocumentStore, FirestoreStore, InMemoryStore};
pub use sync::SyncWorker;

// Re-export shared types for convenience
pub use shared::models::{ParkingLot, Reservation, ReservationStatus};
