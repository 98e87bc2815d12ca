//! Domain models
//!
//! Each stored model owns its collection name and wire field names and maps
//! to and from [`Document`](crate::document::Document)s.

pub mod parking_lot;
pub mod payment;
pub mod pending;
pub mod reservation;
pub mod user;

// Re-exports
pub use parking_lot::{Coordinate, ParkingLot, ParkingLotRegistration};
pub use payment::{
    CardDetails, PaymentMethod, PaymentRecord, PaymentRequest, SavedCard, fare_for_duration,
};
pub use pending::{PendingUpdate, PendingUser, QueuedMutation};
pub use reservation::{NewReservation, Reservation, ReservationGroups, ReservationStatus};
pub use user::UserRegistration;
