//! Unified error codes for the parking client
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Parking lot errors
//! - 2xxx: Reservation errors
//! - 3xxx: Payment errors
//! - 4xxx: Offline sync errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they survive a round trip
/// through the local JSON cache and any UI layer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,

    // ==================== 1xxx: Parking lot ====================
    /// Reservations are not taken on this weekday
    LotClosedDay = 1002,
    LotBeforeOpening = 1003,
    LotAfterClosing = 1004,
    /// Opening hours could not be parsed
    LotInvalidHours = 1005,

    // ==================== 2xxx: Reservation ====================
    ReservationNotCancellable = 2002,
    ReservationInvalidDuration = 2004,
    NoSpotsAvailable = 2005,

    // ==================== 3xxx: Payment ====================
    PaymentFailed = 3001,
    PaymentInvalidCard = 3002,
    PaymentCardExpired = 3003,

    // ==================== 4xxx: Offline sync ====================
    SyncReplayFailed = 4001,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    StorageError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    MalformedDocument = 9006,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",

            // Parking lot
            ErrorCode::LotClosedDay => "Reservations are not available on this day",
            ErrorCode::LotBeforeOpening => "The parking lot is not open yet at that time",
            ErrorCode::LotAfterClosing => "The parking lot is already closed at that time",
            ErrorCode::LotInvalidHours => "Opening hours must look like 7:00am",

            // Reservation
            ErrorCode::ReservationNotCancellable => "Only upcoming reservations can be cancelled",
            ErrorCode::ReservationInvalidDuration => "Duration must be at least one hour",
            ErrorCode::NoSpotsAvailable => "No spots available for the selected time",

            // Payment
            ErrorCode::PaymentFailed => "Payment failed. Please try again.",
            ErrorCode::PaymentInvalidCard => "Card details are invalid",
            ErrorCode::PaymentCardExpired => "Card has expired",

            // Sync
            ErrorCode::SyncReplayFailed => "Pending change could not be synchronized",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StorageError => "Local storage error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
            ErrorCode::MalformedDocument => "Unexpected data received from the server",
        }
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),

            // Parking lot
            1002 => Ok(ErrorCode::LotClosedDay),
            1003 => Ok(ErrorCode::LotBeforeOpening),
            1004 => Ok(ErrorCode::LotAfterClosing),
            1005 => Ok(ErrorCode::LotInvalidHours),

            // Reservation
            2002 => Ok(ErrorCode::ReservationNotCancellable),
            2004 => Ok(ErrorCode::ReservationInvalidDuration),
            2005 => Ok(ErrorCode::NoSpotsAvailable),

            // Payment
            3001 => Ok(ErrorCode::PaymentFailed),
            3002 => Ok(ErrorCode::PaymentInvalidCard),
            3003 => Ok(ErrorCode::PaymentCardExpired),

            // Sync
            4001 => Ok(ErrorCode::SyncReplayFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9006 => Ok(ErrorCode::MalformedDocument),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
