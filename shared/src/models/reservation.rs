//! Reservation Model

use crate::document::{
    Document, DocumentError, DocumentResult, FieldMap, FromDocument, ToFields, field,
};
use crate::error::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection holding reservations
pub const COLLECTION: &str = "reservations";

/// How long before the start a reminder is due
pub const REMINDER_LEAD_MINUTES: i64 = 15;

/// Wire field names
pub mod fields {
    pub const PARKING_LOT_ID: &str = "parkingLotId";
    pub const PARKING_LOT_NAME: &str = "parkingLotName";
    pub const START_TIME: &str = "startTime";
    pub const END_TIME: &str = "endTime";
    pub const STATUS: &str = "status";
    pub const FARE_AMOUNT: &str = "fareAmount";
}

/// End of a `duration_hours` slot starting at `start`
///
/// Zero hours and ends beyond the representable date range are input errors.
pub fn slot_end(start: DateTime<Utc>, duration_hours: u32) -> AppResult<DateTime<Utc>> {
    if duration_hours == 0 {
        return Err(AppError::new(ErrorCode::ReservationInvalidDuration)
            .with_detail("duration_hours", duration_hours));
    }
    Duration::try_hours(i64::from(duration_hours))
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| {
            AppError::new(ErrorCode::ReservationInvalidDuration)
                .with_detail("duration_hours", duration_hours)
        })
}

/// Reservation status
///
/// Written by whoever stores the record; the client never advances it by
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown reservation status {:?}", other)),
        }
    }
}

/// Reservation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub parking_lot_id: String,
    /// Denormalized for display
    pub parking_lot_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub fare_amount: Decimal,
}

impl Reservation {
    /// Half-open interval intersection with `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    pub fn is_cancellable(&self) -> bool {
        self.status == ReservationStatus::Upcoming
    }

    /// When the "starts soon" reminder is due
    pub fn reminder_at(&self) -> DateTime<Utc> {
        self.start_time - Duration::minutes(REMINDER_LEAD_MINUTES)
    }

    /// Copy of this reservation marked cancelled
    pub fn cancelled(&self) -> AppResult<Self> {
        if !self.is_cancellable() {
            return Err(AppError::new(ErrorCode::ReservationNotCancellable)
                .with_detail("status", self.status.as_str()));
        }
        Ok(Self {
            status: ReservationStatus::Cancelled,
            ..self.clone()
        })
    }
}

fn fare_to_wire(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

impl FromDocument for Reservation {
    fn from_document(doc: &Document) -> DocumentResult<Self> {
        let status = doc.string(fields::STATUS)?;
        let status = status
            .parse::<ReservationStatus>()
            .map_err(|reason| DocumentError::InvalidValue {
                field: fields::STATUS.to_string(),
                reason,
            })?;
        let fare = doc.double(fields::FARE_AMOUNT)?;
        let fare_amount = Decimal::from_f64(fare)
            .map(|d| d.round_dp(2))
            .ok_or_else(|| DocumentError::InvalidValue {
                field: fields::FARE_AMOUNT.to_string(),
                reason: format!("{} is not a valid amount", fare),
            })?;

        let start_time = doc.timestamp(fields::START_TIME)?;
        let end_time = doc.timestamp(fields::END_TIME)?;
        if end_time <= start_time {
            return Err(DocumentError::InvalidValue {
                field: fields::END_TIME.to_string(),
                reason: format!("{} is not after {}", end_time, start_time),
            });
        }

        Ok(Self {
            id: doc.id().to_string(),
            parking_lot_id: doc.string(fields::PARKING_LOT_ID)?.to_string(),
            parking_lot_name: doc.string(fields::PARKING_LOT_NAME)?.to_string(),
            start_time,
            end_time,
            status,
            fare_amount,
        })
    }
}

impl ToFields for Reservation {
    fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            field(fields::PARKING_LOT_ID, self.parking_lot_id.as_str()),
            field(fields::PARKING_LOT_NAME, self.parking_lot_name.as_str()),
            field(fields::START_TIME, self.start_time),
            field(fields::END_TIME, self.end_time),
            field(fields::STATUS, self.status.as_str()),
            field(fields::FARE_AMOUNT, fare_to_wire(self.fare_amount)),
        ])
    }
}

/// A reservation about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    pub parking_lot_id: String,
    pub parking_lot_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub fare_amount: Decimal,
}

impl NewReservation {
    /// `[start, start + hours)`; rejects empty intervals
    pub fn new(
        parking_lot_id: impl Into<String>,
        parking_lot_name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_hours: u32,
        fare_amount: Decimal,
    ) -> AppResult<Self> {
        let end_time = slot_end(start_time, duration_hours)?;
        Ok(Self {
            parking_lot_id: parking_lot_id.into(),
            parking_lot_name: parking_lot_name.into(),
            start_time,
            end_time,
            fare_amount,
        })
    }

    /// The stored reservation once the store has assigned `id`
    pub fn into_reservation(self, id: impl Into<String>) -> Reservation {
        Reservation {
            id: id.into(),
            parking_lot_id: self.parking_lot_id,
            parking_lot_name: self.parking_lot_name,
            start_time: self.start_time,
            end_time: self.end_time,
            status: ReservationStatus::Upcoming,
            fare_amount: self.fare_amount,
        }
    }
}

impl ToFields for NewReservation {
    fn to_fields(&self) -> FieldMap {
        self.clone().into_reservation(String::new()).to_fields()
    }
}

/// Reservations split the way the "My Reservations" screen lists them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationGroups {
    pub active: Vec<Reservation>,
    pub upcoming: Vec<Reservation>,
    /// Completed and cancelled
    pub past: Vec<Reservation>,
}

impl ReservationGroups {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.upcoming.is_empty() && self.past.is_empty()
    }
}

impl FromIterator<Reservation> for ReservationGroups {
    fn from_iter<I: IntoIterator<Item = Reservation>>(iter: I) -> Self {
        let mut groups = Self::default();
        for r in iter {
            match r.status {
                ReservationStatus::Active => groups.active.push(r),
                ReservationStatus::Upcoming => groups.upcoming.push(r),
                ReservationStatus::Completed | ReservationStatus::Cancelled => groups.past.push(r),
            }
        }
        groups
    }
}
