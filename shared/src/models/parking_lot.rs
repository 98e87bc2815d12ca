//! Parking Lot Model

use crate::document::{Document, DocumentResult, FieldMap, FromDocument, ToFields, field};
use crate::schedule::{TimeOfDayError, parse_time_of_day};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Collection holding parking lots
pub const COLLECTION: &str = "parkingLots";

/// Wire field names
pub mod fields {
    pub const NAME: &str = "name";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const OPEN_TIME: &str = "open_time";
    pub const CLOSE_TIME: &str = "close_time";
    pub const FARE_PER_DAY: &str = "farePerDay";
    pub const AVAILABLE_SPOTS: &str = "availableSpots";
    pub const AVAILABLE_EV_SPOTS: &str = "available_ev_spots";
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parking lot entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Standard spots
    pub available_spots: u32,
    pub available_ev_spots: u32,
    /// Flat daily fare, whole currency units
    pub fare_per_day: i64,
    /// `h:mma`, e.g. `6:00am`
    pub open_time: String,
    pub close_time: String,
}

impl ParkingLot {
    pub fn has_ev_spots(&self) -> bool {
        self.available_ev_spots > 0
    }

    /// Parsed (open, close) times of day
    pub fn opening_hours(&self) -> Result<(NaiveTime, NaiveTime), TimeOfDayError> {
        Ok((
            parse_time_of_day(&self.open_time)?,
            parse_time_of_day(&self.close_time)?,
        ))
    }
}

impl FromDocument for ParkingLot {
    fn from_document(doc: &Document) -> DocumentResult<Self> {
        Ok(Self {
            id: doc.id().to_string(),
            name: doc.string(fields::NAME)?.to_string(),
            coordinate: Coordinate {
                latitude: doc.double(fields::LATITUDE)?,
                longitude: doc.double(fields::LONGITUDE)?,
            },
            available_spots: doc.count(fields::AVAILABLE_SPOTS)?,
            available_ev_spots: doc.count(fields::AVAILABLE_EV_SPOTS)?,
            fare_per_day: doc.integer(fields::FARE_PER_DAY)?,
            open_time: doc.string(fields::OPEN_TIME)?.to_string(),
            close_time: doc.string(fields::CLOSE_TIME)?.to_string(),
        })
    }
}

impl ToFields for ParkingLot {
    fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            field(fields::NAME, self.name.as_str()),
            field(fields::LATITUDE, self.coordinate.latitude),
            field(fields::LONGITUDE, self.coordinate.longitude),
            field(fields::OPEN_TIME, self.open_time.as_str()),
            field(fields::CLOSE_TIME, self.close_time.as_str()),
            field(fields::FARE_PER_DAY, self.fare_per_day),
            field(fields::AVAILABLE_SPOTS, self.available_spots),
            field(fields::AVAILABLE_EV_SPOTS, self.available_ev_spots),
        ])
    }
}

fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    parse_time_of_day(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("time_of_day"))
}

/// Owner's registration form for a new lot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParkingLotRegistration {
    #[validate(length(min = 1, message = "Please fill in all fields."))]
    pub name: String,
    #[validate(range(
        min = -90.0,
        max = 90.0,
        message = "Latitude must be a valid number between -90 and 90."
    ))]
    pub latitude: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be a valid number between -180 and 180."
    ))]
    pub longitude: f64,
    #[validate(range(min = 1, message = "Fare Per Day must be a valid positive number."))]
    pub fare_per_day: i64,
    pub available_spots: u32,
    pub available_ev_spots: u32,
    #[validate(custom(
        function = "validate_time_of_day",
        message = "Open Time must be in the format hh:mmam or hh:mmpm."
    ))]
    pub open_time: String,
    #[validate(custom(
        function = "validate_time_of_day",
        message = "Close Time must be in the format hh:mmam or hh:mmpm."
    ))]
    pub close_time: String,
}

impl ParkingLotRegistration {
    /// The lot this registration describes, before the store assigns an id
    pub fn to_lot(&self) -> ParkingLot {
        ParkingLot {
            id: String::new(),
            name: self.name.trim().to_string(),
            coordinate: Coordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            available_spots: self.available_spots,
            available_ev_spots: self.available_ev_spots,
            fare_per_day: self.fare_per_day,
            open_time: self.open_time.trim().to_string(),
            close_time: self.close_time.trim().to_string(),
        }
    }
}
