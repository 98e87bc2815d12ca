//! Remaining capacity of a lot for a requested time slot

use crate::ClientConfig;
use crate::store::DocumentStore;
use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc, Weekday};
use shared::document::{StructuredQuery, decode_all};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::reservation::{self, Reservation, ReservationStatus};
use shared::models::ParkingLot;
use shared::schedule::{HoursCheck, check_hours, format_time_of_day};
use std::fmt;
use std::sync::Arc;

/// Why a slot was refused before counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ClosedDay(Weekday),
    BeforeOpening { opens: NaiveTime },
    AfterClosing { closes: NaiveTime },
}

impl Rejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ClosedDay(_) => ErrorCode::LotClosedDay,
            Self::BeforeOpening { .. } => ErrorCode::LotBeforeOpening,
            Self::AfterClosing { .. } => ErrorCode::LotAfterClosing,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedDay(day) => write!(f, "Parking lots are closed on {}", weekday_name(*day)),
            Self::BeforeOpening { opens } => {
                write!(f, "The parking lot opens at {}", format_time_of_day(*opens))
            }
            Self::AfterClosing { closes } => {
                write!(f, "The parking lot closes at {}", format_time_of_day(*closes))
            }
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mondays",
        Weekday::Tue => "Tuesdays",
        Weekday::Wed => "Wednesdays",
        Weekday::Thu => "Thursdays",
        Weekday::Fri => "Fridays",
        Weekday::Sat => "Saturdays",
        Weekday::Sun => "Sundays",
    }
}

/// Where a spot count came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// Nominal capacity minus overlapping reservations
    Counted,
    /// The reservation query failed; nominal capacity reported as is
    NominalFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available { spots: u32, source: CountSource },
    Rejected(Rejection),
}

impl Availability {
    /// Free spots; 0 for rejected slots
    pub fn spots(&self) -> u32 {
        match self {
            Self::Available { spots, .. } => *spots,
            Self::Rejected(_) => 0,
        }
    }

    pub fn is_bookable(&self) -> bool {
        self.spots() > 0
    }

    /// Human-readable reason when nothing can be booked
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Rejected(rejection) => Some(rejection.to_string()),
            Self::Available { spots: 0, .. } => {
                Some(ErrorCode::NoSpotsAvailable.message().to_string())
            }
            Self::Available { .. } => None,
        }
    }
}

/// Answers "how many standard spots of this lot are free for `[start, end)`"
#[derive(Clone)]
pub struct AvailabilityChecker {
    store: Arc<dyn DocumentStore>,
    closed_weekday: Weekday,
    offset: FixedOffset,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ClientConfig) -> Self {
        Self::with_schedule(store, config.closed_weekday, config.local_offset())
    }

    pub fn with_schedule(
        store: Arc<dyn DocumentStore>,
        closed_weekday: Weekday,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            closed_weekday,
            offset,
        }
    }

    /// Free standard spots of `lot` for `duration_hours` from `start`
    ///
    /// Only bad input is an `Err`. Closed days and hours short-circuit
    /// without touching the store; a failed reservation query reports the
    /// lot's nominal capacity.
    pub async fn check(
        &self,
        lot: &ParkingLot,
        start: DateTime<Utc>,
        duration_hours: u32,
    ) -> AppResult<Availability> {
        let end = reservation::slot_end(start, duration_hours)?;

        if let Some(rejection) = self.schedule_rejection(lot, start)? {
            tracing::debug!(lot_id = %lot.id, %start, reason = %rejection, "Slot rejected");
            return Ok(Availability::Rejected(rejection));
        }

        let query = StructuredQuery::collection(reservation::COLLECTION)
            .where_eq(reservation::fields::PARKING_LOT_ID, lot.id.as_str())
            .where_lt(reservation::fields::START_TIME, end)
            .where_gt(reservation::fields::END_TIME, start);

        match self.store.run_query(&query).await {
            Ok(docs) => {
                let overlapping = decode_all::<Reservation>(&docs)
                    .into_iter()
                    .filter(|r| r.parking_lot_id == lot.id)
                    .filter(|r| r.status != ReservationStatus::Cancelled)
                    .filter(|r| r.overlaps(start, end))
                    .count();
                let used = u32::try_from(overlapping).unwrap_or(u32::MAX);
                let spots = lot.available_spots.saturating_sub(used);
                tracing::debug!(lot_id = %lot.id, overlapping, spots, "Counted availability");
                Ok(Availability::Available {
                    spots,
                    source: CountSource::Counted,
                })
            }
            Err(e) => {
                tracing::warn!(
                    lot_id = %lot.id,
                    error = %e,
                    "Reservation query failed, reporting nominal capacity"
                );
                Ok(Availability::Available {
                    spots: lot.available_spots,
                    source: CountSource::NominalFallback,
                })
            }
        }
    }

    fn schedule_rejection(
        &self,
        lot: &ParkingLot,
        start: DateTime<Utc>,
    ) -> AppResult<Option<Rejection>> {
        let local = start.with_timezone(&self.offset);
        if local.weekday() == self.closed_weekday {
            return Ok(Some(Rejection::ClosedDay(self.closed_weekday)));
        }

        let (opens, closes) = lot.opening_hours().map_err(|e| {
            AppError::with_message(ErrorCode::LotInvalidHours, e.to_string())
                .with_detail("lot_id", lot.id.as_str())
        })?;

        Ok(match check_hours(local.time(), opens, closes) {
            HoursCheck::Open => None,
            HoursCheck::BeforeOpening => Some(Rejection::BeforeOpening { opens }),
            HoursCheck::AfterClosing => Some(Rejection::AfterClosing { closes }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::{Offset, TimeZone};
    use rust_decimal::Decimal;
    use shared::document::ToFields;
    use shared::models::Coordinate;

    /// 2024-11-26 is a Tuesday
    fn tue(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 26, h, m, 0).unwrap()
    }

    fn lot(spots: u32) -> ParkingLot {
        ParkingLot {
            id: "lot-1".into(),
            name: "Lot A".into(),
            coordinate: Coordinate {
                latitude: 4.6,
                longitude: -74.06,
            },
            available_spots: spots,
            available_ev_spots: 0,
            fare_per_day: 24_000,
            open_time: "6:00am".into(),
            close_time: "10:00pm".into(),
        }
    }

    fn seed(
        store: &InMemoryStore,
        id: &str,
        lot_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: ReservationStatus,
    ) {
        let r = Reservation {
            id: id.into(),
            parking_lot_id: lot_id.into(),
            parking_lot_name: "Lot A".into(),
            start_time: start,
            end_time: end,
            status,
            fare_amount: Decimal::from(1000),
        };
        store.insert(reservation::COLLECTION, id, r.to_fields());
    }

    fn checker(store: Arc<InMemoryStore>) -> AvailabilityChecker {
        AvailabilityChecker::with_schedule(store, Weekday::Sun, Utc.fix())
    }

    #[tokio::test]
    async fn test_boundaries_are_half_open() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "a", "lot-1", tue(9, 0), tue(10, 0), ReservationStatus::Completed);
        seed(&store, "b", "lot-1", tue(9, 30), tue(10, 30), ReservationStatus::Active);
        seed(&store, "c", "lot-1", tue(12, 0), tue(13, 0), ReservationStatus::Upcoming);

        let result = checker(store).check(&lot(5), tue(10, 0), 2).await.unwrap();
        assert_eq!(
            result,
            Availability::Available {
                spots: 4,
                source: CountSource::Counted
            }
        );
    }

    #[tokio::test]
    async fn test_other_lots_and_cancelled_are_ignored() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "a", "lot-2", tue(10, 0), tue(12, 0), ReservationStatus::Upcoming);
        seed(&store, "b", "lot-1", tue(10, 0), tue(12, 0), ReservationStatus::Cancelled);
        seed(&store, "c", "lot-1", tue(15, 0), tue(16, 0), ReservationStatus::Upcoming);

        let result = checker(store).check(&lot(3), tue(10, 0), 2).await.unwrap();
        assert_eq!(result.spots(), 3);
        assert_eq!(result.reason(), None);
    }

    #[tokio::test]
    async fn test_count_never_goes_negative() {
        let store = Arc::new(InMemoryStore::new());
        for id in ["a", "b", "c"] {
            seed(&store, id, "lot-1", tue(10, 0), tue(11, 0), ReservationStatus::Upcoming);
        }
        let result = checker(store).check(&lot(2), tue(10, 0), 1).await.unwrap();
        assert_eq!(result.spots(), 0);
        assert!(!result.is_bookable());
        assert!(result.reason().is_some());
    }

    #[tokio::test]
    async fn test_closed_day_skips_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let sunday = Utc.with_ymd_and_hms(2024, 11, 24, 10, 0, 0).unwrap();

        let result = checker(store.clone()).check(&lot(50), sunday, 2).await.unwrap();
        assert_eq!(result, Availability::Rejected(Rejection::ClosedDay(Weekday::Sun)));
        assert_eq!(result.spots(), 0);
        assert_eq!(store.calls().query, 0);
    }

    #[tokio::test]
    async fn test_weekday_uses_local_offset() {
        let store = Arc::new(InMemoryStore::new());
        // Monday 03:00 UTC is still Sunday 22:00 at UTC-5
        let monday_utc = Utc.with_ymd_and_hms(2024, 11, 25, 3, 0, 0).unwrap();
        let bogota = FixedOffset::west_opt(5 * 3600).unwrap();
        let checker = AvailabilityChecker::with_schedule(store, Weekday::Sun, bogota);

        let result = checker.check(&lot(5), monday_utc, 1).await.unwrap();
        assert!(matches!(result, Availability::Rejected(Rejection::ClosedDay(_))));
    }

    #[tokio::test]
    async fn test_hours_rejections_are_distinct() {
        let store = Arc::new(InMemoryStore::new());
        let checker = checker(store.clone());

        let early = checker.check(&lot(5), tue(5, 59), 1).await.unwrap();
        let late = checker.check(&lot(5), tue(22, 1), 1).await.unwrap();
        let closing = checker.check(&lot(5), tue(22, 0), 1).await.unwrap();

        assert!(matches!(early, Availability::Rejected(Rejection::BeforeOpening { .. })));
        assert!(matches!(late, Availability::Rejected(Rejection::AfterClosing { .. })));
        assert_ne!(early.reason(), late.reason());
        assert_eq!(early.reason().unwrap(), "The parking lot opens at 6:00am");
        assert_eq!(closing.spots(), 5);
        assert_eq!(store.calls().query, 1);
    }

    #[tokio::test]
    async fn test_query_failure_reports_nominal() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "a", "lot-1", tue(10, 0), tue(12, 0), ReservationStatus::Upcoming);
        store.set_fail_queries(true);

        let result = checker(store).check(&lot(7), tue(10, 0), 2).await.unwrap();
        assert_eq!(
            result,
            Availability::Available {
                spots: 7,
                source: CountSource::NominalFallback
            }
        );
    }

    #[tokio::test]
    async fn test_bad_input_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        let checker = checker(store);

        let err = checker.check(&lot(5), tue(10, 0), 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationInvalidDuration);

        let err = checker.check(&lot(5), tue(10, 0), u32::MAX).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationInvalidDuration);

        let mut broken = lot(5);
        broken.open_time = "six".into();
        let err = checker.check(&broken, tue(10, 0), 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LotInvalidHours);
    }
}
