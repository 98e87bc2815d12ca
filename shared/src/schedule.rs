//! Opening-hours parsing
//!
//! Lots publish their hours as 12-hour clock strings: `7:00am`, `07:00 AM`,
//! `10:30pm`. Parsing is case-insensitive and ignores inner whitespace.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid time of day: {0:?} (expected h:mma, e.g. 7:00am)")]
pub struct TimeOfDayError(pub String);

/// Parse an `h:mma` time-of-day string
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, TimeOfDayError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    NaiveTime::parse_from_str(&compact, "%I:%M%p").map_err(|_| TimeOfDayError(raw.to_string()))
}

/// Render a time of day in the canonical `h:mma` form (`7:05am`)
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%-I:%M%P").to_string()
}

/// Where a time of day falls relative to opening hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoursCheck {
    Open,
    BeforeOpening,
    AfterClosing,
}

/// Same-day comparison: `time` is inside `[open, close]`.
///
/// Hours that wrap past midnight (close earlier than open) are not treated
/// specially, so such a lot reads as closed at every time of day.
pub fn check_hours(time: NaiveTime, open: NaiveTime, close: NaiveTime) -> HoursCheck {
    if time < open {
        HoursCheck::BeforeOpening
    } else if time > close {
        HoursCheck::AfterClosing
    } else {
        HoursCheck::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_accepts_common_spellings() {
        assert_eq!(parse_time_of_day("7:00am").unwrap(), t(7, 0));
        assert_eq!(parse_time_of_day("07:00 AM").unwrap(), t(7, 0));
        assert_eq!(parse_time_of_day("10:30pm").unwrap(), t(22, 30));
        assert_eq!(parse_time_of_day("12:00am").unwrap(), t(0, 0));
        assert_eq!(parse_time_of_day("12:15PM").unwrap(), t(12, 15));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "7am", "19:00", "13:00pm", "7:60am", "seven"] {
            assert!(parse_time_of_day(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_time_of_day(t(7, 5)), "7:05am");
        assert_eq!(format_time_of_day(t(22, 0)), "10:00pm");
    }

    #[test]
    fn test_check_hours_boundaries() {
        let (open, close) = (t(6, 0), t(22, 0));
        assert_eq!(check_hours(t(5, 59), open, close), HoursCheck::BeforeOpening);
        assert_eq!(check_hours(t(6, 0), open, close), HoursCheck::Open);
        assert_eq!(check_hours(t(22, 0), open, close), HoursCheck::Open);
        assert_eq!(check_hours(t(22, 1), open, close), HoursCheck::AfterClosing);
    }
}
