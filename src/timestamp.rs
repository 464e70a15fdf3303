//! Timestamp interpretation.
//!
//! Scan logs carry timestamps in whatever form the page that wrote them
//! produced: RFC 3339 from `toISOString`, naive ISO strings, or the US
//! locale string the scanner page displays.

use crate::models::{ParseError, RawScan, ScanRecord};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Layouts carrying their own offset that RFC 3339 rejects for lack of seconds.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Naive layouts interpreted as wall-clock time in the reference zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a timestamp string into an instant in `tz`.
pub fn parse_timestamp(
    value: &str,
    roll_number: &str,
    tz: &FixedOffset,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::Empty {
            roll_number: roll_number.to_string(),
        });
    }

    let unrecognised = || ParseError::Unrecognised {
        roll_number: roll_number.to_string(),
        value: value.to_string(),
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(tz));
    }

    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(value, format) {
            return Ok(instant.with_timezone(tz));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return tz.from_local_datetime(&naive).single().ok_or_else(unrecognised);
        }
    }

    // A bare ISO date is midnight UTC, as browsers read it.
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(unrecognised)?;
        return Ok(Utc.from_utc_datetime(&midnight).with_timezone(tz));
    }

    Err(unrecognised())
}

/// Resolve a raw scan into a record in the reference zone.
pub fn parse_scan(raw: &RawScan, tz: &FixedOffset) -> Result<ScanRecord, ParseError> {
    let timestamp = parse_timestamp(&raw.timestamp, &raw.roll_number, tz)?;
    Ok(ScanRecord {
        roll_number: raw.roll_number.clone(),
        timestamp,
    })
}

/// Parse a `±HH:MM` offset such as `+05:30`. `Z` and `UTC` mean zero.
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse a cutoff time given as `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Format a clock time the way the dashboard shows it: `9:05:00 AM`.
pub fn format_clock_12h(instant: &DateTime<FixedOffset>) -> String {
    instant.format("%-I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    #[test]
    fn test_rfc3339_is_converted_to_reference_zone() {
        let parsed = parse_timestamp("2024-01-15T04:00:00.000Z", "r1", &ist()).unwrap();
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.minute(), 30);
        assert_eq!(parsed.offset(), &ist());
    }

    #[test]
    fn test_rfc3339_crossing_midnight_changes_date() {
        let parsed = parse_timestamp("2024-01-15T20:00:00Z", "r1", &ist()).unwrap();
        assert_eq!(parsed.day(), 16);
        assert_eq!(parsed.hour(), 1);
    }

    #[test]
    fn test_naive_iso_is_wall_clock_time() {
        let parsed = parse_timestamp("2024-01-15T09:30:00", "r1", &ist()).unwrap();
        assert_eq!((parsed.hour(), parsed.minute()), (9, 30));

        let parsed = parse_timestamp("2024-01-15 10:05", "r1", &ist()).unwrap();
        assert_eq!((parsed.hour(), parsed.minute()), (10, 5));
    }

    #[test]
    fn test_offset_without_seconds() {
        let parsed = parse_timestamp("2024-01-15T09:30+05:30", "r1", &ist()).unwrap();
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (9, 30, 0));

        let parsed = parse_timestamp("2024-01-15T04:00+00:00", "r1", &ist()).unwrap();
        assert_eq!((parsed.hour(), parsed.minute()), (9, 30));
    }

    #[test]
    fn test_date_only_is_utc_midnight() {
        let parsed = parse_timestamp("2024-01-15", "r1", &ist()).unwrap();
        assert_eq!(parsed.day(), 15);
        assert_eq!((parsed.hour(), parsed.minute()), (5, 30));

        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let parsed = parse_timestamp("2024-01-15", "r1", &west).unwrap();
        assert_eq!((parsed.day(), parsed.hour()), (14, 19));
    }

    #[test]
    fn test_us_locale_string() {
        let parsed = parse_timestamp("1/15/2024, 9:45:12 PM", "r1", &ist()).unwrap();
        assert_eq!(parsed.month(), 1);
        assert_eq!(parsed.day(), 15);
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (21, 45, 12));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse_timestamp("not a date", "r9", &ist()).unwrap_err();
        assert_eq!(
            err,
            ParseError::Unrecognised {
                roll_number: "r9".to_string(),
                value: "not a date".to_string(),
            }
        );

        let err = parse_timestamp("   ", "r9", &ist()).unwrap_err();
        assert!(matches!(err, ParseError::Empty { .. }));
    }

    #[test]
    fn test_parse_scan_keeps_roll_number() {
        let raw = RawScan::new("21CS042", "2024-01-15T09:30:00");
        let record = parse_scan(&raw, &ist()).unwrap();
        assert_eq!(record.roll_number, "21CS042");
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+05:30"), Some(ist()));
        assert_eq!(parse_utc_offset("-04:00"), FixedOffset::west_opt(4 * 3600));
        assert_eq!(parse_utc_offset("+02"), FixedOffset::east_opt(2 * 3600));
        assert_eq!(parse_utc_offset("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("05:30"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
        assert_eq!(parse_utc_offset(""), None);
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("09:40"), NaiveTime::from_hms_opt(9, 40, 0));
        assert_eq!(parse_clock_time("09:40:30"), NaiveTime::from_hms_opt(9, 40, 30));
        assert_eq!(parse_clock_time("9.40"), None);
    }

    #[test]
    fn test_format_clock_12h() {
        let morning = parse_timestamp("2024-01-15T09:05:00", "r1", &ist()).unwrap();
        assert_eq!(format_clock_12h(&morning), "9:05:00 AM");

        let noon = parse_timestamp("2024-01-15T12:00:00", "r1", &ist()).unwrap();
        assert_eq!(format_clock_12h(&noon), "12:00:00 PM");
    }
}
