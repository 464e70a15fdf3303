//! Attendance records table.

use crate::models::{RecordRow, ScanRecord};
use chrono::{FixedOffset, NaiveDate};

/// Project records into table rows in the reference zone, keeping log order.
pub fn build_rows(records: &[ScanRecord], tz: &FixedOffset) -> Vec<RecordRow> {
    records
        .iter()
        .map(|record| {
            let local = record.timestamp.with_timezone(tz);
            RecordRow {
                roll_number: record.roll_number.clone(),
                date: local.format("%Y-%m-%d").to_string(),
                time: local.format("%-I:%M:%S %P").to_string(),
            }
        })
        .collect()
}

/// Keep only the rows from `date`. `None` keeps everything.
pub fn filter_by_date(rows: Vec<RecordRow>, date: Option<NaiveDate>) -> Vec<RecordRow> {
    match date {
        Some(date) => {
            let wanted = date.format("%Y-%m-%d").to_string();
            rows.into_iter().filter(|row| row.date == wanted).collect()
        }
        None => rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(19800).unwrap()
    }

    fn record(roll: &str, ts: &str) -> ScanRecord {
        ScanRecord {
            roll_number: roll.to_string(),
            timestamp: parse_timestamp(ts, roll, &ist()).unwrap(),
        }
    }

    #[test]
    fn test_build_rows() {
        let rows = build_rows(
            &[
                record("r1", "2024-01-15T09:05:00"),
                record("r2", "2024-01-15T13:45:10"),
            ],
            &ist(),
        );

        assert_eq!(
            rows[0],
            RecordRow {
                roll_number: "r1".to_string(),
                date: "2024-01-15".to_string(),
                time: "9:05:00 am".to_string(),
            }
        );
        assert_eq!(rows[1].time, "1:45:10 pm");
    }

    #[test]
    fn test_rows_use_reference_zone_date() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let late_night = ScanRecord {
            roll_number: "r1".to_string(),
            timestamp: parse_timestamp("2024-01-15T20:00:00Z", "r1", &utc).unwrap(),
        };
        let rows = build_rows(&[late_night], &ist());
        assert_eq!(rows[0].date, "2024-01-16");
        assert_eq!(rows[0].time, "1:30:00 am");
    }

    #[test]
    fn test_filter_by_date() {
        let rows = build_rows(
            &[
                record("r1", "2024-01-15T09:05:00"),
                record("r2", "2024-01-16T09:05:00"),
                record("r3", "2024-01-15T10:05:00"),
            ],
            &ist(),
        );

        let all = filter_by_date(rows.clone(), None);
        assert_eq!(all.len(), 3);

        let day = filter_by_date(rows.clone(), NaiveDate::from_ymd_opt(2024, 1, 15));
        let rolls: Vec<_> = day.iter().map(|r| r.roll_number.as_str()).collect();
        assert_eq!(rolls, vec!["r1", "r3"]);

        let none = filter_by_date(rows, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert!(none.is_empty());
    }
}
