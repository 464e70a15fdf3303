//! Data models for attendance analytics.
//!
//! This module contains the core data structures shared by the store,
//! the aggregator and the report generator.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A scan exactly as it was persisted by the scanner page.
///
/// The browser store used `rollno`/`time`; both those names and the
/// descriptive ones are accepted. A missing or null field reads as an
/// empty string and a number reads as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScan {
    /// Opaque student identifier.
    #[serde(
        default,
        alias = "rollno",
        alias = "rollNumber",
        deserialize_with = "lenient_string"
    )]
    pub roll_number: String,
    /// Timestamp string, not yet interpreted.
    #[serde(default, alias = "time", deserialize_with = "lenient_string")]
    pub timestamp: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl RawScan {
    /// Creates a raw scan from its two fields.
    #[allow(dead_code)] // Constructor for fixtures and tests
    pub fn new(roll_number: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Scans read from a log, plus the entries that were not scans at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanLog {
    pub scans: Vec<RawScan>,
    /// Entries that are not JSON objects, e.g. a stray string or number.
    pub malformed: usize,
}

/// One logged attendance event with a resolved instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Opaque student identifier, never normalized.
    pub roll_number: String,
    /// Instant of the scan in the reference time zone.
    pub timestamp: DateTime<FixedOffset>,
}

/// Failure to interpret a scan's timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty timestamp for roll number `{roll_number}`")]
    Empty { roll_number: String },

    #[error("unrecognised timestamp `{value}` for roll number `{roll_number}`")]
    Unrecognised { roll_number: String, value: String },
}

/// The six fixed delay ranges of the histogram, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DelayRange {
    /// Ten minutes late or less, including early and on-time scans.
    UpToTen,
    ElevenToTwenty,
    TwentyOneToThirty,
    ThirtyOneToForty,
    FortyOneToFifty,
    /// More than fifty minutes late.
    OverFifty,
}

impl DelayRange {
    /// All ranges in histogram order.
    pub const ALL: [DelayRange; 6] = [
        DelayRange::UpToTen,
        DelayRange::ElevenToTwenty,
        DelayRange::TwentyOneToThirty,
        DelayRange::ThirtyOneToForty,
        DelayRange::FortyOneToFifty,
        DelayRange::OverFifty,
    ];

    /// Picks the range a signed delay (in minutes) falls into.
    pub fn for_delay(minutes: i64) -> Self {
        match minutes {
            m if m <= 10 => DelayRange::UpToTen,
            11..=20 => DelayRange::ElevenToTwenty,
            21..=30 => DelayRange::TwentyOneToThirty,
            31..=40 => DelayRange::ThirtyOneToForty,
            41..=50 => DelayRange::FortyOneToFifty,
            _ => DelayRange::OverFifty,
        }
    }

    /// Histogram label.
    pub fn label(&self) -> &'static str {
        match self {
            DelayRange::UpToTen => "0-10",
            DelayRange::ElevenToTwenty => "11-20",
            DelayRange::TwentyOneToThirty => "21-30",
            DelayRange::ThirtyOneToForty => "31-40",
            DelayRange::FortyOneToFifty => "41-50",
            DelayRange::OverFifty => "50+",
        }
    }
}

impl fmt::Display for DelayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One bar of the delay histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayBucket {
    pub label: String,
    pub count: usize,
    /// Share of all scans, rounded to one decimal place. Zero when there are no scans.
    pub percentage: f64,
}

/// Number of scans on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    /// The day in `M/D/YYYY` form.
    pub label: String,
    pub count: usize,
}

/// How often one student appears in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub roll_number: String,
    pub count: usize,
}

/// A scan that happened today, projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayScan {
    pub roll_number: String,
    /// 12-hour clock, e.g. `9:05:00 AM`.
    pub time: String,
}

/// Headline numbers of the dashboard.
///
/// The `*_latecomers` fields count every scan, late or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Every parsed scan in the log.
    pub total_latecomers: usize,
    /// Students in the ranked top list seen more often than the repeat threshold.
    pub repeat_offenders: usize,
    /// Mean signed delay in whole minutes.
    pub average_delay: i64,
    /// Every scan dated today.
    pub todays_latecomers: usize,
}

/// Scans before or at the cutoff versus after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctualitySplit {
    pub on_time: usize,
    pub late: usize,
}

/// Students seen once versus students seen more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSplit {
    pub first_time: usize,
    pub repeat: usize,
}

/// Everything the dashboard shows, computed from one pass over the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Per-day counts in the order days were first seen.
    pub daily: Vec<DailyCount>,
    /// Most frequent students, highest count first.
    pub frequent: Vec<FrequencyEntry>,
    /// Today's scans in log order.
    pub today: Vec<TodayScan>,
    /// Always six buckets.
    pub delay_distribution: Vec<DelayBucket>,
    pub summary: Summary,
    pub punctuality: PunctualitySplit,
    pub recurrence: RecurrenceSplit,
    /// Raw scans dropped because their timestamp could not be read.
    pub skipped_records: usize,
}

/// One line of the attendance records table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub roll_number: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// 12-hour clock with lowercase meridiem, e.g. `9:05:00 am`.
    pub time: String,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Scan log the report was built from.
    pub source: String,
    /// The instant treated as "now".
    pub generated_at: DateTime<FixedOffset>,
    /// Daily cutoff, `HH:MM:SS`.
    pub cutoff: String,
    /// Reference zone offset, e.g. `+05:30`.
    pub utc_offset: String,
    pub records_parsed: usize,
    pub records_skipped: usize,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub snapshot: Snapshot,
    /// Attendance records table, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<RecordRow>>,
    /// Day the records table was filtered to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_date: Option<NaiveDate>,
}
