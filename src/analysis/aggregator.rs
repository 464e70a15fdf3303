//! Scan log aggregation.
//!
//! This module turns a flat log of scans into the dashboard snapshot:
//! daily counts, the most frequent latecomers, today's scans, the delay
//! distribution and the headline numbers.

use super::delay::{average_delay, bucket_delays, delay_minutes, punctuality_split};
use crate::config::Config;
use crate::models::{
    DailyCount, FrequencyEntry, RawScan, RecurrenceSplit, ScanLog, ScanRecord, Snapshot,
    Summary, TodayScan,
};
use crate::timestamp::{format_clock_12h, parse_clock_time, parse_scan, parse_utc_offset};
use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Settings the aggregation depends on.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Daily cutoff after which a scan counts as late.
    pub cutoff: NaiveTime,
    /// Zone in which calendar dates and clock times are read.
    pub utc_offset: FixedOffset,
    /// Length of the frequent-latecomer ranking.
    pub top_n: usize,
    /// A ranked student seen more often than this is a repeat offender.
    pub repeat_threshold: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cutoff: NaiveTime::from_hms_opt(9, 40, 0).expect("09:40:00 is a valid time"),
            utc_offset: FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("+05:30 is in range"),
            top_n: 5,
            repeat_threshold: 3,
        }
    }
}

impl TryFrom<&Config> for AggregatorConfig {
    type Error = anyhow::Error;

    fn try_from(config: &Config) -> Result<Self> {
        let cutoff = parse_clock_time(&config.schedule.cutoff)
            .ok_or_else(|| anyhow!("Invalid cutoff time: {}", config.schedule.cutoff))?;
        let utc_offset = parse_utc_offset(&config.schedule.utc_offset)
            .ok_or_else(|| anyhow!("Invalid UTC offset: {}", config.schedule.utc_offset))?;

        Ok(Self {
            cutoff,
            utc_offset,
            top_n: config.dashboard.top_n,
            repeat_threshold: config.dashboard.repeat_threshold,
        })
    }
}

/// Computes dashboard snapshots from scan logs.
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create a new aggregator.
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// The settings this aggregator runs with.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// The current instant in the reference zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        chrono::Utc::now().with_timezone(&self.config.utc_offset)
    }

    /// Parse raw scans, dropping those whose timestamp can't be read.
    ///
    /// Returns the parsed records in log order and the number skipped.
    pub fn parse_scans(&self, scans: &[RawScan]) -> (Vec<ScanRecord>, usize) {
        let mut records = Vec::with_capacity(scans.len());
        let mut skipped = 0;

        for scan in scans {
            match parse_scan(scan, &self.config.utc_offset) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping scan: {}", e);
                    skipped += 1;
                }
            }
        }

        (records, skipped)
    }

    /// Aggregate a raw scan log as of `now`.
    pub fn aggregate(&self, scans: &[RawScan], now: DateTime<FixedOffset>) -> Snapshot {
        let (records, skipped) = self.parse_scans(scans);
        let mut snapshot = self.aggregate_records(&records, now);
        snapshot.skipped_records = skipped;
        snapshot
    }

    /// Aggregate a loaded log, counting its malformed entries as skipped.
    pub fn aggregate_log(&self, log: &ScanLog, now: DateTime<FixedOffset>) -> Snapshot {
        let mut snapshot = self.aggregate(&log.scans, now);
        snapshot.skipped_records += log.malformed;
        snapshot
    }

    /// Aggregate already-parsed records as of `now`.
    pub fn aggregate_records(
        &self,
        records: &[ScanRecord],
        now: DateTime<FixedOffset>,
    ) -> Snapshot {
        let tz = self.config.utc_offset;
        let local: Vec<DateTime<FixedOffset>> =
            records.iter().map(|r| r.timestamp.with_timezone(&tz)).collect();
        let today = now.with_timezone(&tz).date_naive();

        let daily = daily_counts(&local);
        let frequencies = student_frequencies(records);
        let frequent = top_frequencies(&frequencies, self.config.top_n);
        let today_scans = todays_scans(records, &local, today);
        let delays: Vec<i64> = local
            .iter()
            .map(|ts| delay_minutes(ts, self.config.cutoff))
            .collect();

        let summary = Summary {
            total_latecomers: records.len(),
            repeat_offenders: frequent
                .iter()
                .filter(|e| e.count > self.config.repeat_threshold)
                .count(),
            average_delay: average_delay(&delays),
            todays_latecomers: today_scans.len(),
        };

        debug!(
            "Aggregated {} scans over {} days, {} today",
            records.len(),
            daily.len(),
            today_scans.len()
        );

        Snapshot {
            daily,
            frequent,
            today: today_scans,
            delay_distribution: bucket_delays(&delays),
            summary,
            punctuality: punctuality_split(&delays),
            recurrence: recurrence_split(&frequencies),
            skipped_records: 0,
        }
    }
}

/// Count scans per calendar day, in the order days first appear.
pub fn daily_counts(timestamps: &[DateTime<FixedOffset>]) -> Vec<DailyCount> {
    let mut counts: Vec<DailyCount> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for ts in timestamps {
        let date = ts.date_naive();
        match index.get(&date) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(date, counts.len());
                counts.push(DailyCount {
                    date,
                    label: date.format("%-m/%-d/%Y").to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}

/// Count scans per student, in the order students first appear.
pub fn student_frequencies(records: &[ScanRecord]) -> Vec<FrequencyEntry> {
    let mut entries: Vec<FrequencyEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.roll_number.as_str()) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(&record.roll_number, entries.len());
                entries.push(FrequencyEntry {
                    roll_number: record.roll_number.clone(),
                    count: 1,
                });
            }
        }
    }

    entries
}

/// The `n` most frequent students, highest count first.
///
/// Equal counts keep their first-appearance order.
pub fn top_frequencies(frequencies: &[FrequencyEntry], n: usize) -> Vec<FrequencyEntry> {
    let mut ranked = frequencies.to_vec();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

/// Scans dated `today`, in log order.
///
/// `local` holds the instants of `records` already moved into the reference zone.
pub fn todays_scans(
    records: &[ScanRecord],
    local: &[DateTime<FixedOffset>],
    today: NaiveDate,
) -> Vec<TodayScan> {
    records
        .iter()
        .zip(local)
        .filter(|(_, ts)| ts.date_naive() == today)
        .map(|(record, ts)| TodayScan {
            roll_number: record.roll_number.clone(),
            time: format_clock_12h(ts),
        })
        .collect()
}

/// Students seen once versus students seen more than once.
pub fn recurrence_split(frequencies: &[FrequencyEntry]) -> RecurrenceSplit {
    let repeat = frequencies.iter().filter(|e| e.count > 1).count();
    RecurrenceSplit {
        first_time: frequencies.len() - repeat,
        repeat,
    }
}
