//! Delay arithmetic relative to the daily cutoff.

use crate::models::{DelayBucket, DelayRange, PunctualitySplit};
use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

/// Signed whole minutes between a scan and the cutoff on the same day.
///
/// Floors toward negative infinity, so a scan 30 seconds before the cutoff
/// is `-1` and one 59 seconds after is `0`. Fractional seconds are ignored.
pub fn delay_minutes(timestamp: &DateTime<FixedOffset>, cutoff: NaiveTime) -> i64 {
    let actual = i64::from(timestamp.num_seconds_from_midnight());
    let expected = i64::from(cutoff.num_seconds_from_midnight());
    (actual - expected).div_euclid(60)
}

/// Count delays into the six fixed ranges.
pub fn bucket_delays(delays: &[i64]) -> Vec<DelayBucket> {
    let mut counts = [0usize; DelayRange::ALL.len()];
    for &delay in delays {
        counts[DelayRange::for_delay(delay) as usize] += 1;
    }

    DelayRange::ALL
        .iter()
        .zip(counts)
        .map(|(range, count)| DelayBucket {
            label: range.label().to_string(),
            count,
            percentage: percentage(count, delays.len()),
        })
        .collect()
}

/// `count / total * 100` rounded half up to one decimal place; `0.0` when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let tenths = (2000 * count + total) / (2 * total);
    tenths as f64 / 10.0
}

/// Mean of signed delays rounded half toward positive infinity; `0` when empty.
pub fn average_delay(delays: &[i64]) -> i64 {
    if delays.is_empty() {
        return 0;
    }
    let n = delays.len() as i64;
    let sum: i64 = delays.iter().sum();
    (2 * sum + n).div_euclid(2 * n)
}

/// Split delays into on-time (at or before the cutoff) and late.
pub fn punctuality_split(delays: &[i64]) -> PunctualitySplit {
    let late = delays.iter().filter(|&&d| d > 0).count();
    PunctualitySplit {
        on_time: delays.len() - late,
        late,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(19800)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, m, s)
            .unwrap()
    }

    fn cutoff() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 40, 0).unwrap()
    }

    #[test]
    fn test_delay_minutes_signed() {
        assert_eq!(delay_minutes(&at(9, 30, 0), cutoff()), -10);
        assert_eq!(delay_minutes(&at(9, 40, 0), cutoff()), 0);
        assert_eq!(delay_minutes(&at(10, 10, 0), cutoff()), 30);
    }

    #[test]
    fn test_delay_minutes_floors() {
        assert_eq!(delay_minutes(&at(9, 40, 59), cutoff()), 0);
        assert_eq!(delay_minutes(&at(9, 39, 30), cutoff()), -1);
        assert_eq!(delay_minutes(&at(9, 50, 59), cutoff()), 10);
    }

    #[test]
    fn test_bucket_boundaries() {
        let buckets = bucket_delays(&[10, 11, 50, 51]);
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 0, 1, 1]);
    }

    #[test]
    fn test_early_arrivals_land_in_first_bucket() {
        let buckets = bucket_delays(&[-120, -1, 0]);
        assert_eq!(buckets[0].label, "0-10");
        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[0].percentage, 100.0);
    }

    #[test]
    fn test_bucket_counts_sum_to_total() {
        let delays = vec![-5, 3, 14, 14, 29, 33, 47, 48, 90, 200, 0];
        let buckets = bucket_delays(&delays);
        assert_eq!(buckets.len(), 6);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), delays.len());
    }

    #[test]
    fn test_empty_buckets_are_zero() {
        let buckets = bucket_delays(&[]);
        assert_eq!(buckets.len(), 6);
        assert!(buckets.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 8), 12.5);
        assert_eq!(percentage(1, 16), 6.3);
        assert_eq!(percentage(0, 7), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_average_delay() {
        assert_eq!(average_delay(&[-10, 30]), 10);
        assert_eq!(average_delay(&[]), 0);
        assert_eq!(average_delay(&[-5]), -5);
        // Ties go toward positive infinity.
        assert_eq!(average_delay(&[-2, -3]), -2);
        assert_eq!(average_delay(&[2, 3]), 3);
    }

    #[test]
    fn test_punctuality_split() {
        let split = punctuality_split(&[-3, 0, 1, 45]);
        assert_eq!(split, PunctualitySplit { on_time: 2, late: 2 });
    }
}
