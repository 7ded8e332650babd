//! Deterministic downsampling of summation records into chart points
//!
//! Divides a caller-specified time window into exactly `requested_points`
//! equal-width buckets. A bucket with no underlying records stays `None`
//! so charts render a gap instead of an interpolated or zero-filled value;
//! a bucket with records carries the average of their metric fields.

use crate::error::{AppError, AppResult};
use crate::models::SummationRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Averaged metrics for one non-empty bucket
#[derive(Debug, Clone, Serialize)]
pub struct SampledBucket {
    /// Start of the bucket's time slice
    pub bucket_start: DateTime<Utc>,
    /// End of the bucket's time slice
    pub bucket_end: DateTime<Utc>,
    /// Number of raw records averaged into this bucket
    pub record_count: usize,
    pub energy_delegated: f64,
    pub energy_reclaimed: f64,
    pub bandwidth_delegated: f64,
    pub bandwidth_reclaimed: f64,
    pub net_energy: f64,
    pub net_bandwidth: f64,
    pub transaction_count: f64,
}

/// Sampling metadata reported alongside the buckets
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleMetadata {
    /// Number of non-null buckets
    pub actual_points: usize,
    /// True iff more raw records existed than requested points
    pub sampling_applied: bool,
}

/// A sampled series: always exactly `requested_points` slots
#[derive(Debug, Clone, Serialize)]
pub struct SampledSeries {
    pub buckets: Vec<Option<SampledBucket>>,
    pub metadata: SampleMetadata,
}

/// Downsample `records` into exactly `requested_points` buckets over
/// `[start, end]`.
///
/// Records outside the window are ignored. `start == end` degenerates to
/// a single populated bucket slot; `requested_points == 0` is invalid.
pub fn sample(
    records: &[SummationRecord],
    requested_points: usize,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<SampledSeries> {
    if requested_points == 0 {
        return Err(AppError::Validation(
            "requested_points must be at least 1".to_string(),
        ));
    }
    if end < start {
        return Err(AppError::Validation(
            "window end precedes window start".to_string(),
        ));
    }

    let start_ms = start.timestamp_millis();
    let span_ms = end.timestamp_millis() - start_ms;

    // Partition records into bucket slots
    let mut slots: Vec<Vec<&SummationRecord>> = vec![Vec::new(); requested_points];
    for record in records {
        let t = record.timestamp.timestamp_millis();
        if t < start_ms || t > start_ms + span_ms {
            continue;
        }
        let index = if span_ms == 0 {
            0
        } else {
            // end of window lands in the last bucket, not one past it
            (((t - start_ms) as u128 * requested_points as u128 / span_ms as u128) as usize)
                .min(requested_points - 1)
        };
        slots[index].push(record);
    }

    let bucket_width_ms = if span_ms > 0 {
        span_ms / requested_points as i64
    } else {
        0
    };

    let mut buckets = Vec::with_capacity(requested_points);
    let mut actual_points = 0;
    for (index, slot) in slots.iter().enumerate() {
        if slot.is_empty() {
            buckets.push(None);
            continue;
        }
        actual_points += 1;

        let bucket_start_ms = start_ms + bucket_width_ms * index as i64;
        let bucket_end_ms = if index + 1 == requested_points {
            start_ms + span_ms
        } else {
            bucket_start_ms + bucket_width_ms
        };

        buckets.push(Some(average_bucket(
            slot,
            millis_to_datetime(bucket_start_ms),
            millis_to_datetime(bucket_end_ms),
        )));
    }

    let in_window = records
        .iter()
        .filter(|r| {
            let t = r.timestamp.timestamp_millis();
            t >= start_ms && t <= start_ms + span_ms
        })
        .count();

    Ok(SampledSeries {
        buckets,
        metadata: SampleMetadata {
            actual_points,
            sampling_applied: in_window > requested_points,
        },
    })
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

fn average_bucket(
    records: &[&SummationRecord],
    bucket_start: DateTime<Utc>,
    bucket_end: DateTime<Utc>,
) -> SampledBucket {
    let n = records.len() as f64;
    let avg = |f: fn(&SummationRecord) -> i64| -> f64 {
        records.iter().map(|r| f(r) as f64).sum::<f64>() / n
    };

    SampledBucket {
        bucket_start,
        bucket_end,
        record_count: records.len(),
        energy_delegated: avg(|r| r.energy_delegated),
        energy_reclaimed: avg(|r| r.energy_reclaimed),
        bandwidth_delegated: avg(|r| r.bandwidth_delegated),
        bandwidth_reclaimed: avg(|r| r.bandwidth_reclaimed),
        net_energy: avg(|r| r.net_energy),
        net_bandwidth: avg(|r| r.net_bandwidth),
        transaction_count: avg(|r| r.transaction_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_at(timestamp: DateTime<Utc>, energy_delegated: i64) -> SummationRecord {
        SummationRecord::from_totals(timestamp, 0, 0, energy_delegated, 0, 0, 0, 1, 0)
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        (start, start + Duration::hours(12))
    }

    #[test]
    fn test_empty_records_yield_all_nulls() {
        let (start, end) = window();
        let series = sample(&[], 12, start, end).unwrap();

        assert_eq!(series.buckets.len(), 12);
        assert!(series.buckets.iter().all(|b| b.is_none()));
        assert_eq!(series.metadata.actual_points, 0);
        assert!(!series.metadata.sampling_applied);
    }

    #[test]
    fn test_output_length_is_always_requested_points() {
        let (start, end) = window();
        let records = vec![record_at(start + Duration::hours(1), 100)];

        for n in [1usize, 3, 12, 100] {
            let series = sample(&records, n, start, end).unwrap();
            assert_eq!(series.buckets.len(), n);
        }
    }

    #[test]
    fn test_gap_preservation() {
        let (start, end) = window();
        // Records only in the first hour of a 12-hour window, 12 buckets
        let records = vec![
            record_at(start + Duration::minutes(10), 100),
            record_at(start + Duration::minutes(40), 300),
        ];

        let series = sample(&records, 12, start, end).unwrap();
        assert!(series.buckets[0].is_some());
        assert!(series.buckets[1..].iter().all(|b| b.is_none()));
        assert_eq!(series.metadata.actual_points, 1);
    }

    #[test]
    fn test_bucket_averages_contained_records() {
        let (start, end) = window();
        let records = vec![
            record_at(start + Duration::minutes(10), 100),
            record_at(start + Duration::minutes(40), 300),
        ];

        let series = sample(&records, 12, start, end).unwrap();
        let bucket = series.buckets[0].as_ref().unwrap();
        assert_eq!(bucket.record_count, 2);
        assert_eq!(bucket.energy_delegated, 200.0);
    }

    #[test]
    fn test_sampling_applied_flag() {
        let (start, end) = window();
        let records: Vec<_> = (0..20)
            .map(|i| record_at(start + Duration::minutes(i * 30), 10))
            .collect();

        let series = sample(&records, 4, start, end).unwrap();
        assert!(series.metadata.sampling_applied);

        let series = sample(&records, 50, start, end).unwrap();
        assert!(!series.metadata.sampling_applied);
    }

    #[test]
    fn test_window_end_lands_in_last_bucket() {
        let (start, end) = window();
        let records = vec![record_at(end, 100)];

        let series = sample(&records, 12, start, end).unwrap();
        assert!(series.buckets[11].is_some());
    }

    #[test]
    fn test_records_outside_window_are_ignored() {
        let (start, end) = window();
        let records = vec![
            record_at(start - Duration::minutes(1), 100),
            record_at(end + Duration::minutes(1), 100),
        ];

        let series = sample(&records, 4, start, end).unwrap();
        assert_eq!(series.metadata.actual_points, 0);
    }

    #[test]
    fn test_degenerate_window() {
        let (start, _) = window();
        let records = vec![record_at(start, 100)];

        let series = sample(&records, 3, start, start).unwrap();
        assert_eq!(series.buckets.len(), 3);
        assert!(series.buckets[0].is_some());
        assert!(series.buckets[1].is_none());
    }

    #[test]
    fn test_zero_points_is_invalid() {
        let (start, end) = window();
        assert!(sample(&[], 0, start, end).is_err());
    }

    #[test]
    fn test_inverted_window_is_invalid() {
        let (start, end) = window();
        assert!(sample(&[], 4, end, start).is_err());
    }
}
