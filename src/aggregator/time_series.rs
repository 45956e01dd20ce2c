//! Time-series bucketing for heart-rate history charts
//!
//! This module turns a sequence of raw samples into chart points appropriate
//! for a [`Range`]: one point per sample for a day, and averaged buckets keyed
//! by weekday, day of month or month name for longer ranges.

use crate::error::InvalidRangeError;
use crate::range::Range;
use crate::samples::Sample;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One chart point: a bucket label and the rounded mean heart rate
///
/// Serializes to exactly `{"label": ..., "heartRate": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    pub label: String,
    pub heart_rate: u32,
    /// Number of samples folded into this point
    #[serde(skip)]
    pub count: usize,
}

impl AggregatedPoint {
    pub fn new(label: impl Into<String>, heart_rate: u32) -> Self {
        Self {
            label: label.into(),
            heart_rate,
            count: 1,
        }
    }
}

/// Mean of `count` values summing to `sum`, rounded half up
///
/// Integer arithmetic, so `.5` always rounds up with no float drift.
/// `count` must be non-zero.
pub(crate) fn round_mean(sum: u64, count: u64) -> u32 {
    ((2 * sum + count) / (2 * count)) as u32
}

/// Label of the bucket a timestamp falls into for `range`
///
/// * `Day`: `H:MM AM|PM`, 12-hour clock, no leading zero on the hour
/// * `Week`: `Sun` .. `Sat`
/// * `Month`: `1` .. `31`
/// * `Year`: `Jan` .. `Dec`
pub fn bucket_label<Tz>(range: Range, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let pattern = match range {
        Range::Day => "%-I:%M %p",
        Range::Week => "%a",
        Range::Month => "%-d",
        Range::Year => "%b",
    };
    timestamp.format(pattern).to_string()
}

/// Aggregate samples for `range`, labelling in the local time zone
///
/// See [`aggregate_in`].
pub fn aggregate(samples: &[Sample], range: Range) -> Vec<AggregatedPoint> {
    aggregate_in(samples, range, &Local)
}

/// Aggregate samples for a range given by name
///
/// # Errors
///
/// Returns [`InvalidRangeError`] if `range` is not one of `day`, `week`,
/// `month` or `year`. Empty input is not an error.
pub fn aggregate_named(
    samples: &[Sample],
    range: &str,
) -> Result<Vec<AggregatedPoint>, InvalidRangeError> {
    let range: Range = range.parse()?;
    Ok(aggregate(samples, range))
}

/// Aggregate samples for `range`, deriving labels in time zone `tz`
///
/// For [`Range::Day`] every sample becomes its own point in input order,
/// duplicates included. For the other ranges samples are grouped by
/// [`bucket_label`] and each group's heart rates averaged with
/// round-half-up. Points come out in the order their labels were first
/// seen while scanning the input, not in calendar order; the input is
/// not sorted first.
pub fn aggregate_in<Tz>(samples: &[Sample], range: Range, tz: &Tz) -> Vec<AggregatedPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if range == Range::Day {
        return samples
            .iter()
            .map(|sample| {
                AggregatedPoint::new(
                    bucket_label(range, &sample.timestamp.with_timezone(tz)),
                    sample.heart_rate,
                )
            })
            .collect();
    }

    // (label, sum, count) in first-seen order
    let mut buckets: Vec<(String, u64, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sample in samples {
        let label = bucket_label(range, &sample.timestamp.with_timezone(tz));
        let slot = *index.entry(label).or_insert_with_key(|label| {
            buckets.push((label.clone(), 0, 0));
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.1 += u64::from(sample.heart_rate);
        bucket.2 += 1;
    }

    buckets
        .into_iter()
        .map(|(label, sum, count)| AggregatedPoint {
            label,
            heart_rate: round_mean(sum, count as u64),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn sample_at(y: i32, m: u32, d: u32, h: u32, min: u32, bpm: u32) -> Sample {
        Sample::new(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap(), bpm)
    }

    fn labels(points: &[AggregatedPoint]) -> Vec<&str> {
        points.iter().map(|p| p.label.as_str()).collect()
    }

    #[test]
    fn test_week_example() {
        // 2024-03-04 is a Monday
        let samples = vec![
            sample_at(2024, 3, 4, 10, 0, 80),
            sample_at(2024, 3, 4, 14, 0, 100),
            sample_at(2024, 3, 5, 9, 0, 60),
        ];

        let points = aggregate_in(&samples, Range::Week, &Utc);
        assert_eq!(
            points,
            vec![
                AggregatedPoint {
                    label: "Mon".to_string(),
                    heart_rate: 90,
                    count: 2
                },
                AggregatedPoint {
                    label: "Tue".to_string(),
                    heart_rate: 60,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        for range in Range::ALL {
            assert!(aggregate_in(&[], range, &Utc).is_empty());
            assert!(aggregate(&[], range).is_empty());
        }
    }

    #[test]
    fn test_invalid_range_name() {
        let samples = vec![sample_at(2024, 3, 4, 10, 0, 80)];
        let err = aggregate_named(&samples, "decade").unwrap_err();
        assert_eq!(err, InvalidRangeError("decade".to_string()));

        assert!(aggregate_named(&[], "decade").is_err());
        assert!(aggregate_named(&[], "week").unwrap().is_empty());
    }

    #[test]
    fn test_day_labels() {
        let samples = vec![
            sample_at(2024, 3, 4, 9, 5, 70),
            sample_at(2024, 3, 4, 14, 30, 71),
            sample_at(2024, 3, 4, 0, 15, 72),
            sample_at(2024, 3, 4, 12, 0, 73),
        ];

        let points = aggregate_in(&samples, Range::Day, &Utc);
        assert_eq!(
            labels(&points),
            vec!["9:05 AM", "2:30 PM", "12:15 AM", "12:00 PM"]
        );
        assert_eq!(
            points.iter().map(|p| p.heart_rate).collect::<Vec<_>>(),
            vec![70, 71, 72, 73]
        );
    }

    #[test]
    fn test_day_keeps_duplicate_minutes() {
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let samples = vec![
            Sample::new(base, 80),
            Sample::new(base + chrono::Duration::seconds(10), 82),
            Sample::new(base + chrono::Duration::seconds(20), 84),
        ];

        let points = aggregate_in(&samples, Range::Day, &Utc);
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.label == "10:00 AM"));
        assert!(points.iter().all(|p| p.count == 1));
    }

    #[test]
    fn test_month_labels_without_leading_zero() {
        let samples = vec![
            sample_at(2024, 3, 1, 10, 0, 60),
            sample_at(2024, 3, 9, 10, 0, 70),
            sample_at(2024, 3, 31, 10, 0, 80),
        ];

        let points = aggregate_in(&samples, Range::Month, &Utc);
        assert_eq!(labels(&points), vec!["1", "9", "31"]);
    }

    #[test]
    fn test_year_groups_by_month_name() {
        let samples = vec![
            sample_at(2024, 1, 3, 10, 0, 60),
            sample_at(2024, 12, 25, 10, 0, 90),
            sample_at(2024, 1, 20, 10, 0, 70),
        ];

        let points = aggregate_in(&samples, Range::Year, &Utc);
        assert_eq!(labels(&points), vec!["Jan", "Dec"]);
        assert_eq!(points[0].heart_rate, 65);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].heart_rate, 90);
    }

    #[test]
    fn test_first_seen_order_not_calendar_order() {
        let samples = vec![
            sample_at(2024, 3, 20, 10, 0, 60),
            sample_at(2024, 3, 2, 10, 0, 70),
            sample_at(2024, 3, 11, 10, 0, 80),
            sample_at(2024, 3, 2, 11, 0, 90),
        ];

        let points = aggregate_in(&samples, Range::Month, &Utc);
        assert_eq!(labels(&points), vec!["20", "2", "11"]);
        assert_eq!(points[1].heart_rate, 80);
    }

    #[test]
    fn test_labels_follow_time_zone() {
        // Monday 23:30 UTC is already Tuesday at +02:00
        let samples = vec![sample_at(2024, 3, 4, 23, 30, 75)];
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(aggregate_in(&samples, Range::Week, &Utc)[0].label, "Mon");
        assert_eq!(aggregate_in(&samples, Range::Week, &tz)[0].label, "Tue");
        assert_eq!(aggregate_in(&samples, Range::Day, &tz)[0].label, "1:30 AM");
    }

    #[test]
    fn test_rounding_half_up() {
        let samples = vec![
            sample_at(2024, 3, 4, 10, 0, 70),
            sample_at(2024, 3, 4, 11, 0, 71),
        ];
        // 70.5 rounds up
        assert_eq!(aggregate_in(&samples, Range::Week, &Utc)[0].heart_rate, 71);

        let samples = vec![
            sample_at(2024, 3, 4, 10, 0, 70),
            sample_at(2024, 3, 4, 11, 0, 70),
            sample_at(2024, 3, 4, 12, 0, 71),
        ];
        // 70.33 rounds down
        assert_eq!(aggregate_in(&samples, Range::Week, &Utc)[0].heart_rate, 70);
    }

    #[test]
    fn test_round_mean_golden_values() {
        assert_eq!(round_mean(181, 2), 91);
        assert_eq!(round_mean(179, 2), 90);
        assert_eq!(round_mean(200, 3), 67);
        assert_eq!(round_mean(199, 3), 66);
        assert_eq!(round_mean(0, 5), 0);
    }

    #[test]
    fn test_point_serialization_has_only_chart_fields() {
        let point = AggregatedPoint {
            label: "Mon".to_string(),
            heart_rate: 90,
            count: 2,
        };

        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json, serde_json::json!({"label": "Mon", "heartRate": 90}));
    }
}
