//! Core sample types for heart-rate readings
//!
//! This module defines the validated [`Sample`] record used by every other
//! component, the untyped [`RawSample`] shape records arrive in, and the
//! boundary validation that turns one into the other.

use crate::error::SampleError;
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Timestamp type for consistent time handling across the crate
pub type Timestamp = DateTime<Utc>;

/// One timestamped heart-rate reading
///
/// Immutable once recorded. Serialized as `{"timestamp": ..., "heartRate": ...}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// When the reading was taken
    pub timestamp: Timestamp,
    /// Beats per minute
    pub heart_rate: u32,
}

impl Sample {
    pub fn new(timestamp: Timestamp, heart_rate: u32) -> Self {
        Self {
            timestamp,
            heart_rate,
        }
    }
}

/// A heart-rate record as it arrives from a sensor or document store
///
/// Both fields are untyped; [`RawSample::validate`] checks them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawSample {
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, rename = "heartRate")]
    pub heart_rate: Option<Value>,
}

impl RawSample {
    /// Validate this record into a [`Sample`]
    ///
    /// Timestamps may be RFC 3339 strings or integer epoch milliseconds.
    /// Heart rates must be finite, non-negative numbers; fractional values
    /// are rounded to the nearest beat.
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] naming the first field that failed.
    pub fn validate(&self) -> Result<Sample, SampleError> {
        let timestamp = match &self.timestamp {
            None => return Err(SampleError::MissingTimestamp),
            Some(value) => parse_timestamp(value)?,
        };

        let heart_rate = match &self.heart_rate {
            None => return Err(SampleError::MissingHeartRate),
            Some(value) => parse_heart_rate(value)?,
        };

        Ok(Sample::new(timestamp, heart_rate))
    }
}

fn parse_timestamp(value: &Value) -> Result<Timestamp, SampleError> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| SampleError::InvalidTimestamp(format!("{}: {}", text, e))),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(|| SampleError::InvalidTimestamp(number.to_string())),
        other => Err(SampleError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_heart_rate(value: &Value) -> Result<u32, SampleError> {
    let Some(bpm) = value.as_f64() else {
        return Err(SampleError::InvalidHeartRate(value.to_string()));
    };

    if !bpm.is_finite() || bpm < 0.0 || bpm > f64::from(u32::MAX) {
        return Err(SampleError::InvalidHeartRate(value.to_string()));
    }

    Ok(bpm.round() as u32)
}

/// Validate a batch of raw records, skipping the malformed ones
///
/// A bad record never fails the batch. Each skipped record is logged with
/// its position so partial data can still be charted.
pub fn parse_samples(records: &[RawSample]) -> Vec<Sample> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record.validate() {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("Skipping malformed sample at index {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Parse a JSON array of records into validated samples
///
/// Array elements that are not objects are skipped like any other
/// malformed record.
///
/// # Errors
///
/// Returns [`SampleError::Json`] if the document is not a JSON array.
pub fn parse_json(text: &str) -> Result<Vec<Sample>, SampleError> {
    let values: Vec<Value> = serde_json::from_str(text)?;

    let records: Vec<RawSample> = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Record at index {} is not an object: {}", index, e);
                RawSample::default()
            })
        })
        .collect();

    Ok(parse_samples(&records))
}

/// Read and validate samples from a JSON file
pub fn load_samples(path: &Path) -> Result<Vec<Sample>, SampleError> {
    let text = std::fs::read_to_string(path)?;
    parse_json(&text)
}

/// Severity level for alerts raised from heart-rate readings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Reading outside the resting band
    Warning,
    /// Reading that warrants immediate attention
    Critical,
}
