//! Built-in alert rules
//!
//! Thresholds mirror the sensor's local display: readings outside the
//! 60 to 100 bpm resting band are flagged, and anything above 140 bpm is
//! treated as a dangerous spike.

use crate::samples::{Sample, Severity, Timestamp};
use crate::triggers::trigger_engine::latest_sample;
use crate::triggers::AlertRule;
use chrono::Duration;

/// Fires when the most recent reading is above a threshold
pub struct HighHeartRateRule {
    pub threshold: u32,
    pub severity: Severity,
}

impl HighHeartRateRule {
    pub fn new(threshold: u32, severity: Severity) -> Self {
        Self {
            threshold,
            severity,
        }
    }

    /// 100 bpm, Warning
    pub fn with_defaults() -> Self {
        Self::new(100, Severity::Warning)
    }
}

impl AlertRule for HighHeartRateRule {
    fn evaluate(&self, samples: &[Sample], _now: Timestamp) -> bool {
        latest_sample(samples).map_or(false, |sample| sample.heart_rate > self.threshold)
    }

    fn reason(&self, samples: &[Sample], _now: Timestamp) -> String {
        match latest_sample(samples) {
            Some(sample) => format!(
                "Heart rate {} bpm above maximum {} bpm",
                sample.heart_rate, self.threshold
            ),
            None => format!("Heart rate above maximum {} bpm", self.threshold),
        }
    }

    fn name(&self) -> &str {
        "HighHeartRateRule"
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}

/// Fires when the most recent reading is below a threshold
pub struct LowHeartRateRule {
    pub threshold: u32,
    pub severity: Severity,
}

impl LowHeartRateRule {
    pub fn new(threshold: u32, severity: Severity) -> Self {
        Self {
            threshold,
            severity,
        }
    }

    /// 60 bpm, Warning
    pub fn with_defaults() -> Self {
        Self::new(60, Severity::Warning)
    }
}

impl AlertRule for LowHeartRateRule {
    fn evaluate(&self, samples: &[Sample], _now: Timestamp) -> bool {
        latest_sample(samples).map_or(false, |sample| sample.heart_rate < self.threshold)
    }

    fn reason(&self, samples: &[Sample], _now: Timestamp) -> String {
        match latest_sample(samples) {
            Some(sample) => format!(
                "Heart rate {} bpm below minimum {} bpm",
                sample.heart_rate, self.threshold
            ),
            None => format!("Heart rate below minimum {} bpm", self.threshold),
        }
    }

    fn name(&self) -> &str {
        "LowHeartRateRule"
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}

/// Fires when any reading within the window exceeds the spike threshold
pub struct SpikeRule {
    pub threshold: u32,
    pub window_seconds: i64,
    pub severity: Severity,
}

impl SpikeRule {
    pub fn new(threshold: u32, window_seconds: i64, severity: Severity) -> Self {
        Self {
            threshold,
            window_seconds,
            severity,
        }
    }

    /// 140 bpm within the last 60 seconds, Critical
    pub fn with_defaults() -> Self {
        Self::new(140, 60, Severity::Critical)
    }

    fn peak_in_window(&self, samples: &[Sample], now: Timestamp) -> Option<u32> {
        let cutoff = now - Duration::seconds(self.window_seconds);
        samples
            .iter()
            .filter(|sample| sample.timestamp >= cutoff && sample.timestamp <= now)
            .map(|sample| sample.heart_rate)
            .max()
    }
}

impl AlertRule for SpikeRule {
    fn evaluate(&self, samples: &[Sample], now: Timestamp) -> bool {
        self.peak_in_window(samples, now)
            .map_or(false, |peak| peak > self.threshold)
    }

    fn reason(&self, samples: &[Sample], now: Timestamp) -> String {
        let peak = self.peak_in_window(samples, now).unwrap_or_default();
        format!(
            "Heart rate spiked to {} bpm within the last {} seconds (limit {} bpm)",
            peak, self.window_seconds, self.threshold
        )
    }

    /// Newest reading above the threshold, so a single spike is reported
    /// once however long it stays in the window
    fn trigger_timestamp(&self, samples: &[Sample], now: Timestamp) -> Option<Timestamp> {
        let cutoff = now - Duration::seconds(self.window_seconds);
        samples
            .iter()
            .filter(|sample| sample.timestamp >= cutoff && sample.timestamp <= now)
            .filter(|sample| sample.heart_rate > self.threshold)
            .map(|sample| sample.timestamp)
            .max()
    }

    fn name(&self) -> &str {
        "SpikeRule"
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}
