//! Insight text and summary statistics over heart-rate history
//!
//! [`summarize`] is the single entry point for insight text. It consumes the
//! points produced by [`aggregate`](super::aggregate) so charts and insight
//! text always describe the same data.

use super::time_series::{round_mean, AggregatedPoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peak heart rate above which the spike warning is added
pub const SPIKE_BPM: u32 = 140;

/// Average heart rate below which the average is reported as low
pub const LOW_AVERAGE_BPM: u32 = 60;

/// Average heart rate above which the average is reported as high
pub const HIGH_AVERAGE_BPM: u32 = 100;

/// Rough energy estimate per recorded beats-per-minute reading
pub const CALORIES_PER_READING_BPM: f64 = 0.05;

/// Mean, peak and low heart rate over a set of chart points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartRateStats {
    /// Rounded (half up) mean of the point values
    pub mean: u32,
    pub max: u32,
    pub min: u32,
}

impl HeartRateStats {
    /// Compute statistics, or `None` for an empty slice
    ///
    /// Each point weighs the same regardless of how many samples it holds.
    pub fn from_points(points: &[AggregatedPoint]) -> Option<Self> {
        let max = points.iter().map(|p| p.heart_rate).max()?;
        let min = points.iter().map(|p| p.heart_rate).min()?;
        let sum: u64 = points.iter().map(|p| u64::from(p.heart_rate)).sum();

        Some(Self {
            mean: round_mean(sum, points.len() as u64),
            max,
            min,
        })
    }
}

/// Where an average heart rate sits relative to the normal resting band
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AverageLevel {
    BelowNormal,
    Normal,
    AboveNormal,
}

impl AverageLevel {
    pub fn classify(mean: u32) -> Self {
        if mean < LOW_AVERAGE_BPM {
            AverageLevel::BelowNormal
        } else if mean > HIGH_AVERAGE_BPM {
            AverageLevel::AboveNormal
        } else {
            AverageLevel::Normal
        }
    }
}

/// Structured form of the insight text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Insight {
    /// Human-readable period name, e.g. `week`
    pub range_label: String,
    pub stats: HeartRateStats,
    /// Whether the peak exceeded [`SPIKE_BPM`]
    pub spike: bool,
    pub level: AverageLevel,
}

impl Insight {
    pub fn from_points(points: &[AggregatedPoint], range_label: &str) -> Option<Self> {
        let stats = HeartRateStats::from_points(points)?;

        Some(Self {
            range_label: range_label.to_string(),
            stats,
            spike: stats.max > SPIKE_BPM,
            level: AverageLevel::classify(stats.mean),
        })
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Over the past {}, your average heart rate was {} bpm. ",
            self.range_label, self.stats.mean
        )?;
        write!(
            f,
            "Your heart rate peaked at {} bpm and was as low as {} bpm. ",
            self.stats.max, self.stats.min
        )?;

        if self.spike {
            write!(
                f,
                "But you have been getting sudden spikes up to {} bpm, so be cautious. ",
                self.stats.max
            )?;
        }

        match self.level {
            AverageLevel::BelowNormal => f.write_str(
                "Your average heart rate is below normal. This could indicate excellent \
                 cardiovascular fitness, but if you're experiencing symptoms, please consult a doctor.",
            ),
            AverageLevel::AboveNormal => f.write_str(
                "Your average heart rate is above normal. This could be due to stress, caffeine, \
                 or physical activity. If it persists, consider consulting a doctor.",
            ),
            AverageLevel::Normal => f.write_str(
                "Your average heart rate is within the normal range, indicating good heart health.",
            ),
        }
    }
}

/// Compose insight text for a set of chart points
///
/// Returns `None` when `points` is empty. Never fails.
pub fn summarize(points: &[AggregatedPoint], range_label: &str) -> Option<String> {
    Insight::from_points(points, range_label).map(|insight| insight.to_string())
}

/// Running statistics for a live monitoring session
///
/// Fed one reading at a time; holds no state beyond what callers pass in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    count: u64,
    sum: u64,
    max: Option<u32>,
    min: Option<u32>,
    calories: f64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reading into the session
    pub fn record(&mut self, heart_rate: u32) {
        self.count += 1;
        self.sum += u64::from(heart_rate);
        self.max = Some(self.max.map_or(heart_rate, |max| max.max(heart_rate)));
        self.min = Some(self.min.map_or(heart_rate, |min| min.min(heart_rate)));
        self.calories += f64::from(heart_rate) * CALORIES_PER_READING_BPM;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Rounded mean of every reading so far
    pub fn mean(&self) -> Option<u32> {
        (self.count > 0).then(|| round_mean(self.sum, self.count))
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    pub fn min(&self) -> Option<u32> {
        self.min
    }

    /// Estimated calories burned over the session
    pub fn calories_burned(&self) -> f64 {
        self.calories
    }
}
