//! Heart-rate training zones

use crate::samples::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Training zone a single reading falls into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateZone {
    /// Below 70 bpm
    Rest,
    /// 70 to 99 bpm
    FatBurn,
    /// 100 to 139 bpm
    Cardio,
    /// 140 bpm and above
    Peak,
}

impl HeartRateZone {
    pub const ALL: [HeartRateZone; 4] = [
        HeartRateZone::Rest,
        HeartRateZone::FatBurn,
        HeartRateZone::Cardio,
        HeartRateZone::Peak,
    ];

    pub fn classify(heart_rate: u32) -> Self {
        match heart_rate {
            0..=69 => HeartRateZone::Rest,
            70..=99 => HeartRateZone::FatBurn,
            100..=139 => HeartRateZone::Cardio,
            _ => HeartRateZone::Peak,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeartRateZone::Rest => "Rest",
            HeartRateZone::FatBurn => "Fat Burn",
            HeartRateZone::Cardio => "Cardio",
            HeartRateZone::Peak => "Peak",
        }
    }
}

impl fmt::Display for HeartRateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Share of readings spent in each zone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneBreakdown {
    pub rest: usize,
    pub fat_burn: usize,
    pub cardio: usize,
    pub peak: usize,
}

impl ZoneBreakdown {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut breakdown = Self::default();
        for sample in samples {
            *breakdown.slot(HeartRateZone::classify(sample.heart_rate)) += 1;
        }
        breakdown
    }

    fn slot(&mut self, zone: HeartRateZone) -> &mut usize {
        match zone {
            HeartRateZone::Rest => &mut self.rest,
            HeartRateZone::FatBurn => &mut self.fat_burn,
            HeartRateZone::Cardio => &mut self.cardio,
            HeartRateZone::Peak => &mut self.peak,
        }
    }

    pub fn count(&self, zone: HeartRateZone) -> usize {
        match zone {
            HeartRateZone::Rest => self.rest,
            HeartRateZone::FatBurn => self.fat_burn,
            HeartRateZone::Cardio => self.cardio,
            HeartRateZone::Peak => self.peak,
        }
    }

    pub fn total(&self) -> usize {
        self.rest + self.fat_burn + self.cardio + self.peak
    }

    /// Percentage of readings in `zone`, 0 when there are no readings
    pub fn percentage(&self, zone: HeartRateZone) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(zone) as f64 * 100.0 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(HeartRateZone::classify(0), HeartRateZone::Rest);
        assert_eq!(HeartRateZone::classify(69), HeartRateZone::Rest);
        assert_eq!(HeartRateZone::classify(70), HeartRateZone::FatBurn);
        assert_eq!(HeartRateZone::classify(99), HeartRateZone::FatBurn);
        assert_eq!(HeartRateZone::classify(100), HeartRateZone::Cardio);
        assert_eq!(HeartRateZone::classify(139), HeartRateZone::Cardio);
        assert_eq!(HeartRateZone::classify(140), HeartRateZone::Peak);
        assert_eq!(HeartRateZone::classify(220), HeartRateZone::Peak);
    }

    #[test]
    fn test_zone_names() {
        assert_eq!(HeartRateZone::FatBurn.to_string(), "Fat Burn");
        assert_eq!(
            serde_json::to_string(&HeartRateZone::FatBurn).unwrap(),
            "\"fat_burn\""
        );
    }

    #[test]
    fn test_breakdown_percentages() {
        let now = Utc::now();
        let samples: Vec<Sample> = [60, 65, 80, 120, 150]
            .into_iter()
            .map(|bpm| Sample::new(now, bpm))
            .collect();

        let breakdown = ZoneBreakdown::from_samples(&samples);
        assert_eq!(breakdown.total(), 5);
        assert_eq!(breakdown.count(HeartRateZone::Rest), 2);
        assert!((breakdown.percentage(HeartRateZone::Rest) - 40.0).abs() < 1e-9);
        assert!((breakdown.percentage(HeartRateZone::Peak) - 20.0).abs() < 1e-9);

        let sum: f64 = HeartRateZone::ALL
            .iter()
            .map(|&zone| breakdown.percentage(zone))
            .sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_empty() {
        let breakdown = ZoneBreakdown::from_samples(&[]);
        assert_eq!(breakdown.total(), 0);
        assert_eq!(breakdown.percentage(HeartRateZone::Cardio), 0.0);
    }
}
