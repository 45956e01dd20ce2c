//! Synthetic heart-rate generator
//!
//! Produces plausible readings for demos and for exercising the alert path
//! without a physical sensor. A slowly drifting base rate is perturbed by
//! occasional spikes and a little noise on every reading.

use crate::config::SimulatorConfig;
use crate::samples::{Sample, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stateful heart-rate generator
///
/// All continuity between readings (the drifting base rate and the time of
/// the previous reading) lives in this value.
#[derive(Debug, Clone)]
pub struct HeartRateSimulator<R: Rng = StdRng> {
    settings: SimulatorConfig,
    rng: R,
    base_rate: f64,
    last_update: Option<Timestamp>,
}

impl HeartRateSimulator<StdRng> {
    /// Create a simulator seeded from system entropy
    pub fn new(settings: SimulatorConfig) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Create a reproducible simulator
    pub fn seeded(settings: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> HeartRateSimulator<R> {
    pub fn with_rng(settings: SimulatorConfig, rng: R) -> Self {
        let base_rate = settings
            .initial_rate
            .clamp(settings.base_min, settings.base_max);
        Self {
            settings,
            rng,
            base_rate,
            last_update: None,
        }
    }

    /// Current drifting base rate
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Produce the reading for time `now`
    ///
    /// The base rate drifts by up to half a beat per elapsed second, then a
    /// spike of 10 to 30 bpm is added with probability `spike_chance`, then
    /// up to 2.5 bpm of noise either way. The result is clamped to
    /// `[floor, ceiling]` and rounded.
    pub fn next_rate(&mut self, now: Timestamp) -> u32 {
        let elapsed = self
            .last_update
            .map(|last| (now - last).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0);
        self.last_update = Some(now);

        self.base_rate += (self.rng.gen::<f64>() - 0.5) * elapsed;
        self.base_rate = self
            .base_rate
            .clamp(self.settings.base_min, self.settings.base_max);

        let mut rate = self.base_rate;
        if self.rng.gen::<f64>() < self.settings.spike_chance {
            rate += self.rng.gen::<f64>() * 20.0 + 10.0;
        }
        rate += (self.rng.gen::<f64>() - 0.5) * 5.0;

        rate.clamp(self.settings.floor, self.settings.ceiling).round() as u32
    }

    pub fn next_sample(&mut self, now: Timestamp) -> Sample {
        Sample::new(now, self.next_rate(now))
    }
}
