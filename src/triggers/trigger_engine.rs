use crate::config::ThresholdConfig;
use crate::samples::{Sample, Severity, Timestamp};
use crate::triggers::rules::{HighHeartRateRule, LowHeartRateRule, SpikeRule};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine for evaluating alert rules against recent readings
///
/// A rule fires at most once per triggering reading: evaluating the same
/// readings again on a later tick does not repeat the alert.
pub struct TriggerEngine {
    rules: Vec<Box<dyn AlertRule>>,
    /// Triggering reading each rule last fired for, keyed by rule name
    last_fired: HashMap<String, Timestamp>,
}

/// Trait for rules that decide whether recent readings warrant an alert
pub trait AlertRule: Send + Sync {
    /// Whether this rule fires for `samples` as of `now`
    fn evaluate(&self, samples: &[Sample], now: Timestamp) -> bool;

    /// Human-readable explanation of why the rule fired
    fn reason(&self, samples: &[Sample], now: Timestamp) -> String;

    /// Get a human-readable name for this rule
    fn name(&self) -> &str;

    /// Get the severity level if this rule triggers
    fn severity(&self) -> Severity;

    /// Timestamp of the reading that makes this rule fire
    ///
    /// Used to suppress repeat alerts for the same reading. Defaults to the
    /// most recent sample.
    fn trigger_timestamp(&self, samples: &[Sample], _now: Timestamp) -> Option<Timestamp> {
        latest_sample(samples).map(|sample| sample.timestamp)
    }
}

/// Context for one fired rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerContext {
    /// When the rule was evaluated
    pub timestamp: Timestamp,
    /// Most recent reading at evaluation time
    pub latest: Option<Sample>,
    /// Name of the rule that fired
    pub triggered_by: String,
    pub severity: Severity,
    pub reason: String,
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerEngine {
    /// Create a trigger engine with no rules
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            last_fired: HashMap::new(),
        }
    }

    /// Create an engine with the built-in high, low and spike rules
    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(HighHeartRateRule::new(
            thresholds.high_bpm,
            Severity::Warning,
        )));
        engine.add_rule(Box::new(LowHeartRateRule::new(
            thresholds.low_bpm,
            Severity::Warning,
        )));
        engine.add_rule(Box::new(SpikeRule::new(
            thresholds.spike_bpm,
            thresholds.spike_window_seconds as i64,
            Severity::Critical,
        )));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn AlertRule>) {
        self.rules.push(rule);
    }

    /// Evaluate every rule and return a context for each one that fires
    ///
    /// Rules that already fired for the same triggering reading are skipped.
    pub fn evaluate(&mut self, samples: &[Sample], now: Timestamp) -> Vec<TriggerContext> {
        let latest = latest_sample(samples);
        let mut contexts = Vec::new();

        for rule in &self.rules {
            if !rule.evaluate(samples, now) {
                continue;
            }

            if let Some(key) = rule.trigger_timestamp(samples, now) {
                if self.last_fired.get(rule.name()) == Some(&key) {
                    debug!("{} already fired for reading at {}", rule.name(), key);
                    continue;
                }
                self.last_fired.insert(rule.name().to_string(), key);
            }

            contexts.push(TriggerContext {
                timestamp: now,
                latest,
                triggered_by: rule.name().to_string(),
                severity: rule.severity(),
                reason: rule.reason(samples, now),
            });
        }

        contexts
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Most recent sample by timestamp, regardless of slice order
pub(crate) fn latest_sample(samples: &[Sample]) -> Option<Sample> {
    samples.iter().max_by_key(|sample| sample.timestamp).copied()
}
