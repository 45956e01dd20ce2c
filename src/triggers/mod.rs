/// Trigger engine and rule implementations
pub mod trigger_engine;
pub mod rules;

pub use rules::{HighHeartRateRule, LowHeartRateRule, SpikeRule};
pub use trigger_engine::{AlertRule, TriggerContext, TriggerEngine};
