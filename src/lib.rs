/// Error types for parsing, configuration, alerting and publishing
pub mod error;

/// Heart-rate samples and raw record validation
pub mod samples;

/// Named history ranges and their time windows
pub mod range;

/// Time-series bucketing and insight text
pub mod aggregator;

/// Heart-rate zone classification
pub mod zones;

/// Sample storage
pub mod store;

/// Configuration management
pub mod config;

/// Synthetic reading generator
pub mod simulator;

/// Alert rules evaluated against recent readings
pub mod triggers;

/// Alert manager and dispatch
pub mod alerts;

/// Posting live readings to a remote endpoint
pub mod publish;

// Re-export commonly used types
pub use aggregator::{aggregate, summarize, AggregatedPoint};
pub use error::{AlertError, ConfigError, InvalidRangeError, PublishError, SampleError};
pub use range::Range;
pub use samples::{Sample, Severity};
