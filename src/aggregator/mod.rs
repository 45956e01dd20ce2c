/// Time-series bucketing and insight text
pub mod insights;
pub mod time_series;

pub use insights::{summarize, AverageLevel, HeartRateStats, Insight, SessionStats};
pub use time_series::{aggregate, aggregate_in, aggregate_named, bucket_label, AggregatedPoint};
