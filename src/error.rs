use thiserror::Error;

/// A range name outside `day`, `week`, `month` and `year`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid range: {0}")]
pub struct InvalidRangeError(pub String);

/// Errors that can occur while validating raw heart-rate records
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Missing timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Missing heart rate")]
    MissingHeartRate,

    #[error("Invalid heart rate: {0}")]
    InvalidHeartRate(String),

    #[error("Malformed input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur when dispatching alerts
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to dispatch alert: {0}")]
    DispatchFailed(String),
}

/// Errors that can occur when publishing readings to a remote endpoint
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Endpoint rejected reading with status {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
