use crate::error::PublishError;
use crate::samples::Sample;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Destination for live readings
pub trait ReadingSink: Send + Sync {
    fn publish<'a>(
        &'a self,
        sample: &'a Sample,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>>;
}

/// Body posted for each reading
#[derive(Debug, Serialize)]
struct ReadingPayload {
    #[serde(rename = "heartRate")]
    heart_rate: u32,
}

/// Posts each reading as `{"heartRate": n}` to an HTTP endpoint
///
/// The receiving server stamps the reading with its own clock, so only the
/// rate is sent.
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    /// Create a sink for `endpoint` (e.g., "http://localhost:3000/api/heart-rate")
    ///
    /// # Errors
    ///
    /// Returns `PublishError::HttpError` if the HTTP client cannot be built.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReadingSink for HttpSink {
    fn publish<'a>(
        &'a self,
        sample: &'a Sample,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = ReadingPayload {
                heart_rate: sample.heart_rate,
            };

            let response = self
                .client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        PublishError::Timeout
                    } else {
                        PublishError::HttpError(e)
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(PublishError::Status(status.as_u16()));
            }

            debug!("Published {} bpm to {}", sample.heart_rate, self.endpoint);
            Ok(())
        })
    }
}

/// In-memory sink for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    published: Arc<Mutex<Vec<Sample>>>,
    failure_status: Option<u16>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every reading with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            published: Arc::default(),
            failure_status: Some(status),
        }
    }

    /// Readings accepted so far
    pub fn published(&self) -> Vec<Sample> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ReadingSink for MockSink {
    fn publish<'a>(
        &'a self,
        sample: &'a Sample,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(status) = self.failure_status {
                return Err(PublishError::Status(status));
            }
            self.published
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(*sample);
            Ok(())
        })
    }
}
