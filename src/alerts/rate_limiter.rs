use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Sliding one-minute rate limiter for alert dispatch
///
/// Remembers when recent alerts went out and refuses new ones once
/// `max_per_minute` fall inside the trailing minute.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_minute: usize,
    sent: VecDeque<DateTime<Utc>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        Self {
            max_per_minute,
            sent: VecDeque::new(),
        }
    }

    /// Whether an alert may go out now
    pub fn can_send(&mut self) -> bool {
        self.can_send_at(Utc::now())
    }

    /// Whether an alert may go out at `now`
    pub fn can_send_at(&mut self, now: DateTime<Utc>) -> bool {
        self.expire(now);
        self.sent.len() < self.max_per_minute
    }

    /// Record an alert sent now
    pub fn record(&mut self) {
        self.record_at(Utc::now());
    }

    /// Record an alert sent at `timestamp`
    pub fn record_at(&mut self, timestamp: DateTime<Utc>) {
        self.sent.push_back(timestamp);
    }

    /// Alerts sent within the minute before `now`
    pub fn count_at(&mut self, now: DateTime<Utc>) -> usize {
        self.expire(now);
        self.sent.len()
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::minutes(1);
        // Records may arrive out of order, so scan everything
        self.sent.retain(|&time| time > cutoff);
    }
}
