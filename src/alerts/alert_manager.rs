use crate::alerts::RateLimiter;
use crate::config::AlertConfig;
use crate::error::AlertError;
use crate::samples::{Severity, Timestamp};
use crate::triggers::TriggerContext;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Message sent for critical readings
pub const EMERGENCY_MESSAGE: &str = "ALERT: Your heart rate indicates a potential risk of a heart \
     attack. Please seek medical attention immediately or call emergency services.";

/// Advice appended to warning-level alerts
pub const REST_ADVICE: &str = "Consider resting and re-checking your heart rate in a few minutes.";

/// An alert ready for dispatch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub timestamp: Timestamp,
    pub severity: Severity,
    /// One-line description of what fired
    pub summary: String,
    /// Text shown to the person being monitored
    pub message: String,
    /// Reading that caused the alert, if known
    pub heart_rate: Option<u32>,
}

impl Alert {
    /// Build the alert for a fired rule
    pub fn from_context(context: &TriggerContext) -> Self {
        let message = match context.severity {
            Severity::Critical => EMERGENCY_MESSAGE.to_string(),
            _ => format!("{}. {}", context.reason, REST_ADVICE),
        };

        Self {
            timestamp: context.timestamp,
            severity: context.severity,
            summary: context.reason.clone(),
            message,
            heart_rate: context.latest.map(|sample| sample.heart_rate),
        }
    }
}

/// Delivery seam for alerts
///
/// Implementations own transport details (SMS, push, email); the manager
/// only decides when to call them.
#[cfg_attr(test, mockall::automock)]
pub trait AlertDispatcher: Send {
    fn dispatch(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Dispatcher that writes alerts to the log
#[derive(Debug, Clone, Default)]
pub struct LogDispatcher {
    recipient: Option<String>,
}

impl LogDispatcher {
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

impl AlertDispatcher for LogDispatcher {
    fn dispatch(&self, alert: &Alert) -> Result<(), AlertError> {
        let to = self.recipient.as_deref().unwrap_or("console");
        match alert.severity {
            Severity::Critical => error!("[alert -> {}] {} | {}", to, alert.summary, alert.message),
            _ => warn!("[alert -> {}] {} | {}", to, alert.summary, alert.message),
        }
        Ok(())
    }
}

/// Rate-limited alert delivery
///
/// Alerts below Warning severity are dropped. When the rate limit is
/// reached, alerts wait in a bounded queue (oldest dropped first) and are
/// delivered by later `send_alert` or `tick` calls once capacity frees up.
pub struct AlertManager {
    dispatcher: Box<dyn AlertDispatcher>,
    rate_limiter: RateLimiter,
    alert_queue: VecDeque<Alert>,
    max_queue_size: usize,
}

impl AlertManager {
    /// Create an alert manager with the default queue size of 100
    pub fn new(dispatcher: Box<dyn AlertDispatcher>, max_per_minute: usize) -> Self {
        Self::with_queue_size(dispatcher, max_per_minute, 100)
    }

    pub fn with_queue_size(
        dispatcher: Box<dyn AlertDispatcher>,
        max_per_minute: usize,
        max_queue_size: usize,
    ) -> Self {
        Self {
            dispatcher,
            rate_limiter: RateLimiter::new(max_per_minute),
            alert_queue: VecDeque::new(),
            max_queue_size,
        }
    }

    pub fn from_config(dispatcher: Box<dyn AlertDispatcher>, config: &AlertConfig) -> Self {
        Self::with_queue_size(
            dispatcher,
            config.rate_limit_per_minute,
            config.max_queue_size,
        )
    }

    /// Deliver an alert now, or queue it if rate limited
    ///
    /// The alert joins the back of the queue and the queue is flushed as far
    /// as the rate limit allows, so delivery stays in arrival order.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's error if delivery fails. The failed alert
    /// stays at the front of the queue and is retried by the next
    /// `send_alert` or `tick`.
    pub fn send_alert(&mut self, alert: Alert) -> Result<(), AlertError> {
        if alert.severity < Severity::Warning {
            info!("Skipping informational alert: {}", alert.summary);
            return self.process_queued_alerts();
        }

        if !self.alert_queue.is_empty() || !self.rate_limiter.can_send() {
            info!("Queued alert due to rate limit: {}", alert.summary);
        }
        self.queue_alert(alert);
        self.process_queued_alerts()
    }

    fn process_queued_alerts(&mut self) -> Result<(), AlertError> {
        while self.rate_limiter.can_send() {
            let Some(queued) = self.alert_queue.pop_front() else {
                break;
            };
            if let Err(e) = self.dispatch_now(&queued) {
                self.alert_queue.push_front(queued);
                return Err(e);
            }
        }
        Ok(())
    }

    fn queue_alert(&mut self, alert: Alert) {
        if self.alert_queue.len() >= self.max_queue_size {
            if let Some(dropped) = self.alert_queue.pop_front() {
                warn!("Alert queue full, dropping oldest alert: {}", dropped.summary);
            }
        }
        self.alert_queue.push_back(alert);
    }

    fn dispatch_now(&mut self, alert: &Alert) -> Result<(), AlertError> {
        match self.dispatcher.dispatch(alert) {
            Ok(()) => {
                self.rate_limiter.record();
                info!("Dispatched alert: {}", alert.summary);
                Ok(())
            }
            Err(e) => {
                error!("Failed to dispatch alert: {}", e);
                Err(e)
            }
        }
    }

    pub fn queued_alert_count(&self) -> usize {
        self.alert_queue.len()
    }

    pub fn has_processable_alerts(&mut self) -> bool {
        !self.alert_queue.is_empty() && self.rate_limiter.can_send()
    }

    /// Deliver queued alerts that the rate limit now allows
    ///
    /// Call periodically so queued alerts go out even when no new alert
    /// arrives. Returns how many were delivered.
    pub fn tick(&mut self) -> Result<usize, AlertError> {
        if !self.has_processable_alerts() {
            return Ok(0);
        }

        let before = self.alert_queue.len();
        self.process_queued_alerts()?;
        let processed = before - self.alert_queue.len();
        if processed > 0 {
            info!("Processed {} queued alerts", processed);
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Sample;
    use chrono::Utc;
    use mockall::Sequence;

    fn create_test_alert(severity: Severity, summary: &str) -> Alert {
        Alert {
            timestamp: Utc::now(),
            severity,
            summary: summary.to_string(),
            message: "Test message".to_string(),
            heart_rate: Some(150),
        }
    }

    fn context(severity: Severity, reason: &str, bpm: u32) -> TriggerContext {
        let now = Utc::now();
        TriggerContext {
            timestamp: now,
            latest: Some(Sample::new(now, bpm)),
            triggered_by: "TestRule".to_string(),
            severity,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_alert_from_critical_context() {
        let alert = Alert::from_context(&context(Severity::Critical, "Spiked", 165));

        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.message, EMERGENCY_MESSAGE);
        assert_eq!(alert.summary, "Spiked");
        assert_eq!(alert.heart_rate, Some(165));
    }

    #[test]
    fn test_alert_from_warning_context() {
        let alert = Alert::from_context(&context(
            Severity::Warning,
            "Heart rate 110 bpm above maximum 100 bpm",
            110,
        ));

        assert!(alert.message.starts_with("Heart rate 110 bpm above maximum 100 bpm. "));
        assert!(alert.message.ends_with(REST_ADVICE));
    }

    #[test]
    fn test_send_alert_dispatches() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|alert| alert.summary == "High")
            .times(1)
            .returning(|_| Ok(()));

        let mut manager = AlertManager::new(Box::new(dispatcher), 3);
        manager
            .send_alert(create_test_alert(Severity::Warning, "High"))
            .unwrap();
        assert_eq!(manager.queued_alert_count(), 0);
    }

    #[test]
    fn test_send_alert_skips_info() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher.expect_dispatch().never();

        let mut manager = AlertManager::new(Box::new(dispatcher), 3);
        manager
            .send_alert(create_test_alert(Severity::Info, "Just saying"))
            .unwrap();
        assert_eq!(manager.queued_alert_count(), 0);
    }

    #[test]
    fn test_rate_limited_alerts_are_queued() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| Ok(()));

        let mut manager = AlertManager::new(Box::new(dispatcher), 1);
        for i in 0..3 {
            manager
                .send_alert(create_test_alert(Severity::Critical, &format!("Alert {}", i)))
                .unwrap();
        }

        assert_eq!(manager.queued_alert_count(), 2);
        assert!(!manager.has_processable_alerts());
        assert_eq!(manager.tick().unwrap(), 0);
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| Ok(()));

        let mut manager = AlertManager::with_queue_size(Box::new(dispatcher), 1, 2);
        for i in 0..5 {
            manager
                .send_alert(create_test_alert(Severity::Critical, &format!("Alert {}", i)))
                .unwrap();
        }

        assert_eq!(manager.queued_alert_count(), 2);
        let queued: Vec<&str> = manager
            .alert_queue
            .iter()
            .map(|a| a.summary.as_str())
            .collect();
        assert_eq!(queued, vec!["Alert 3", "Alert 4"]);
    }

    #[test]
    fn test_tick_with_empty_queue() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher.expect_dispatch().never();

        let mut manager = AlertManager::new(Box::new(dispatcher), 3);
        assert_eq!(manager.tick().unwrap(), 0);
    }

    #[test]
    fn test_dispatch_failure_keeps_alert_queued() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher
            .expect_dispatch()
            .times(2)
            .returning(|_| Err(AlertError::DispatchFailed("gateway down".to_string())));

        let mut manager = AlertManager::new(Box::new(dispatcher), 1);

        let result = manager.send_alert(create_test_alert(Severity::Critical, "First"));
        assert!(matches!(result, Err(AlertError::DispatchFailed(_))));
        assert_eq!(manager.queued_alert_count(), 1);

        // The retry of "First" fails again; "Second" waits behind it
        let result = manager.send_alert(create_test_alert(Severity::Critical, "Second"));
        assert!(result.is_err());
        let queued: Vec<&str> = manager
            .alert_queue
            .iter()
            .map(|a| a.summary.as_str())
            .collect();
        assert_eq!(queued, vec!["First", "Second"]);
    }

    #[test]
    fn test_failed_alert_is_retried_before_newer_alerts() {
        let mut seq = Sequence::new();
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|alert| alert.summary == "A")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AlertError::DispatchFailed("timeout".to_string())));
        dispatcher
            .expect_dispatch()
            .withf(|alert| alert.summary == "A")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        dispatcher
            .expect_dispatch()
            .withf(|alert| alert.summary == "B")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut manager = AlertManager::new(Box::new(dispatcher), 3);

        assert!(manager
            .send_alert(create_test_alert(Severity::Critical, "A"))
            .is_err());
        assert!(manager
            .send_alert(create_test_alert(Severity::Critical, "B"))
            .is_ok());
        assert_eq!(manager.queued_alert_count(), 0);
    }

    #[test]
    fn test_failed_retry_in_tick_keeps_alert() {
        let mut seq = Sequence::new();
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher
            .expect_dispatch()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(AlertError::DispatchFailed("offline".to_string())));
        dispatcher
            .expect_dispatch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut manager = AlertManager::new(Box::new(dispatcher), 3);
        assert!(manager
            .send_alert(create_test_alert(Severity::Critical, "Spike"))
            .is_err());

        assert!(manager.tick().is_err());
        assert_eq!(manager.queued_alert_count(), 1);

        assert_eq!(manager.tick().unwrap(), 1);
        assert_eq!(manager.queued_alert_count(), 0);
    }

    #[test]
    fn test_from_config() {
        let mut dispatcher = MockAlertDispatcher::new();
        dispatcher.expect_dispatch().times(2).returning(|_| Ok(()));

        let config = AlertConfig {
            rate_limit_per_minute: 2,
            max_queue_size: 1,
            recipient: None,
        };
        let mut manager = AlertManager::from_config(Box::new(dispatcher), &config);

        for i in 0..4 {
            manager
                .send_alert(create_test_alert(Severity::Warning, &format!("Alert {}", i)))
                .unwrap();
        }
        assert_eq!(manager.queued_alert_count(), 1);
    }

    #[test]
    fn test_log_dispatcher_always_succeeds() {
        let dispatcher = LogDispatcher::new(Some("+15550100".to_string()));
        assert!(dispatcher
            .dispatch(&create_test_alert(Severity::Critical, "Spike"))
            .is_ok());
        assert!(LogDispatcher::default()
            .dispatch(&create_test_alert(Severity::Warning, "High"))
            .is_ok());
    }
}

// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::Utc;
    use quickcheck_macros::quickcheck;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingDispatcher(Arc<AtomicUsize>);

    impl AlertDispatcher for CountingDispatcher {
        fn dispatch(&self, _alert: &Alert) -> Result<(), AlertError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[quickcheck]
    fn prop_rate_limiting_prevents_spam(rate_limit: u8, num_alerts: u8) -> bool {
        let rate_limit = usize::from(rate_limit % 10) + 1;
        let num_alerts = usize::from(num_alerts % 50);

        let sent = Arc::new(AtomicUsize::new(0));
        let mut manager = AlertManager::with_queue_size(
            Box::new(CountingDispatcher(Arc::clone(&sent))),
            rate_limit,
            1000,
        );

        for i in 0..num_alerts {
            let alert = Alert {
                timestamp: Utc::now(),
                severity: Severity::Critical,
                summary: format!("Alert {}", i),
                message: EMERGENCY_MESSAGE.to_string(),
                heart_rate: Some(160),
            };
            if manager.send_alert(alert).is_err() {
                return false;
            }
        }

        let dispatched = sent.load(Ordering::SeqCst);
        dispatched == num_alerts.min(rate_limit)
            && manager.queued_alert_count() == num_alerts - dispatched
    }
}
