/// Alert manager and rate limiting
pub mod alert_manager;
pub mod rate_limiter;

pub use alert_manager::{Alert, AlertDispatcher, AlertManager, LogDispatcher};
pub use rate_limiter::RateLimiter;
