//! Retry policy for API requests.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::PacingConfig;

/// Outcome of a single request attempt.
#[derive(Debug)]
pub enum Attempt {
    /// Success status; carries the raw body.
    Success(String),
    /// HTTP 429.
    RateLimited,
    /// HTTP 401; the token must be exchanged again.
    Unauthorized,
    /// Any other failure, already formatted for the log.
    Failed(String),
}

impl Attempt {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Attempt::RateLimited,
            StatusCode::UNAUTHORIZED => Attempt::Unauthorized,
            _ => Attempt::Failed(format!("HTTP {}: {}", status.as_u16(), body)),
        }
    }
}

/// Attempt limit and pauses applied by the transport.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_sleep: Duration,
    pub failure_sleep: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, rate_limit_sleep: Duration, failure_sleep: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            rate_limit_sleep,
            failure_sleep,
        }
    }

    /// Pause after the `attempt`-th (1-based) request was rate limited.
    ///
    /// Grows linearly with the attempt number.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.rate_limit_sleep.saturating_mul(attempt)
    }
}

impl From<&PacingConfig> for RetryPolicy {
    fn from(pacing: &PacingConfig) -> Self {
        Self::new(
            pacing.max_retries,
            pacing.rate_limit_sleep(),
            pacing.sleep_time(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_delay_is_linear() {
        let policy = RetryPolicy::new(5, Duration::from_secs(30), Duration::from_secs(1));
        assert_eq!(policy.rate_limit_delay(1), Duration::from_secs(30));
        assert_eq!(policy.rate_limit_delay(2), Duration::from_secs(60));
        assert_eq!(policy.rate_limit_delay(5), Duration::from_secs(150));
    }

    #[test]
    fn test_rate_limit_delay_saturates() {
        let policy = RetryPolicy::new(5, Duration::MAX, Duration::ZERO);
        assert_eq!(policy.rate_limit_delay(3), Duration::MAX);
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            Attempt::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Attempt::RateLimited
        ));
        assert!(matches!(
            Attempt::from_status(StatusCode::UNAUTHORIZED, ""),
            Attempt::Unauthorized
        ));
        match Attempt::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            Attempt::Failed(reason) => assert_eq!(reason, "HTTP 500: boom"),
            other => panic!("unexpected {:?}", other),
        }
        // 403 is not a token problem for this API; it is retried like any failure
        assert!(matches!(
            Attempt::from_status(StatusCode::FORBIDDEN, ""),
            Attempt::Failed(_)
        ));
    }

    #[test]
    fn test_policy_from_pacing() {
        let pacing = PacingConfig {
            sleep_time_secs: 0.25,
            max_retries: 3,
            rate_limit_sleep_secs: 10,
            request_timeout_secs: 20,
            asset_timeout_secs: 600,
            page_size: 24,
        };
        let policy = RetryPolicy::from(&pacing);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.rate_limit_sleep, Duration::from_secs(10));
        assert_eq!(policy.failure_sleep, Duration::from_millis(250));
    }
}
