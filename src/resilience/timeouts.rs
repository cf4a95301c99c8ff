//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Carry connect, response, body read and idle timeouts from config to the client
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;

/// Deadlines applied to every outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// TCP connect deadline, enforced by the connector.
    pub connect: Duration,
    /// Deadline for the backend to return response headers.
    pub response: Duration,
    /// Longest gap between body frames once streaming has started.
    pub read: Duration,
    /// Idle lifetime of pooled connections.
    pub idle: Duration,
}

impl From<&TimeoutConfig> for UpstreamTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            response: Duration::from_secs(config.response_secs),
            read: Duration::from_secs(config.read_secs),
            idle: Duration::from_secs(config.idle_secs),
        }
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// The deadline passed before the wrapped operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion or fail once `limit` has elapsed.
///
/// On timeout the future is dropped, which releases whatever it held.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_config() {
        let config = TimeoutConfig {
            connect_secs: 2,
            response_secs: 10,
            read_secs: 15,
            idle_secs: 90,
        };
        let timeouts = UpstreamTimeouts::from(&config);
        assert_eq!(timeouts.connect, Duration::from_secs(2));
        assert_eq!(timeouts.response, Duration::from_secs(10));
        assert_eq!(timeouts.read, Duration::from_secs(15));
        assert_eq!(timeouts.idle, Duration::from_secs(90));
    }

    #[tokio::test]
    async fn completes_within_deadline() {
        let result = with_deadline(Duration::from_millis(200), async { 7 }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn times_out_slow_future() {
        let limit = Duration::from_millis(50);
        let result = with_deadline(limit, tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(result, Err(DeadlineExceeded(limit)));
    }
}
