//! Timeout and interval configuration for crosscheck-link operations.
//!
//! Centralizes deadlines for HTTP requests and the WebSocket push channel,
//! plus the fallback poll interval and the new-job refresh retry policy.

use std::time::Duration;

/// Timeout and interval configuration for crosscheck-link operations.
///
/// # Examples
///
/// ```rust
/// use crosscheck_link::CrossCheckLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = CrossCheckLinkTimeouts::default();
///
/// // Custom configuration for high-latency environments
/// let timeouts = CrossCheckLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(60))
///     .poll_interval(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CrossCheckLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for receiving data after a request is sent.
    /// Default: 30 seconds
    pub receive_timeout: Duration,

    /// Keep-alive ping interval for the WebSocket push channel.
    /// Set to 0 to disable keep-alive pings.
    /// Default: 10 seconds
    pub keepalive_interval: Duration,

    /// Maximum time to wait for a Pong response after sending a keepalive
    /// Ping before the connection is treated as dead.
    /// Set to 0 to disable pong timeout checking.
    /// Default: 5 seconds
    pub pong_timeout: Duration,

    /// Fixed interval between fallback poll ticks while the push channel is
    /// down and active jobs exist.
    /// Default: 5 seconds
    pub poll_interval: Duration,

    /// Initial delay between refresh attempts after a new job is observed.
    /// Doubled on every attempt.
    /// Default: 500 milliseconds
    pub refresh_retry_delay: Duration,

    /// Maximum refresh attempts while waiting for a new job to appear in
    /// the full list.
    /// Default: 5
    pub refresh_retry_attempts: u32,
}

impl Default for CrossCheckLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(10),
            pong_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            refresh_retry_delay: Duration::from_millis(500),
            refresh_retry_attempts: 5,
        }
    }
}

impl CrossCheckLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> CrossCheckLinkTimeoutsBuilder {
        CrossCheckLinkTimeoutsBuilder::new()
    }

    /// Create timeouts optimized for fast local development.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(5),
            pong_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            refresh_retry_delay: Duration::from_millis(100),
            refresh_retry_attempts: 5,
        }
    }

    /// Create timeouts optimized for high-latency or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            receive_timeout: Duration::from_secs(120),
            keepalive_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(15),
            refresh_retry_delay: Duration::from_secs(1),
            refresh_retry_attempts: 6,
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Builder for creating custom [`CrossCheckLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct CrossCheckLinkTimeoutsBuilder {
    timeouts: CrossCheckLinkTimeouts,
}

impl CrossCheckLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: CrossCheckLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the receive timeout (waiting for data after request).
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.receive_timeout = timeout;
        self
    }

    /// Set the keepalive ping interval.
    /// Set to 0 to disable keepalive pings.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.timeouts.keepalive_interval = interval;
        self
    }

    /// Set the pong timeout (max wait for Pong after sending a Ping).
    /// Set to 0 to disable pong timeout checking.
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.pong_timeout = timeout;
        self
    }

    /// Set the fallback poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.timeouts.poll_interval = interval;
        self
    }

    /// Set the initial delay between new-job refresh attempts.
    pub fn refresh_retry_delay(mut self, delay: Duration) -> Self {
        self.timeouts.refresh_retry_delay = delay;
        self
    }

    /// Set the maximum number of new-job refresh attempts.
    pub fn refresh_retry_attempts(mut self, attempts: u32) -> Self {
        self.timeouts.refresh_retry_attempts = attempts;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> CrossCheckLinkTimeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = CrossCheckLinkTimeouts::default();
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.poll_interval, Duration::from_secs(5));
        assert_eq!(timeouts.refresh_retry_attempts, 5);
    }

    #[test]
    fn test_builder() {
        let timeouts = CrossCheckLinkTimeouts::builder()
            .connection_timeout(Duration::from_secs(60))
            .poll_interval(Duration::from_secs(2))
            .refresh_retry_attempts(3)
            .build();

        assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
        assert_eq!(timeouts.poll_interval, Duration::from_secs(2));
        assert_eq!(timeouts.refresh_retry_attempts, 3);
    }

    #[test]
    fn test_fast_preset() {
        let timeouts = CrossCheckLinkTimeouts::fast();
        assert!(timeouts.connection_timeout <= Duration::from_secs(5));
        assert!(timeouts.poll_interval <= Duration::from_secs(5));
    }

    #[test]
    fn test_is_no_timeout() {
        assert!(CrossCheckLinkTimeouts::is_no_timeout(Duration::ZERO));
        assert!(!CrossCheckLinkTimeouts::is_no_timeout(Duration::from_secs(1)));
    }
}
