use serde::{Deserialize, Serialize};

/// Connection-level options for the push channel.
///
/// These options control reconnection behavior after a disconnect. They are
/// separate from [`CrossCheckLinkTimeouts`](crate::timeouts::CrossCheckLinkTimeouts),
/// which covers per-operation deadlines.
///
/// # Example
///
/// ```rust
/// use crosscheck_link::ConnectionOptions;
///
/// let options = ConnectionOptions::new()
///     .with_reconnect_delay_ms(2000)
///     .with_max_reconnect_attempts(Some(10));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Enable automatic reconnection on connection loss
    /// Default: true - automatically attempts to reconnect
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Initial delay in milliseconds between reconnection attempts
    /// Default: 1000ms (1 second)
    /// Uses exponential backoff up to max_reconnect_delay_ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum delay between reconnection attempts (for exponential backoff)
    /// Default: 30000ms (30 seconds)
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Maximum number of reconnection attempts before giving up
    /// Default: None (retry indefinitely)
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30000
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 30000,
            max_reconnect_attempts: None,
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to automatically reconnect on connection loss
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the initial delay between reconnection attempts (in milliseconds)
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set the maximum delay between reconnection attempts (in milliseconds)
    pub fn with_max_reconnect_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_reconnect_delay_ms = max_delay_ms;
        self
    }

    /// Set the maximum number of reconnection attempts
    /// Pass None for indefinite retries
    pub fn with_max_reconnect_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConnectionOptions::default();

        assert!(opts.auto_reconnect, "auto_reconnect should default to true");
        assert_eq!(opts.reconnect_delay_ms, 1000);
        assert_eq!(opts.max_reconnect_delay_ms, 30000);
        assert!(
            opts.max_reconnect_attempts.is_none(),
            "max_reconnect_attempts should default to None (indefinite)"
        );
    }

    #[test]
    fn test_builder_pattern() {
        let opts = ConnectionOptions::new()
            .with_auto_reconnect(false)
            .with_reconnect_delay_ms(500)
            .with_max_reconnect_delay_ms(60000)
            .with_max_reconnect_attempts(Some(5));

        assert!(!opts.auto_reconnect);
        assert_eq!(opts.reconnect_delay_ms, 500);
        assert_eq!(opts.max_reconnect_delay_ms, 60000);
        assert_eq!(opts.max_reconnect_attempts, Some(5));
    }

    #[test]
    fn test_deserialization_with_defaults() {
        let json = r#"{"auto_reconnect": false}"#;
        let opts: ConnectionOptions = serde_json::from_str(json).unwrap();

        assert!(!opts.auto_reconnect);
        assert_eq!(opts.reconnect_delay_ms, 1000); // default
        assert!(opts.max_reconnect_attempts.is_none()); // default
    }
}
