//! Lifecycle and synchronization event handlers.
//!
//! Provides callback-based hooks the presentation layer registers to react
//! to synchronization events:
//!
//! - [`on_update`](EventHandlers::on_update): Fired with the full job snapshot after every registry change
//! - [`on_notify`](EventHandlers::on_notify): Fired once per meaningful terminal transition
//! - [`on_connectivity`](EventHandlers::on_connectivity): Fired when the push channel goes up or down
//! - [`on_error`](EventHandlers::on_error): Fired on connection or protocol errors
//!
//! The presentation layer owns all rendering; handlers must not mutate
//! registry state.
//!
//! # Example
//!
//! ```rust
//! use crosscheck_link::EventHandlers;
//!
//! let handlers = EventHandlers::new()
//!     .on_update(|jobs| {
//!         println!("{} jobs tracked", jobs.len());
//!     })
//!     .on_notify(|notification| {
//!         println!("[{:?}] {}", notification.severity, notification.message);
//!     })
//!     .on_connectivity(|live| {
//!         println!("{}", if live { "Live" } else { "Polling" });
//!     });
//! ```

use std::fmt;
use std::sync::Arc;

use crate::models::{Job, Notification};

/// Reason for a push-channel disconnect.
#[derive(Debug, Clone)]
pub struct DisconnectReason {
    /// Human-readable description of why the connection closed.
    pub message: String,
    /// WebSocket close code, if available (e.g. 1000 = normal, 1006 = abnormal).
    pub code: Option<u16>,
}

impl DisconnectReason {
    /// Create a new disconnect reason with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a new disconnect reason with a message and close code.
    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code: {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Error information passed to the `on_error` handler.
#[derive(Debug, Clone)]
pub struct ConnectionError {
    /// Human-readable error message.
    pub message: String,
    /// Whether this error is recoverable (i.e. auto-reconnect may succeed).
    pub recoverable: bool,
}

impl ConnectionError {
    /// Create a new connection error.
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Type alias for the on_update callback.
pub type OnUpdateCallback = Arc<dyn Fn(&[Job]) + Send + Sync>;

/// Type alias for the on_notify callback.
pub type OnNotifyCallback = Arc<dyn Fn(Notification) + Send + Sync>;

/// Type alias for the on_connectivity callback.
pub type OnConnectivityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Type alias for the on_error callback.
pub type OnErrorCallback = Arc<dyn Fn(ConnectionError) + Send + Sync>;

/// Synchronization event handlers.
///
/// All handlers are optional. The builder pattern makes it easy to register
/// only the handlers you need. Handlers are `Send + Sync` so they work with
/// the async tokio runtime.
#[derive(Clone, Default)]
pub struct EventHandlers {
    /// Called with the full job snapshot after every registry change.
    pub(crate) on_update: Option<OnUpdateCallback>,

    /// Called once per meaningful terminal transition.
    pub(crate) on_notify: Option<OnNotifyCallback>,

    /// Called when push-channel connectivity changes (`true` = live).
    pub(crate) on_connectivity: Option<OnConnectivityCallback>,

    /// Called when a connection or protocol error occurs.
    pub(crate) on_error: Option<OnErrorCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_update", &self.on_update.is_some())
            .field("on_notify", &self.on_notify.is_some())
            .field("on_connectivity", &self.on_connectivity.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl EventHandlers {
    /// Create a new empty `EventHandlers` (no callbacks registered).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with the full job snapshot after every
    /// registry change.
    pub fn on_update(mut self, f: impl Fn(&[Job]) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked once per meaningful terminal transition.
    ///
    /// Duplicate deliveries of the same `(job_id, terminal status)` pair are
    /// suppressed upstream; the callback fires at most once per pair.
    pub fn on_notify(mut self, f: impl Fn(Notification) + Send + Sync + 'static) -> Self {
        self.on_notify = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when push-channel connectivity changes.
    ///
    /// Receives `true` when the channel is live and `false` when the client
    /// has fallen back to polling (or is idle).
    pub fn on_connectivity(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_connectivity = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when a connection error occurs.
    ///
    /// The callback receives a [`ConnectionError`] indicating whether the
    /// error is recoverable (auto-reconnect may help) or fatal.
    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Returns `true` if any handler is registered.
    pub fn has_any(&self) -> bool {
        self.on_update.is_some()
            || self.on_notify.is_some()
            || self.on_connectivity.is_some()
            || self.on_error.is_some()
    }

    // ---------------------------------------------------------------
    // Internal dispatch helpers
    // ---------------------------------------------------------------

    /// Dispatch the on_update event.
    pub(crate) fn emit_update(&self, jobs: &[Job]) {
        if let Some(cb) = &self.on_update {
            cb(jobs);
        }
    }

    /// Dispatch the on_notify event.
    pub(crate) fn emit_notify(&self, notification: Notification) {
        if let Some(cb) = &self.on_notify {
            cb(notification);
        }
    }

    /// Dispatch the on_connectivity event.
    pub(crate) fn emit_connectivity(&self, live: bool) {
        if let Some(cb) = &self.on_connectivity {
            cb(live);
        }
    }

    /// Dispatch the on_error event.
    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_handlers_have_none() {
        let handlers = EventHandlers::new();
        assert!(!handlers.has_any());

        // Emitting with no handlers registered is a no-op.
        handlers.emit_update(&[]);
        handlers.emit_connectivity(true);
    }

    #[test]
    fn test_emit_dispatches_to_registered_callback() {
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();

        let handlers = EventHandlers::new().on_notify(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handlers.has_any());

        handlers.emit_notify(Notification::new("j-1", Severity::Success, "done"));
        handlers.emit_notify(Notification::new("j-2", Severity::Error, "failed"));

        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disconnect_reason_display() {
        let plain = DisconnectReason::new("server closed");
        assert_eq!(plain.to_string(), "server closed");

        let coded = DisconnectReason::with_code("abnormal", 1006);
        assert_eq!(coded.to_string(), "abnormal (code: 1006)");
    }
}
