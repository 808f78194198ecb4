use serde::{Deserialize, Serialize};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
    Info,
}

/// A user-facing notification produced by the synchronization core.
///
/// Emitted at most once per `(job_id, terminal status)` pair; the
/// presentation layer renders it as a toast/snackbar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Job the notification refers to.
    pub job_id: String,

    /// Display severity.
    pub severity: Severity,

    /// Ready-to-display message text.
    pub message: String,
}

impl Notification {
    pub fn new(job_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            severity,
            message: message.into(),
        }
    }
}
