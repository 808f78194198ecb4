use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution status of a batch or pipeline job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created but not yet scheduled
    Pending,

    /// Scheduled, waiting for a worker
    Queued,

    /// Currently executing
    Running,

    /// Finished with all operations successful
    Completed,

    /// Finished with a fatal error
    Failed,

    /// Stopped by user request
    Cancelled,

    /// Finished, but some operations failed
    PartialSuccess,
}

impl JobStatus {
    /// Returns true if no further transition is expected without an
    /// explicit retry action.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::PartialSuccess
        )
    }

    /// Returns true if the job still counts toward active-job accounting.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Operation-level progress of a running job.
///
/// `completed_operations` and `failed_operations` are non-decreasing within
/// a single run; `percent_complete` may be recomputed if the backend revises
/// `total_operations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobProgress {
    pub total_operations: u64,
    pub completed_operations: u64,
    pub failed_operations: u64,
    pub skipped_operations: u64,
    pub percent_complete: f64,
}

/// A tracked validation job as reported by the backend.
///
/// `job_id`, `name` and `job_type` are immutable once assigned.
/// `started_at` and `completed_at` are set at most once each;
/// `completed_at` is only meaningful once the status is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Opaque unique identifier assigned by the backend.
    pub job_id: String,

    /// Human-readable job name.
    pub name: String,

    /// Kind of work (e.g. "comparison", "pipeline").
    pub job_type: String,

    /// Current execution status.
    pub status: JobStatus,

    /// Operation-level progress, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Rows/checks that validated successfully. Non-decreasing until terminal.
    #[serde(default)]
    pub success_count: u64,

    /// Rows/checks that failed validation. Non-decreasing until terminal.
    #[serde(default)]
    pub failure_count: u64,

    /// Total wall-clock duration reported after completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::PartialSuccess.is_terminal());

        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_active_is_inverse_of_terminal() {
        for status in [
            JobStatus::Pending,
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
            JobStatus::PartialSuccess,
        ] {
            assert_eq!(status.is_active(), !status.is_terminal());
        }
    }

    #[test]
    fn test_status_wire_format_is_snake_case() {
        let json = serde_json::to_string(&JobStatus::PartialSuccess).unwrap();
        assert_eq!(json, "\"partial_success\"");

        let parsed: JobStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(parsed, JobStatus::Running);
    }

    #[test]
    fn test_job_deserializes_with_missing_optionals() {
        let json = r#"{
            "job_id": "j-1",
            "name": "orders vs orders_v2",
            "job_type": "comparison",
            "status": "queued"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();

        assert_eq!(job.job_id, "j-1");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.progress.is_none());
        assert!(job.started_at.is_none());
        assert_eq!(job.success_count, 0);
        assert_eq!(job.failure_count, 0);
    }
}
