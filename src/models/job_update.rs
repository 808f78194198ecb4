use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::{Job, JobProgress, JobStatus};

/// Partial job delta carried by a push-channel `job_update` message.
///
/// Only `job_id` is required; every other field is optional. A payload
/// without a `job_id` fails deserialization and is dropped by the transport
/// layer before it can reach the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUpdate {
    pub job_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
}

impl JobUpdate {
    /// Create an empty delta for the given job.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: None,
            progress: None,
            started_at: None,
            completed_at: None,
            success_count: None,
            failure_count: None,
            total_duration_ms: None,
        }
    }

    /// Set the status carried by this delta.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Merge this delta into an existing record.
    ///
    /// Present fields replace prior values; absent fields preserve whatever
    /// the record already holds. `started_at`/`completed_at` are set at most
    /// once and never overwritten once present.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(ref progress) = self.progress {
            job.progress = Some(progress.clone());
        }
        if job.started_at.is_none() {
            job.started_at = self.started_at;
        }
        if job.completed_at.is_none() {
            job.completed_at = self.completed_at;
        }
        if let Some(count) = self.success_count {
            job.success_count = count;
        }
        if let Some(count) = self.failure_count {
            job.failure_count = count;
        }
        if let Some(duration) = self.total_duration_ms {
            job.total_duration_ms = Some(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_job() -> Job {
        Job {
            job_id: "j-1".to_string(),
            name: "nightly comparison".to_string(),
            job_type: "comparison".to_string(),
            status: JobStatus::Running,
            progress: None,
            started_at: None,
            completed_at: None,
            success_count: 10,
            failure_count: 1,
            total_duration_ms: None,
        }
    }

    #[test]
    fn test_absent_fields_preserve_prior_values() {
        let mut job = running_job();
        let delta = JobUpdate::new("j-1").with_status(JobStatus::Running);
        delta.apply_to(&mut job);

        assert_eq!(job.success_count, 10, "absent count must not be zeroed");
        assert_eq!(job.failure_count, 1);
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn test_present_fields_overwrite() {
        let mut job = running_job();
        let mut delta = JobUpdate::new("j-1").with_status(JobStatus::Completed);
        delta.success_count = Some(42);
        delta.total_duration_ms = Some(1234);
        delta.apply_to(&mut job);

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.success_count, 42);
        assert_eq!(job.total_duration_ms, Some(1234));
    }

    #[test]
    fn test_timestamps_set_at_most_once() {
        let mut job = running_job();
        let first = Utc::now();
        let mut delta = JobUpdate::new("j-1");
        delta.started_at = Some(first);
        delta.apply_to(&mut job);
        assert_eq!(job.started_at, Some(first));

        let mut later = JobUpdate::new("j-1");
        later.started_at = Some(first + chrono::Duration::seconds(30));
        later.apply_to(&mut job);
        assert_eq!(job.started_at, Some(first), "started_at must not move");
    }

    #[test]
    fn test_missing_job_id_fails_deserialization() {
        let result = serde_json::from_str::<JobUpdate>(r#"{"status": "running"}"#);
        assert!(result.is_err());
    }
}
