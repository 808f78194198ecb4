//! In-memory job registry.
//!
//! The single source of client-side truth for job state. Pure storage: the
//! registry merges records and answers queries but never emits
//! notifications, keeping update-merging and notification-triggering
//! independently testable. Owned exclusively by the synchronization
//! controller task; nothing else mutates it.

use std::collections::HashMap;

use crate::models::{Job, JobStatus, JobUpdate};

/// Keyed collection of job records, one entry per `job_id`.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Job>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked jobs, terminal ones included.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if no jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Look up a job by id.
    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    /// Current status of a job, if tracked.
    pub fn status_of(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.get(job_id).map(|job| job.status)
    }

    /// Insert or overwrite a full record (snapshot row).
    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.job_id.clone(), job);
    }

    /// Merge a partial delta into an existing record by `job_id`.
    ///
    /// Present fields replace prior values; absent fields are preserved.
    /// Returns `false` without touching state when no record exists for the
    /// id (a brand-new job's delta is resolved via a full refresh instead)
    /// or when the delta would move a terminal record back to a non-terminal
    /// status (a stale, out-of-order push — the server re-announces retried
    /// jobs through snapshots).
    pub fn upsert(&mut self, update: &JobUpdate) -> bool {
        let Some(job) = self.jobs.get_mut(&update.job_id) else {
            return false;
        };

        if job.status.is_terminal() {
            if let Some(incoming) = update.status {
                if !incoming.is_terminal() {
                    log::debug!(
                        "[registry] Ignoring stale delta for terminal job {} ({:?} -> {:?})",
                        update.job_id,
                        job.status,
                        incoming
                    );
                    return false;
                }
            }
        }

        update.apply_to(job);
        true
    }

    /// All jobs whose status is non-terminal.
    pub fn get_active(&self) -> Vec<&Job> {
        self.jobs.values().filter(|job| job.status.is_active()).collect()
    }

    /// Number of non-terminal jobs.
    pub fn active_count(&self) -> usize {
        self.jobs.values().filter(|job| job.status.is_active()).count()
    }

    /// Borrow the full keyed collection. Insertion order irrelevant.
    pub fn all(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Clone the full collection for handing to the presentation layer.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    /// Replace the whole collection with a poll result.
    pub fn replace_all(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs
            .into_iter()
            .map(|job| (job.job_id.clone(), job))
            .collect();
    }
}
