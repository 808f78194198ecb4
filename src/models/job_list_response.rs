use serde::{Deserialize, Serialize};

use super::job::Job;

/// Response envelope for `GET /v1/api/batch/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
}

/// Response envelope for `GET /v1/api/batch/jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub job: Job,
}
