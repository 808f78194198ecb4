//! Batch-job REST API with HTTP transport.

use crate::{
    auth::AuthProvider,
    error::{CrossCheckLinkError, Result},
    models::{Job, JobListResponse, JobResponse},
};
use futures_util::future::BoxFuture;
use log::{debug, warn};
use std::time::Instant;

/// Default `limit` applied to full job-list fetches.
pub const DEFAULT_JOB_LIST_LIMIT: u32 = 100;

/// Anything that can produce the authoritative job list for a project.
///
/// The synchronization controller depends on this seam rather than on HTTP
/// directly, so the merge/notify logic is testable with a scripted source.
/// [`JobsApi`] is the production implementation.
pub trait JobSource: Send + Sync {
    /// Fetch the full job list scoped to a project.
    fn fetch_jobs<'a>(&'a self, project_id: &'a str) -> BoxFuture<'a, Result<Vec<Job>>>;
}

/// Handles batch-job requests against the CrossCheck REST backend.
#[derive(Clone)]
pub struct JobsApi {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
}

impl JobsApi {
    pub(crate) fn new(base_url: String, http_client: reqwest::Client, auth: AuthProvider) -> Self {
        Self {
            base_url,
            http_client,
            auth,
        }
    }

    /// Fetch the full job list for a project.
    pub async fn list_jobs(&self, project_id: &str, limit: Option<u32>) -> Result<Vec<Job>> {
        let url = format!(
            "{}/v1/api/batch/jobs?limit={}&project_id={}",
            self.base_url,
            limit.unwrap_or(DEFAULT_JOB_LIST_LIMIT),
            project_id
        );
        let response: JobListResponse = self.get_with_retry(&url).await?;
        Ok(response.jobs)
    }

    /// Fetch a single full job record.
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let url = format!("{}/v1/api/batch/jobs/{}", self.base_url, job_id);
        let response: JobResponse = self.get_with_retry(&url).await?;
        Ok(response.job)
    }

    /// Request cancellation of a job. Fire-and-forget: the core only reacts
    /// to the status change observed afterward.
    pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/v1/api/batch/jobs/{}/cancel", self.base_url, job_id);
        self.action(self.http_client.post(&url)).await
    }

    /// Request a retry of a terminal job. Fire-and-forget.
    pub async fn retry_job(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/v1/api/batch/jobs/{}/retry", self.base_url, job_id);
        self.action(self.http_client.post(&url)).await
    }

    /// Delete a job record. Fire-and-forget.
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/v1/api/batch/jobs/{}", self.base_url, job_id);
        self.action(self.http_client.delete(&url)).await
    }

    /// GET a JSON payload with bounded retry of transient failures.
    async fn get_with_retry<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut retries = 0;
        let max_retries = 3;
        let overall_start = Instant::now();

        loop {
            // Build the request fresh on each attempt
            let req_builder = self.auth.apply_to_request(self.http_client.get(url));

            let attempt_start = Instant::now();
            debug!(
                "[jobs-api] Sending GET to {} (attempt {}/{})",
                url,
                retries + 1,
                max_retries + 1
            );

            match req_builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "[jobs-api] Response received: status={} duration_ms={}",
                        status,
                        attempt_start.elapsed().as_millis()
                    );

                    if status.is_success() {
                        let payload: T = response.json().await?;
                        debug!(
                            "[jobs-api] Success: total_ms={}",
                            overall_start.elapsed().as_millis()
                        );
                        return Ok(payload);
                    }

                    let message = Self::extract_error_message(response).await;
                    warn!(
                        "[jobs-api] Server error: status={} message=\"{}\"",
                        status, message
                    );
                    return Err(CrossCheckLinkError::ServerError {
                        status_code: status.as_u16(),
                        message,
                    });
                },
                Err(e) if retries < max_retries && Self::is_retriable(&e) => {
                    warn!(
                        "[jobs-api] Retriable error (attempt {}/{}): {}",
                        retries + 1,
                        max_retries + 1,
                        e
                    );
                    retries += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(100 * retries as u64))
                        .await;
                    continue;
                },
                Err(e) => {
                    warn!(
                        "[jobs-api] Fatal error: {} total_ms={}",
                        e,
                        overall_start.elapsed().as_millis()
                    );
                    return Err(e.into());
                },
            }
        }
    }

    /// Execute a fire-and-forget lifecycle action (no retry; the caller's
    /// next status observation is the source of truth).
    async fn action(&self, builder: reqwest::RequestBuilder) -> Result<()> {
        let response = self.auth.apply_to_request(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = Self::extract_error_message(response).await;
        Err(CrossCheckLinkError::ServerError {
            status_code: status.as_u16(),
            message,
        })
    }

    /// Pull a human-readable message out of an error response body.
    async fn extract_error_message(response: reqwest::Response) -> String {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(message) = value
                .pointer("/error/message")
                .or_else(|| value.pointer("/message"))
                .and_then(|m| m.as_str())
            {
                return message.to_string();
            }
        }
        body
    }

    fn is_retriable(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }
}

impl JobSource for JobsApi {
    fn fetch_jobs<'a>(&'a self, project_id: &'a str) -> BoxFuture<'a, Result<Vec<Job>>> {
        Box::pin(async move { self.list_jobs(project_id, None).await })
    }
}
