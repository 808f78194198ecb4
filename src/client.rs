//! Main CrossCheck client with builder pattern.
//!
//! Provides the primary interface for talking to a CrossCheck backend and
//! starting job synchronization for a project scope.

use crate::{
    api::JobsApi,
    auth::AuthProvider,
    controller::SyncController,
    error::{CrossCheckLinkError, Result},
    event_handlers::EventHandlers,
    models::ConnectionOptions,
    push::{ChannelEvent, PushChannel},
    timeouts::CrossCheckLinkTimeouts,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the channel-event queue between the push channel and the
/// controller. Events queue here while the controller is mid-suspension
/// (e.g. applying a snapshot) and drain in arrival order.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Main CrossCheck client.
///
/// Use [`CrossCheckLinkClientBuilder`] to construct instances with custom
/// configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use crosscheck_link::CrossCheckLinkClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CrossCheckLinkClient::builder()
///     .base_url("http://localhost:8080")
///     .build()?;
///
/// let jobs = client.jobs().list_jobs("project-1", None).await?;
/// println!("{} jobs", jobs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CrossCheckLinkClient {
    base_url: String,
    auth: AuthProvider,
    jobs: JobsApi,
    timeouts: CrossCheckLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
}

impl CrossCheckLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> CrossCheckLinkClientBuilder {
        CrossCheckLinkClientBuilder::new()
    }

    /// Access the batch-jobs REST API.
    pub fn jobs(&self) -> &JobsApi {
        &self.jobs
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &CrossCheckLinkTimeouts {
        &self.timeouts
    }

    /// Start job synchronization for one project scope.
    ///
    /// Wires a push channel and a fallback poller into a
    /// [`SyncController`]; construct one controller per active project and
    /// [`stop`](SyncController::stop) it on scope change.
    pub async fn start_sync(&self, project_id: &str) -> Result<SyncController> {
        let (events_tx, events_rx) = mpsc::channel::<ChannelEvent>(EVENT_CHANNEL_CAPACITY);

        let push = PushChannel::connect(
            &self.base_url,
            project_id,
            self.auth.clone(),
            self.timeouts.clone(),
            self.connection_options.clone(),
            self.event_handlers.clone(),
            events_tx,
        )
        .await?;

        let controller = SyncController::start(
            project_id,
            Arc::new(self.jobs.clone()),
            events_rx,
            self.timeouts.clone(),
            self.event_handlers.clone(),
        )
        .with_push(push);

        Ok(controller)
    }
}

/// Builder for configuring [`CrossCheckLinkClient`] instances.
pub struct CrossCheckLinkClientBuilder {
    base_url: Option<String>,
    auth: AuthProvider,
    timeouts: CrossCheckLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
}

impl CrossCheckLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            auth: AuthProvider::none(),
            timeouts: CrossCheckLinkTimeouts::default(),
            connection_options: ConnectionOptions::default(),
            event_handlers: EventHandlers::default(),
        }
    }

    /// Set the base URL for the CrossCheck backend
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthProvider::bearer_token(token.into());
        self
    }

    /// Set authentication provider directly
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Set timeout and interval configuration for all operations
    pub fn timeouts(mut self, timeouts: CrossCheckLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set connection options for push-channel reconnection behavior
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    /// Register synchronization event handlers
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CrossCheckLinkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| CrossCheckLinkError::ConfigurationError("base_url is required".into()))?;

        // Keep-alive connections reduce TCP handshake overhead for the
        // poll/refresh fetch cycle.
        let http_client = reqwest::Client::builder()
            .timeout(self.timeouts.receive_timeout)
            .connect_timeout(self.timeouts.connection_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| CrossCheckLinkError::ConfigurationError(e.to_string()))?;

        let jobs = JobsApi::new(base_url.clone(), http_client, self.auth.clone());

        Ok(CrossCheckLinkClient {
            base_url,
            auth: self.auth,
            jobs,
            timeouts: self.timeouts,
            connection_options: self.connection_options,
            event_handlers: self.event_handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_pattern() {
        let result = CrossCheckLinkClient::builder()
            .base_url("http://localhost:8080")
            .bearer_token("test_token")
            .timeouts(
                CrossCheckLinkTimeouts::builder()
                    .poll_interval(Duration::from_secs(2))
                    .build(),
            )
            .build();

        assert!(result.is_ok());
        assert_eq!(
            result.unwrap().timeouts().poll_interval,
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_builder_missing_url() {
        let result = CrossCheckLinkClient::builder().build();
        assert!(result.is_err());
    }
}
