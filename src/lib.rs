//! # crosscheck-link
//!
//! Client-side job synchronization SDK for the CrossCheck data-validation
//! platform. Keeps a client's view of long-running batch/pipeline jobs
//! consistent with authoritative server state by combining a WebSocket push
//! channel with a polling fallback:
//!
//! - A [`PushChannel`] delivers incremental job updates and a connectivity
//!   signal, reconnecting automatically with exponential backoff.
//! - A [`SyncController`] merges updates from both channels into one job
//!   registry, classifies status transitions, and emits each user-facing
//!   notification exactly once per meaningful transition.
//! - Fallback polling runs only while the push channel is down and active
//!   jobs exist; it stops the moment either condition clears.
//!
//! # Example
//!
//! ```rust,no_run
//! use crosscheck_link::{CrossCheckLinkClient, EventHandlers};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CrossCheckLinkClient::builder()
//!     .base_url("http://localhost:8080")
//!     .event_handlers(
//!         EventHandlers::new()
//!             .on_update(|jobs| println!("{} jobs tracked", jobs.len()))
//!             .on_notify(|n| println!("{}", n.message))
//!             .on_connectivity(|live| println!("{}", if live { "Live" } else { "Polling" })),
//!     )
//!     .build()?;
//!
//! let mut sync = client.start_sync("project-1").await?;
//! // ... later, on scope change or teardown:
//! sync.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod controller;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod push;
pub mod registry;
pub mod timeouts;
pub mod transition;

pub use api::{JobSource, JobsApi, DEFAULT_JOB_LIST_LIMIT};
pub use auth::AuthProvider;
pub use client::{CrossCheckLinkClient, CrossCheckLinkClientBuilder};
pub use controller::SyncController;
pub use error::{CrossCheckLinkError, Result};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    ConnectionOptions, Job, JobListResponse, JobProgress, JobResponse, JobStatus, JobUpdate,
    Notification, ServerMessage, Severity,
};
pub use push::{ChannelEvent, PushChannel};
pub use registry::JobRegistry;
pub use timeouts::{CrossCheckLinkTimeouts, CrossCheckLinkTimeoutsBuilder};
pub use transition::{classify, Transition};
