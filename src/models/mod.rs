//! Data models for the crosscheck-link client library.
//!
//! Defines job records, push-channel wire messages, REST response envelopes
//! and notification types.

pub mod connection_options;
pub mod job;
pub mod job_list_response;
pub mod job_update;
pub mod notification;
pub mod server_message;

pub use connection_options::ConnectionOptions;
pub use job::{Job, JobProgress, JobStatus};
pub use job_list_response::{JobListResponse, JobResponse};
pub use job_update::JobUpdate;
pub use notification::{Notification, Severity};
pub use server_message::ServerMessage;
