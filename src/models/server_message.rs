use serde::{Deserialize, Serialize};

use super::job_update::JobUpdate;

/// WebSocket message types sent from server to client on the jobs channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Incremental update for a single job
    JobUpdate {
        /// Partial job record; `job_id` is always present
        data: JobUpdate,
    },

    /// Error notification from the server
    Error {
        /// Error code
        code: String,

        /// Human-readable error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    #[test]
    fn test_job_update_round_trip() {
        let json = r#"{"type":"job_update","data":{"job_id":"j-9","status":"completed"}}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();

        match msg {
            ServerMessage::JobUpdate { data } => {
                assert_eq!(data.job_id, "j-9");
                assert_eq!(data.status, Some(JobStatus::Completed));
            },
            other => panic!("Expected JobUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_message_type_is_an_error() {
        // The transport logs and skips frames it cannot parse.
        let result = serde_json::from_str::<ServerMessage>(r#"{"type":"heartbeat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_without_job_id_is_rejected() {
        let json = r#"{"type":"job_update","data":{"status":"running"}}"#;
        assert!(serde_json::from_str::<ServerMessage>(json).is_err());
    }
}
