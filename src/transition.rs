//! Status transition classification.
//!
//! Pure function deciding what a status change means for the client:
//! whether it is a brand-new job, a notifiable terminal transition, a
//! progress refresh, or nothing of interest. Exercised independent of any
//! transport.

use crate::models::JobStatus;

/// Classification of a `(previous, next)` status pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No user-visible meaning; merge silently.
    None,

    /// The job was never seen before.
    NewJob,

    /// An active job finished with full success.
    BecameTerminalSuccess,

    /// An active job finished with a fatal error.
    BecameTerminalFailure,

    /// An active job finished with partial results.
    BecameTerminalPartial,

    /// Same non-terminal status repeated: a progress-field refresh.
    InProgress,
}

impl Transition {
    /// Returns true if this transition warrants a user-facing notification.
    pub fn is_notifiable(&self) -> bool {
        matches!(
            self,
            Self::BecameTerminalSuccess | Self::BecameTerminalFailure | Self::BecameTerminalPartial
        )
    }
}

/// Classify a status change.
///
/// `previous` is the registry's stored status at the moment of comparison,
/// or `None` if the job has never been seen. Idempotence falls out of the
/// caller advancing the stored status before any re-application: replaying
/// the same incoming status yields a terminal-to-terminal repeat, which is
/// `Transition::None`.
pub fn classify(previous: Option<JobStatus>, next: JobStatus) -> Transition {
    let Some(previous) = previous else {
        return Transition::NewJob;
    };

    if matches!(previous, JobStatus::Running | JobStatus::Queued) {
        match next {
            JobStatus::Completed => return Transition::BecameTerminalSuccess,
            JobStatus::Failed => return Transition::BecameTerminalFailure,
            JobStatus::PartialSuccess => return Transition::BecameTerminalPartial,
            _ => {},
        }
    }

    if previous == next && !next.is_terminal() {
        return Transition::InProgress;
    }

    Transition::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    #[test]
    fn test_unseen_job_is_new() {
        assert_eq!(classify(None, Running), Transition::NewJob);
        assert_eq!(classify(None, Completed), Transition::NewJob);
    }

    #[test]
    fn test_terminal_transitions_from_active_states() {
        for active in [Running, Queued] {
            assert_eq!(
                classify(Some(active), Completed),
                Transition::BecameTerminalSuccess
            );
            assert_eq!(
                classify(Some(active), Failed),
                Transition::BecameTerminalFailure
            );
            assert_eq!(
                classify(Some(active), PartialSuccess),
                Transition::BecameTerminalPartial
            );
        }
    }

    #[test]
    fn test_cancellation_is_silent() {
        // User-initiated stop; no toast.
        assert_eq!(classify(Some(Running), Cancelled), Transition::None);
        assert_eq!(classify(Some(Queued), Cancelled), Transition::None);
    }

    #[test]
    fn test_progress_refresh_is_in_progress() {
        assert_eq!(classify(Some(Running), Running), Transition::InProgress);
        assert_eq!(classify(Some(Queued), Queued), Transition::InProgress);
        assert_eq!(classify(Some(Pending), Pending), Transition::InProgress);
    }

    #[test]
    fn test_forward_movement_between_active_states_is_silent() {
        assert_eq!(classify(Some(Pending), Queued), Transition::None);
        assert_eq!(classify(Some(Queued), Running), Transition::None);
    }

    #[test]
    fn test_terminal_to_terminal_repeat_is_silent() {
        assert_eq!(classify(Some(Completed), Completed), Transition::None);
        assert_eq!(classify(Some(Failed), Failed), Transition::None);
        assert_eq!(classify(Some(Completed), Failed), Transition::None);
    }

    #[test]
    fn test_terminal_from_pending_is_silent() {
        // Only running/queued jobs produce completion toasts; a pending job
        // completing was never watched by the user.
        assert_eq!(classify(Some(Pending), Completed), Transition::None);
        assert_eq!(classify(Some(Pending), Failed), Transition::None);
    }

    #[test]
    fn test_replay_is_idempotent() {
        // First application notifies; once the stored status has advanced,
        // replaying the same payload classifies as a terminal repeat.
        let first = classify(Some(Running), Completed);
        assert!(first.is_notifiable());

        let replay = classify(Some(Completed), Completed);
        assert_eq!(replay, Transition::None);
    }
}
