//! Synchronization controller.
//!
//! The sole consumer of push-channel and poller events, and the only owner
//! of the job registry and the known-ids set. Split in two layers:
//!
//! - [`SyncState`]: the transport-free ingestion core. Both channels feed
//!   the same two entry points (`apply_update`, `apply_snapshot`), so merge
//!   and notification-dedup logic exists in exactly one place.
//! - [`SyncController`]: the async driver. A background task owns the
//!   `SyncState`, serializes all events through one loop, runs the fallback
//!   poll timer strictly as a function of the gating predicate, and
//!   dispatches the new-job full refresh with retry.
//!
//! All failures are contained here: a failed fetch is logged and leaves the
//! registry and known-ids untouched; the next poll tick or push event
//! continues unaffected.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;

use crate::{
    api::JobSource,
    error::Result,
    event_handlers::EventHandlers,
    models::{Job, JobStatus, JobUpdate, Notification, Severity},
    push::{ChannelEvent, PushChannel},
    registry::JobRegistry,
    timeouts::CrossCheckLinkTimeouts,
    transition::{classify, Transition},
};

/// Maximum sleep duration that won't overflow `Instant + Duration`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Capacity of the internal control channel (fetch results, stop signal).
const CTRL_CHANNEL_CAPACITY: usize = 64;

/// Where a full job snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotSource {
    /// Fallback poll tick: the registry is replaced wholesale afterwards.
    Poll,

    /// Initial load or new-job refresh: records are merged in, nothing is
    /// evicted.
    Refresh,
}

/// Outcome of ingesting a single push delta.
#[derive(Debug)]
pub(crate) enum UpdateOutcome {
    /// The job was never seen before: its id is now known, the raw delta
    /// was NOT merged, and a scoped full refresh must be dispatched.
    RefreshNeeded { job_id: String },

    /// The job was already known; the delta was evaluated against the
    /// registry.
    Applied {
        /// At most one deduplicated notification for this ingestion.
        notification: Option<Notification>,
        /// Whether the registry changed (drives re-render).
        merged: bool,
    },
}

// ── SyncState (transport-free core) ─────────────────────────────────────────

/// Ingestion core: registry + known ids + notification dedup + poll gating.
///
/// Owned exclusively by the controller task. All methods are synchronous;
/// the state never performs I/O.
pub(crate) struct SyncState {
    /// Active project scope this instance was constructed for.
    scope: String,
    registry: JobRegistry,
    /// Every job id this client has ever observed.
    known_ids: HashSet<String>,
    /// `(job_id, terminal status)` pairs already announced to the user.
    notified: HashSet<(String, JobStatus)>,
    /// Last known push-channel connectivity.
    connected: bool,
}

impl SyncState {
    pub(crate) fn new(scope: String) -> Self {
        Self {
            scope,
            registry: JobRegistry::new(),
            known_ids: HashSet::new(),
            notified: HashSet::new(),
            connected: false,
        }
    }

    pub(crate) fn scope(&self) -> &str {
        &self.scope
    }

    /// Record a connectivity change. Returns true if the value changed.
    pub(crate) fn set_connected(&mut self, connected: bool) -> bool {
        if self.connected == connected {
            return false;
        }
        self.connected = connected;
        true
    }

    /// Fallback polling is warranted iff the push channel is down and there
    /// is something to track. The scope is fixed at construction, so the
    /// scope-selected condition holds for the lifetime of this state.
    pub(crate) fn should_poll(&self) -> bool {
        !self.connected && self.registry.active_count() > 0
    }

    /// Clone the full job collection for the presentation layer.
    pub(crate) fn snapshot(&self) -> Vec<Job> {
        self.registry.snapshot()
    }

    /// Ingest a push-channel delta.
    pub(crate) fn apply_update(&mut self, update: JobUpdate) -> UpdateOutcome {
        if self.known_ids.insert(update.job_id.clone()) {
            // Brand-new job: its update payload is assumed incomplete
            // relative to the full record, so resolve it via a refresh
            // instead of merging the delta.
            return UpdateOutcome::RefreshNeeded {
                job_id: update.job_id,
            };
        }

        let previous = self.registry.status_of(&update.job_id);
        let merged = self.registry.upsert(&update);

        let notification = match (merged, update.status) {
            (true, Some(next)) => self.note_transition(&update.job_id, previous, next),
            _ => None,
        };

        UpdateOutcome::Applied {
            notification,
            merged,
        }
    }

    /// Ingest a full snapshot from a poll tick or a refresh.
    ///
    /// Transition detection for previously-known jobs runs against the
    /// registry's stored status *before* anything is stored, so a silently
    /// dropped push event cannot swallow a notification.
    pub(crate) fn apply_snapshot(
        &mut self,
        jobs: Vec<Job>,
        source: SnapshotSource,
    ) -> Vec<Notification> {
        let mut notifications = Vec::new();

        for job in &jobs {
            if self.known_ids.insert(job.job_id.clone()) {
                // Newly discovered through the snapshot itself.
                continue;
            }
            let previous = self.registry.status_of(&job.job_id);
            if let Some(notification) =
                self.note_transition_labelled(&job.job_id, &job.name, previous, job.status)
            {
                notifications.push(notification);
            }
        }

        match source {
            SnapshotSource::Poll => self.registry.replace_all(jobs),
            SnapshotSource::Refresh => {
                for job in jobs {
                    self.registry.insert(job);
                }
            },
        }

        notifications
    }

    /// Classify a transition and build at most one notification for it,
    /// using the registry record's name as the display label.
    fn note_transition(
        &mut self,
        job_id: &str,
        previous: Option<JobStatus>,
        next: JobStatus,
    ) -> Option<Notification> {
        let label = self
            .registry
            .get(job_id)
            .map(|job| job.name.clone())
            .unwrap_or_else(|| job_id.to_string());
        self.note_transition_labelled(job_id, &label, previous, next)
    }

    /// Classify a transition and build at most one notification for it.
    ///
    /// Delivery is at-least-once, so dedup is keyed by
    /// `(job_id, terminal status)` regardless of which channel detected the
    /// transition.
    fn note_transition_labelled(
        &mut self,
        job_id: &str,
        label: &str,
        previous: Option<JobStatus>,
        next: JobStatus,
    ) -> Option<Notification> {
        let transition = classify(previous, next);
        if !transition.is_notifiable() {
            return None;
        }
        if !self.notified.insert((job_id.to_string(), next)) {
            return None;
        }

        let (severity, message) = match transition {
            Transition::BecameTerminalSuccess => (
                Severity::Success,
                format!("Validation job \"{}\" completed", label),
            ),
            Transition::BecameTerminalFailure => (
                Severity::Error,
                format!("Validation job \"{}\" failed", label),
            ),
            Transition::BecameTerminalPartial => (
                Severity::Warning,
                format!("Validation job \"{}\" finished with partial results", label),
            ),
            _ => return None,
        };

        Some(Notification::new(job_id, severity, message))
    }
}

// ── SyncController (async driver) ───────────────────────────────────────────

/// Control events delivered to the driver task.
enum CtrlEvent {
    /// A full-list fetch finished (poll tick, initial load, or refresh).
    FetchResult {
        origin: SnapshotSource,
        /// Scope the fetch was dispatched for; stale scopes are discarded.
        scope: String,
        outcome: Result<Vec<Job>>,
    },
    /// Tear the controller down.
    Stop,
}

/// Synchronization controller for one project scope.
///
/// Create with [`SyncController::start`] (or through
/// [`CrossCheckLinkClient::start_sync`](crate::client::CrossCheckLinkClient::start_sync),
/// which also wires up the push channel). Any producer can feed
/// [`ChannelEvent`]s through the sender side of the receiver passed to
/// `start`; the production producer is [`PushChannel`].
///
/// # Examples
///
/// ```rust,no_run
/// use crosscheck_link::{CrossCheckLinkClient, EventHandlers};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CrossCheckLinkClient::builder()
///     .base_url("http://localhost:8080")
///     .event_handlers(EventHandlers::new().on_notify(|n| println!("{}", n.message)))
///     .build()?;
///
/// let mut sync = client.start_sync("project-1").await?;
/// // ... the dashboard stays live until:
/// sync.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct SyncController {
    project_id: String,
    ctrl_tx: mpsc::Sender<CtrlEvent>,
    push: Option<PushChannel>,
    closed: bool,
    _task: JoinHandle<()>,
}

impl SyncController {
    /// Start a controller for one project scope.
    ///
    /// `channel_events` is the stream of push-channel events; `source`
    /// produces authoritative job lists for the initial load, the new-job
    /// refresh, and fallback polling.
    pub fn start(
        project_id: impl Into<String>,
        source: Arc<dyn JobSource>,
        channel_events: mpsc::Receiver<ChannelEvent>,
        timeouts: CrossCheckLinkTimeouts,
        handlers: EventHandlers,
    ) -> Self {
        let project_id = project_id.into();
        let (ctrl_tx, ctrl_rx) = mpsc::channel(CTRL_CHANNEL_CAPACITY);

        let task = tokio::spawn(controller_task(
            SyncState::new(project_id.clone()),
            source,
            channel_events,
            ctrl_rx,
            ctrl_tx.clone(),
            timeouts,
            handlers,
        ));

        Self {
            project_id,
            ctrl_tx,
            push: None,
            closed: false,
            _task: task,
        }
    }

    /// Attach the production push channel so the handle can expose
    /// connectivity and manual reconnect.
    pub(crate) fn with_push(mut self, push: PushChannel) -> Self {
        self.push = Some(push);
        self
    }

    /// The project scope this controller synchronizes.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Whether the push channel is currently live ("Live" vs "Polling").
    pub fn is_connected(&self) -> bool {
        self.push.as_ref().is_some_and(PushChannel::is_connected)
    }

    /// Force an immediate push-channel reconnection attempt.
    pub async fn reconnect(&self) {
        if let Some(push) = &self.push {
            push.reconnect().await;
        }
    }

    /// Stop the controller and its push channel.
    ///
    /// Safe to call multiple times — subsequent calls are no-ops.
    pub async fn stop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(push) = &self.push {
            push.disconnect().await;
        }
        let _ = self.ctrl_tx.send(CtrlEvent::Stop).await;
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        // Best-effort teardown; the push channel's own Drop covers the socket.
        let _ = self.ctrl_tx.try_send(CtrlEvent::Stop);
    }
}

/// Dispatch one full-list fetch and feed the result back as a control event.
fn dispatch_fetch(
    source: Arc<dyn JobSource>,
    scope: String,
    origin: SnapshotSource,
    ctrl_tx: mpsc::Sender<CtrlEvent>,
) {
    tokio::spawn(async move {
        let outcome = source.fetch_jobs(&scope).await;
        let _ = ctrl_tx
            .send(CtrlEvent::FetchResult {
                origin,
                scope,
                outcome,
            })
            .await;
    });
}

/// Dispatch the new-job full refresh.
///
/// The backend may not include a just-created job in the list immediately,
/// so the fetch retries with doubling delay until the id appears (bounded).
/// If it never does, the last snapshot is applied anyway and the next poll
/// tick or push event self-heals.
fn dispatch_refresh(
    source: Arc<dyn JobSource>,
    scope: String,
    job_id: String,
    initial_delay: Duration,
    max_attempts: u32,
    ctrl_tx: mpsc::Sender<CtrlEvent>,
) {
    tokio::spawn(async move {
        let mut delay = initial_delay;
        let mut last: Option<Result<Vec<Job>>> = None;

        for attempt in 0..max_attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }

            match source.fetch_jobs(&scope).await {
                Ok(jobs) => {
                    let found = jobs.iter().any(|job| job.job_id == job_id);
                    last = Some(Ok(jobs));
                    if found {
                        break;
                    }
                    log::debug!(
                        "[crosscheck-link] Refresh attempt {} does not yet contain job {}",
                        attempt + 1,
                        job_id
                    );
                },
                Err(e) => {
                    log::debug!(
                        "[crosscheck-link] Refresh attempt {} failed: {}",
                        attempt + 1,
                        e
                    );
                    last = Some(Err(e));
                },
            }
        }

        if let Some(outcome) = last {
            let _ = ctrl_tx
                .send(CtrlEvent::FetchResult {
                    origin: SnapshotSource::Refresh,
                    scope,
                    outcome,
                })
                .await;
        }
    });
}

/// The driver task: the single logical thread of execution through which
/// every registry mutation and notification passes.
async fn controller_task(
    mut state: SyncState,
    source: Arc<dyn JobSource>,
    mut channel_events: mpsc::Receiver<ChannelEvent>,
    mut ctrl_rx: mpsc::Receiver<CtrlEvent>,
    ctrl_tx: mpsc::Sender<CtrlEvent>,
    timeouts: CrossCheckLinkTimeouts,
    handlers: EventHandlers,
) {
    // Initial load: populate the registry before any delta arrives.
    dispatch_fetch(
        source.clone(),
        state.scope().to_string(),
        SnapshotSource::Refresh,
        ctrl_tx.clone(),
    );

    let mut next_poll: Option<TokioInstant> = None;
    let mut poll_in_flight = false;
    let mut channel_open = true;

    loop {
        // Re-evaluate poll gating after every event. Arming and cancelling
        // happen only here, so at most one tick is ever pending and a scope
        // teardown cannot leak a timer.
        if state.should_poll() {
            if next_poll.is_none() {
                log::debug!(
                    "[crosscheck-link] Fallback polling armed (interval {:?})",
                    timeouts.poll_interval
                );
                next_poll = Some(TokioInstant::now() + timeouts.poll_interval);
            }
        } else if next_poll.take().is_some() {
            log::debug!("[crosscheck-link] Fallback polling disarmed");
        }

        let poll_deadline = next_poll.unwrap_or_else(|| TokioInstant::now() + FAR_FUTURE);
        let poll_sleep = tokio::time::sleep_until(poll_deadline);
        tokio::pin!(poll_sleep);

        tokio::select! {
            biased;

            ctrl = ctrl_rx.recv() => {
                match ctrl {
                    Some(CtrlEvent::Stop) | None => break,
                    Some(CtrlEvent::FetchResult { origin, scope, outcome }) => {
                        if origin == SnapshotSource::Poll {
                            poll_in_flight = false;
                        }
                        if scope != state.scope() {
                            // A fetch dispatched for a previous scope; its
                            // result is stale by definition.
                            log::debug!(
                                "[crosscheck-link] Discarding fetch result for stale scope {}",
                                scope
                            );
                            continue;
                        }
                        match outcome {
                            Ok(jobs) => {
                                let notifications = state.apply_snapshot(jobs, origin);
                                for notification in notifications {
                                    handlers.emit_notify(notification);
                                }
                                handlers.emit_update(&state.snapshot());
                            },
                            Err(e) => {
                                // Transient; state untouched, next cycle retries.
                                log::warn!("[crosscheck-link] Job list fetch failed: {}", e);
                            },
                        }
                    },
                }
            }

            event = channel_events.recv(), if channel_open => {
                match event {
                    None => {
                        // Producer gone; keep serving fetch results until Stop.
                        channel_open = false;
                    },
                    Some(ChannelEvent::Up) => {
                        if state.set_connected(true) {
                            handlers.emit_connectivity(true);
                        }
                    },
                    Some(ChannelEvent::Down(reason)) => {
                        log::info!("[crosscheck-link] Push channel down: {}", reason);
                        if state.set_connected(false) {
                            handlers.emit_connectivity(false);
                        }
                    },
                    Some(ChannelEvent::Update(update)) => {
                        match state.apply_update(update) {
                            UpdateOutcome::RefreshNeeded { job_id } => {
                                log::debug!(
                                    "[crosscheck-link] New job {} observed; scheduling full refresh",
                                    job_id
                                );
                                dispatch_refresh(
                                    source.clone(),
                                    state.scope().to_string(),
                                    job_id,
                                    timeouts.refresh_retry_delay,
                                    timeouts.refresh_retry_attempts,
                                    ctrl_tx.clone(),
                                );
                            },
                            UpdateOutcome::Applied { notification, merged } => {
                                if let Some(notification) = notification {
                                    handlers.emit_notify(notification);
                                }
                                if merged {
                                    handlers.emit_update(&state.snapshot());
                                }
                            },
                        }
                    },
                }
            }

            _ = &mut poll_sleep, if next_poll.is_some() => {
                next_poll = Some(TokioInstant::now() + timeouts.poll_interval);
                // The gating condition may have flipped between scheduling
                // and firing; check again before touching the network.
                if state.should_poll() && !poll_in_flight {
                    poll_in_flight = true;
                    dispatch_fetch(
                        source.clone(),
                        state.scope().to_string(),
                        SnapshotSource::Poll,
                        ctrl_tx.clone(),
                    );
                }
            }
        }
    }

    log::debug!("[crosscheck-link] Controller for scope {} stopped", state.scope());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobProgress;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            job_id: id.to_string(),
            name: format!("job {}", id),
            job_type: "comparison".to_string(),
            status,
            progress: None,
            started_at: None,
            completed_at: None,
            success_count: 0,
            failure_count: 0,
            total_duration_ms: None,
        }
    }

    fn state_with(jobs: Vec<Job>) -> SyncState {
        let mut state = SyncState::new("proj-1".to_string());
        state.apply_snapshot(jobs, SnapshotSource::Refresh);
        state
    }

    #[test]
    fn test_unknown_job_requests_refresh_without_merging() {
        let mut state = SyncState::new("proj-1".to_string());

        let outcome =
            state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Running));

        match outcome {
            UpdateOutcome::RefreshNeeded { job_id } => assert_eq!(job_id, "abc"),
            other => panic!("Expected RefreshNeeded, got {:?}", other),
        }
        assert!(state.known_ids.contains("abc"));
        assert!(
            state.registry.get("abc").is_none(),
            "raw delta must not reach the registry"
        );
    }

    #[test]
    fn test_second_delta_while_refresh_pending_does_not_rerequest() {
        let mut state = SyncState::new("proj-1".to_string());

        state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Running));
        let outcome =
            state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Running));

        match outcome {
            UpdateOutcome::Applied { notification, merged } => {
                assert!(notification.is_none());
                assert!(!merged, "nothing in the registry to merge into yet");
            },
            other => panic!("Expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_snapshot_populates_without_notifying() {
        let mut state = SyncState::new("proj-1".to_string());
        state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Running));

        let mut refreshed = job("abc", JobStatus::Running);
        refreshed.progress = Some(JobProgress {
            total_operations: 10,
            completed_operations: 3,
            failed_operations: 0,
            skipped_operations: 0,
            percent_complete: 30.0,
        });
        let notifications =
            state.apply_snapshot(vec![refreshed], SnapshotSource::Refresh);

        assert!(notifications.is_empty(), "new job must not notify");
        assert_eq!(
            state.registry.status_of("abc"),
            Some(JobStatus::Running)
        );
        assert!(state.registry.get("abc").unwrap().progress.is_some());
    }

    #[test]
    fn test_terminal_transition_notifies_exactly_once() {
        let mut state = state_with(vec![job("abc", JobStatus::Running)]);

        let outcome =
            state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Completed));
        let notification = match outcome {
            UpdateOutcome::Applied { notification, merged } => {
                assert!(merged);
                notification.expect("first completion must notify")
            },
            other => panic!("Expected Applied, got {:?}", other),
        };
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.job_id, "abc");

        // At-least-once delivery: the same event again must stay silent.
        let outcome =
            state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Completed));
        match outcome {
            UpdateOutcome::Applied { notification, .. } => {
                assert!(notification.is_none(), "duplicate must be suppressed");
            },
            other => panic!("Expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_dedup_spans_channels() {
        let mut state = state_with(vec![job("abc", JobStatus::Running)]);

        // Push announces the completion first...
        let outcome =
            state.apply_update(JobUpdate::new("abc").with_status(JobStatus::Completed));
        assert!(matches!(
            outcome,
            UpdateOutcome::Applied { notification: Some(_), .. }
        ));

        // ...then a poll snapshot reports the same terminal state.
        let notifications =
            state.apply_snapshot(vec![job("abc", JobStatus::Completed)], SnapshotSource::Poll);
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_poll_snapshot_detects_missed_transition() {
        let mut state = state_with(vec![job("xyz", JobStatus::Running)]);

        let notifications =
            state.apply_snapshot(vec![job("xyz", JobStatus::Failed)], SnapshotSource::Poll);

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Error);
        assert_eq!(
            state.registry.status_of("xyz"),
            Some(JobStatus::Failed)
        );
        assert!(!state.should_poll(), "nothing active remains");
    }

    #[test]
    fn test_partial_success_notifies_with_warning() {
        let mut state = state_with(vec![job("p", JobStatus::Queued)]);

        let notifications = state.apply_snapshot(
            vec![job("p", JobStatus::PartialSuccess)],
            SnapshotSource::Poll,
        );

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Warning);
    }

    #[test]
    fn test_poll_snapshot_replaces_wholesale() {
        let mut state = state_with(vec![
            job("keep", JobStatus::Running),
            job("gone", JobStatus::Running),
        ]);

        state.apply_snapshot(vec![job("keep", JobStatus::Running)], SnapshotSource::Poll);

        assert!(state.registry.get("gone").is_none());
        assert!(state.registry.get("keep").is_some());
        // "gone" stays known; if it reappears it is an update, not a new job.
        assert!(state.known_ids.contains("gone"));
    }

    #[test]
    fn test_progress_update_preserves_absent_fields() {
        let mut initial = job("abc", JobStatus::Running);
        initial.success_count = 50;
        let mut state = state_with(vec![initial]);

        let mut delta = JobUpdate::new("abc");
        delta.progress = Some(JobProgress {
            total_operations: 100,
            completed_operations: 60,
            failed_operations: 2,
            skipped_operations: 0,
            percent_complete: 60.0,
        });
        let outcome = state.apply_update(delta);

        assert!(matches!(
            outcome,
            UpdateOutcome::Applied { notification: None, merged: true }
        ));
        let record = state.registry.get("abc").unwrap();
        assert_eq!(record.success_count, 50);
        assert_eq!(record.status, JobStatus::Running);
    }

    #[test]
    fn test_gating_predicate() {
        let mut state = SyncState::new("proj-1".to_string());
        assert!(!state.should_poll(), "empty registry, nothing to track");

        state.apply_snapshot(
            vec![job("a", JobStatus::Running)],
            SnapshotSource::Refresh,
        );
        assert!(state.should_poll(), "disconnected with an active job");

        state.set_connected(true);
        assert!(!state.should_poll(), "healthy push channel wins");

        state.set_connected(false);
        state.apply_snapshot(vec![job("a", JobStatus::Completed)], SnapshotSource::Poll);
        assert!(!state.should_poll(), "no active jobs left");
    }

    #[test]
    fn test_replay_is_idempotent() {
        let snapshot = vec![
            job("a", JobStatus::Running),
            job("b", JobStatus::Completed),
        ];

        let mut state = SyncState::new("proj-1".to_string());
        let first = state.apply_snapshot(snapshot.clone(), SnapshotSource::Poll);
        let replay = state.apply_snapshot(snapshot, SnapshotSource::Poll);

        assert!(first.is_empty(), "initial discovery never notifies");
        assert!(replay.is_empty(), "replay never notifies");
        assert_eq!(state.registry.active_count(), 1);
    }

    #[test]
    fn test_connectivity_change_reports_edges_only() {
        let mut state = SyncState::new("proj-1".to_string());

        assert!(state.set_connected(true));
        assert!(!state.set_connected(true), "no edge, no event");
        assert!(state.set_connected(false));
    }
}
