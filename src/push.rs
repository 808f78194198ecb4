//! WebSocket push channel for incremental job updates.
//!
//! Maintains a persistent connection scoped to a project and feeds
//! [`ChannelEvent`]s into the synchronization controller. Handles:
//!
//! - Connectivity signalling (`connected` flips false immediately on any
//!   detected failure, true only once the socket is established)
//! - Automatic reconnection with exponential backoff
//! - Manual `reconnect()` to force an immediate attempt
//! - Keepalive pings with a pong-timeout deadline
//!
//! The adapter is stateless with respect to job data: it only produces
//! events; all merging happens in the controller.

use crate::{
    auth::AuthProvider,
    error::{CrossCheckLinkError, Result},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    models::{ConnectionOptions, JobUpdate, ServerMessage},
    timeouts::CrossCheckLinkTimeouts,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message},
};

type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Maximum text message size (4 MiB). Job deltas are small; anything larger
/// is a protocol violation and gets skipped.
const MAX_WS_TEXT_MESSAGE_BYTES: usize = 4 << 20;

/// Maximum sleep duration that won't overflow `Instant + Duration`.
/// ~100 years is far enough into the future to be effectively "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Capacity of the command channel between the handle and the task.
const CMD_CHANNEL_CAPACITY: usize = 16;

/// Events produced by the push channel for the synchronization controller.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The channel is established; incremental updates are flowing.
    Up,

    /// The channel went down; consumers must assume possibly stale state.
    Down(DisconnectReason),

    /// Incremental update for a single job.
    Update(JobUpdate),
}

/// Commands sent from the public handle to the background channel task.
enum PushCmd {
    /// Force an immediate reconnection attempt, skipping any backoff sleep.
    Reconnect,
    /// Gracefully shut down the connection.
    Shutdown,
}

/// Map the HTTP base URL to the jobs WebSocket endpoint for a project.
fn resolve_push_url(base_url: &str, project_id: &str) -> Result<String> {
    let base = Url::parse(base_url.trim()).map_err(|e| {
        CrossCheckLinkError::ConfigurationError(format!("Invalid base_url '{}': {}", base_url, e))
    })?;

    if base.host_str().is_none() {
        return Err(CrossCheckLinkError::ConfigurationError(
            "base_url must include a host".to_string(),
        ));
    }

    let ws_scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(CrossCheckLinkError::ConfigurationError(format!(
                "Unsupported base_url scheme '{}'; expected http(s) or ws(s)",
                other
            )));
        },
    };

    let mut ws_url = base.clone();
    ws_url.set_scheme(ws_scheme).map_err(|_| {
        CrossCheckLinkError::ConfigurationError("Failed to set WebSocket URL scheme".to_string())
    })?;
    ws_url.set_fragment(None);
    ws_url.set_path("/v1/ws/jobs");
    ws_url.set_query(None);
    ws_url
        .query_pairs_mut()
        .append_pair("project_id", project_id);

    Ok(ws_url.to_string())
}

/// Spread keepalive pings of concurrent channels by hashing the scope key
/// into a +/-20% jitter window.
fn jitter_keepalive_interval(base: Duration, key: &str) -> Duration {
    if base.is_zero() {
        return base;
    }

    let base_ms = base.as_millis() as u64;
    if base_ms <= 1 {
        return base;
    }

    let jitter_span = (base_ms / 5).max(1);
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hashed = hasher.finish();

    let offset = (hashed % (2 * jitter_span + 1)) as i64 - jitter_span as i64;
    let jittered_ms = if offset >= 0 {
        base_ms.saturating_add(offset as u64)
    } else {
        base_ms.saturating_sub((-offset) as u64).max(1)
    };

    Duration::from_millis(jittered_ms)
}

// ── PushChannel (public handle) ─────────────────────────────────────────────

/// Persistent push connection for one project scope.
///
/// Created via [`PushChannel::connect`]. The background task owns the
/// WebSocket stream; the handle exposes the connectivity signal and
/// reconnect/disconnect commands.
pub struct PushChannel {
    /// Channel to the background task.
    cmd_tx: mpsc::Sender<PushCmd>,
    /// Whether the WebSocket is currently open.
    connected: Arc<AtomicBool>,
    /// Reconnection attempt counter (resets on success).
    reconnect_attempts: Arc<AtomicU32>,
    /// Background task handle.
    _task: JoinHandle<()>,
}

impl PushChannel {
    /// Establish the push channel and spawn its background task.
    ///
    /// Waits for the initial connection attempt to complete. An initial
    /// failure is not fatal: the task keeps reconnecting with backoff and
    /// the controller falls back to polling in the meantime.
    pub async fn connect(
        base_url: &str,
        project_id: &str,
        auth: AuthProvider,
        timeouts: CrossCheckLinkTimeouts,
        options: ConnectionOptions,
        event_handlers: EventHandlers,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self> {
        let url = resolve_push_url(base_url, project_id)?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<PushCmd>(CMD_CHANNEL_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let reconnect_attempts = Arc::new(AtomicU32::new(0));

        // The background task signals this once the initial connection
        // attempt has completed (Ok) or failed (Err).
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();

        let task = tokio::spawn(channel_task(
            cmd_rx,
            url,
            project_id.to_string(),
            auth,
            timeouts,
            options,
            event_handlers,
            events,
            connected.clone(),
            reconnect_attempts.clone(),
            Some(ready_tx),
        ));

        match ready_rx.await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                log::warn!("[crosscheck-link] Initial push connection failed: {}", e);
            },
            Err(_) => {
                log::warn!("[crosscheck-link] Channel task exited before signalling readiness");
            },
        }

        Ok(Self {
            cmd_tx,
            connected,
            reconnect_attempts,
            _task: task,
        })
    }

    /// Whether the WebSocket is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Number of reconnection attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Force an immediate reconnection attempt, skipping any backoff sleep.
    pub async fn reconnect(&self) {
        let _ = self.cmd_tx.send(PushCmd::Reconnect).await;
    }

    /// Gracefully disconnect and shut down the background task.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(PushCmd::Shutdown).await;
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        // Best-effort shutdown signal.
        let _ = self.cmd_tx.try_send(PushCmd::Shutdown);
    }
}

// ── Background channel task ─────────────────────────────────────────────────

/// Establish the WebSocket connection.
async fn establish_push(
    url: &str,
    auth: &AuthProvider,
    timeouts: &CrossCheckLinkTimeouts,
    event_handlers: &EventHandlers,
) -> Result<WebSocketStream> {
    log::debug!("[crosscheck-link] Establishing push connection to {}", url);

    let mut request = url.into_client_request().map_err(|e| {
        CrossCheckLinkError::WebSocketError(format!("Failed to build WebSocket request: {}", e))
    })?;
    auth.apply_to_ws_request(&mut request)?;

    let connect_result = if !CrossCheckLinkTimeouts::is_no_timeout(timeouts.connection_timeout) {
        tokio::time::timeout(timeouts.connection_timeout, connect_async(request)).await
    } else {
        Ok(connect_async(request).await)
    };

    match connect_result {
        Ok(Ok((stream, _))) => Ok(stream),
        Ok(Err(tokio_tungstenite::tungstenite::error::Error::Http(response))) => {
            let status = response.status();
            let body_text = response
                .into_body()
                .as_ref()
                .and_then(|b| {
                    if b.is_empty() {
                        None
                    } else {
                        Some(String::from_utf8_lossy(b).into_owned())
                    }
                })
                .unwrap_or_default();
            let message = match status.as_u16() {
                401 => "Unauthorized: WebSocket requires valid credentials".to_string(),
                403 => "Forbidden: Access to WebSocket denied".to_string(),
                code => {
                    if body_text.is_empty() {
                        format!("WebSocket HTTP error: {}", code)
                    } else {
                        format!("WebSocket HTTP error {}: {}", code, body_text)
                    }
                },
            };
            event_handlers.emit_error(ConnectionError::new(&message, false));
            Err(CrossCheckLinkError::WebSocketError(message))
        },
        Ok(Err(e)) => {
            let msg = format!("Connection failed: {}", e);
            event_handlers.emit_error(ConnectionError::new(&msg, true));
            Err(CrossCheckLinkError::WebSocketError(msg))
        },
        Err(_) => {
            let msg = format!("Connection timeout ({:?})", timeouts.connection_timeout);
            event_handlers.emit_error(ConnectionError::new(&msg, true));
            Err(CrossCheckLinkError::TimeoutError(msg))
        },
    }
}

/// Parse a text frame and forward a job update to the controller.
///
/// Malformed payloads (including a `job_update` without a `job_id`) are
/// logged and dropped; they must not corrupt downstream state.
async fn forward_frame(text: &str, events: &mpsc::Sender<ChannelEvent>) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::JobUpdate { data }) => {
            if events.send(ChannelEvent::Update(data)).await.is_err() {
                log::debug!("[crosscheck-link] Controller dropped; discarding update");
            }
        },
        Ok(ServerMessage::Error { code, message }) => {
            log::warn!(
                "[crosscheck-link] Server error on push channel: {} ({})",
                message,
                code
            );
        },
        Err(e) => {
            log::warn!("[crosscheck-link] Dropping unparseable push frame: {}", e);
        },
    }
}

/// The background task managing the push WebSocket.
///
/// Lifecycle:
/// 1. Establish the WebSocket connection
/// 2. Enter event loop: read frames + process commands + keepalive pings
/// 3. On disconnect: attempt auto-reconnection with exponential backoff
async fn channel_task(
    mut cmd_rx: mpsc::Receiver<PushCmd>,
    url: String,
    project_id: String,
    auth: AuthProvider,
    timeouts: CrossCheckLinkTimeouts,
    options: ConnectionOptions,
    event_handlers: EventHandlers,
    events: mpsc::Sender<ChannelEvent>,
    connected: Arc<AtomicBool>,
    reconnect_attempts: Arc<AtomicU32>,
    ready_tx: Option<oneshot::Sender<Result<()>>>,
) {
    let mut ws_stream: Option<WebSocketStream> = None;
    let mut shutdown_requested = false;
    // Set when a manual reconnect tears down a live socket, so the next
    // attempt skips the backoff sleep.
    let mut force_reconnect = false;

    // Keepalive configuration
    let keepalive_dur = if timeouts.keepalive_interval.is_zero() {
        FAR_FUTURE
    } else {
        jitter_keepalive_interval(timeouts.keepalive_interval, &project_id)
    };
    let has_keepalive = !timeouts.keepalive_interval.is_zero();
    let mut idle_deadline = TokioInstant::now() + keepalive_dur;

    // Pong timeout: after sending a Ping, we must receive *some* frame
    // (typically a Pong) within this window or we consider the connection dead.
    let pong_timeout_dur = timeouts.pong_timeout;
    let has_pong_timeout = has_keepalive && !pong_timeout_dur.is_zero();
    let mut awaiting_pong = false;
    let mut pong_deadline = TokioInstant::now() + FAR_FUTURE; // inactive until first Ping

    // Initial connection attempt
    match establish_push(&url, &auth, &timeouts, &event_handlers).await {
        Ok(stream) => {
            ws_stream = Some(stream);
            connected.store(true, Ordering::SeqCst);
            let _ = events.send(ChannelEvent::Up).await;
            idle_deadline = TokioInstant::now() + keepalive_dur;
            if let Some(tx) = ready_tx {
                let _ = tx.send(Ok(()));
            }
        },
        Err(e) => {
            log::warn!("[crosscheck-link] Initial connection failed: {}", e);
            if let Some(tx) = ready_tx {
                let _ = tx.send(Err(e));
            }
        },
    }

    loop {
        if shutdown_requested {
            if let Some(ref mut ws) = ws_stream {
                let _ = ws.close(None).await;
            }
            let was_connected = connected.swap(false, Ordering::SeqCst);
            if was_connected {
                let _ = events
                    .send(ChannelEvent::Down(DisconnectReason::new(
                        "Client disconnected",
                    )))
                    .await;
            }
            return;
        }

        if let Some(ref mut ws) = ws_stream {
            // Connected — multiplex between frames, commands, keepalive, pong timeout
            let idle_sleep = tokio::time::sleep_until(idle_deadline);
            tokio::pin!(idle_sleep);

            let pong_sleep = tokio::time::sleep_until(pong_deadline);
            tokio::pin!(pong_sleep);

            tokio::select! {
                biased;

                // Pong timeout: no frame arrived since we sent our Ping.
                _ = &mut pong_sleep, if has_pong_timeout && awaiting_pong => {
                    log::warn!(
                        "[crosscheck-link] Pong timeout ({:?}) — server unresponsive, treating connection as dead",
                        pong_timeout_dur,
                    );
                    connected.store(false, Ordering::SeqCst);
                    let _ = events
                        .send(ChannelEvent::Down(DisconnectReason::new(format!(
                            "Pong timeout ({:?})",
                            pong_timeout_dur,
                        ))))
                        .await;
                    awaiting_pong = false;
                    ws_stream = None;
                    // Fall through to reconnection
                    continue;
                }

                // Commands from the public handle
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(PushCmd::Reconnect) => {
                            // Drop the current socket and re-establish.
                            log::info!("[crosscheck-link] Manual reconnect requested");
                            let _ = ws.close(None).await;
                            connected.store(false, Ordering::SeqCst);
                            let _ = events
                                .send(ChannelEvent::Down(DisconnectReason::new(
                                    "Manual reconnect",
                                )))
                                .await;
                            ws_stream = None;
                            force_reconnect = true;
                            continue;
                        },
                        Some(PushCmd::Shutdown) | None => {
                            shutdown_requested = true;
                            continue;
                        },
                    }
                }

                // Keepalive ping
                _ = &mut idle_sleep, if has_keepalive && !awaiting_pong => {
                    if let Err(e) = ws.send(Message::Ping(Bytes::new())).await {
                        log::warn!("[crosscheck-link] Failed to send keepalive ping: {}", e);
                        connected.store(false, Ordering::SeqCst);
                        let _ = events
                            .send(ChannelEvent::Down(DisconnectReason::new(format!(
                                "Keepalive ping failed: {}",
                                e,
                            ))))
                            .await;
                        awaiting_pong = false;
                        ws_stream = None;
                        continue;
                    }
                    if has_pong_timeout {
                        awaiting_pong = true;
                        pong_deadline = TokioInstant::now() + pong_timeout_dur;
                    }
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                }

                // WebSocket frames
                frame = ws.next() => {
                    // Any frame received proves the connection is alive.
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    if awaiting_pong {
                        awaiting_pong = false;
                        pong_deadline = TokioInstant::now() + FAR_FUTURE;
                    }

                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if text.len() > MAX_WS_TEXT_MESSAGE_BYTES {
                                log::warn!(
                                    "[crosscheck-link] Text message too large ({} bytes)",
                                    text.len()
                                );
                                continue;
                            }
                            forward_frame(&text, &events).await;
                        },
                        Some(Ok(Message::Binary(_))) => {
                            log::warn!("[crosscheck-link] Unexpected binary frame; skipping");
                        },
                        Some(Ok(Message::Close(frame))) => {
                            let reason = if let Some(f) = frame {
                                DisconnectReason::with_code(f.reason.to_string(), f.code.into())
                            } else {
                                DisconnectReason::new("Server closed connection")
                            };
                            connected.store(false, Ordering::SeqCst);
                            let _ = events.send(ChannelEvent::Down(reason)).await;
                            ws_stream = None;
                            continue;
                        },
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = ws.send(Message::Pong(payload)).await;
                        },
                        Some(Ok(Message::Pong(_))) => {},
                        Some(Ok(Message::Frame(_))) => {},
                        Some(Err(e)) => {
                            let msg = e.to_string();
                            event_handlers.emit_error(ConnectionError::new(&msg, true));
                            connected.store(false, Ordering::SeqCst);
                            let _ = events
                                .send(ChannelEvent::Down(DisconnectReason::new(format!(
                                    "WebSocket error: {}",
                                    msg,
                                ))))
                                .await;
                            ws_stream = None;
                            continue;
                        },
                        None => {
                            connected.store(false, Ordering::SeqCst);
                            let _ = events
                                .send(ChannelEvent::Down(DisconnectReason::new(
                                    "WebSocket stream ended",
                                )))
                                .await;
                            ws_stream = None;
                            continue;
                        },
                    }
                }
            }
        } else {
            // ── Not connected — attempt reconnection or wait for commands ──

            if force_reconnect {
                force_reconnect = false;
                // Skip straight to the connection attempt below.
            } else if !options.auto_reconnect {
                match cmd_rx.recv().await {
                    Some(PushCmd::Reconnect) => {
                        // Manual reconnect is the only way back up.
                    },
                    Some(PushCmd::Shutdown) | None => {
                        return;
                    },
                }
            } else {
                let attempt = reconnect_attempts.fetch_add(1, Ordering::SeqCst);
                let mut skip_backoff = false;
                if let Some(max) = options.max_reconnect_attempts {
                    if attempt >= max {
                        log::warn!(
                            "[crosscheck-link] Max reconnection attempts ({}) reached",
                            max
                        );
                        event_handlers.emit_error(ConnectionError::new(
                            format!("Max reconnection attempts ({}) reached", max),
                            false,
                        ));
                        // Wait for a manual reconnect or shutdown.
                        match cmd_rx.recv().await {
                            Some(PushCmd::Reconnect) => {
                                reconnect_attempts.store(0, Ordering::SeqCst);
                                skip_backoff = true;
                            },
                            Some(PushCmd::Shutdown) | None => return,
                        }
                    }
                }

                if !skip_backoff {
                    let delay = std::cmp::min(
                        options
                            .reconnect_delay_ms
                            .saturating_mul(2u64.saturating_pow(attempt)),
                        options.max_reconnect_delay_ms,
                    );

                    log::info!(
                        "[crosscheck-link] Attempting reconnection in {}ms (attempt {})",
                        delay,
                        attempt + 1
                    );

                    // Wait out the backoff, but let Reconnect/Shutdown cut it short.
                    let sleep_fut = tokio::time::sleep(Duration::from_millis(delay));
                    tokio::pin!(sleep_fut);

                    tokio::select! {
                        biased;
                        cmd = cmd_rx.recv() => {
                            match cmd {
                                Some(PushCmd::Reconnect) => {
                                    log::info!("[crosscheck-link] Manual reconnect — skipping backoff");
                                },
                                Some(PushCmd::Shutdown) | None => {
                                    shutdown_requested = true;
                                    continue;
                                },
                            }
                        }
                        _ = &mut sleep_fut => {}
                    }
                }
            }

            // Attempt reconnection
            match establish_push(&url, &auth, &timeouts, &event_handlers).await {
                Ok(stream) => {
                    log::info!("[crosscheck-link] Reconnection successful");
                    reconnect_attempts.store(0, Ordering::SeqCst);
                    connected.store(true, Ordering::SeqCst);
                    if events.send(ChannelEvent::Up).await.is_err() {
                        // Controller is gone — nothing left to serve.
                        return;
                    }
                    ws_stream = Some(stream);
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    awaiting_pong = false;
                    pong_deadline = TokioInstant::now() + FAR_FUTURE;
                },
                Err(e) => {
                    log::warn!("[crosscheck-link] Reconnection attempt failed: {}", e);
                    // Loop back — the next iteration computes a longer delay.
                },
            }
        }
    }
}
