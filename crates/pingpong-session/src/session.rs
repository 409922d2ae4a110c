//! Heartbeat session state machine.
//!
//! One `HeartbeatSession` owns one logical user connection. A spawned driver
//! task runs the connect-with-retry loop; inside an open connection a single
//! `select!` event loop multiplexes inbound frames, the ping interval, the
//! pong deadline and the shutdown token, so no two transitions ever run
//! concurrently and session state needs no locking discipline beyond
//! snapshot reads from the outside.

use crate::config::{SessionConfig, UserIdentity};
use crate::error::SessionError;
use crate::heartbeat::HeartbeatClock;
use crate::observer::ObserverRegistry;
use crate::SessionResult;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use pingpong_core::{
    epoch_ms, parse_frame, session_id, ConnectionStatus, Frame, PingMessage, PingPongStats,
    StatsAccumulator,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
}

/// Heartbeat session handle. Cheap to clone; all clones drive the same
/// session.
#[derive(Clone)]
pub struct HeartbeatSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    state: RwLock<SessionState>,
    identity: RwLock<Option<UserIdentity>>,
    session_id: RwLock<Option<String>>,
    reconnect_attempts: RwLock<u32>,
    /// Generation of the driver task that currently owns the connection
    /// lifecycle; zero when none does. Guards against overlapping
    /// `connect` calls, and lets a superseded driver tell on its way out
    /// that it has lost ownership.
    driver_slot: AtomicU64,
    driver_seq: AtomicU64,
    shutdown: RwLock<CancellationToken>,
    stats: RwLock<StatsAccumulator>,
    observers: ObserverRegistry,
}

impl HeartbeatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                state: RwLock::new(SessionState::Idle),
                identity: RwLock::new(None),
                session_id: RwLock::new(None),
                reconnect_attempts: RwLock::new(0),
                driver_slot: AtomicU64::new(0),
                driver_seq: AtomicU64::new(0),
                shutdown: RwLock::new(CancellationToken::new()),
                stats: RwLock::new(StatsAccumulator::new()),
                observers: ObserverRegistry::new(),
            }),
        }
    }

    /// Start the session for the given identity.
    ///
    /// Idempotent: a no-op while a driver task owns the session, so
    /// duplicate sockets cannot be created and the retry counter is left
    /// untouched. `disconnect` releases ownership synchronously, so a
    /// `connect` issued right after it starts a fresh driver. Counters
    /// restart from zero with each fresh driver. Transport-open failures
    /// are absorbed by the reconnect procedure and never surfaced here;
    /// the only error is a malformed endpoint.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self, identity: UserIdentity) -> SessionResult<()> {
        self.inner.config.validate_endpoint()?;

        let generation = self.inner.driver_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .inner
            .driver_slot
            .compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("connect ignored: session already connecting or open");
            return Ok(());
        }

        *self.inner.identity.write() = Some(identity);
        *self.inner.reconnect_attempts.write() = 0;
        *self.inner.stats.write() = StatsAccumulator::new();

        let token = CancellationToken::new();
        *self.inner.shutdown.write() = token.clone();

        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_driver(inner, token, generation));
        Ok(())
    }

    /// Tear the session down. Best-effort and safe from any state,
    /// including mid-backoff; pending timers are cancelled through the
    /// shutdown token and no further sends occur.
    pub fn disconnect(&self) {
        self.inner.shutdown.read().cancel();
        // Release driver ownership now rather than when the cancelled task
        // unwinds, so a follow-up connect starts a fresh driver.
        self.inner.driver_slot.store(0, Ordering::SeqCst);
        *self.inner.state.write() = SessionState::Idle;
        *self.inner.session_id.write() = None;
        self.inner.stats.write().mark_idle();
        self.inner
            .observers
            .notify_status(&ConnectionStatus::disconnected());
        info!("heartbeat session disconnected");
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Session token of the current connection attempt, if any.
    pub fn session_id(&self) -> Option<String> {
        self.inner.session_id.read().clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        *self.inner.reconnect_attempts.read()
    }

    /// Current statistics snapshot (a copy).
    pub fn stats(&self) -> PingPongStats {
        self.inner.stats.read().snapshot(epoch_ms())
    }

    /// Register a status observer. Multicast: joins any previously
    /// registered observers, each receives every snapshot.
    pub fn on_connection_status_change(
        &self,
        callback: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) {
        self.inner.observers.subscribe_status(Box::new(callback));
    }

    /// Register a stats observer, notified after every ping send and pong
    /// receipt.
    pub fn on_stats_update(&self, callback: impl Fn(&PingPongStats) + Send + Sync + 'static) {
        self.inner.observers.subscribe_stats(Box::new(callback));
    }
}

/// Why an open connection's event loop ended.
enum SessionExit {
    /// `disconnect()` was called; the caller publishes the final status.
    Shutdown,
    /// Server closed with the normal-closure code; no reconnect.
    NormalClose,
    /// Liveness failure, routed into the reconnect procedure.
    Failure(SessionError),
}

/// Write the session state, unless `disconnect` already cancelled this
/// driver. From that moment on the state belongs to `disconnect` (and any
/// successor driver); a write from the outgoing task would clobber it.
fn set_state_unless_cancelled(
    inner: &SessionInner,
    token: &CancellationToken,
    next: SessionState,
) {
    let mut state = inner.state.write();
    if !token.is_cancelled() {
        *state = next;
    }
}

async fn run_driver(inner: Arc<SessionInner>, token: CancellationToken, generation: u64) {
    loop {
        if token.is_cancelled() {
            break;
        }

        set_state_unless_cancelled(&inner, &token, SessionState::Connecting);

        let Some(identity) = inner.identity.read().clone() else {
            set_state_unless_cancelled(&inner, &token, SessionState::Idle);
            break;
        };

        // Fresh token per connection attempt.
        let session_id = session_id::generate(epoch_ms());
        *inner.session_id.write() = Some(session_id.clone());

        let url = match inner.config.connect_url(&identity, &session_id) {
            Ok(url) => url,
            Err(e) => {
                error!(%e, "cannot build connect URL");
                set_state_unless_cancelled(&inner, &token, SessionState::Idle);
                break;
            }
        };

        match connect_async_tls_with_config(url.as_str(), None, true, None).await {
            Ok((ws_stream, _response)) => {
                // A disconnect may have landed while the handshake was in
                // flight; the open must not be published then.
                if token.is_cancelled() {
                    break;
                }
                info!(session_id = %session_id, "heartbeat connection open");
                set_state_unless_cancelled(&inner, &token, SessionState::Open);
                *inner.reconnect_attempts.write() = 0;
                inner.stats.write().mark_connected(epoch_ms());
                inner.observers.notify_status(&ConnectionStatus::opened());

                match run_session(&inner, ws_stream, &token, &identity, &session_id).await {
                    SessionExit::Shutdown => {
                        // `disconnect` owns the Idle transition.
                        break;
                    }
                    SessionExit::NormalClose => {
                        info!("connection closed normally by server");
                        inner
                            .observers
                            .notify_status(&ConnectionStatus::disconnected());
                        set_state_unless_cancelled(&inner, &token, SessionState::Idle);
                        break;
                    }
                    SessionExit::Failure(e) => {
                        warn!(%e, "heartbeat connection lost");
                        inner
                            .observers
                            .notify_status(&ConnectionStatus::disconnected());
                    }
                }
            }
            Err(e) => {
                warn!(%e, "transport open failed");
            }
        }

        if token.is_cancelled() {
            break;
        }

        // Reconnect procedure: bounded retries, exponential backoff.
        if *inner.reconnect_attempts.read() >= inner.config.max_reconnect_attempts {
            error!(
                attempts = inner.config.max_reconnect_attempts,
                "reconnect attempts exhausted; call connect() to retry"
            );
            set_state_unless_cancelled(&inner, &token, SessionState::Idle);
            break;
        }

        let attempt = {
            let mut attempts = inner.reconnect_attempts.write();
            *attempts += 1;
            *attempts
        };
        set_state_unless_cancelled(&inner, &token, SessionState::Reconnecting);

        let delay = backoff_delay(
            attempt,
            inner.config.reconnect_base_delay_ms,
            inner.config.reconnect_max_delay_ms,
        );
        warn!(
            attempt,
            max = inner.config.max_reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = token.cancelled() => {
                break;
            }
        }
    }

    // Release ownership, unless a successor driver already took it over.
    let _ = inner
        .driver_slot
        .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
}

async fn run_session(
    inner: &Arc<SessionInner>,
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    token: &CancellationToken,
    identity: &UserIdentity,
    session_id: &str,
) -> SessionExit {
    let (mut write, mut read) = ws_stream.split();

    let period = Duration::from_millis(inner.config.ping_interval_ms);
    let mut ping_timer = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut clock = HeartbeatClock::new(Duration::from_millis(inner.config.pong_timeout_ms));

    loop {
        // At most one armed deadline; re-arming on the next ping replaces it.
        let pong_deadline = clock.deadline();
        let deadline_expired = async move {
            match pong_deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = token.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(?e, "failed to send close frame during shutdown");
                }
                return SessionExit::Shutdown;
            }

            _ = ping_timer.tick() => {
                let now = epoch_ms();
                let ping = PingMessage::new(
                    identity.user_id.clone(),
                    now,
                    Some(session_id.to_string()),
                );
                let text = match serde_json::to_string(&ping) {
                    Ok(text) => text,
                    Err(e) => return SessionExit::Failure(e.into()),
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    return SessionExit::Failure(e.into());
                }

                clock.record_ping(now);
                let snapshot = {
                    let mut stats = inner.stats.write();
                    stats.record_ping(now);
                    stats.snapshot(now)
                };
                inner.observers.notify_stats(&snapshot);
                debug!(session_id, timestamp = now, "sent heartbeat ping");
            }

            () = deadline_expired => {
                warn!(
                    session_id,
                    timeout_ms = inner.config.pong_timeout_ms,
                    "pong deadline expired"
                );
                return SessionExit::Failure(SessionError::PongTimeout);
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_frame(inner, &mut clock, &text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            return SessionExit::Failure(e.into());
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((1005, "no close frame".to_string()));
                        if code == 1000 {
                            return SessionExit::NormalClose;
                        }
                        warn!(code, %reason, "connection closed by server");
                        return SessionExit::Failure(SessionError::ConnectionClosed {
                            code,
                            reason,
                        });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return SessionExit::Failure(e.into());
                    }
                    None => {
                        return SessionExit::Failure(SessionError::ConnectionClosed {
                            code: 1006,
                            reason: "stream ended".to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Handle one inbound text frame. Malformed frames are logged and dropped;
/// they never tear the session down.
fn handle_text_frame(inner: &SessionInner, clock: &mut HeartbeatClock, text: &str) {
    match parse_frame(text) {
        Ok(Frame::Pong(pong)) => {
            let now = epoch_ms();
            // Latency from the echoed send time; independent of server
            // clock skew, and of the optional server-side responseTime.
            let latency = (now - pong.timestamp).max(0);

            clock.record_pong(now);
            let snapshot = {
                let mut stats = inner.stats.write();
                stats.record_pong(now, latency);
                stats.snapshot(now)
            };
            inner.observers.notify_stats(&snapshot);

            let status = ConnectionStatus::measured(latency, clock.last_ping_ms(), now);
            inner.observers.notify_status(&status);
            debug!(latency_ms = latency, quality = %status.quality, "received pong");
        }
        Ok(Frame::Ping(_)) => {
            debug!("ignoring server-initiated ping frame");
        }
        Ok(Frame::Unrecognized(message_type)) => {
            debug!(message_type = %message_type, "ignoring unrecognized message");
        }
        Err(e) => {
            warn!(%e, "dropping malformed frame");
        }
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max_ms`.
/// No jitter; retry schedules are exact.
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
    Duration::from_millis(delay)
}
