//! Connection lifecycle manager.
//!
//! Owns the single logical connection to the backing store: starts attempts,
//! mirrors the transport's readiness, and schedules retries.
//!
//! # Retry cycles
//! ```text
//! connect() fails      → retry_attempts += 1
//!                      → Backoff timer after base * 2^(attempts-1), while attempts < max
//! link lost (event)    → retry_attempts = 0
//!                      → Reconnect timer after base
//! connected (event)    → retry_attempts = 0, pending timer cancelled
//! ```
//!
//! All mutable state sits behind one lock that is never held across an
//! `.await`, so every transition is observed whole. At most one attempt is in
//! flight and at most one timer is pending; installing a timer cancels the
//! previous one, and a timer that wakes after being superseded does nothing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::SharedConfig;
use crate::database::state::ConnectionState;
use crate::database::transport::{redact_url, ConnectOptions, Transport, TransportEvent};
use crate::observability::metrics;
use crate::resilience::backoff_delay;

/// Stand-in deadline for delays too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Why a timer was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryKind {
    /// Follows a failed attempt; delay grows exponentially.
    Backoff,
    /// Follows a lost link; fixed delay, fresh cycle.
    Reconnect,
}

impl RetryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RetryKind::Backoff => "backoff",
            RetryKind::Reconnect => "reconnect",
        }
    }
}

impl fmt::Display for RetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The timer currently waiting to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRetry {
    pub kind: RetryKind,
    pub delay: Duration,
    pub due: Instant,
}

impl PendingRetry {
    pub fn remaining(&self) -> Duration {
        self.due.saturating_duration_since(Instant::now())
    }
}

/// Consistent view of the manager at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    pub retry_attempts: u32,
    pub max_retry_attempts: u32,
    pub is_connecting: bool,
    pub pending_retry: Option<PendingRetry>,
    pub retries_scheduled: u64,
}

struct Timer {
    generation: u64,
    retry: PendingRetry,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    retry_attempts: u32,
    is_connecting: bool,
    pending: Option<Timer>,
    generation: u64,
    retries_scheduled: u64,
    stopped: bool,
}

/// Manages the lifecycle of the connection to the backing store.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    config: SharedConfig,
    inner: Mutex<Inner>,
    this: Weak<ConnectionManager>,
}

impl ConnectionManager {
    /// Create a manager. The connection URL and tunables are read from
    /// `config` on every attempt, so reloads take effect on the next one.
    pub fn new(transport: Arc<dyn Transport>, config: SharedConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            transport,
            config,
            inner: Mutex::new(Inner::default()),
            this: this.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current readiness. Cheap; safe to call on every request.
    pub fn status(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        let max_retry_attempts = self.config.load().database.max_retry_attempts;
        let inner = self.lock();
        ConnectionSnapshot {
            state: inner.state,
            retry_attempts: inner.retry_attempts,
            max_retry_attempts,
            is_connecting: inner.is_connecting,
            pending_retry: inner.pending.as_ref().map(|t| t.retry),
            retries_scheduled: inner.retries_scheduled,
        }
    }

    /// Subscribe to transport events and mirror them until `shutdown` fires.
    ///
    /// Call once at startup, before the first `connect()`.
    pub fn start(&self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let mut events = self.transport.subscribe();
        let this = self.this.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    received = events.recv() => match received {
                        Ok(event) => match this.upgrade() {
                            Some(manager) => manager.handle_event(event),
                            None => break,
                        },
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Database event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("Database event listener stopped");
        })
    }

    /// Start `connect()` in the background and return immediately.
    pub fn trigger_connect(&self) {
        if let Some(manager) = self.this.upgrade() {
            tokio::spawn(async move { manager.connect().await });
        }
    }

    /// Attempt to connect, unless an attempt is already running or the link
    /// is up. Failures are handled here: counted, classified, and retried
    /// with backoff until the attempt cap is reached.
    pub async fn connect(&self) {
        let config = self.config.load_full();
        let db = &config.database;

        let url = {
            let mut inner = self.lock();
            if inner.stopped {
                return;
            }
            if inner.is_connecting {
                tracing::debug!("Database connection attempt already in progress");
                return;
            }
            if inner.state == ConnectionState::Connected {
                tracing::debug!("Database already connected");
                return;
            }
            let Some(url) = db.resolve_url() else {
                tracing::error!(
                    env = %db.url_env,
                    "Database URL is not configured; set the environment variable or database.url"
                );
                metrics::record_missing_target();
                return;
            };
            // Arriving with the cap exhausted starts a fresh cycle. This is an
            // external trigger, or a pending timer after a reload lowered the cap.
            if inner.retry_attempts >= db.max_retry_attempts {
                inner.retry_attempts = 0;
            }
            inner.is_connecting = true;
            url
        };

        tracing::info!(url = %redact_url(&url), "Connecting to database");
        metrics::record_connect_attempt();
        let result = self.transport.connect(&url, &ConnectOptions::from(db)).await;

        let mut inner = self.lock();
        inner.is_connecting = false;
        match result {
            Ok(()) => tracing::info!("Database connection attempt succeeded"),
            Err(e) => {
                inner.retry_attempts += 1;
                let kind = e.kind();
                metrics::record_connect_failure(kind);
                tracing::error!(
                    attempt = inner.retry_attempts,
                    max_attempts = db.max_retry_attempts,
                    kind = %kind,
                    error = %e,
                    "Database connection failed: {}",
                    kind.hint()
                );

                if inner.stopped {
                    return;
                }
                if inner.retry_attempts < db.max_retry_attempts {
                    let delay = backoff_delay(inner.retry_attempts, db.base_delay());
                    self.schedule(&mut inner, RetryKind::Backoff, delay);
                } else {
                    tracing::error!(
                        attempts = inner.retry_attempts,
                        "Maximum database retry attempts reached; waiting for a reconnect trigger"
                    );
                }
            }
        }
    }

    /// Apply one transport event.
    pub fn handle_event(&self, event: TransportEvent) {
        let mut inner = self.lock();
        let previous = inner.state;

        match event {
            TransportEvent::Connecting => inner.state = ConnectionState::Connecting,
            TransportEvent::Disconnecting => inner.state = ConnectionState::Disconnecting,
            TransportEvent::Connected => {
                inner.state = ConnectionState::Connected;
                inner.retry_attempts = 0;
                inner.is_connecting = false;
                if let Some(timer) = inner.pending.take() {
                    timer.cancel.cancel();
                }
                tracing::info!("Database connected");
            }
            TransportEvent::Disconnected => {
                inner.state = ConnectionState::Disconnected;
                if inner.stopped {
                    tracing::info!("Database disconnected");
                } else if inner.is_connecting || previous == ConnectionState::Connecting {
                    tracing::debug!("Disconnect during a connection attempt; not scheduling a reconnect");
                } else {
                    tracing::warn!("Database disconnected; scheduling reconnect");
                    inner.retry_attempts = 0;
                    let delay = self.config.load().database.base_delay();
                    self.schedule(&mut inner, RetryKind::Reconnect, delay);
                }
            }
            TransportEvent::Error(e) => {
                tracing::warn!(kind = %e.kind(), error = %e, "Database transport error");
            }
        }

        if inner.state != previous {
            metrics::set_connection_state(inner.state);
        }
    }

    /// Install a timer, cancelling whichever one was pending.
    fn schedule(&self, inner: &mut Inner, kind: RetryKind, delay: Duration) {
        if let Some(old) = inner.pending.take() {
            old.cancel.cancel();
            tracing::debug!(kind = %old.retry.kind, "Superseded pending database retry");
        }

        inner.generation += 1;
        inner.retries_scheduled += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();
        inner.pending = Some(Timer {
            generation,
            retry: PendingRetry {
                kind,
                delay,
                due: Instant::now()
                    .checked_add(delay)
                    .unwrap_or_else(|| Instant::now() + FAR_FUTURE),
            },
            cancel: cancel.clone(),
        });

        metrics::record_retry_scheduled(kind);
        tracing::info!(
            kind = %kind,
            delay_secs = delay.as_secs(),
            attempt = inner.retry_attempts,
            "Database retry scheduled"
        );

        let this = self.this.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let Some(manager) = this.upgrade() {
                manager.fire(generation).await;
            }
        });
    }

    async fn fire(&self, generation: u64) {
        {
            let mut inner = self.lock();
            match &inner.pending {
                Some(timer) if timer.generation == generation => inner.pending = None,
                _ => return,
            }
        }
        self.connect().await;
    }

    /// Stop retrying and close the transport.
    pub async fn shutdown(&self) {
        {
            let mut inner = self.lock();
            inner.stopped = true;
            if let Some(timer) = inner.pending.take() {
                timer.cancel.cancel();
            }
        }
        self.transport.close().await;
        tracing::info!("Database connection manager stopped");
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectionManager")
            .field("state", &inner.state)
            .field("retry_attempts", &inner.retry_attempts)
            .field("is_connecting", &inner.is_connecting)
            .field("pending", &inner.pending.as_ref().map(|t| t.retry))
            .finish()
    }
}
