//! The listener lifecycle.
//!
//! ```text
//! Idle ─ start ─→ Connecting ─ ok ─→ Waiting ⇄ Decoding
//!                    │                  │
//!                  error          fault or stop
//!                    ↓                  ↓
//!                 Cleanup ←─────────────┘
//!                    │
//!          stopped? ─┴─ no ─→ Backoff ─→ Connecting
//!              │
//!              └─ yes ─→ Stopped
//! ```
//!
//! One worker task runs the whole loop and is the only owner of the
//! session. Stop interrupts connecting, waiting and backing off; cleanup
//! and in-flight commands are bounded by the I/O timeout.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mailwatch_imap::types::Uid;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ConnectionConfig, ListenerSettings, validate_config};
use crate::decode::decode;
use crate::error::{ConfigError, SessionFault};
use crate::run_state::RunState;
use crate::session::{FetchedMessage, Session, SessionConnector};
use crate::sink::MessageSink;
use crate::transport::{TlsTransport, Transport};

/// Where the listener is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Created, not started.
    Idle,
    /// Opening a session.
    Connecting,
    /// In IMAP IDLE, waiting for new mail.
    Waiting,
    /// Handing a fetched batch to the consumer.
    Decoding,
    /// Releasing the session or a failed attempt.
    Cleanup,
    /// Sleeping before the next attempt.
    Backoff,
    /// Finished; never restarts.
    Stopped,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Connection attempts made.
    pub attempts: u64,
    /// Sessions successfully opened.
    pub sessions: u64,
    /// Messages handed to the consumer.
    pub delivered: u64,
}

struct Shared<T> {
    connector: SessionConnector<T>,
    sink: MessageSink,
    run: RunState,
    state: watch::Sender<ListenerState>,
    attempts: AtomicU64,
    sessions: AtomicU64,
    delivered: AtomicU64,
}

impl<T> Shared<T> {
    fn set_state(&self, state: ListenerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "listener state");
        }
    }

    fn deliver(&self, message: &FetchedMessage) {
        let decoded = decode(&message.raw);
        debug!(
            seq = %message.seq,
            uid = ?message.uid.map(Uid::get),
            subject = ?decoded.subject(),
            "delivering message"
        );

        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink(&decoded))).is_err() {
            error!(seq = %message.seq, "message consumer panicked");
            return;
        }
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keeps one IDLE session to a mailbox alive and forwards new messages.
///
/// # Example
///
/// ```ignore
/// let supervisor = ListenerSupervisor::new(config, ListenerSettings::default(), log_sink());
/// supervisor.start()?;
/// tokio::signal::ctrl_c().await?;
/// supervisor.stop().await;
/// ```
pub struct ListenerSupervisor<T: Transport = TlsTransport> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> std::fmt::Debug for ListenerSupervisor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSupervisor")
            .field("config", self.shared.connector.config())
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ListenerSupervisor<TlsTransport> {
    /// Creates a listener that connects over implicit TLS.
    #[must_use]
    pub fn new(config: ConnectionConfig, settings: ListenerSettings, sink: MessageSink) -> Self {
        Self::with_transport(TlsTransport, config, settings, sink)
    }
}

impl<T: Transport> ListenerSupervisor<T> {
    /// Creates a listener over a custom transport.
    #[must_use]
    pub fn with_transport(
        transport: T,
        config: ConnectionConfig,
        settings: ListenerSettings,
        sink: MessageSink,
    ) -> Self {
        let (state, _) = watch::channel(ListenerState::Idle);
        Self {
            shared: Arc::new(Shared {
                connector: SessionConnector::new(transport, config, settings),
                sink,
                run: RunState::new(),
                state,
                attempts: AtomicU64::new(0),
                sessions: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Validates the configuration and spawns the worker.
    ///
    /// Idempotent while running. Starting after [`stop`](Self::stop) is a
    /// no-op: a stopped listener stays stopped. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every invalid field.
    pub fn start(&self) -> Result<(), ConfigError> {
        validate_config(
            self.shared.connector.config(),
            self.shared.connector.settings(),
        )
        .map_err(ConfigError::Invalid)?;

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.run.is_stopped() {
            warn!("listener was stopped; start ignored");
            return Ok(());
        }
        if worker.is_some() {
            debug!("listener already running");
            return Ok(());
        }

        *worker = Some(tokio::spawn(run_listener(Arc::clone(&self.shared))));
        Ok(())
    }

    /// Stops the listener and waits for the worker to finish cleanup.
    ///
    /// Idempotent, safe before [`start`](Self::start), never fails.
    ///
    /// Connecting, backoff and waiting in IDLE are abandoned at once. A
    /// FETCH or the DONE that ends IDLE is let finish, then CLOSE and
    /// LOGOUT are sent; each of these is bounded by
    /// [`ListenerSettings::io_timeout`](crate::ListenerSettings::io_timeout),
    /// so against an unresponsive server `stop` can take up to about three
    /// times that timeout. A batch already fetched is delivered to the sink
    /// first.
    pub async fn stop(&self) {
        self.shared.run.stop();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) => {
                if let Err(error) = handle.await {
                    warn!(%error, "listener task ended abnormally");
                    self.shared.set_state(ListenerState::Stopped);
                }
            }
            None => {
                self.shared.state.send_if_modified(|state| {
                    let never_started = *state == ListenerState::Idle;
                    if never_started {
                        *state = ListenerState::Stopped;
                    }
                    never_started
                });
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        *self.shared.state.borrow()
    }

    /// Watches lifecycle state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListenerState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            attempts: self.shared.attempts.load(Ordering::Relaxed),
            sessions: self.shared.sessions.load(Ordering::Relaxed),
            delivered: self.shared.delivered.load(Ordering::Relaxed),
        }
    }
}

impl<T: Transport> Drop for ListenerSupervisor<T> {
    fn drop(&mut self) {
        self.shared.run.stop();
    }
}

async fn run_listener<T: Transport>(shared: Arc<Shared<T>>) {
    let config = shared.connector.config();
    let settings = shared.connector.settings();
    let mut attempt: u64 = 0;

    while !shared.run.is_stopped() {
        attempt += 1;
        shared.attempts.fetch_add(1, Ordering::Relaxed);
        shared.set_state(ListenerState::Connecting);
        info!(
            host = %config.host,
            port = config.port,
            username = %config.username,
            attempt,
            "connecting"
        );

        let connected = tokio::select! {
            () = shared.run.stopped() => None,
            result = shared.connector.connect() => Some(result),
        };

        match connected {
            None => {
                shared.set_state(ListenerState::Cleanup);
                debug!("stop requested while connecting");
                break;
            }
            Some(Ok(mut session)) => {
                attempt = 0;
                shared.sessions.fetch_add(1, Ordering::Relaxed);
                shared.set_state(ListenerState::Waiting);
                info!(
                    mailbox = session.mailbox(),
                    exists = session.exists(),
                    "listening for new mail"
                );

                let outcome = listen(&shared, &mut session).await;
                shared.set_state(ListenerState::Cleanup);
                match &outcome {
                    Ok(()) => info!("stopping listener"),
                    Err(fault) if fault.is_peer_close() => {
                        warn!(error = %fault, "mailbox closed by server");
                    }
                    Err(fault) => warn!(error = %fault, "lost connection"),
                }
                session.close().await;
            }
            Some(Err(error)) => {
                shared.set_state(ListenerState::Cleanup);
                if error.is_auth_failure() {
                    warn!(attempt, %error, "login rejected");
                } else {
                    warn!(attempt, %error, "connection attempt failed");
                }
            }
        }

        if shared.run.is_stopped() {
            break;
        }

        shared.set_state(ListenerState::Backoff);
        info!(delay = ?settings.backoff, "retrying after backoff");
        let stopped = tokio::select! {
            () = shared.run.stopped() => true,
            () = tokio::time::sleep(settings.backoff) => false,
        };
        if stopped {
            break;
        }
    }

    shared.set_state(ListenerState::Stopped);
    info!("listener stopped");
}

async fn listen<T: Transport>(
    shared: &Shared<T>,
    session: &mut Session<T::Stream>,
) -> Result<(), SessionFault> {
    while let Some(batch) = session.next_batch(&shared.run).await? {
        shared.set_state(ListenerState::Decoding);
        for message in &batch {
            shared.deliver(message);
        }
        shared.set_state(ListenerState::Waiting);
    }
    Ok(())
}
