//! Opening a session and waiting on it for new mail.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use mailwatch_imap::connection::{Authenticated, Client, IdleEvent, Selected};
use mailwatch_imap::parser::FetchItem;
use mailwatch_imap::types::{SeqNum, SequenceSet, Uid};
use mailwatch_imap::FetchItems;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, ListenerSettings};
use crate::error::{ConnectError, SessionFault};
use crate::run_state::RunState;
use crate::transport::Transport;

/// One message fetched after an arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Sequence number at fetch time.
    pub seq: SeqNum,
    /// UID, when the server sent one.
    pub uid: Option<Uid>,
    /// The full RFC 5322 message.
    pub raw: Vec<u8>,
}

/// Makes one connection attempt per [`connect`](Self::connect) call.
#[derive(Debug)]
pub struct SessionConnector<T> {
    transport: T,
    config: ConnectionConfig,
    settings: ListenerSettings,
}

impl<T: Transport> SessionConnector<T> {
    /// Creates a connector.
    #[must_use]
    pub const fn new(transport: T, config: ConnectionConfig, settings: ListenerSettings) -> Self {
        Self {
            transport,
            config,
            settings,
        }
    }

    /// The connection configuration.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The listener settings.
    #[must_use]
    pub const fn settings(&self) -> &ListenerSettings {
        &self.settings
    }

    /// Connects, logs in and opens the mailbox read-only.
    ///
    /// No retry happens here. On failure after the transport is open, the
    /// connection is logged out where the client is still held and dropped
    /// otherwise, before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectError`] naming the step that failed.
    pub async fn connect(&self) -> Result<Session<T::Stream>, ConnectError> {
        let connect_timeout = self.settings.connect_timeout;
        let io_timeout = self.settings.io_timeout;

        let client = timeout(connect_timeout, async {
            let stream = self.transport.connect(&self.config, connect_timeout).await?;
            Client::from_stream(stream).await
        })
        .await
        .map_err(|_| ConnectError::Timeout {
            stage: "connect",
            after: connect_timeout,
        })?
        .map_err(ConnectError::Transport)?;
        debug!(host = %self.config.host, "greeting received");

        let mut client = timeout(
            io_timeout,
            client.login(&self.config.username, &self.config.password),
        )
        .await
        .map_err(|_| ConnectError::Timeout {
            stage: "login",
            after: io_timeout,
        })?
        .map_err(ConnectError::Login)?;
        debug!(username = %self.config.username, "logged in");

        if !client.supports_idle() {
            match timeout(io_timeout, client.capability()).await {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => {
                    logout_quietly(client, io_timeout).await;
                    return Err(ConnectError::Capability(error));
                }
                Err(_) => {
                    return Err(ConnectError::Timeout {
                        stage: "capability",
                        after: io_timeout,
                    });
                }
            }
        }
        if !client.supports_idle() {
            logout_quietly(client, io_timeout).await;
            return Err(ConnectError::IdleUnsupported);
        }

        let mailbox = self.settings.mailbox.as_str();
        let client = timeout(io_timeout, client.examine(mailbox))
            .await
            .map_err(|_| ConnectError::Timeout {
                stage: "examine",
                after: io_timeout,
            })?
            .map_err(|source| ConnectError::Mailbox {
                mailbox: mailbox.to_string(),
                source,
            })?;

        Ok(Session::new(client, &self.settings))
    }
}

async fn logout_quietly<S>(client: Client<S, Authenticated>, io_timeout: Duration)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match timeout(io_timeout, client.logout()).await {
        Ok(Ok(())) => debug!("logged out after failed setup"),
        Ok(Err(error)) => debug!(%error, "LOGOUT failed after failed setup"),
        Err(_) => debug!("LOGOUT timed out after failed setup"),
    }
}

/// Runs an IMAP step under `limit`, classifying its failure.
async fn bounded<T, F>(limit: Duration, step: F) -> Result<T, SessionFault>
where
    F: Future<Output = mailwatch_imap::Result<T>>,
{
    timeout(limit, step)
        .await
        .map_err(|_| SessionFault::Timeout(limit))?
        .map_err(SessionFault::from)
}

/// Shifts `seen` down once for every expunge at or below it.
///
/// `expunged` must be in the order the server sent it; each number already
/// accounts for the expunges before it.
fn settle(seen: &mut u32, expunged: &[SeqNum]) {
    for seq in expunged {
        if seq.get() <= *seen {
            *seen -= 1;
        }
    }
}

enum IdleOutcome {
    /// A count above the baseline was announced.
    Changed,
    /// IDLE ended by refresh timer or by the server; re-enter it.
    Refresh,
    /// Stop was requested.
    Stopped,
}

/// A live, authenticated connection with the mailbox open read-only.
///
/// `seen` is the highest sequence number already surfaced (or present when
/// the mailbox was opened); only messages above it are fetched.
pub struct Session<S> {
    client: Client<S, Selected>,
    seen: u32,
    usable: bool,
    io_timeout: Duration,
    idle_refresh: Duration,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("seen", &self.seen)
            .field("usable", &self.usable)
            .finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(mut client: Client<S, Selected>, settings: &ListenerSettings) -> Self {
        // Expunges reported by EXAMINE are already reflected in the count.
        client.take_expunged();
        let seen = client.exists();
        Self {
            client,
            seen,
            usable: true,
            io_timeout: settings.io_timeout,
            idle_refresh: settings.idle_refresh,
        }
    }

    /// The open mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.client.mailbox()
    }

    /// Message count as last reported by the server.
    #[must_use]
    pub fn exists(&self) -> u32 {
        self.client.exists()
    }

    /// Highest sequence number already accounted for.
    #[must_use]
    pub const fn seen(&self) -> u32 {
        self.seen
    }

    /// Waits in IDLE until messages arrive, then fetches them.
    ///
    /// Returns `Ok(None)` once `run` is stopped, with IDLE ended. The batch
    /// is ordered by sequence number. Arrivals announced while IDLE was
    /// being ended or while fetching are picked up by the next call.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionFault`] if the connection fails; the session is
    /// then only fit to be dropped through [`close`](Self::close).
    pub async fn next_batch(
        &mut self,
        run: &RunState,
    ) -> Result<Option<Vec<FetchedMessage>>, SessionFault> {
        let result = self.wait_and_fetch(run).await;
        if result.is_err() {
            self.usable = false;
        }
        result
    }

    async fn wait_and_fetch(
        &mut self,
        run: &RunState,
    ) -> Result<Option<Vec<FetchedMessage>>, SessionFault> {
        loop {
            if run.is_stopped() {
                return Ok(None);
            }
            settle(&mut self.seen, &self.client.take_expunged());
            if self.client.exists() > self.seen {
                return self.fetch_new().await.map(Some);
            }
            self.seen = self.seen.min(self.client.exists());

            match self.idle_once(run).await? {
                IdleOutcome::Stopped => return Ok(None),
                IdleOutcome::Changed | IdleOutcome::Refresh => {}
            }
        }
    }

    async fn idle_once(&mut self, run: &RunState) -> Result<IdleOutcome, SessionFault> {
        let io_timeout = self.io_timeout;
        let mut idle = bounded(io_timeout, self.client.idle()).await?;
        let deadline = Instant::now() + self.idle_refresh;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = tokio::select! {
                () = run.stopped() => None,
                event = idle.wait(remaining) => Some(event),
            };

            let Some(event) = event else {
                debug!("stop requested, ending IDLE");
                if let Err(error) = bounded(io_timeout, idle.done()).await {
                    debug!(%error, "DONE failed while stopping");
                    self.usable = false;
                }
                return Ok(IdleOutcome::Stopped);
            };

            let event = event.map_err(SessionFault::from)?;
            settle(&mut self.seen, &idle.take_expunged());
            match event {
                IdleEvent::Exists(exists) if exists > self.seen => {
                    debug!(exists, seen = self.seen, "new message announced");
                    bounded(io_timeout, idle.done()).await?;
                    return Ok(IdleOutcome::Changed);
                }
                IdleEvent::Timeout => {
                    debug!(after = ?self.idle_refresh, "re-issuing IDLE");
                    bounded(io_timeout, idle.done()).await?;
                    return Ok(IdleOutcome::Refresh);
                }
                IdleEvent::Ended => {
                    debug!("server ended IDLE");
                    return Ok(IdleOutcome::Refresh);
                }
                IdleEvent::Exists(_)
                | IdleEvent::Expunge(_)
                | IdleEvent::Recent(_)
                | IdleEvent::Fetch(_)
                | IdleEvent::Other(_) => {}
            }
        }
    }

    async fn fetch_new(&mut self) -> Result<Vec<FetchedMessage>, SessionFault> {
        let first = self.seen + 1;
        let last = self.client.exists();
        let Some(range) = SequenceSet::range(first, last) else {
            self.seen = last;
            return Ok(Vec::new());
        };

        debug!(first, last, "fetching new messages");
        let responses = bounded(
            self.io_timeout,
            self.client.fetch(&range, FetchItems::uid_and_body_peek()),
        )
        .await?;

        let mut by_seq: BTreeMap<SeqNum, (Option<Uid>, Option<Vec<u8>>)> = BTreeMap::new();
        for (seq, items) in responses {
            if !(first..=last).contains(&seq.get()) {
                continue;
            }
            let entry = by_seq.entry(seq).or_default();
            for item in items {
                match item {
                    FetchItem::Uid(uid) => entry.0 = Some(uid),
                    FetchItem::Body {
                        section: None,
                        data: Some(data),
                    } => entry.1 = Some(data),
                    _ => {}
                }
            }
        }

        self.seen = last;
        settle(&mut self.seen, &self.client.take_expunged());
        self.seen = self.seen.min(self.client.exists());

        let batch = by_seq
            .into_iter()
            .filter_map(|(seq, (uid, raw))| match raw {
                Some(raw) => Some(FetchedMessage { seq, uid, raw }),
                None => {
                    warn!(%seq, "server returned no body for new message");
                    None
                }
            })
            .collect();
        Ok(batch)
    }

    /// Ends the session: CLOSE, then LOGOUT, each bounded by the I/O
    /// timeout. Failures are logged and swallowed.
    ///
    /// After a fault the protocol state is unknown, so the connection is
    /// dropped without either command.
    pub async fn close(self) {
        let Self {
            client,
            usable,
            io_timeout,
            ..
        } = self;

        if !usable {
            debug!("dropping connection without CLOSE/LOGOUT");
            return;
        }

        match timeout(io_timeout, client.close()).await {
            Ok(Ok(authenticated)) => match timeout(io_timeout, authenticated.logout()).await {
                Ok(Ok(())) => info!("logged out"),
                Ok(Err(error)) => debug!(%error, "LOGOUT failed"),
                Err(_) => debug!(after = ?io_timeout, "LOGOUT timed out"),
            },
            Ok(Err(error)) => warn!(%error, "CLOSE failed"),
            Err(_) => warn!(after = ?io_timeout, "CLOSE timed out"),
        }
    }
}
