//! IMAP IDLE command support (RFC 2177).
//!
//! IDLE lets the server push mailbox changes instead of the client polling.
//! While an [`IdleHandle`] is alive the connection is in IDLE mode; every
//! `EXISTS` and `EXPUNGE` it sees is also folded into the [`Selected`]
//! state, so after [`IdleHandle::done`] the client's
//! [`exists`](Client::exists) count and
//! [`take_expunged`](Client::take_expunged) log are current.

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use super::client::{Client, Selected};
use crate::command::Command;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{SeqNum, Status};
use crate::{Error, Result};

/// Event received during IDLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleEvent {
    /// New message count (EXISTS response).
    Exists(u32),
    /// Message expunged (EXPUNGE response).
    Expunge(SeqNum),
    /// Unsolicited FETCH for a message, usually a flag change.
    Fetch(SeqNum),
    /// Recent count changed.
    Recent(u32),
    /// Untagged data with no bearing on the message count, such as an
    /// `* OK Still here` keepalive.
    Other(UntaggedResponse),
    /// The server completed the IDLE command on its own; no DONE is needed.
    Ended,
    /// Timeout occurred without receiving an event.
    Timeout,
}

/// Handle for an active IDLE session.
///
/// Holds the client mutably for as long as IDLE lasts. Call
/// [`wait`](Self::wait) to receive events, and [`done`](Self::done) to exit
/// IDLE mode.
pub struct IdleHandle<'a, S> {
    client: &'a mut Client<S, Selected>,
    tag: String,
    ended: bool,
}

impl<S> std::fmt::Debug for IdleHandle<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleHandle")
            .field("tag", &self.tag)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl<S> IdleHandle<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for a server event or timeout.
    ///
    /// Cancel-safe: dropping the future (for example when another
    /// `tokio::select!` branch wins) loses no server data.
    ///
    /// An untagged `BYE` is returned as [`Error::Bye`].
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        if self.ended {
            return Ok(IdleEvent::Ended);
        }
        match timeout(duration, self.client.stream.read_response()).await {
            Ok(response) => self.handle(&response?),
            Err(_) => Ok(IdleEvent::Timeout),
        }
    }

    /// Drains the `EXPUNGE` notices absorbed so far; see
    /// [`Client::take_expunged`].
    pub fn take_expunged(&mut self) -> Vec<SeqNum> {
        self.client.take_expunged()
    }

    fn handle(&mut self, response: &[u8]) -> Result<IdleEvent> {
        match ResponseParser::parse(response)? {
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => Err(Error::Bye(text)),
            Response::Untagged(untagged) => {
                self.client.absorb(&untagged);
                Ok(match untagged {
                    UntaggedResponse::Exists(n) => IdleEvent::Exists(n),
                    UntaggedResponse::Recent(n) => IdleEvent::Recent(n),
                    UntaggedResponse::Expunge(seq) => IdleEvent::Expunge(seq),
                    UntaggedResponse::Fetch { seq, .. } => IdleEvent::Fetch(seq),
                    other => IdleEvent::Other(other),
                })
            }
            Response::Continuation { .. } => Err(Error::Protocol(
                "unexpected continuation during IDLE".to_string(),
            )),
            Response::Tagged {
                tag, status, text, ..
            } => {
                if tag.as_str() != self.tag {
                    return Err(Error::Protocol(format!(
                        "unexpected tag {} during IDLE",
                        tag.as_str()
                    )));
                }
                self.ended = true;
                match status {
                    Status::Ok => Ok(IdleEvent::Ended),
                    status => Err(status_error(status, text)),
                }
            }
        }
    }

    /// Exits IDLE mode by sending DONE and reading the tagged completion.
    ///
    /// Untagged data that arrives before the completion is folded into the
    /// client state.
    pub async fn done(self) -> Result<()> {
        if self.ended {
            return Ok(());
        }

        let cmd = Command::Done.serialize("");
        self.client.stream.write_command(&cmd).await?;

        loop {
            let response = self.client.stream.read_response().await?;
            match ResponseParser::parse(&response)? {
                Response::Tagged {
                    tag, status, text, ..
                } if tag.as_str() == self.tag => {
                    return match status {
                        Status::Ok => Ok(()),
                        status => Err(status_error(status, text)),
                    };
                }
                Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                    return Err(Error::Bye(text));
                }
                Response::Untagged(untagged) => self.client.absorb(&untagged),
                _ => {}
            }
        }
    }
}

fn status_error(status: Status, text: String) -> Error {
    match status {
        Status::No => Error::No(text),
        Status::Bad => Error::Bad(text),
        Status::Bye => Error::Bye(text),
        Status::Ok | Status::PreAuth => Error::Protocol(format!("unexpected {status:?} in IDLE")),
    }
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE mode for real-time notifications.
    ///
    /// Untagged data the server sends before its `+` continuation is folded
    /// into the client state. Check [`supports_idle`](Client::supports_idle)
    /// first; a server without IDLE answers `BAD`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut handle = client.idle().await?;
    /// loop {
    ///     match handle.wait(Duration::from_secs(600)).await? {
    ///         IdleEvent::Exists(n) => println!("New message count: {n}"),
    ///         IdleEvent::Timeout | IdleEvent::Ended => break,
    ///         _ => {}
    ///     }
    /// }
    /// handle.done().await?;
    /// ```
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        let tag = self.tag_gen.next_tag();
        let cmd = Command::Idle.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        loop {
            let response = self.stream.read_response().await?;
            match ResponseParser::parse(&response)? {
                Response::Continuation { .. } => break,
                Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                    return Err(Error::Bye(text));
                }
                Response::Untagged(untagged) => self.absorb(&untagged),
                Response::Tagged { status, text, .. } => {
                    return Err(match status {
                        Status::Ok => Error::Protocol("IDLE completed without idling".to_string()),
                        status => status_error(status, text),
                    });
                }
            }
        }

        Ok(IdleHandle {
            client: self,
            tag,
            ended: false,
        })
    }
}
