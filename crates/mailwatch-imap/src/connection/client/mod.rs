//! Type-state IMAP client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at compile time.
//! The IMAP connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN
//! - `Selected`: After successful EXAMINE
//!
//! Each state only exposes methods that are valid for that state.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time;
/// the value of that type carries whatever the state knows at runtime.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if the server supports IDLE (RFC 2177).
    #[must_use]
    pub fn supports_idle(&self) -> bool {
        self.has_capability(&Capability::Idle)
    }

    /// Sends a NOOP command to keep the connection alive.
    pub async fn noop(&mut self) -> Result<()> {
        self.run(Command::Noop).await.map(drop)
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        self.run(Command::Capability).await?;
        Ok(self.capabilities.clone())
    }

    /// Sends `command` and reads through its tagged completion.
    ///
    /// Capability lists seen on the way are stored. Returns the untagged
    /// responses; a `NO`, `BAD` or `BYE` completion becomes an error.
    pub(crate) async fn run(&mut self, command: Command) -> Result<Vec<UntaggedResponse>> {
        let tag = self.tag_gen.next_tag();
        tracing::trace!(tag = %tag, command = ?command, "sending");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let responses = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await?;

        let mut untagged = Vec::new();
        for bytes in &responses {
            match ResponseParser::parse(bytes)? {
                Response::Untagged(UntaggedResponse::Capability(caps)) => self.capabilities = caps,
                Response::Untagged(resp) => untagged.push(resp),
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    code,
                    text,
                } if resp_tag.as_str() == tag => {
                    if let Some(ResponseCode::Capability(caps)) = code {
                        self.capabilities = caps;
                    }
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(untagged),
                        Status::No => Err(Error::No(text)),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                    };
                }
                Response::Tagged { .. } | Response::Continuation { .. } => {}
            }
        }

        Err(Error::Protocol("missing tagged response".to_string()))
    }

    /// Sends LOGOUT and reads until the server completes it or hangs up.
    pub(crate) async fn send_logout(&mut self) -> Result<()> {
        match self.run(Command::Logout).await {
            Err(e) if e.is_disconnect() => Ok(()),
            other => other.map(drop),
        }
    }
}
