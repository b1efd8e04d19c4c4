//! # mailwatch-imap
//!
//! The slice of IMAP (RFC 9051 / RFC 3501) that a read-only mailbox listener
//! needs: an implicit-TLS transport, CRLF/literal framing, a sans-I/O response
//! parser, and a type-state client that can log in, `EXAMINE` a mailbox,
//! `IDLE` on it (RFC 2177), fetch newly arrived messages and shut down.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use mailwatch_imap::{Client, IdleEvent, connection::connect_tls};
//!
//! #[tokio::main]
//! async fn main() -> mailwatch_imap::Result<()> {
//!     let stream = connect_tls("imap.example.com", 993).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!     let mut inbox = client.examine("INBOX").await?;
//!
//!     let mut idle = inbox.idle().await?;
//!     if let IdleEvent::Exists(n) = idle.wait(Duration::from_secs(600)).await? {
//!         println!("mailbox now holds {n} messages");
//!     }
//!     idle.done().await?;
//!
//!     inbox.close().await?.logout().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── examine() ──→ Selected
//!                                       ↑                          │
//!                                       └──────── close() ─────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders and tag generation
//! - [`connection`]: transport, framing, type-state client, IDLE
//! - [`parser`]: sans-I/O response parser
//! - [`types`]: identifiers, capabilities, response codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, FramedStream, IdleEvent, IdleHandle, ImapStream,
    NotAuthenticated, ResponseAccumulator, Selected,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Mailbox, MailboxStatus, ResponseCode, SeqNum, SequenceSet, Status, Tag, Uid,
};
