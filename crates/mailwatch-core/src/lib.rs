//! # mailwatch-core
//!
//! A long-lived, self-healing IMAP IDLE listener for one mailbox.
//!
//! This crate provides:
//! - Configuration, its JSON and environment forms, and validation
//! - A connector that opens a read-only session in one attempt
//! - A session that waits in IDLE and fetches newly arrived messages
//! - A supervisor that retries with a fixed backoff and stops cleanly
//! - Plain-text decoding of fetched messages for the consumer
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwatch_core::{ConnectionConfig, ListenerSettings, ListenerSupervisor, on_message};
//!
//! let config = ConnectionConfig::new("imap.example.com", "me@example.com", "app-password");
//! let supervisor = ListenerSupervisor::new(
//!     config,
//!     ListenerSettings::default(),
//!     on_message(|subject, body| println!("{subject:?}: {body}")),
//! );
//! supervisor.start()?;
//! tokio::signal::ctrl_c().await?;
//! supervisor.stop().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod decode;
mod error;
pub mod run_state;
pub mod session;
pub mod sink;
pub mod supervisor;
pub mod transport;

pub use config::{
    ConnectionConfig, ListenerSettings, Protocol, ValidationError, ValidationResult, WatchConfig,
    validate_config,
};
pub use decode::{DecodedMessage, decode};
pub use error::{ConfigError, ConnectError, SessionFault};
pub use run_state::RunState;
pub use session::{FetchedMessage, Session, SessionConnector};
pub use sink::{MessageSink, log_sink, on_message};
pub use supervisor::{ListenerState, ListenerStats, ListenerSupervisor};
pub use transport::{TlsTransport, Transport};
