//! Error types for the core library.
//!
//! Only [`ConfigError`] reaches the caller of
//! [`ListenerSupervisor::start`](crate::ListenerSupervisor::start);
//! [`ConnectError`] and [`SessionFault`] are handled inside the listener
//! loop, and decode problems are logged per message.

use std::time::Duration;

use thiserror::Error;

use crate::config::ValidationError;

/// Configuration is unusable; fatal at start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more fields failed validation.
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    /// Protocol tag other than `imaps` or `imap`.
    #[error("unsupported protocol {0:?} (expected \"imaps\" or \"imap\")")]
    UnsupportedProtocol(String),

    /// Required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    /// Environment variable has an unparsable value.
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Value as found.
        value: String,
    },

    /// Configuration file is not valid JSON for the expected shape.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field(), e.message()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One connection attempt failed; the listener backs off and retries.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// TCP connect, TLS handshake or greeting failed.
    #[error("connection failed: {0}")]
    Transport(#[source] mailwatch_imap::Error),

    /// LOGIN was rejected or failed.
    #[error("authentication failed: {0}")]
    Login(#[source] mailwatch_imap::Error),

    /// CAPABILITY failed while checking for IDLE.
    #[error("capability check failed: {0}")]
    Capability(#[source] mailwatch_imap::Error),

    /// EXAMINE of the mailbox failed.
    #[error("cannot open mailbox {mailbox:?}: {source}")]
    Mailbox {
        /// Mailbox name.
        mailbox: String,
        /// Underlying error.
        #[source]
        source: mailwatch_imap::Error,
    },

    /// Server does not advertise IDLE.
    #[error("server does not support IDLE")]
    IdleUnsupported,

    /// A step did not finish in time.
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        /// What was in progress.
        stage: &'static str,
        /// The bound that expired.
        after: Duration,
    },
}

impl ConnectError {
    /// Returns true when the server rejected the credentials.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Login(mailwatch_imap::Error::No(_) | mailwatch_imap::Error::Bad(_))
        )
    }
}

/// A live session broke; the listener cleans up and reconnects.
#[derive(Debug, Error)]
pub enum SessionFault {
    /// Server sent BYE or closed the connection.
    #[error("mailbox closed by server: {0}")]
    PeerClosed(#[source] mailwatch_imap::Error),

    /// Any other I/O or protocol failure.
    #[error("session error: {0}")]
    Imap(#[source] mailwatch_imap::Error),

    /// Server did not answer a command in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl SessionFault {
    /// Returns true when the server ended the session (BYE or EOF).
    #[must_use]
    pub const fn is_peer_close(&self) -> bool {
        matches!(self, Self::PeerClosed(_))
    }
}

impl From<mailwatch_imap::Error> for SessionFault {
    fn from(err: mailwatch_imap::Error) -> Self {
        if err.is_disconnect() {
            Self::PeerClosed(err)
        } else {
            Self::Imap(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn invalid_config_lists_fields() {
        let err = ConfigError::Invalid(vec![ValidationError::EmptyHost, ValidationError::InvalidPort]);
        let text = err.to_string();
        assert!(text.contains("host: IMAP server is required"));
        assert!(text.contains("port: IMAP port must be 1-65535"));
    }

    #[test]
    fn bye_and_eof_are_peer_close() {
        let bye = SessionFault::from(mailwatch_imap::Error::Bye("bye".into()));
        assert!(bye.is_peer_close());

        let eof = SessionFault::from(mailwatch_imap::Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "eof",
        )));
        assert!(eof.is_peer_close());
    }

    #[test]
    fn protocol_error_is_not_peer_close() {
        let fault = SessionFault::from(mailwatch_imap::Error::Protocol("junk".into()));
        assert!(!fault.is_peer_close());
        assert!(!SessionFault::Timeout(Duration::from_secs(1)).is_peer_close());
    }

    #[test]
    fn login_no_is_auth_failure() {
        let err = ConnectError::Login(mailwatch_imap::Error::No("bad password".into()));
        assert!(err.is_auth_failure());
        assert!(!ConnectError::IdleUnsupported.is_auth_failure());
    }
}
