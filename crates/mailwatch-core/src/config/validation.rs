//! Configuration validation.

use std::time::Duration;

use super::model::{ConnectionConfig, ListenerSettings};

/// Validation error for listener configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is empty.
    EmptyHost,
    /// Port is zero.
    InvalidPort,
    /// Username is empty.
    EmptyUsername,
    /// Password is empty.
    EmptyPassword,
    /// Mailbox name is empty.
    EmptyMailbox,
    /// Backoff is zero, which would retry in a busy loop.
    ZeroBackoff,
    /// Connection timeout is zero.
    ZeroConnectTimeout,
    /// Command timeout is zero.
    ZeroIoTimeout,
    /// IDLE refresh interval is zero.
    ZeroIdleRefresh,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyHost => "IMAP server is required",
            Self::InvalidPort => "IMAP port must be 1-65535",
            Self::EmptyUsername => "IMAP username is required",
            Self::EmptyPassword => "IMAP password is required",
            Self::EmptyMailbox => "Mailbox name is required",
            Self::ZeroBackoff => "Backoff must be at least one second",
            Self::ZeroConnectTimeout => "Connect timeout must be at least one second",
            Self::ZeroIoTimeout => "I/O timeout must be at least one second",
            Self::ZeroIdleRefresh => "IDLE refresh must be at least one second",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost => "host",
            Self::InvalidPort => "port",
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
            Self::EmptyMailbox => "mailbox",
            Self::ZeroBackoff => "backoff",
            Self::ZeroConnectTimeout => "connect_timeout",
            Self::ZeroIoTimeout => "io_timeout",
            Self::ZeroIdleRefresh => "idle_refresh",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a configuration.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a connection configuration and listener settings together.
///
/// Returns `Ok(())` if valid, or every problem found.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_config(
    connection: &ConnectionConfig,
    settings: &ListenerSettings,
) -> ValidationResult {
    let mut errors = Vec::new();

    if connection.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if connection.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if connection.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if connection.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    if settings.mailbox.trim().is_empty() {
        errors.push(ValidationError::EmptyMailbox);
    }
    for (value, error) in [
        (settings.backoff, ValidationError::ZeroBackoff),
        (settings.connect_timeout, ValidationError::ZeroConnectTimeout),
        (settings.io_timeout, ValidationError::ZeroIoTimeout),
        (settings.idle_refresh, ValidationError::ZeroIdleRefresh),
    ] {
        if value == Duration::ZERO {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
