//! Connection configuration types.

use std::time::Duration;

/// Port for IMAP over implicit TLS.
pub const IMAPS_PORT: u16 = 993;

/// IMAP connection configuration.
///
/// The connection is always TLS from the first byte; there is no plaintext
/// or STARTTLS mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server hostname, also used for certificate verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Bound on TCP connect plus TLS handshake plus greeting.
    pub connect_timeout: Duration,
}

impl Config {
    /// Creates a configuration for `host` on the IMAPS port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: IMAPS_PORT,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
