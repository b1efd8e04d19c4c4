//! Configuration model types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Port for IMAP over implicit TLS.
pub const DEFAULT_PORT: u16 = mailwatch_imap::connection::IMAPS_PORT;

/// Protocol tag from the configuration.
///
/// Both tags connect with implicit TLS; `imap` exists so configurations
/// written for a plaintext store still work, but it is never honored as
/// plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Protocol {
    /// IMAP over implicit TLS.
    #[default]
    Imaps,
    /// Plain IMAP tag, forced onto TLS.
    Imap,
}

impl Protocol {
    /// Parses a protocol tag, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedProtocol`] for anything other than
    /// `imaps` or `imap`.
    pub fn parse(tag: &str) -> Result<Self, ConfigError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "imaps" => Ok(Self::Imaps),
            "imap" => Ok(Self::Imap),
            _ => Err(ConfigError::UnsupportedProtocol(tag.to_string())),
        }
    }

    /// Get the tag as written in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imaps => "imaps",
            Self::Imap => "imap",
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = ConfigError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Self::parse(&tag)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to log in.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname, also used for certificate verification.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username for LOGIN.
    pub username: String,
    /// Password for LOGIN.
    pub password: String,
    /// Protocol tag.
    #[serde(default)]
    pub protocol: Protocol,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionConfig {
    /// Create a configuration on the default port with the `imaps` tag.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            protocol: Protocol::Imaps,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the protocol tag.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .finish()
    }
}

/// Tuning for the listener loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Folder opened read-only.
    pub mailbox: String,
    /// Fixed delay between connection attempts.
    #[serde(rename = "backoff_secs", with = "secs")]
    pub backoff: Duration,
    /// Bound on TCP connect, TLS handshake and greeting.
    #[serde(rename = "connect_timeout_secs", with = "secs")]
    pub connect_timeout: Duration,
    /// Bound on each command's response.
    #[serde(rename = "io_timeout_secs", with = "secs")]
    pub io_timeout: Duration,
    /// How long one IDLE may run before it is ended and re-issued.
    #[serde(rename = "idle_refresh_secs", with = "secs")]
    pub idle_refresh: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            mailbox: "INBOX".to_string(),
            backoff: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            // RFC 2177 asks clients to re-issue IDLE at least every 29 minutes.
            idle_refresh: Duration::from_secs(29 * 60),
        }
    }
}

impl ListenerSettings {
    /// Sets the mailbox.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = mailbox.into();
        self
    }

    /// Sets the backoff delay.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the IDLE refresh interval.
    #[must_use]
    pub const fn with_idle_refresh(mut self, idle_refresh: Duration) -> Self {
        self.idle_refresh = idle_refresh;
        self
    }

    /// Sets the per-command timeout.
    #[must_use]
    pub const fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Everything the listener needs, as read from a file or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchConfig {
    /// Server and credentials.
    pub connection: ConnectionConfig,
    /// Listener tuning.
    #[serde(default)]
    pub listener: ListenerSettings,
}

impl WatchConfig {
    /// Parses the JSON form: `{ "connection": {...}, "listener": {...} }`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document does not match.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Reads `MAIL_HOST`, `MAIL_PORT`, `MAIL_USERNAME`, `MAIL_PASSWORD`,
    /// `MAIL_PROTOCOL` and `MAIL_FOLDER` through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));

        let protocol = lookup("MAIL_PROTOCOL")
            .map_or(Ok(Protocol::Imaps), |tag| Protocol::parse(&tag))?;
        let port = match lookup("MAIL_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar {
                    name: "MAIL_PORT",
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let connection = ConnectionConfig::new(
            required("MAIL_HOST")?,
            required("MAIL_USERNAME")?,
            required("MAIL_PASSWORD")?,
        )
        .with_port(port)
        .with_protocol(protocol);

        let mut listener = ListenerSettings::default();
        if let Some(folder) = lookup("MAIL_FOLDER") {
            listener.mailbox = folder;
        }

        Ok(Self {
            connection,
            listener,
        })
    }

    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`WatchConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
