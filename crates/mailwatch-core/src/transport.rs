//! Byte-stream transports the connector can open.

use std::future::Future;
use std::time::Duration;

use mailwatch_imap::connection::{self, ImapStream};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ConnectionConfig;

/// Opens one outbound connection to the configured server.
///
/// Production uses [`TlsTransport`]; tests substitute in-memory streams.
pub trait Transport: Send + Sync + 'static {
    /// The connected stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connects to `config.host:config.port`, giving up after `timeout`.
    fn connect(
        &self,
        config: &ConnectionConfig,
        timeout: Duration,
    ) -> impl Future<Output = mailwatch_imap::Result<Self::Stream>> + Send;
}

/// Implicit TLS over TCP, verified against the webpki roots.
///
/// Both protocol tags end up here: `imap` is never spoken in plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTransport;

impl Transport for TlsTransport {
    type Stream = ImapStream;

    async fn connect(
        &self,
        config: &ConnectionConfig,
        timeout: Duration,
    ) -> mailwatch_imap::Result<ImapStream> {
        let imap_config = connection::Config::new(config.host.as_str())
            .port(config.port)
            .connect_timeout(timeout);
        connection::connect(&imap_config).await
    }
}
