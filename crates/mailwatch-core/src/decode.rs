//! Turning fetched message bytes into subject and plain-text body.

use mailwatch_mime::Message;
use tracing::{debug, warn};

/// What the consumer receives for each new message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMessage {
    subject: Option<String>,
    body: String,
}

impl DecodedMessage {
    /// Creates a decoded message.
    #[must_use]
    pub fn new(subject: Option<String>, body: impl Into<String>) -> Self {
        Self {
            subject,
            body: body.into(),
        }
    }

    /// The decoded Subject header, if the message has one.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The plain-text body; empty when there is none.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Decodes a raw RFC 5322 message. Never fails.
///
/// A `text/plain` message yields its content; a multipart message yields
/// its first immediate `text/plain` part. Anything else, or any structural
/// problem, yields an empty body.
#[must_use]
pub fn decode(raw: &[u8]) -> DecodedMessage {
    let message = Message::parse(raw);
    let subject = message.subject();

    let body = match message.plain_text() {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!(subject = ?subject, "message has no text/plain body");
            String::new()
        }
        Err(error) => {
            warn!(subject = ?subject, %error, "could not decode message body");
            String::new()
        }
    };

    DecodedMessage { subject, body }
}
