//! Implementation for the not-authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and any capabilities it advertises. A `BYE`
    /// greeting (server refusing the connection) is an error.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        let mut capabilities = Vec::new();

        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, .. } | UntaggedResponse::PreAuth { code, .. },
            ) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        self.run(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        Ok(self.transition(Authenticated))
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.send_logout().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::types::Capability;

    #[tokio::test]
    async fn test_greeting_capabilities() {
        let mock = Builder::new()
            .read(b"* OK [CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN] Dovecot ready.\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();

        assert!(client.supports_idle());
        assert!(client.has_capability(&Capability::Auth("PLAIN".into())));
    }

    #[tokio::test]
    async fn test_bye_greeting_is_error() {
        let mock = Builder::new().read(b"* BYE Too many connections\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Bye(text) if text == "Too many connections"));
    }

    #[tokio::test]
    async fn test_login_updates_capabilities_from_completion() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN user \"secret pw\"\r\n")
            .read(b"A0000 OK [CAPABILITY IMAP4rev1 IDLE] Logged in\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        assert!(!client.supports_idle());

        let client = client.login("user", "secret pw").await.unwrap();
        assert!(client.supports_idle());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN user wrong\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Authentication failed.\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();

        let err = client.login("user", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::No(text) if text == "Authentication failed."));
    }

    #[tokio::test]
    async fn test_capability_command() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 IDLE\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut client = Client::from_stream(mock).await.unwrap();

        let caps = client.capability().await.unwrap();
        assert_eq!(caps, vec![Capability::Imap4Rev1, Capability::Idle]);
    }
}
