//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::Command;
use crate::types::{Mailbox, MailboxStatus};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens a mailbox read-only with EXAMINE.
    ///
    /// Consumes self and returns a selected client on success; the status the
    /// server reported is available through [`Client::status`].
    pub async fn examine(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let mailbox = Mailbox::new(mailbox);
        let untagged = self
            .run(Command::Examine {
                mailbox: mailbox.clone(),
            })
            .await?;

        let mut selected = Selected::new(mailbox, MailboxStatus {
            read_only: true,
            ..MailboxStatus::default()
        });
        for response in &untagged {
            selected.absorb(response);
        }

        Ok(self.transition(selected))
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
    use crate::Error;
    use crate::connection::client::NotAuthenticated;

    #[tokio::test]
    async fn test_examine_collects_status() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK ok\r\n")
            .write(b"A0001 EXAMINE INBOX\r\n")
            .read(b"* FLAGS (\\Answered \\Seen)\r\n")
            .read(b"* OK [PERMANENTFLAGS ()] No permanent flags permitted\r\n")
            .read(b"* 172 EXISTS\r\n")
            .read(b"* 1 RECENT\r\n")
            .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
            .read(b"* OK [UIDNEXT 4392] Predicted next UID\r\n")
            .read(b"A0001 OK [READ-ONLY] EXAMINE completed\r\n")
            .build();

        let client = Client::<_, NotAuthenticated>::from_stream(mock)
            .await
            .unwrap();
        let client = client.login("u", "p").await.unwrap();
        let client = client.examine("INBOX").await.unwrap();

        let status = client.status();
        assert_eq!(client.mailbox(), "INBOX");
        assert_eq!(status.exists, 172);
        assert!(status.read_only);
    }

    #[tokio::test]
    async fn test_examine_missing_mailbox() {
        let mock = Builder::new()
            .read(b"* PREAUTH ready\r\n")
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK ok\r\n")
            .write(b"A0001 EXAMINE Nope\r\n")
            .read(b"A0001 NO [NONEXISTENT] Mailbox doesn't exist: Nope\r\n")
            .build();

        let client = Client::<_, NotAuthenticated>::from_stream(mock)
            .await
            .unwrap();
        let client = client.login("u", "p").await.unwrap();
        let err = client.examine("Nope").await.unwrap_err();
        assert!(matches!(err, Error::No(_)));
    }

    #[tokio::test]
    async fn test_logout_tolerates_hangup() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK ok\r\n")
            .write(b"A0001 LOGOUT\r\n")
            .read(b"* BYE Logging out\r\n")
            .build();

        let client = Client::<_, NotAuthenticated>::from_stream(mock)
            .await
            .unwrap();
        let client = client.login("u", "p").await.unwrap();
        client.logout().await.unwrap();
    }
}
