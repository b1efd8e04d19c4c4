//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::{Command, FetchItems};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{MailboxStatus, SeqNum, SequenceSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the name of the selected mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.state.mailbox.as_str()
    }

    /// Returns the mailbox status, kept current with untagged data.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.state.status
    }

    /// Returns the number of messages the server last reported.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.state.status.exists
    }

    /// Drains the `EXPUNGE` notices received since the last call, in the
    /// order the server sent them.
    ///
    /// Each number is relative to the mailbox as it stood after the
    /// previous expunge, so they must be applied one at a time.
    pub fn take_expunged(&mut self) -> Vec<SeqNum> {
        std::mem::take(&mut self.state.expunged)
    }

    pub(crate) fn absorb(&mut self, response: &UntaggedResponse) {
        self.state.absorb(response);
    }

    /// Fetches message data by sequence number.
    ///
    /// Returns the FETCH responses in the order the server sent them.
    /// Unsolicited `EXISTS`/`EXPUNGE` arriving alongside update
    /// [`exists`](Self::exists) and [`take_expunged`](Self::take_expunged).
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let untagged = self
            .run(Command::Fetch {
                sequence: sequence.clone(),
                items,
                uid: false,
            })
            .await?;

        let mut results = Vec::new();
        for response in untagged {
            match response {
                UntaggedResponse::Fetch { seq, items } => results.push((seq, items)),
                other => self.absorb(&other),
            }
        }

        Ok(results)
    }

    /// Closes the mailbox and returns to authenticated state.
    ///
    /// The mailbox was opened with EXAMINE, so nothing is expunged.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        self.run(Command::Close).await?;
        Ok(self.transition(Authenticated))
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.send_logout().await
    }
}
