//! Type-state markers for IMAP client connection states.
//!
//! `NotAuthenticated` and `Authenticated` are plain markers. `Selected`
//! carries the mailbox it opened and the status the server reported, kept
//! current as untagged data arrives.

use crate::parser::UntaggedResponse;
use crate::types::{Mailbox, MailboxStatus, SeqNum};

/// Marker type for the not-authenticated state.
///
/// In this state, only LOGIN is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// In this state, EXAMINE is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// State for a selected mailbox.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) status: MailboxStatus,
    /// Every `EXPUNGE` absorbed since the caller last drained them, in
    /// arrival order.
    pub(crate) expunged: Vec<SeqNum>,
}

impl Selected {
    /// Creates a new Selected state.
    #[must_use]
    pub const fn new(mailbox: Mailbox, status: MailboxStatus) -> Self {
        Self {
            mailbox,
            status,
            expunged: Vec::new(),
        }
    }

    /// Folds untagged mailbox data into the status.
    pub(crate) fn absorb(&mut self, response: &UntaggedResponse) {
        match response {
            UntaggedResponse::Exists(n) => self.status.exists = *n,
            UntaggedResponse::Expunge(seq) => {
                self.status.exists = self.status.exists.saturating_sub(1);
                self.expunged.push(*seq);
            }
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => self.status.apply_code(code),
            _ => {}
        }
    }
}
