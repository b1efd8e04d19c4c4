//! IMAP command builder.
//!
//! Only the commands a read-only listener issues are modelled.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems};

use serialize::{write_astring, write_fetch_items, write_mailbox};

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    // Authenticated State Commands
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },

    // Selected State Commands
    /// CLOSE command.
    Close,
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
        /// Use UIDs.
        uid: bool,
    },
    /// IDLE command.
    Idle,
    /// DONE (to end IDLE).
    Done,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Examine { mailbox } => f.debug_struct("Examine").field("mailbox", mailbox).finish(),
            Self::Fetch {
                sequence,
                items,
                uid,
            } => f
                .debug_struct("Fetch")
                .field("sequence", sequence)
                .field("items", items)
                .field("uid", uid)
                .finish(),
            Self::Capability => f.write_str("Capability"),
            Self::Noop => f.write_str("Noop"),
            Self::Logout => f.write_str("Logout"),
            Self::Close => f.write_str("Close"),
            Self::Idle => f.write_str("Idle"),
            Self::Done => f.write_str("Done"),
        }
    }
}

impl Command {
    /// Serializes the command to bytes with the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();

        // DONE doesn't get a tag (it's sent during IDLE)
        if !matches!(self, Self::Done) {
            buf.extend_from_slice(tag.as_bytes());
            buf.push(b' ');
        }

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Close => buf.extend_from_slice(b"CLOSE"),

            Self::Fetch {
                sequence,
                items,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }

            Self::Idle => buf.extend_from_slice(b"IDLE"),
            Self::Done => buf.extend_from_slice(b"DONE"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}
