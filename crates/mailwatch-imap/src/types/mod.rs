//! Core IMAP types.
//!
//! The fundamental types used throughout the client, following RFC 9051
//! (`IMAP4rev2`) and RFC 3501 (`IMAP4rev1`).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use identifiers::{SeqNum, Tag, Uid};
pub use mailbox::{Mailbox, MailboxStatus};
pub use response_code::ResponseCode;
pub use sequence::SequenceSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_new() {
        assert!(SeqNum::new(0).is_none());
        assert!(SeqNum::new(1).is_some());
        assert_eq!(SeqNum::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_uid_new() {
        assert!(Uid::new(0).is_none());
        assert_eq!(Uid::new(123).unwrap().get(), 123);
    }

    #[test]
    fn test_sequence_set_display() {
        assert_eq!(SequenceSet::range(1, 1).unwrap().to_string(), "1");
        assert_eq!(SequenceSet::range(4, 7).unwrap().to_string(), "4:7");
    }
}
