//! Mailbox types.

use super::ResponseCode;

/// Mailbox name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the server has told us about the opened mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Whether the server confirmed read-only access.
    pub read_only: bool,
}

impl MailboxStatus {
    /// Folds a response code from an untagged OK or the tagged completion
    /// into the status.
    pub fn apply_code(&mut self, code: &ResponseCode) {
        match code {
            ResponseCode::ReadOnly => self.read_only = true,
            ResponseCode::ReadWrite => self.read_only = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_name_display() {
        assert_eq!(Mailbox::new("Archive").to_string(), "Archive");
    }

    #[test]
    fn access_mode_follows_last_code() {
        let mut status = MailboxStatus::default();
        status.apply_code(&ResponseCode::ReadOnly);
        status.apply_code(&ResponseCode::Alert);
        assert!(status.read_only);

        status.apply_code(&ResponseCode::ReadWrite);
        assert!(!status.read_only);
    }
}
