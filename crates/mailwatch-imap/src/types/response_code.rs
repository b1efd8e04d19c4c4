//! Response codes.

use super::Capability;

/// Bracketed response code carried by status responses.
///
/// Codes with no bearing on a read-only listener (`UIDNEXT`,
/// `PERMANENTFLAGS`, ...) come through as [`ResponseCode::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that MUST be shown to user.
    Alert,
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// PARSE: Error parsing message.
    Parse,
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Mailbox doesn't exist, but can be created.
    TryCreate,
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// UNAVAILABLE (RFC 5530): temporary server-side failure.
    Unavailable,
    /// Any other code, by name.
    Unknown(String),
}

impl ResponseCode {
    /// Returns true for codes that report bad credentials.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}
