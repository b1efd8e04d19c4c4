//! Errors raised while taking a message apart.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a message or one of its parts could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `Content-Type` value without a usable `type/subtype`.
    #[error("malformed content type {0:?}")]
    InvalidContentType(String),

    /// Base64 body that does not decode even leniently.
    #[error("bad base64 body: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Multipart content type without a `boundary` parameter.
    #[error("multipart body has no boundary parameter")]
    MissingBoundary,

    /// Multipart body whose delimiters cannot be found.
    #[error("malformed multipart body: {0}")]
    InvalidMultipart(String),
}
