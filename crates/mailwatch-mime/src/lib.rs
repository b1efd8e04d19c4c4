//! # mailwatch-mime
//!
//! Lenient MIME parsing for messages fetched by the listener.
//!
//! ## Features
//!
//! - **Headers**: unfolding, case-insensitive lookup, RFC 2047 encoded words
//! - **Content types**: parameters, quoted values, `text/plain` default
//! - **Transfer decoding**: Base64, Quoted-Printable, 7bit/8bit/binary
//! - **Charsets**: UTF-8, US-ASCII, ISO-8859-1, lossy fallback
//! - **Multipart**: first-level split on the boundary delimiter
//!
//! ## Quick Start
//!
//! ```
//! use mailwatch_mime::Message;
//!
//! let raw = b"Subject: =?utf-8?Q?Caf=C3=A9?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! assert_eq!(message.subject().as_deref(), Some("Café"));
//! assert_eq!(message.plain_text()?.as_deref(), Some("Hello, World!"));
//! # Ok::<(), mailwatch_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
