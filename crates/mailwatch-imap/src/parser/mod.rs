//! IMAP protocol parser.
//!
//! A sans-I/O parser for IMAP server responses, split in two layers:
//!
//! - **Lexer**: tokenizes raw bytes into IMAP tokens (atoms, strings, literals, ...)
//! - **Response Parser**: builds structured responses from tokens
//!
//! # Example
//!
//! ```
//! use mailwatch_imap::parser::{ResponseParser, Response, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 12 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(12)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
