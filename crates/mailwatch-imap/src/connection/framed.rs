//! Framed I/O for IMAP protocol.
//!
//! IMAP responses are CRLF-terminated lines that may embed literals
//! (`{n}\r\n` followed by `n` raw bytes). [`FramedStream::read_response`]
//! returns one complete response with its literals inline.
//!
//! Reading is cancel-safe: the partially assembled response and the number
//! of literal bytes still owed live in the stream, not in the future, so a
//! `read_response` dropped by `tokio::select!` resumes where it stopped on
//! the next call.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Framed connection for IMAP protocol.
///
/// Handles line-based reading with literal support and buffered writing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    /// Bytes of the response being assembled.
    partial: Vec<u8>,
    /// Offset in `partial` where the current line starts.
    line_start: usize,
    /// Literal bytes still to copy before line reading resumes.
    literal_remaining: usize,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            partial: Vec::new(),
            line_start: 0,
            literal_remaining: 0,
        }
    }

    /// Reads a complete IMAP response, including any embedded literals.
    ///
    /// End of stream is reported as an [`io::ErrorKind::UnexpectedEof`] I/O
    /// error, even between responses.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if self.literal_remaining > 0 {
                let n = self.literal_remaining.min(buf.len());
                self.partial.extend_from_slice(&buf[..n]);
                self.reader.consume(n);
                self.literal_remaining -= n;
                if self.literal_remaining == 0 {
                    self.line_start = self.partial.len();
                }
                continue;
            }

            let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
                let len = buf.len();
                self.partial.extend_from_slice(buf);
                self.reader.consume(len);
                if self.partial.len() - self.line_start > MAX_LINE_LENGTH {
                    self.reset();
                    return Err(Error::Protocol("line too long".to_string()));
                }
                continue;
            };

            self.partial.extend_from_slice(&buf[..=pos]);
            self.reader.consume(pos + 1);

            match parse_literal_length(&self.partial[self.line_start..]) {
                Some(len) if len > MAX_LITERAL_SIZE => {
                    self.reset();
                    return Err(Error::Protocol(format!(
                        "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                Some(0) => self.line_start = self.partial.len(),
                Some(len) => self.literal_remaining = len,
                None => {
                    self.line_start = 0;
                    return Ok(std::mem::take(&mut self.partial));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.partial.clear();
        self.line_start = 0;
        self.literal_remaining = 0;
    }

    /// Writes a command to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }
}

/// Parses a literal length from the end of a line.
///
/// Matches lines ending in `{123}\r\n` or `{123+}\r\n` (non-synchronizing).
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);

    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// A response reader that accumulates responses until a tagged response.
pub struct ResponseAccumulator {
    tag: String,
    responses: Vec<Vec<u8>>,
}

impl ResponseAccumulator {
    /// Creates a new response accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            responses: Vec::new(),
        }
    }

    /// Reads responses until a tagged response matching our tag is found.
    pub async fn read_until_tagged<S>(
        &mut self,
        framed: &mut FramedStream<S>,
    ) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let response = framed.read_response().await?;

            let is_tagged = response
                .strip_prefix(self.tag.as_bytes())
                .is_some_and(|rest| rest.first() == Some(&b' '));

            self.responses.push(response);

            if is_tagged {
                break;
            }
        }

        Ok(std::mem::take(&mut self.responses))
    }
}
