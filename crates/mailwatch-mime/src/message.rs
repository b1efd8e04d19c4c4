//! MIME message structure and handling.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string. Unknown values mean 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A MIME entity: a header block and the raw bytes that follow it.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Splits raw entity bytes at the first empty line.
    ///
    /// Without an empty line the whole input is treated as headers.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = split_head(raw);
        Self {
            headers: Headers::parse(&String::from_utf8_lossy(head)),
            body: body.to_vec(),
        }
    }

    /// Gets the content type, `text/plain` when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is present but invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if a Base64 body is malformed.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the body transfer-decoded and converted from its charset.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type or the transfer encoding is
    /// malformed.
    pub fn body_text(&self) -> Result<String> {
        let content_type = self.content_type()?;
        let decoded = self.decode_body()?;
        Ok(decode_charset(&decoded, content_type.charset()))
    }

    /// Splits a multipart body into its immediate child parts.
    ///
    /// The preamble and epilogue are discarded. Nested multiparts are
    /// returned as single parts and not recursed into.
    ///
    /// # Errors
    ///
    /// Returns an error if this is not a multipart entity, if the boundary
    /// parameter is missing, or if no delimiter line is found.
    pub fn parts(&self) -> Result<Vec<Self>> {
        let content_type = self.content_type()?;
        if !content_type.is_multipart() {
            return Err(Error::InvalidMultipart(format!(
                "{}/{} is not multipart",
                content_type.main_type, content_type.sub_type
            )));
        }
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

        Ok(split_multipart(&self.body, boundary)?
            .into_iter()
            .map(Self::parse)
            .collect())
    }
}

/// A parsed email message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// Header parsing is lenient and never fails; body structure is only
    /// interpreted on demand by [`Message::parts`] and
    /// [`Message::plain_text`].
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw),
        }
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.root.content_type()
    }

    /// Gets the unfolded Subject header with encoded words decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_decoded("subject")
    }

    /// Immediate child parts of a multipart message.
    ///
    /// # Errors
    ///
    /// See [`Part::parts`].
    pub fn parts(&self) -> Result<Vec<Part>> {
        self.root.parts()
    }

    /// Extracts the plain-text body.
    ///
    /// A `text/plain` message yields its decoded body. A multipart message
    /// yields its first immediate `text/plain` part. Anything else yields
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message structure or the selected part's
    /// encoding is malformed.
    pub fn plain_text(&self) -> Result<Option<String>> {
        let content_type = self.content_type()?;

        if content_type.is_multipart() {
            return self
                .parts()?
                .iter()
                .find(|part| part.content_type().is_ok_and(|ct| ct.is_text_plain()))
                .map(Part::body_text)
                .transpose();
        }

        if content_type.is_text_plain() {
            return self.root.body_text().map(Some);
        }

        Ok(None)
    }
}

fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;
    while pos < raw.len() {
        let end = line_end(raw, pos);
        let line = &raw[pos..end];
        if line.is_empty() || line == b"\r" {
            let body_start = (end + 1).min(raw.len());
            return (&raw[..pos], &raw[body_start..]);
        }
        pos = end + 1;
    }
    (raw, &[])
}

/// Index of the next `\n` at or after `from`, or the input length.
fn line_end(data: &[u8], from: usize) -> usize {
    data[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(data.len(), |i| from + i)
}

/// Splits a multipart body on `--boundary` delimiter lines (RFC 2046 §5.1.1).
///
/// The line break before a delimiter belongs to the delimiter. A missing
/// close delimiter ends the last part at the end of the body.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut pos = 0;
    let mut seen_delimiter = false;

    while pos < body.len() {
        let end = line_end(body, pos);
        let line = body[pos..end].trim_ascii_end();

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest == b"--";
            if closing || rest.is_empty() {
                seen_delimiter = true;
                if let Some(start) = current.take() {
                    parts.push(strip_trailing_newline(&body[start..pos]));
                }
                if closing {
                    return Ok(parts);
                }
                current = Some((end + 1).min(body.len()));
            }
        }

        pos = end + 1;
    }

    if !seen_delimiter {
        return Err(Error::InvalidMultipart(format!(
            "no delimiter for boundary {boundary:?}"
        )));
    }
    if let Some(start) = current {
        parts.push(&body[start..]);
    }
    Ok(parts)
}

fn strip_trailing_newline(data: &[u8]) -> &[u8] {
    let data = data.strip_suffix(b"\n").unwrap_or(data);
    data.strip_suffix(b"\r").unwrap_or(data)
}
