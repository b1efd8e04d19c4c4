//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 encoded words and the
//! handful of charsets mail servers actually send for plain text.

use crate::error::Result;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Standard alphabet, tolerant of missing padding and trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input contains bytes outside the Base64 alphabet.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045 §6.7).
///
/// Soft line breaks (`=` at end of line) are removed. A malformed escape is
/// kept literally rather than rejected.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        match data.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => i += 3,
            Some([b'\n', _]) => i += 2,
            Some(&[hi, lo]) => {
                if let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) {
                    out.push((hi << 4) | lo);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            _ => {
                // `=` followed by fewer than two bytes.
                if data.get(i + 1) == Some(&b'\n') {
                    i += 2;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
        }
    }

    out
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Converts bytes in `charset` to a string.
///
/// UTF-8 and US-ASCII are decoded lossily; ISO-8859-1 maps each byte to the
/// code point of the same value. Unknown charsets fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let charset = charset.map(|c| c.trim().to_ascii_lowercase());
    match charset.as_deref() {
        Some("iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1") => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`, encoding `B` or `Q`.
/// Whitespace between two adjacent encoded words is dropped; anything that
/// does not parse as an encoded word is kept verbatim.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let literal = &rest[..start];
        match parse_encoded_word(&rest[start..]) {
            Some((decoded, len)) => {
                if !(after_word && literal.chars().all(char::is_whitespace)) {
                    out.push_str(literal);
                }
                out.push_str(&decoded);
                after_word = true;
                rest = &rest[start + len..];
            }
            None => {
                out.push_str(&rest[..start + 2]);
                after_word = false;
                rest = &rest[start + 2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parses one encoded word at the start of `s`, returning the decoded text
/// and the number of bytes consumed.
fn parse_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];

    if charset.is_empty() || encoded.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes()).ok()?,
        "Q" | "q" => decode_q(encoded.as_bytes()),
        _ => return None,
    };

    // RFC 2231 language suffix: `utf-8*en`.
    let charset = charset.split('*').next().unwrap_or(charset);
    let consumed = s.len() - rest.len() + end + 2;
    Some((decode_charset(&bytes, Some(charset)), consumed))
}

/// The `Q` encoding: quoted-printable with `_` standing for a space.
fn decode_q(data: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = data
        .iter()
        .map(|&b| if b == b'_' { b' ' } else { b })
        .collect();
    decode_quoted_printable(&spaced)
}
