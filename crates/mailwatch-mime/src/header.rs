//! MIME header handling.

use crate::encoding::decode_rfc2047;
use std::collections::HashMap;

/// Collection of email headers, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header with RFC 2047 encoded words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_rfc2047)
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if no header was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses a header block.
    ///
    /// Folded lines (starting with a space or tab) are unfolded by dropping
    /// the line break. Parsing stops at the first empty line. Lines that are
    /// neither a `Name: value` field nor a continuation are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(line);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value.trim());
            }

            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim();
                if !name.is_empty() && !name.contains(char::is_whitespace) {
                    current = Some((name.to_string(), value.to_string()));
                }
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value.trim());
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Not: a header\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(headers.get("Not"), None);
    }

    #[test]
    fn test_tab_folding_keeps_whitespace() {
        let headers = Headers::parse("Subject: long\r\n\tsubject line\r\n");
        assert_eq!(headers.get("subject"), Some("long\tsubject line"));
    }

    #[test]
    fn test_repeated_headers_first_wins() {
        let headers = Headers::parse("Received: a\nReceived: b\n");
        assert_eq!(headers.get("received"), Some("a"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let headers = Headers::parse("garbage line\n continuation of nothing\nSubject: ok\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("subject"), Some("ok"));
    }

    #[test]
    fn test_get_decoded_folded_encoded_words() {
        let headers = Headers::parse(concat!(
            "Subject: =?utf-8?Q?Caf=C3=A9?=\r\n",
            " =?utf-8?B?IG9wZW4=?=\r\n",
        ));
        assert_eq!(headers.get_decoded("subject").as_deref(), Some("Café open"));
    }
}
