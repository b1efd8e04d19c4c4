//! Command serialization helpers.

use crate::types::Mailbox;

use super::types::{FetchAttribute, FetchItems};

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Writes FETCH items.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items.0.as_slice() {
        [single] => write_fetch_attribute(buf, single),
        attrs => {
            buf.push(b'(');
            for (i, attr) in attrs.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_fetch_attribute(buf, attr);
            }
            buf.push(b')');
        }
    }
}

fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body { section, peek } => {
            if *peek {
                buf.extend_from_slice(b"BODY.PEEK[");
            } else {
                buf.extend_from_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn astring(s: &str) -> String {
        let mut buf = Vec::new();
        write_astring(&mut buf, s);
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn atoms_are_written_bare() {
        assert_eq!(astring("INBOX"), "INBOX");
        assert_eq!(astring("user@example.com"), "user@example.com");
    }

    #[test]
    fn specials_are_quoted_and_escaped() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("Sent Items"), "\"Sent Items\"");
        assert_eq!(astring(r#"pa"ss\word"#), r#""pa\"ss\\word""#);
    }

    #[test]
    fn body_section_is_written() {
        let mut buf = Vec::new();
        write_fetch_attribute(
            &mut buf,
            &FetchAttribute::Body {
                section: Some("HEADER".into()),
                peek: false,
            },
        );
        assert_eq!(buf, b"BODY[HEADER]");
    }
}
