//! FETCH response parsing.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::helpers::skip_value;
use super::types::FetchItem;

/// Parses the parenthesized item list of a FETCH response.
///
/// Items the listener never asks for (`FLAGS`, `ENVELOPE`, ...) are
/// skipped rather than rejected.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => match name.to_uppercase().as_str() {
                "UID" => {
                    lexer.expect_space()?;
                    let n = lexer.read_number()?;
                    let uid = Uid::new(n)
                        .ok_or_else(|| lexer.error("invalid UID value: 0 (UID cannot be 0)"))?;
                    items.push(FetchItem::Uid(uid));
                }
                "RFC822.SIZE" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Rfc822Size(lexer.read_number()?));
                }
                "BODY" | "BODY.PEEK" | "RFC822" => {
                    let section = parse_section(lexer)?;
                    lexer.expect_space()?;
                    let data = match lexer.next_token()? {
                        Token::Literal(d) => Some(d),
                        Token::QuotedString(s) => Some(s.into_bytes()),
                        Token::Nil => None,
                        token => {
                            return Err(lexer.error(&format!("Expected body data, got {token:?}")));
                        }
                    };
                    items.push(FetchItem::Body { section, data });
                }
                _ => {
                    // BODY[HEADER.FIELDS (..)] style names carry a section too
                    if lexer.peek() == Some(b'[') {
                        parse_section(lexer)?;
                    }
                    lexer.expect_space()?;
                    skip_value(lexer)?;
                }
            },
            token => return Err(lexer.error(&format!("Unexpected token in FETCH: {token:?}"))),
        }
    }

    Ok(items)
}

/// Parses an optional `[section]` and `<origin>` after `BODY`.
///
/// An empty section (`BODY[]`) is the whole message and maps to `None`.
fn parse_section(lexer: &mut Lexer<'_>) -> Result<Option<String>> {
    let mut section = None;

    if lexer.peek() == Some(b'[') {
        lexer.advance();
        let mut buf = Vec::new();
        loop {
            match lexer.advance() {
                Some(b']') => break,
                Some(b) => buf.push(b),
                None => return Err(lexer.error("Unterminated body section")),
            }
        }
        if !buf.is_empty() {
            section = Some(String::from_utf8_lossy(&buf).into_owned());
        }
    }

    if lexer.peek() == Some(b'<') {
        while let Some(b) = lexer.advance() {
            if b == b'>' {
                break;
            }
        }
    }

    Ok(section)
}
