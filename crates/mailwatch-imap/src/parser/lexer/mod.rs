//! IMAP lexer for tokenizing server responses.
//!
//! Works on one complete response as assembled by
//! [`FramedStream`](crate::connection::FramedStream): every literal announced
//! with `{n}` is already followed by its `n` bytes.

#![allow(clippy::missing_errors_doc)]

use crate::{Error, Result};

/// One lexical unit of a server response.
///
/// Atoms borrow from the input; quoted strings are unescaped and literals
/// copied out, so both own their bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bare word such as `OK`, `EXISTS` or `\Seen`.
    Atom(&'a str),
    /// `"..."` with escapes resolved.
    QuotedString(String),
    /// `{n}` followed by its `n` bytes.
    Literal(Vec<u8>),
    /// Unsigned decimal.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// A single SP.
    Space,
    /// `*`, either the untagged prefix or the `\*` flag.
    Asterisk,
    /// `+`, the continuation prefix.
    Plus,
    /// `NIL`, any case.
    Nil,
    /// End of the response line.
    Crlf,
    /// Nothing left.
    Eof,
}

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.skip(2);
                    return Ok(Token::Crlf);
                }
                return Err(self.error("Expected LF after CR"));
            }
            b' ' => Token::Space,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b'*' => Token::Asterisk,
            b'+' => Token::Plus,
            b'"' => return self.read_quoted_string(),
            b'{' => return self.read_literal(),
            b'0'..=b'9' => return self.read_number_or_atom(),
            _ if is_atom_char(byte) => return self.read_atom(),
            _ => return Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        };

        self.advance();
        Ok(single)
    }

    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance();

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => result.push(c),
                    Some(c) => {
                        return Err(self.error(&format!("Invalid escape: \\{}", char::from(c))));
                    }
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unterminated quoted string"));
                }
                Some(c) => result.push(c),
            }
        }

        Ok(Token::QuotedString(
            String::from_utf8_lossy(&result).into_owned(),
        ))
    }

    /// Reads `{n}` (or the LITERAL+ form `{n+}`), the CRLF, and `n` bytes.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance();

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.input[start..self.pos];

        if self.peek() == Some(b'+') {
            self.advance();
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }

        let size: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("Invalid literal size"))?;

        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }

        let end = self
            .pos
            .checked_add(size)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| self.error("Incomplete literal data"))?;

        let data = self.input[self.pos..end].to_vec();
        self.pos = end;

        Ok(Token::Literal(data))
    }

    fn read_number_or_atom(&mut self) -> Result<Token<'a>> {
        let s = self.take_atom()?;

        if s.bytes().all(|b| b.is_ascii_digit()) {
            let n: u32 = s.parse().map_err(|_| self.error("Number too large"))?;
            Ok(Token::Number(n))
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn read_atom(&mut self) -> Result<Token<'a>> {
        let s = self.take_atom()?;

        if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn take_atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.advance();
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))
    }

    /// Creates a parse error at the current position.
    pub(crate) fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Expects and consumes a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Expects and consumes a space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }

    /// Consumes a single space if one is next.
    pub fn skip_space(&mut self) {
        if self.peek() == Some(b' ') {
            self.advance();
        }
    }
}

/// Returns true if the byte is a valid atom character.
///
/// `\` is accepted so that flags like `\Seen` lex as a single atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    // atom-specials: ( ) { SP CTL % * " ] ; `[` stays out so BODY[...] splits
    matches!(b,
        0x21 | 0x23 | 0x24 | 0x26 | 0x27 |
        0x2B..=0x5A |
        0x5C |
        0x5E..=0x7A |
        0x7C |
        0x7E
    )
}
