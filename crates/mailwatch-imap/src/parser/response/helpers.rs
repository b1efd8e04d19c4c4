//! Parser helper functions.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{Capability, ResponseCode};

/// Parses a response code.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "UNAVAILABLE" => ResponseCode::Unavailable,
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    // Skip any code arguments we don't model
    while lexer.peek() != Some(b']') && !lexer.is_eof() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Parses space-separated capability atoms up to the end of the line or
/// the closing bracket of a response code.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }

    Ok(caps)
}

/// Reads text until CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();

    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end + 2);

    String::from_utf8_lossy(&remaining[..end]).into_owned()
}

/// Skips one value: an atom, number, string, literal or nested list.
pub fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => {
                depth = depth.checked_sub(1).ok_or_else(|| lexer.error("Unbalanced list"))?;
            }
            Token::Crlf | Token::Eof => return Err(lexer.error("Unexpected end of value")),
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn permanent_flags_are_skipped() {
        let mut lexer = Lexer::new(b"[PERMANENTFLAGS (\\Seen \\*)] rest");
        let code = parse_response_code(&mut lexer).unwrap();
        assert_eq!(code, ResponseCode::Unknown("PERMANENTFLAGS".into()));
        assert_eq!(lexer.remaining(), b" rest");
    }

    #[test]
    fn unknown_code_arguments_are_skipped() {
        let mut lexer = Lexer::new(b"[HIGHESTMODSEQ 715194045007] rest");
        let code = parse_response_code(&mut lexer).unwrap();
        assert_eq!(code, ResponseCode::Unknown("HIGHESTMODSEQ".into()));
        assert_eq!(lexer.remaining(), b" rest");
    }

    #[test]
    fn auth_failure_code() {
        let mut lexer = Lexer::new(b"[AUTHENTICATIONFAILED]");
        assert!(parse_response_code(&mut lexer).unwrap().is_auth_failure());
    }

    #[test]
    fn skip_nested_value_with_literal() {
        let mut lexer = Lexer::new(b"(\"a\" ({3}\r\n))) NIL) UID 5");
        skip_value(&mut lexer).unwrap();
        assert_eq!(lexer.remaining(), b" UID 5");
    }

    #[test]
    fn text_without_crlf_is_taken_whole() {
        let mut lexer = Lexer::new(b"all of it");
        assert_eq!(read_text_until_crlf(&mut lexer), "all of it");
        assert!(lexer.is_eof());
    }
}
