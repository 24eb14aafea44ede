//! JSON/JSON5 tokenizer.
//!
//! Operates on raw bytes with a cursor and line/column tracking, so errors
//! carry a text position. The JSON5 dialect is a strict superset: comments
//! become whitespace, identifier keys and single-quoted strings become
//! string tokens, hex integers become integer tokens.

use crate::error::{Error, ErrorKind, Position, Result};

/// Which grammar the tokenizer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Json,
    Json5,
}

/// One lexical token. Number tokens keep the integer/float distinction read
/// off the surface syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Str(String),
    Int(i64),
    /// Integer literal above `i64::MAX`.
    UInt(u64),
    Float(f64),
    True,
    False,
    Null,
    /// Unquoted identifier key (JSON5 only).
    Ident(String),
    Eof,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Str(_) => "string",
            Token::Int(_) | Token::UInt(_) => "integer",
            Token::Float(_) => "number",
            Token::True | Token::False => "boolean",
            Token::Null => "null",
            Token::Ident(_) => "identifier",
            Token::Eof => "end of input",
        }
    }
}

pub struct Lexer<'a> {
    data: &'a [u8],
    x: usize,
    line: usize,
    column: usize,
    dialect: Dialect,
    peeked: Option<(Token, Position, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8], dialect: Dialect) -> Self {
        Self {
            data,
            x: 0,
            line: 1,
            column: 1,
            dialect,
            peeked: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Byte offset of the next unconsumed token (or of the cursor when no
    /// token is buffered).
    pub fn offset(&self) -> usize {
        match &self.peeked {
            Some((_, _, start)) => *start,
            None => self.x,
        }
    }

    fn pos(&self) -> Position {
        Position::LineColumn {
            line: self.line,
            column: self.column,
        }
    }

    /// Consumes one byte, updating line/column.
    fn bump(&mut self) {
        if self.data[self.x] == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.x += 1;
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token> {
        match self.peeked {
            Some(ref entry) => Ok(&entry.0),
            None => {
                let start = self.find_token_start()?;
                let pos = self.pos();
                let token = self.read_token()?;
                Ok(&self.peeked.insert((token, pos, start)).0)
            }
        }
    }

    /// Skips whitespace (and comments in JSON5) and returns the position of
    /// the next remaining input, or `None` at end of input. The remainder is
    /// not lexed, so this cannot fail on unlexable trailing text.
    pub fn trailing(&mut self) -> Result<Option<Position>> {
        if let Some((token, pos, _)) = &self.peeked {
            return Ok(match token {
                Token::Eof => None,
                _ => Some(*pos),
            });
        }
        self.find_token_start()?;
        Ok(match self.peek_byte() {
            Some(_) => Some(self.pos()),
            None => None,
        })
    }

    /// Consumes and returns the next token with its start position.
    pub fn next_token(&mut self) -> Result<(Token, Position)> {
        if let Some((token, pos, _)) = self.peeked.take() {
            return Ok((token, pos));
        }
        self.find_token_start()?;
        let pos = self.pos();
        let token = self.read_token()?;
        Ok((token, pos))
    }

    /// Skips whitespace (and comments in JSON5), returning the byte offset
    /// where the next token starts.
    fn find_token_start(&mut self) -> Result<usize> {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.bump(),
                Some(b'/') if self.dialect == Dialect::Json5 => self.skip_comment()?,
                _ => return Ok(self.x),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let pos = self.pos();
        self.bump(); // '/'
        match self.peek_byte() {
            Some(b'/') => {
                while let Some(b) = self.peek_byte() {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
                Ok(())
            }
            Some(b'*') => {
                self.bump();
                loop {
                    match self.peek_byte() {
                        Some(b'*') => {
                            self.bump();
                            if self.peek_byte() == Some(b'/') {
                                self.bump();
                                return Ok(());
                            }
                        }
                        Some(_) => self.bump(),
                        None => {
                            return Err(Error::at(
                                ErrorKind::UnexpectedEnd,
                                "unterminated block comment",
                                pos,
                            ))
                        }
                    }
                }
            }
            _ => Err(Error::at(
                ErrorKind::UnexpectedToken,
                "unexpected character '/'",
                pos,
            )),
        }
    }

    fn read_token(&mut self) -> Result<Token> {
        let pos = self.pos();
        let Some(byte) = self.peek_byte() else {
            return Ok(Token::Eof);
        };
        match byte {
            b'{' => {
                self.bump();
                Ok(Token::LBrace)
            }
            b'}' => {
                self.bump();
                Ok(Token::RBrace)
            }
            b'[' => {
                self.bump();
                Ok(Token::LBracket)
            }
            b']' => {
                self.bump();
                Ok(Token::RBracket)
            }
            b':' => {
                self.bump();
                Ok(Token::Colon)
            }
            b',' => {
                self.bump();
                Ok(Token::Comma)
            }
            b'"' => self.read_string(b'"'),
            b'\'' if self.dialect == Dialect::Json5 => self.read_string(b'\''),
            b'-' | b'0'..=b'9' => self.read_number(),
            b'_' | b'$' | b'a'..=b'z' | b'A'..=b'Z' => self.read_word(pos),
            _ => Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("unexpected character {:?}", byte as char),
                pos,
            )),
        }
    }

    fn read_word(&mut self, pos: Position) -> Result<Token> {
        let start = self.x;
        while let Some(b) = self.peek_byte() {
            match b {
                b'_' | b'$' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => self.bump(),
                _ => break,
            }
        }
        let word = &self.data[start..self.x];
        match word {
            b"true" => Ok(Token::True),
            b"false" => Ok(Token::False),
            b"null" => Ok(Token::Null),
            _ if self.dialect == Dialect::Json5 => {
                // word is ASCII by construction
                let ident = String::from_utf8_lossy(word).into_owned();
                Ok(Token::Ident(ident))
            }
            _ => Err(Error::at(
                ErrorKind::UnexpectedToken,
                "unexpected identifier",
                pos,
            )),
        }
    }

    fn read_string(&mut self, quote: u8) -> Result<Token> {
        let start_pos = self.pos();
        self.bump(); // opening quote
        let mut out: Vec<u8> = Vec::new();
        loop {
            let Some(byte) = self.peek_byte() else {
                return Err(Error::at(
                    ErrorKind::UnexpectedEnd,
                    "unterminated string",
                    self.pos(),
                ));
            };
            match byte {
                b if b == quote => {
                    self.bump();
                    break;
                }
                b'\\' => self.read_escape(&mut out)?,
                0x00..=0x1f => {
                    return Err(Error::at(
                        ErrorKind::UnexpectedToken,
                        "unescaped control character in string",
                        self.pos(),
                    ));
                }
                b => {
                    out.push(b);
                    self.bump();
                }
            }
        }
        let text = String::from_utf8(out)
            .map_err(|_| Error::at(ErrorKind::InvalidUtf8, "string is not valid utf-8", start_pos))?;
        Ok(Token::Str(text))
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let pos = self.pos();
        self.bump(); // backslash
        let Some(byte) = self.peek_byte() else {
            return Err(Error::at(
                ErrorKind::UnexpectedEnd,
                "unterminated escape sequence",
                pos,
            ));
        };
        self.bump();
        match byte {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'\'' if self.dialect == Dialect::Json5 => out.push(b'\''),
            b'u' => {
                let unit = self.read_hex4(pos)?;
                let code_point = if (0xd800..=0xdbff).contains(&unit) {
                    // high surrogate, a \uXXXX low surrogate must follow
                    if self.peek_byte() != Some(b'\\') {
                        return Err(Error::at(ErrorKind::InvalidEscape, "unpaired surrogate", pos));
                    }
                    self.bump();
                    if self.peek_byte() != Some(b'u') {
                        return Err(Error::at(ErrorKind::InvalidEscape, "unpaired surrogate", pos));
                    }
                    self.bump();
                    let low = self.read_hex4(pos)?;
                    if !(0xdc00..=0xdfff).contains(&low) {
                        return Err(Error::at(ErrorKind::InvalidEscape, "unpaired surrogate", pos));
                    }
                    0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00)
                } else if (0xdc00..=0xdfff).contains(&unit) {
                    return Err(Error::at(ErrorKind::InvalidEscape, "unpaired surrogate", pos));
                } else {
                    unit
                };
                let ch = char::from_u32(code_point).ok_or_else(|| {
                    Error::at(ErrorKind::InvalidEscape, "invalid unicode escape", pos)
                })?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => {
                return Err(Error::at(
                    ErrorKind::InvalidEscape,
                    format!("invalid escape character {:?}", other as char),
                    pos,
                ));
            }
        }
        Ok(())
    }

    fn read_hex4(&mut self, pos: Position) -> Result<u32> {
        let mut value: u32 = 0;
        for _ in 0..4 {
            let Some(byte) = self.peek_byte() else {
                return Err(Error::at(
                    ErrorKind::UnexpectedEnd,
                    "unterminated unicode escape",
                    pos,
                ));
            };
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => {
                    return Err(Error::at(
                        ErrorKind::InvalidEscape,
                        "invalid unicode escape digit",
                        pos,
                    ));
                }
            };
            self.bump();
            value = (value << 4) | digit as u32;
        }
        Ok(value)
    }

    fn read_number(&mut self) -> Result<Token> {
        let pos = self.pos();
        let start = self.x;
        let negative = self.peek_byte() == Some(b'-');
        if negative {
            self.bump();
        }

        // JSON5 hex integer
        if self.dialect == Dialect::Json5
            && self.peek_byte() == Some(b'0')
            && matches!(self.data.get(self.x + 1), Some(b'x' | b'X'))
        {
            self.bump();
            self.bump();
            return self.read_hex_integer(negative, pos);
        }

        if !matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            return Err(Error::at(
                ErrorKind::UnexpectedToken,
                "expected a digit",
                pos,
            ));
        }
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.bump();
        }

        let mut is_float = false;
        if self.peek_byte() == Some(b'.') {
            is_float = true;
            self.bump();
            if !matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    "expected a digit after '.'",
                    self.pos(),
                ));
            }
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if matches!(self.peek_byte(), Some(b'e' | b'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek_byte(), Some(b'+' | b'-')) {
                self.bump();
            }
            if !matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    "expected a digit in exponent",
                    self.pos(),
                ));
            }
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }

        // the scanned range is ASCII digits/sign/dot/exponent
        let text = std::str::from_utf8(&self.data[start..self.x])
            .map_err(|_| Error::at(ErrorKind::InvalidUtf8, "malformed number", pos))?;
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| Error::at(ErrorKind::UnexpectedToken, "malformed number", pos))?;
            if !value.is_finite() {
                return Err(Error::at(
                    ErrorKind::NumberOutOfRange,
                    "float literal overflows f64",
                    pos,
                ));
            }
            Ok(Token::Float(value))
        } else if let Ok(value) = text.parse::<i64>() {
            Ok(Token::Int(value))
        } else if !negative {
            match text.parse::<u64>() {
                Ok(value) => Ok(Token::UInt(value)),
                Err(_) => Err(Error::at(
                    ErrorKind::NumberOutOfRange,
                    "integer literal overflows u64",
                    pos,
                )),
            }
        } else {
            Err(Error::at(
                ErrorKind::NumberOutOfRange,
                "integer literal overflows i64",
                pos,
            ))
        }
    }

    fn read_hex_integer(&mut self, negative: bool, pos: Position) -> Result<Token> {
        let digits_start = self.x;
        let mut value: u64 = 0;
        while let Some(byte) = self.peek_byte() {
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => break,
            };
            value = value
                .checked_mul(16)
                .and_then(|v| v.checked_add(digit as u64))
                .ok_or_else(|| {
                    Error::at(ErrorKind::NumberOutOfRange, "hex literal overflows u64", pos)
                })?;
            self.bump();
        }
        if self.x == digits_start {
            return Err(Error::at(
                ErrorKind::UnexpectedToken,
                "expected hex digits",
                pos,
            ));
        }
        if negative {
            if value > i64::MAX as u64 + 1 {
                return Err(Error::at(
                    ErrorKind::NumberOutOfRange,
                    "hex literal overflows i64",
                    pos,
                ));
            }
            Ok(Token::Int((value as i128).wrapping_neg() as i64))
        } else if value <= i64::MAX as u64 {
            Ok(Token::Int(value as i64))
        } else {
            Ok(Token::UInt(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str, dialect: Dialect) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(input.as_bytes(), dialect);
        let mut out = Vec::new();
        loop {
            let (token, _) = lexer.next_token()?;
            let done = token == Token::Eof;
            out.push(token);
            if done {
                return Ok(out);
            }
        }
    }

    #[test]
    fn punctuation_and_keywords() {
        assert_eq!(
            tokens("[true, false, null]", Dialect::Json).unwrap(),
            vec![
                Token::LBracket,
                Token::True,
                Token::Comma,
                Token::False,
                Token::Comma,
                Token::Null,
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn number_surface_syntax_sets_the_tag() {
        assert_eq!(tokens("0", Dialect::Json).unwrap()[0], Token::Int(0));
        assert_eq!(tokens("-17", Dialect::Json).unwrap()[0], Token::Int(-17));
        assert_eq!(tokens("1.0", Dialect::Json).unwrap()[0], Token::Float(1.0));
        assert_eq!(tokens("1e3", Dialect::Json).unwrap()[0], Token::Float(1000.0));
        assert_eq!(
            tokens("18446744073709551615", Dialect::Json).unwrap()[0],
            Token::UInt(u64::MAX)
        );
    }

    #[test]
    fn integer_overflow_is_out_of_range() {
        let err = tokens("18446744073709551616", Dialect::Json).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NumberOutOfRange);
        let err = tokens("-9223372036854775809", Dialect::Json).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NumberOutOfRange);
        let err = tokens("1e999", Dialect::Json).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NumberOutOfRange);
    }

    #[test]
    fn escapes_decode() {
        assert_eq!(
            tokens(r#""a\n\t\"\\A""#, Dialect::Json).unwrap()[0],
            Token::Str("a\n\t\"\\A".into())
        );
        // surrogate pair for U+1F600
        assert_eq!(
            tokens(r#""😀""#, Dialect::Json).unwrap()[0],
            Token::Str("\u{1f600}".into())
        );
    }

    #[test]
    fn bad_escapes_are_rejected() {
        assert_eq!(
            tokens(r#""\q""#, Dialect::Json).unwrap_err().kind,
            ErrorKind::InvalidEscape
        );
        assert_eq!(
            tokens(r#""\ud83d""#, Dialect::Json).unwrap_err().kind,
            ErrorKind::InvalidEscape
        );
        assert_eq!(
            tokens(r#""\u12g4""#, Dialect::Json).unwrap_err().kind,
            ErrorKind::InvalidEscape
        );
    }

    #[test]
    fn json5_extras() {
        assert_eq!(
            tokens("// c\n 0x2a", Dialect::Json5).unwrap()[0],
            Token::Int(42)
        );
        assert_eq!(
            tokens("/* b */ 'hi'", Dialect::Json5).unwrap()[0],
            Token::Str("hi".into())
        );
        assert_eq!(
            tokens("key", Dialect::Json5).unwrap()[0],
            Token::Ident("key".into())
        );
        assert_eq!(tokens("-0x10", Dialect::Json5).unwrap()[0], Token::Int(-16));
    }

    #[test]
    fn json5_extras_rejected_in_strict_json() {
        assert_eq!(
            tokens("'hi'", Dialect::Json).unwrap_err().kind,
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            tokens("// c", Dialect::Json).unwrap_err().kind,
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            tokens("key", Dialect::Json).unwrap_err().kind,
            ErrorKind::UnexpectedToken
        );
    }

    #[test]
    fn positions_are_line_and_column() {
        let mut lexer = Lexer::new(b"{\n  \"a\"", Dialect::Json);
        let (_, pos) = lexer.next_token().unwrap();
        assert_eq!(pos, Position::LineColumn { line: 1, column: 1 });
        let (_, pos) = lexer.next_token().unwrap();
        assert_eq!(pos, Position::LineColumn { line: 2, column: 3 });
    }

    #[test]
    fn unterminated_inputs_hit_unexpected_end() {
        assert_eq!(
            tokens(r#""abc"#, Dialect::Json).unwrap_err().kind,
            ErrorKind::UnexpectedEnd
        );
        assert_eq!(
            tokens("/* open", Dialect::Json5).unwrap_err().kind,
            ErrorKind::UnexpectedEnd
        );
    }
}
