//! Recursive-descent JSON/JSON5 parser driving the visitor dispatch.

use crate::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use crate::depth::{Guard, DEFAULT_MAX_DEPTH};
use crate::error::{Error, ErrorKind, Result};
use crate::json::lexer::{Dialect, Lexer, Token};

/// One-shot parser over a fully buffered input.
///
/// Instances serve exactly one logical operation. The first error becomes
/// sticky: every later call returns the same `Err` without scanning.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    guard: Guard,
    fault: Option<Error>,
}

impl<'a> Parser<'a> {
    /// Strict-JSON parser with the default depth limit.
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, Dialect::Json, DEFAULT_MAX_DEPTH)
    }

    pub fn with_options(input: &'a [u8], dialect: Dialect, max_depth: usize) -> Self {
        Self {
            lexer: Lexer::new(input, dialect),
            guard: Guard::new(max_depth),
            fault: None,
        }
    }

    /// Byte offset of the next unconsumed input.
    pub fn offset(&self) -> usize {
        self.lexer.offset()
    }

    /// Parses exactly one value covering the whole input; anything but
    /// whitespace after it fails with `TrailingData`.
    pub fn parse(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        self.deserialize_any(visitor)?;
        // the remainder is not lexed, so unlexable garbage still reports
        // TrailingData rather than a tokenizer error
        match self.lexer.trailing() {
            Ok(None) => Ok(()),
            Ok(Some(pos)) => {
                let err = Error::at(ErrorKind::TrailingData, "unexpected input after value", pos);
                Err(self.fail(err))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Parses one value and stops, returning the number of bytes consumed.
    /// Trailing input is left untouched.
    pub fn parse_prefix(&mut self, visitor: &mut dyn Visitor) -> Result<usize> {
        self.deserialize_any(visitor)?;
        Ok(self.lexer.offset())
    }

    fn check_fault(&self) -> Result<()> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Records the first error; later failures return the recorded one.
    fn fail(&mut self, err: Error) -> Error {
        match &self.fault {
            Some(first) => first.clone(),
            None => {
                self.fault = Some(err.clone());
                err
            }
        }
    }

    fn read_value(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        let (token, pos) = self.lexer.next_token()?;
        match token {
            Token::Null => visitor.visit_null(),
            Token::True => visitor.visit_bool(true),
            Token::False => visitor.visit_bool(false),
            Token::Int(value) => visitor.visit_i64(value),
            Token::UInt(value) => visitor.visit_u64(value),
            Token::Float(value) => visitor.visit_f64(value),
            Token::Str(value) => visitor.visit_str(&value),
            Token::LBracket => {
                self.guard.enter(Some(pos))?;
                let result = {
                    let mut seq = SeqTokens {
                        de: &mut *self,
                        first: true,
                    };
                    visitor.visit_seq(&mut seq)
                };
                self.guard.leave();
                result
            }
            Token::LBrace => {
                self.guard.enter(Some(pos))?;
                let result = {
                    let mut map = MapTokens {
                        de: &mut *self,
                        first: true,
                    };
                    visitor.visit_map(&mut map)
                };
                self.guard.leave();
                result
            }
            Token::Eof => Err(Error::at(ErrorKind::UnexpectedEnd, "expected a value", pos)),
            other => Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("unexpected {}, expected a value", other.describe()),
                pos,
            )),
        }
    }

    fn seq_next(&mut self, first: &mut bool, visitor: &mut dyn Visitor) -> Result<bool> {
        self.check_fault()?;
        match self.seq_next_inner(first, visitor) {
            Ok(more) => Ok(more),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn seq_next_inner(&mut self, first: &mut bool, visitor: &mut dyn Visitor) -> Result<bool> {
        if matches!(self.lexer.peek()?, Token::RBracket) {
            self.lexer.next_token()?;
            return Ok(false);
        }
        if !*first {
            let (token, pos) = self.lexer.next_token()?;
            if token == Token::Eof {
                return Err(Error::at(ErrorKind::UnexpectedEnd, "unterminated array", pos));
            }
            if token != Token::Comma {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    format!("unexpected {}, expected ',' or ']'", token.describe()),
                    pos,
                ));
            }
            // trailing comma before the closing bracket
            if self.lexer.dialect() == Dialect::Json5
                && matches!(self.lexer.peek()?, Token::RBracket)
            {
                self.lexer.next_token()?;
                return Ok(false);
            }
        }
        *first = false;
        self.read_value(visitor)?;
        Ok(true)
    }

    fn map_next_key(&mut self, first: &mut bool) -> Result<Option<String>> {
        self.check_fault()?;
        match self.map_next_key_inner(first) {
            Ok(key) => Ok(key),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn map_next_key_inner(&mut self, first: &mut bool) -> Result<Option<String>> {
        if matches!(self.lexer.peek()?, Token::RBrace) {
            self.lexer.next_token()?;
            return Ok(None);
        }
        if !*first {
            let (token, pos) = self.lexer.next_token()?;
            if token == Token::Eof {
                return Err(Error::at(
                    ErrorKind::UnexpectedEnd,
                    "unterminated object",
                    pos,
                ));
            }
            if token != Token::Comma {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    format!("unexpected {}, expected ',' or '}}'", token.describe()),
                    pos,
                ));
            }
            if self.lexer.dialect() == Dialect::Json5 && matches!(self.lexer.peek()?, Token::RBrace)
            {
                self.lexer.next_token()?;
                return Ok(None);
            }
        }
        *first = false;
        let (token, pos) = self.lexer.next_token()?;
        let key = match token {
            Token::Str(key) => key,
            // the lexer only produces Ident in JSON5
            Token::Ident(key) => key,
            Token::Eof => {
                return Err(Error::at(
                    ErrorKind::UnexpectedEnd,
                    "unterminated object",
                    pos,
                ));
            }
            other => {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    format!("unexpected {}, expected an object key", other.describe()),
                    pos,
                ));
            }
        };
        let (token, pos) = self.lexer.next_token()?;
        if token != Token::Colon {
            return Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("unexpected {}, expected ':'", token.describe()),
                pos,
            ));
        }
        Ok(Some(key))
    }
}

impl Deserializer for Parser<'_> {
    fn deserialize_any(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        self.check_fault()?;
        match self.read_value(visitor) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }
}

struct SeqTokens<'p, 'a> {
    de: &'p mut Parser<'a>,
    first: bool,
}

impl SeqAccess for SeqTokens<'_, '_> {
    fn next_element(&mut self, visitor: &mut dyn Visitor) -> Result<bool> {
        self.de.seq_next(&mut self.first, visitor)
    }
}

struct MapTokens<'p, 'a> {
    de: &'p mut Parser<'a>,
    first: bool,
}

impl MapAccess for MapTokens<'_, '_> {
    fn next_key(&mut self) -> Result<Option<String>> {
        self.de.map_next_key(&mut self.first)
    }

    fn next_value(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        self.de.deserialize_any(visitor)
    }
}
