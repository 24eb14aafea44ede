//! Error taxonomy shared by every format backend.
//!
//! Text backends report positions as line/column, binary backends as byte
//! offsets. The first error of an operation becomes sticky on the instance
//! that produced it; see the backend modules.

use std::fmt;

use thiserror::Error;

/// Crate-wide result alias. Every fallible operation returns this.
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a serialization/deserialization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A token appeared where the grammar does not allow it.
    #[error("unexpected token")]
    UnexpectedToken,
    /// Input ended before the current value was complete.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// Malformed escape sequence inside a string literal.
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// Byte sequence that is not valid UTF-8 where text was required.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// Numeric literal outside the representable i64/u64/f64 range.
    #[error("number out of range")]
    NumberOutOfRange,
    /// Nesting exceeded the configured maximum depth.
    #[error("maximum depth exceeded")]
    DepthExceeded,
    /// Value shape does not match what the caller or format accepts.
    #[error("invalid type")]
    InvalidType,
    /// Unrecognized MessagePack leading tag byte.
    #[error("invalid tag")]
    InvalidTag,
    /// Non-whitespace input remained after a complete value.
    #[error("trailing data")]
    TrailingData,
    /// Underlying I/O failure from a reader/writer adapter.
    #[error("i/o error")]
    Io,
}

/// Where in the input an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte offset into binary input.
    Offset(usize),
    /// 1-based line and column into text input.
    LineColumn { line: usize, column: usize },
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Offset(offset) => write!(f, "byte {offset}"),
            Position::LineColumn { line, column } => write!(f, "line {line} column {column}"),
        }
    }
}

/// A serialization/deserialization error with positional context.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

impl Error {
    /// Error without positional context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    /// Error detected at a known input position.
    pub fn at(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position: Some(position),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{}: {} at {}", self.kind, self.message, position),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string())
    }
}
