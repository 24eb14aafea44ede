//! JSON text backend: strict RFC 8259 parsing and emission, with a JSON5
//! dialect switch shared by the [`crate::json5`] module.

mod emitter;
mod lexer;
mod parser;
mod value;

pub use emitter::TextSerializer;
pub use lexer::Dialect;
pub use parser::Parser;
pub use value::{Value, ValueBuilder};

use std::io::{Read, Write};
use std::path::Path;

use crate::de::Visitor;
use crate::depth::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use crate::ser::Serialize;

pub(crate) fn parse_bytes(input: &[u8], dialect: Dialect, visitor: &mut dyn Visitor) -> Result<()> {
    Parser::with_options(input, dialect, DEFAULT_MAX_DEPTH).parse(visitor)
}

pub(crate) fn parse_bytes_prefix(
    input: &[u8],
    dialect: Dialect,
    visitor: &mut dyn Visitor,
) -> Result<usize> {
    Parser::with_options(input, dialect, DEFAULT_MAX_DEPTH).parse_prefix(visitor)
}

/// Parses a complete JSON document into a value tree.
///
/// Input after the first value (other than whitespace) is an error; use
/// [`from_str_partial`] to read a value off the front of a larger buffer.
pub fn from_str(input: &str) -> Result<Value> {
    let mut builder = ValueBuilder::new();
    parse_bytes(input.as_bytes(), Dialect::Json, &mut builder)?;
    builder.finish()
}

/// Parses one JSON value off the front of the input and returns it together
/// with the number of bytes consumed.
pub fn from_str_partial(input: &str) -> Result<(Value, usize)> {
    let mut builder = ValueBuilder::new();
    let consumed = parse_bytes_prefix(input.as_bytes(), Dialect::Json, &mut builder)?;
    Ok((builder.finish()?, consumed))
}

/// Reads a complete JSON document from `reader`.
pub fn from_reader(mut reader: impl Read) -> Result<Value> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let mut builder = ValueBuilder::new();
    parse_bytes(&data, Dialect::Json, &mut builder)?;
    builder.finish()
}

/// Reads a complete JSON document from the file at `path`.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value> {
    let data = std::fs::read(path)?;
    let mut builder = ValueBuilder::new();
    parse_bytes(&data, Dialect::Json, &mut builder)?;
    builder.finish()
}

/// Serializes `value` to compact JSON text.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut serializer = TextSerializer::new();
    value.serialize(&mut serializer)?;
    serializer.finish()
}

/// Serializes `value` to two-space-indented JSON text.
pub fn to_string_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    to_string_pretty_indent(value, "  ")
}

/// Serializes `value` with a caller-chosen indent unit.
pub fn to_string_pretty_indent<T: Serialize + ?Sized>(value: &T, indent: &str) -> Result<String> {
    let mut serializer = TextSerializer::pretty(indent);
    value.serialize(&mut serializer)?;
    serializer.finish()
}

/// Serializes `value` as compact JSON into `writer`.
pub fn to_writer<T: Serialize + ?Sized>(writer: &mut impl Write, value: &T) -> Result<()> {
    let text = to_string(value)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Serializes `value` as pretty JSON into `writer`.
pub fn to_writer_pretty<T: Serialize + ?Sized>(writer: &mut impl Write, value: &T) -> Result<()> {
    let text = to_string_pretty(value)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn document_round_trip() {
        let text = r#"{"name":"box","size":[2,3.5],"open":false,"note":null}"#;
        let value = from_str(text).unwrap();
        assert_eq!(to_string(&value).unwrap(), text);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = from_str("{} true").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TrailingData);
    }

    #[test]
    fn partial_parse_reports_consumed_bytes() {
        let (value, consumed) = from_str_partial("[1, 2] tail").unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(consumed, 6);
    }

    #[test]
    fn reader_and_writer_round_trip() {
        let value = from_reader(&b"[true]"[..]).unwrap();
        let mut out = Vec::new();
        to_writer(&mut out, &value).unwrap();
        assert_eq!(out, b"[true]");
    }
}
