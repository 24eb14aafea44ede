//! JSON5 reading. JSON5 is an input dialect only; emission always produces
//! strict JSON, which every JSON5 reader also accepts.

use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::json::{parse_bytes, parse_bytes_prefix, Dialect, Value, ValueBuilder};

/// Parses a complete JSON5 document into a value tree.
pub fn from_str(input: &str) -> Result<Value> {
    let mut builder = ValueBuilder::new();
    parse_bytes(input.as_bytes(), Dialect::Json5, &mut builder)?;
    builder.finish()
}

/// Parses one JSON5 value off the front of the input and returns it together
/// with the number of bytes consumed.
pub fn from_str_partial(input: &str) -> Result<(Value, usize)> {
    let mut builder = ValueBuilder::new();
    let consumed = parse_bytes_prefix(input.as_bytes(), Dialect::Json5, &mut builder)?;
    Ok((builder.finish()?, consumed))
}

/// Reads a complete JSON5 document from `reader`.
pub fn from_reader(mut reader: impl Read) -> Result<Value> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let mut builder = ValueBuilder::new();
    parse_bytes(&data, Dialect::Json5, &mut builder)?;
    builder.finish()
}

/// Reads a complete JSON5 document from the file at `path`.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value> {
    let data = std::fs::read(path)?;
    let mut builder = ValueBuilder::new();
    parse_bytes(&data, Dialect::Json5, &mut builder)?;
    builder.finish()
}
