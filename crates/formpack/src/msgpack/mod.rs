//! MessagePack binary backend.

mod constants;
mod decoder;
mod encoder;
mod value;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use value::{Value, ValueBuilder};

use std::io::{Read, Write};
use std::path::Path;

use crate::de::Deserializer;
use crate::error::{Error, ErrorKind, Position, Result};
use crate::ser::Serialize;

/// Decodes a complete MessagePack document into a value tree.
///
/// Input after the first value is an error; use [`from_slice_partial`] to
/// read a value off the front of a larger buffer.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(data);
    let mut builder = ValueBuilder::new();
    decoder.deserialize_any(&mut builder)?;
    if decoder.position() != data.len() {
        return Err(Error::at(
            ErrorKind::TrailingData,
            format!("{} bytes after value", data.len() - decoder.position()),
            Position::Offset(decoder.position()),
        ));
    }
    builder.finish()
}

/// Decodes one MessagePack value off the front of the input and returns it
/// together with the number of bytes consumed.
pub fn from_slice_partial(data: &[u8]) -> Result<(Value, usize)> {
    let mut decoder = Decoder::new(data);
    let mut builder = ValueBuilder::new();
    decoder.deserialize_any(&mut builder)?;
    Ok((builder.finish()?, decoder.position()))
}

/// Reads a complete MessagePack document from `reader`.
pub fn from_reader(mut reader: impl Read) -> Result<Value> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    from_slice(&data)
}

/// Reads a complete MessagePack document from the file at `path`.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value> {
    let data = std::fs::read(path)?;
    from_slice(&data)
}

/// Encodes `value` to MessagePack bytes.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    value.serialize(&mut encoder)?;
    encoder.into_bytes()
}

/// Encodes `value` into `writer`.
pub fn to_writer<T: Serialize + ?Sized>(writer: &mut impl Write, value: &T) -> Result<()> {
    let bytes = to_vec(value)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Encodes `value` into the file at `path`, replacing any existing content.
pub fn to_file<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let bytes = to_vec(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encodes `value` and renders the bytes as space-separated lowercase hex,
/// for diagnostics and wire-level assertions.
pub fn to_hex<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = to_vec(value)?;
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trip() {
        let value = Value::Map(vec![
            ("a".into(), Value::Bool(true)),
            ("b".into(), Value::Array(vec![Value::Int(1), Value::Nil])),
        ]);
        let bytes = to_vec(&value).unwrap();
        assert_eq!(from_slice(&bytes).unwrap(), value);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = from_slice(&[0xc0, 0x00]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TrailingData);
        assert_eq!(err.position, Some(Position::Offset(1)));
    }

    #[test]
    fn partial_decode_reports_consumed_bytes() {
        let (value, consumed) = from_slice_partial(&[0x92, 0x01, 0x02, 0xc0]).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn hex_rendering() {
        let value = Value::Map(vec![("a".into(), Value::Bool(true))]);
        assert_eq!(to_hex(&value).unwrap(), "81 a1 61 c3");
    }
}
