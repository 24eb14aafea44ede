//! MessagePack encoder. Always emits the shortest representation that holds
//! the value, so equal inputs produce byte-identical output.

use formpack_buffers::Writer;

use crate::depth::{Guard, DEFAULT_MAX_DEPTH};
use crate::error::{Error, ErrorKind, Result};
use crate::msgpack::constants::*;
use crate::ser::Serializer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Array,
    Map,
}

struct Frame {
    kind: FrameKind,
    /// Entry count written into the header; the caller must emit exactly
    /// this many elements/entries before closing.
    declared: usize,
    count: usize,
    /// For maps: a key has been written and exactly one value must follow.
    expect_value: bool,
}

/// One-shot MessagePack serializer.
pub struct Encoder {
    writer: Writer,
    guard: Guard,
    fault: Option<Error>,
    frames: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            writer: Writer::with_capacity(64),
            guard: Guard::new(max_depth),
            fault: None,
            frames: Vec::new(),
        }
    }

    /// Returns the encoded bytes. Fails if any primitive call failed or a
    /// container was left open.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        if !self.frames.is_empty() {
            return Err(Error::new(ErrorKind::InvalidType, "unclosed container"));
        }
        Ok(self.writer.into_vec())
    }

    fn fail(&mut self, err: Error) -> Error {
        match &self.fault {
            Some(first) => first.clone(),
            None => {
                self.fault = Some(err.clone());
                err
            }
        }
    }

    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        match op(self) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Declared-length bookkeeping before a value is written. The header
    /// already promised a count, so overshooting is caught here and
    /// undershooting when the container is closed.
    fn begin_value(&mut self) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        match frame.kind {
            FrameKind::Array => {
                if frame.count == frame.declared {
                    return Err(Error::new(
                        ErrorKind::InvalidType,
                        "more elements than the declared length",
                    ));
                }
                frame.count += 1;
            }
            FrameKind::Map => {
                if !frame.expect_value {
                    return Err(Error::new(
                        ErrorKind::InvalidType,
                        "map value emitted without a key",
                    ));
                }
                frame.expect_value = false;
            }
        }
        Ok(())
    }

    fn write_u64_minimal(&mut self, value: u64) {
        if value <= POS_FIXINT_MAX as u64 {
            self.writer.u8(value as u8);
        } else if value <= u64::from(u8::MAX) {
            self.writer.u8u8(UINT8, value as u8);
        } else if value <= u64::from(u16::MAX) {
            self.writer.u8u16(UINT16, value as u16);
        } else if value <= u64::from(u32::MAX) {
            self.writer.u8u32(UINT32, value as u32);
        } else {
            self.writer.u8u64(UINT64, value);
        }
    }

    fn write_i64_minimal(&mut self, value: i64) {
        if value >= 0 {
            self.write_u64_minimal(value as u64);
        } else if value >= NEG_FIXINT_MIN {
            self.writer.u8(value as u8);
        } else if value >= i64::from(i8::MIN) {
            self.writer.u8u8(INT8, value as u8);
        } else if value >= i64::from(i16::MIN) {
            self.writer.u8u16(INT16, value as u16);
        } else if value >= i64::from(i32::MIN) {
            self.writer.u8u32(INT32, value as u32);
        } else {
            self.writer.u8u64(INT64, value as u64);
        }
    }

    fn write_str(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if len <= FIXSTR_MAX {
            self.writer.u8(FIXSTR | len as u8);
        } else if len <= u8::MAX as usize {
            self.writer.u8u8(STR8, len as u8);
        } else if len <= u16::MAX as usize {
            self.writer.u8u16(STR16, len as u16);
        } else {
            let len = header_len(len)?;
            self.writer.u8u32(STR32, len);
        }
        self.writer.utf8(value);
        Ok(())
    }

    fn begin_container(
        &mut self,
        len: Option<usize>,
        kind: FrameKind,
        fix: u8,
        wide16: u8,
        wide32: u8,
    ) -> Result<()> {
        let Some(len) = len else {
            return Err(Error::new(
                ErrorKind::InvalidType,
                "container length must be known up front",
            ));
        };
        self.begin_value()?;
        self.guard.enter(None)?;
        self.frames.push(Frame {
            kind,
            declared: len,
            count: 0,
            expect_value: false,
        });
        if len <= FIXCONTAINER_MAX {
            self.writer.u8(fix | len as u8);
        } else if len <= u16::MAX as usize {
            self.writer.u8u16(wide16, len as u16);
        } else {
            let len = header_len(len)?;
            self.writer.u8u32(wide32, len);
        }
        Ok(())
    }

    fn end_container(&mut self, kind: FrameKind) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .filter(|frame| frame.kind == kind && !frame.expect_value)
            .ok_or_else(|| Error::new(ErrorKind::InvalidType, "mismatched container close"))?;
        if frame.count != frame.declared {
            return Err(Error::new(
                ErrorKind::InvalidType,
                format!(
                    "container closed after {} of {} declared entries",
                    frame.count, frame.declared
                ),
            ));
        }
        self.guard.leave();
        Ok(())
    }
}

fn header_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Error::new(
            ErrorKind::NumberOutOfRange,
            "length exceeds the 32-bit wire maximum",
        )
    })
}

impl Serializer for Encoder {
    fn serialize_null(&mut self) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.writer.u8(NIL);
            Ok(())
        })
    }

    fn serialize_bool(&mut self, value: bool) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.writer.u8(if value { TRUE } else { FALSE });
            Ok(())
        })
    }

    fn serialize_i64(&mut self, value: i64) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.write_i64_minimal(value);
            Ok(())
        })
    }

    fn serialize_u64(&mut self, value: u64) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.write_u64_minimal(value);
            Ok(())
        })
    }

    fn serialize_f32(&mut self, value: f32) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.writer.u8f32(FLOAT32, value);
            Ok(())
        })
    }

    fn serialize_f64(&mut self, value: f64) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.writer.u8f64(FLOAT64, value);
            Ok(())
        })
    }

    fn serialize_str(&mut self, value: &str) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.write_str(value)
        })
    }

    fn serialize_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            let len = value.len();
            if len <= u8::MAX as usize {
                s.writer.u8u8(BIN8, len as u8);
            } else if len <= u16::MAX as usize {
                s.writer.u8u16(BIN16, len as u16);
            } else {
                let len = header_len(len)?;
                s.writer.u8u32(BIN32, len);
            }
            s.writer.buf(value);
            Ok(())
        })
    }

    fn serialize_ext(&mut self, tag: i8, data: &[u8]) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            match data.len() {
                1 => s.writer.u8(FIXEXT1),
                2 => s.writer.u8(FIXEXT2),
                4 => s.writer.u8(FIXEXT4),
                8 => s.writer.u8(FIXEXT8),
                16 => s.writer.u8(FIXEXT16),
                len if len <= u8::MAX as usize => s.writer.u8u8(EXT8, len as u8),
                len if len <= u16::MAX as usize => s.writer.u8u16(EXT16, len as u16),
                len => {
                    let len = header_len(len)?;
                    s.writer.u8u32(EXT32, len);
                }
            }
            s.writer.i8(tag);
            s.writer.buf(data);
            Ok(())
        })
    }

    fn begin_array(&mut self, len: Option<usize>) -> Result<()> {
        self.guarded(|s| s.begin_container(len, FrameKind::Array, FIXARRAY, ARRAY16, ARRAY32))
    }

    fn end_array(&mut self) -> Result<()> {
        self.guarded(|s| s.end_container(FrameKind::Array))
    }

    fn begin_object(&mut self, len: Option<usize>) -> Result<()> {
        self.guarded(|s| s.begin_container(len, FrameKind::Map, FIXMAP, MAP16, MAP32))
    }

    fn serialize_key(&mut self, key: &str) -> Result<()> {
        self.guarded(|s| {
            let Some(frame) = s.frames.last_mut() else {
                return Err(Error::new(ErrorKind::InvalidType, "key outside a map"));
            };
            if frame.kind != FrameKind::Map || frame.expect_value {
                return Err(Error::new(
                    ErrorKind::InvalidType,
                    "key emitted where a value was expected",
                ));
            }
            if frame.count == frame.declared {
                return Err(Error::new(
                    ErrorKind::InvalidType,
                    "more entries than the declared length",
                ));
            }
            frame.count += 1;
            frame.expect_value = true;
            s.write_str(key)
        })
    }

    fn end_object(&mut self) -> Result<()> {
        self.guarded(|s| s.end_container(FrameKind::Map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgpack::value::Value;
    use crate::ser::Serialize;

    fn encode(value: &Value) -> Vec<u8> {
        let mut encoder = Encoder::new();
        value.serialize(&mut encoder).unwrap();
        encoder.into_bytes().unwrap()
    }

    #[test]
    fn integers_take_the_shortest_form() {
        assert_eq!(encode(&Value::Int(0)), [0x00]);
        assert_eq!(encode(&Value::Int(127)), [0x7f]);
        assert_eq!(encode(&Value::Int(128)), [UINT8, 128]);
        assert_eq!(encode(&Value::Int(256)), [UINT16, 0x01, 0x00]);
        assert_eq!(encode(&Value::Int(-1)), [0xff]);
        assert_eq!(encode(&Value::Int(-32)), [0xe0]);
        assert_eq!(encode(&Value::Int(-33)), [INT8, 0xdf]);
        assert_eq!(encode(&Value::Int(-129)), [INT16, 0xff, 0x7f]);
    }

    #[test]
    fn strings_take_the_shortest_form() {
        assert_eq!(encode(&Value::Str("a".into())), [0xa1, b'a']);
        let long = "x".repeat(32);
        let bytes = encode(&Value::Str(long.clone()));
        assert_eq!(&bytes[..2], &[STR8, 32]);
        assert_eq!(&bytes[2..], long.as_bytes());
    }

    #[test]
    fn unknown_container_length_is_rejected() {
        let mut encoder = Encoder::new();
        let err = encoder.begin_array(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
        // sticky
        assert!(encoder.serialize_null().is_err());
    }

    #[test]
    fn element_count_must_match_the_declared_length() {
        // too few: header promised 2, only 1 written
        let mut encoder = Encoder::new();
        encoder.begin_array(Some(2)).unwrap();
        encoder.serialize_null().unwrap();
        let err = encoder.end_array().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);

        // too many: the third element overruns the header
        let mut encoder = Encoder::new();
        encoder.begin_array(Some(2)).unwrap();
        encoder.serialize_null().unwrap();
        encoder.serialize_null().unwrap();
        let err = encoder.serialize_null().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn map_entries_alternate_key_and_value() {
        // value without a key
        let mut encoder = Encoder::new();
        encoder.begin_object(Some(1)).unwrap();
        let err = encoder.serialize_i64(1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);

        // key with no value before close
        let mut encoder = Encoder::new();
        encoder.begin_object(Some(1)).unwrap();
        encoder.serialize_key("a").unwrap();
        let err = encoder.end_object().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);

        // more keys than declared
        let mut encoder = Encoder::new();
        encoder.begin_object(Some(1)).unwrap();
        encoder.serialize_key("a").unwrap();
        encoder.serialize_bool(true).unwrap();
        let err = encoder.serialize_key("b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn ext_payload_sizes_pick_fixext_when_possible() {
        assert_eq!(
            encode(&Value::Ext(7, vec![0xaa])),
            [FIXEXT1, 0x07, 0xaa]
        );
        assert_eq!(
            encode(&Value::Ext(-1, vec![1, 2, 3])),
            [EXT8, 3, 0xff, 1, 2, 3]
        );
    }

    #[test]
    fn unclosed_container_fails_into_bytes() {
        let mut encoder = Encoder::new();
        encoder.begin_array(Some(1)).unwrap();
        assert!(encoder.into_bytes().is_err());
    }

    #[test]
    fn depth_guard_applies_to_encoding() {
        let mut encoder = Encoder::with_max_depth(2);
        encoder.begin_array(Some(1)).unwrap();
        encoder.begin_array(Some(1)).unwrap();
        let err = encoder.begin_array(Some(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DepthExceeded);
    }
}
