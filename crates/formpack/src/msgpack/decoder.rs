//! MessagePack decoder driving the visitor dispatch.

use crate::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use crate::depth::{Guard, DEFAULT_MAX_DEPTH};
use crate::error::{Error, ErrorKind, Position, Result};
use crate::msgpack::constants::*;

/// One-shot decoder over a fully buffered input.
///
/// Instances serve exactly one logical operation. The first error becomes
/// sticky: every later call returns the same `Err` without reading.
pub struct Decoder<'a> {
    data: &'a [u8],
    x: usize,
    guard: Guard,
    fault: Option<Error>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            x: 0,
            guard: Guard::new(max_depth),
            fault: None,
        }
    }

    /// Byte offset of the next unconsumed input.
    pub fn position(&self) -> usize {
        self.x
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

    fn short(&self) -> Error {
        Error::at(
            ErrorKind::UnexpectedEnd,
            "input ended inside a value",
            Position::Offset(self.x),
        )
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.x.checked_add(len).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.x..end];
                self.x = end;
                Ok(slice)
            }
            None => Err(self.short()),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.u64()?))
    }

    fn utf8(&mut self, len: usize) -> Result<&'a str> {
        let start = self.x;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|err| {
            Error::at(
                ErrorKind::InvalidUtf8,
                format!("string payload is not valid UTF-8 ({err})"),
                Position::Offset(start),
            )
        })
    }

    /// Big-endian unsigned value routed through the signed callback when it
    /// fits, so visitors see one integer shape for the common range.
    fn dispatch_u64(&mut self, value: u64, visitor: &mut dyn Visitor) -> Result<()> {
        match i64::try_from(value) {
            Ok(value) => visitor.visit_i64(value),
            Err(_) => visitor.visit_u64(value),
        }
    }

    fn read_seq(&mut self, len: usize, pos: usize, visitor: &mut dyn Visitor) -> Result<()> {
        self.guard.enter(Some(Position::Offset(pos)))?;
        let result = {
            let mut seq = SeqReader {
                de: &mut *self,
                remaining: len,
            };
            visitor.visit_seq(&mut seq)
        };
        self.guard.leave();
        result
    }

    fn read_map(&mut self, len: usize, pos: usize, visitor: &mut dyn Visitor) -> Result<()> {
        self.guard.enter(Some(Position::Offset(pos)))?;
        let result = {
            let mut map = MapReader {
                de: &mut *self,
                remaining: len,
                expect_value: false,
            };
            visitor.visit_map(&mut map)
        };
        self.guard.leave();
        result
    }

    fn read_ext(&mut self, len: usize, visitor: &mut dyn Visitor) -> Result<()> {
        let tag = self.u8()? as i8;
        let data = self.take(len)?;
        visitor.visit_ext(tag, data)
    }

    fn read_value(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        let pos = self.x;
        let marker = self.u8()?;
        match marker {
            // positive fixint
            0x00..=0x7f => visitor.visit_i64(i64::from(marker)),
            // negative fixint
            0xe0..=0xff => visitor.visit_i64(i64::from(marker as i8)),
            0x80..=0x8f => {
                let len = (marker & 0x0f) as usize;
                self.read_map(len, pos, visitor)
            }
            0x90..=0x9f => {
                let len = (marker & 0x0f) as usize;
                self.read_seq(len, pos, visitor)
            }
            0xa0..=0xbf => {
                let len = (marker & 0x1f) as usize;
                let text = self.utf8(len)?;
                visitor.visit_str(text)
            }
            NIL => visitor.visit_null(),
            NEVER_USED => Err(Error::at(
                ErrorKind::InvalidTag,
                "reserved marker 0xc1",
                Position::Offset(pos),
            )),
            FALSE => visitor.visit_bool(false),
            TRUE => visitor.visit_bool(true),
            BIN8 => {
                let len = self.u8()? as usize;
                let data = self.take(len)?;
                visitor.visit_bytes(data)
            }
            BIN16 => {
                let len = self.u16()? as usize;
                let data = self.take(len)?;
                visitor.visit_bytes(data)
            }
            BIN32 => {
                let len = self.u32()? as usize;
                let data = self.take(len)?;
                visitor.visit_bytes(data)
            }
            EXT8 => {
                let len = self.u8()? as usize;
                self.read_ext(len, visitor)
            }
            EXT16 => {
                let len = self.u16()? as usize;
                self.read_ext(len, visitor)
            }
            EXT32 => {
                let len = self.u32()? as usize;
                self.read_ext(len, visitor)
            }
            FLOAT32 => {
                let value = self.f32()?;
                visitor.visit_f32(value)
            }
            FLOAT64 => {
                let value = self.f64()?;
                visitor.visit_f64(value)
            }
            UINT8 => {
                let value = self.u8()?;
                visitor.visit_i64(i64::from(value))
            }
            UINT16 => {
                let value = self.u16()?;
                visitor.visit_i64(i64::from(value))
            }
            UINT32 => {
                let value = self.u32()?;
                visitor.visit_i64(i64::from(value))
            }
            UINT64 => {
                let value = self.u64()?;
                self.dispatch_u64(value, visitor)
            }
            INT8 => {
                let value = self.u8()? as i8;
                visitor.visit_i64(i64::from(value))
            }
            INT16 => {
                let value = self.u16()? as i16;
                visitor.visit_i64(i64::from(value))
            }
            INT32 => {
                let value = self.u32()? as i32;
                visitor.visit_i64(i64::from(value))
            }
            INT64 => {
                let value = self.u64()? as i64;
                visitor.visit_i64(value)
            }
            FIXEXT1 => self.read_ext(1, visitor),
            FIXEXT2 => self.read_ext(2, visitor),
            FIXEXT4 => self.read_ext(4, visitor),
            FIXEXT8 => self.read_ext(8, visitor),
            FIXEXT16 => self.read_ext(16, visitor),
            STR8 => {
                let len = self.u8()? as usize;
                let text = self.utf8(len)?;
                visitor.visit_str(text)
            }
            STR16 => {
                let len = self.u16()? as usize;
                let text = self.utf8(len)?;
                visitor.visit_str(text)
            }
            STR32 => {
                let len = self.u32()? as usize;
                let text = self.utf8(len)?;
                visitor.visit_str(text)
            }
            ARRAY16 => {
                let len = self.u16()? as usize;
                self.read_seq(len, pos, visitor)
            }
            ARRAY32 => {
                let len = self.u32()? as usize;
                self.read_seq(len, pos, visitor)
            }
            MAP16 => {
                let len = self.u16()? as usize;
                self.read_map(len, pos, visitor)
            }
            MAP32 => {
                let len = self.u32()? as usize;
                self.read_map(len, pos, visitor)
            }
        }
    }

    /// Reads a map key, which must be a string value on the wire.
    fn read_key(&mut self) -> Result<String> {
        let pos = self.x;
        let marker = self.u8()?;
        let len = match marker {
            0xa0..=0xbf => (marker & 0x1f) as usize,
            STR8 => self.u8()? as usize,
            STR16 => self.u16()? as usize,
            STR32 => self.u32()? as usize,
            other => {
                return Err(Error::at(
                    ErrorKind::InvalidType,
                    format!("map key must be a string, found marker 0x{other:02x}"),
                    Position::Offset(pos),
                ));
            }
        };
        Ok(self.utf8(len)?.to_owned())
    }

    fn seq_next(&mut self, remaining: &mut usize, visitor: &mut dyn Visitor) -> Result<bool> {
        self.check_fault()?;
        if *remaining == 0 {
            return Ok(false);
        }
        *remaining -= 1;
        match self.read_value(visitor) {
            Ok(()) => Ok(true),
            Err(err) => Err(self.fail(err)),
        }
    }
}

impl Deserializer for Decoder<'_> {
    fn deserialize_any(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        self.check_fault()?;
        match self.read_value(visitor) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }
}

struct SeqReader<'d, 'a> {
    de: &'d mut Decoder<'a>,
    remaining: usize,
}

impl SeqAccess for SeqReader<'_, '_> {
    fn next_element(&mut self, visitor: &mut dyn Visitor) -> Result<bool> {
        self.de.seq_next(&mut self.remaining, visitor)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct MapReader<'d, 'a> {
    de: &'d mut Decoder<'a>,
    remaining: usize,
    expect_value: bool,
}

impl MapAccess for MapReader<'_, '_> {
    fn next_key(&mut self) -> Result<Option<String>> {
        self.de.check_fault()?;
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.expect_value = true;
        match self.de.read_key() {
            Ok(key) => Ok(Some(key)),
            Err(err) => Err(self.de.fail(err)),
        }
    }

    fn next_value(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        self.de.check_fault()?;
        if !self.expect_value {
            let err = Error::new(ErrorKind::InvalidType, "value pulled without a key");
            return Err(self.de.fail(err));
        }
        self.expect_value = false;
        match self.de.read_value(visitor) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.de.fail(err)),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}
