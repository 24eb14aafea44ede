//! Format-neutral deserializer capability set and visitor dispatch.
//!
//! A backend's [`Deserializer`] inspects the next token/tag and calls the
//! matching method on a caller-supplied [`Visitor`]. Sequence and map
//! visits hand the visitor a pull accessor that re-enters the dispatch
//! loop, so the same backend drives either a generic value-tree builder or
//! a user type's own `Deserialize` without knowing which.

use crate::error::{Error, ErrorKind, Result};

fn unexpected(shape: &str) -> Error {
    Error::new(ErrorKind::InvalidType, format!("unexpected {shape}"))
}

/// Pull access to the elements of a sequence being deserialized.
pub trait SeqAccess {
    /// Drives `visitor` with the next element. Returns `Ok(false)` when the
    /// sequence has ended, in which case `visitor` was not invoked.
    fn next_element(&mut self, visitor: &mut dyn Visitor) -> Result<bool>;

    /// Remaining element count, when the format declares it up front.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Pull access to the entries of a map being deserialized.
pub trait MapAccess {
    /// Reads the next key, or `Ok(None)` when the map has ended. Each
    /// `Some` key must be followed by exactly one `next_value` call.
    fn next_key(&mut self) -> Result<Option<String>>;

    /// Drives `visitor` with the value belonging to the last key.
    fn next_value(&mut self, visitor: &mut dyn Visitor) -> Result<()>;

    /// Remaining entry count, when the format declares it up front.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Per-shape callbacks invoked by a deserializer's dispatch loop.
///
/// Every method defaults to an `InvalidType` error naming the shape, so an
/// implementation only overrides what it accepts.
pub trait Visitor {
    fn visit_null(&mut self) -> Result<()> {
        Err(unexpected("null"))
    }

    fn visit_bool(&mut self, value: bool) -> Result<()> {
        let _ = value;
        Err(unexpected("bool"))
    }

    fn visit_i64(&mut self, value: i64) -> Result<()> {
        let _ = value;
        Err(unexpected("integer"))
    }

    fn visit_u64(&mut self, value: u64) -> Result<()> {
        let _ = value;
        Err(unexpected("unsigned integer"))
    }

    /// Single-precision float. Defaults to widening, so only visitors that
    /// preserve the 32-bit tag override this.
    fn visit_f32(&mut self, value: f32) -> Result<()> {
        self.visit_f64(value as f64)
    }

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        let _ = value;
        Err(unexpected("float"))
    }

    fn visit_str(&mut self, value: &str) -> Result<()> {
        let _ = value;
        Err(unexpected("string"))
    }

    fn visit_bytes(&mut self, value: &[u8]) -> Result<()> {
        let _ = value;
        Err(unexpected("bytes"))
    }

    fn visit_ext(&mut self, tag: i8, data: &[u8]) -> Result<()> {
        let _ = (tag, data);
        Err(unexpected("extension"))
    }

    fn visit_seq(&mut self, seq: &mut dyn SeqAccess) -> Result<()> {
        let _ = seq;
        Err(unexpected("array"))
    }

    fn visit_map(&mut self, map: &mut dyn MapAccess) -> Result<()> {
        let _ = map;
        Err(unexpected("map"))
    }
}

/// Primitive pull operations implemented by each format backend.
///
/// `deserialize_any` is the dispatch entry point; the typed pulls are
/// implemented on top of it and fail with `InvalidType` when the next value
/// has a different shape.
pub trait Deserializer {
    fn deserialize_any(&mut self, visitor: &mut dyn Visitor) -> Result<()>;

    fn deserialize_bool(&mut self) -> Result<bool> {
        let mut out = BoolVisitor(None);
        self.deserialize_any(&mut out)?;
        out.0.ok_or_else(|| unexpected("shape, expected bool"))
    }

    fn deserialize_i64(&mut self) -> Result<i64> {
        let mut out = IntVisitor(None);
        self.deserialize_any(&mut out)?;
        out.0.ok_or_else(|| unexpected("shape, expected integer"))
    }

    fn deserialize_u64(&mut self) -> Result<u64> {
        let mut out = UintVisitor(None);
        self.deserialize_any(&mut out)?;
        out.0.ok_or_else(|| unexpected("shape, expected unsigned integer"))
    }

    fn deserialize_f64(&mut self) -> Result<f64> {
        let mut out = FloatVisitor(None);
        self.deserialize_any(&mut out)?;
        out.0.ok_or_else(|| unexpected("shape, expected float"))
    }

    fn deserialize_str(&mut self) -> Result<String> {
        let mut out = StrVisitor(None);
        self.deserialize_any(&mut out)?;
        out.0.ok_or_else(|| unexpected("shape, expected string"))
    }
}

/// Contract a type satisfies to be read from any backend: pull its fields
/// via deserializer primitives, mutate `self` on success, propagate the
/// first `Err`.
pub trait Deserialize {
    fn deserialize(&mut self, deserializer: &mut dyn Deserializer) -> Result<()>;
}

struct BoolVisitor(Option<bool>);

impl Visitor for BoolVisitor {
    fn visit_bool(&mut self, value: bool) -> Result<()> {
        self.0 = Some(value);
        Ok(())
    }
}

struct IntVisitor(Option<i64>);

impl Visitor for IntVisitor {
    fn visit_i64(&mut self, value: i64) -> Result<()> {
        self.0 = Some(value);
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<()> {
        let value = i64::try_from(value).map_err(|_| {
            Error::new(ErrorKind::NumberOutOfRange, "unsigned value exceeds i64")
        })?;
        self.0 = Some(value);
        Ok(())
    }
}

struct UintVisitor(Option<u64>);

impl Visitor for UintVisitor {
    fn visit_i64(&mut self, value: i64) -> Result<()> {
        let value = u64::try_from(value)
            .map_err(|_| Error::new(ErrorKind::NumberOutOfRange, "negative value for u64"))?;
        self.0 = Some(value);
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<()> {
        self.0 = Some(value);
        Ok(())
    }
}

struct FloatVisitor(Option<f64>);

impl Visitor for FloatVisitor {
    fn visit_i64(&mut self, value: i64) -> Result<()> {
        self.0 = Some(value as f64);
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<()> {
        self.0 = Some(value as f64);
        Ok(())
    }

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        self.0 = Some(value);
        Ok(())
    }
}

struct StrVisitor(Option<String>);

impl Visitor for StrVisitor {
    fn visit_str(&mut self, value: &str) -> Result<()> {
        self.0 = Some(value.to_owned());
        Ok(())
    }
}
