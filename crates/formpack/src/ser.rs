//! Format-neutral serializer capability set.
//!
//! A [`Serializer`] is one concrete backend (JSON text emitter, MessagePack
//! encoder) exposing primitive emission calls; a [`Serialize`] value drives
//! those primitives in its own stored order. Neither side knows the other's
//! concrete type, so a third backend can be added without touching any
//! `Serialize` implementation.

use crate::error::Result;

/// Primitive emission operations implemented by each format backend.
///
/// Every call returns `Result<()>`; after the first error the backend
/// instance is sticky and all further calls return the same error without
/// doing work. Partial output already produced before a failure is not
/// rolled back — callers must discard it.
pub trait Serializer {
    fn serialize_null(&mut self) -> Result<()>;
    fn serialize_bool(&mut self, value: bool) -> Result<()>;
    fn serialize_i64(&mut self, value: i64) -> Result<()>;
    fn serialize_u64(&mut self, value: u64) -> Result<()>;
    /// Single-precision float. Backends without a distinct 32-bit wire
    /// representation widen to f64.
    fn serialize_f32(&mut self, value: f32) -> Result<()> {
        self.serialize_f64(value as f64)
    }
    fn serialize_f64(&mut self, value: f64) -> Result<()>;
    fn serialize_str(&mut self, value: &str) -> Result<()>;
    /// Raw bytes. Text backends that cannot represent binary fail with
    /// `InvalidType`.
    fn serialize_bytes(&mut self, value: &[u8]) -> Result<()>;
    /// Extension value (type id + payload). Only meaningful for tag-based
    /// binary formats; others fail with `InvalidType`.
    fn serialize_ext(&mut self, tag: i8, data: &[u8]) -> Result<()>;

    /// Opens an array. `len` is a hint; backends that must write a length
    /// header up front may require it.
    fn begin_array(&mut self, len: Option<usize>) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;

    /// Opens an object. Between `begin_object` and `end_object`, each member
    /// is emitted as a `serialize_key` call followed by exactly one value
    /// emission.
    fn begin_object(&mut self, len: Option<usize>) -> Result<()>;
    fn serialize_key(&mut self, key: &str) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;
}

/// Contract a type satisfies to be written by any backend: emit itself via
/// serializer primitives, propagating the first `Err`.
pub trait Serialize {
    fn serialize(&self, serializer: &mut dyn Serializer) -> Result<()>;
}

impl<T: Serialize + ?Sized> Serialize for &T {
    fn serialize(&self, serializer: &mut dyn Serializer) -> Result<()> {
        (**self).serialize(serializer)
    }
}
