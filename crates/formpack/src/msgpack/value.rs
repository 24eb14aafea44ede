//! Generic MessagePack value tree and its visitor-based materializer.

use crate::de::{MapAccess, SeqAccess, Visitor};
use crate::error::{Error, ErrorKind, Result};
use crate::ser::{Serialize, Serializer};

/// Dynamic MessagePack value.
///
/// The wire distinctions MessagePack makes beyond JSON (binary payloads,
/// 32-bit floats, extension values) each get their own variant so that
/// decode/encode is lossless. Maps keep insertion order; keys are unique
/// (a duplicate key on decode replaces the earlier value, last wins, while
/// keeping the first occurrence's position).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    /// Integer too large for i64. Only produced for magnitudes above
    /// `i64::MAX`.
    UInt(u64),
    Float32(f32),
    Float64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
    /// Application extension value: type id plus opaque payload.
    Ext(i8, Vec<u8>),
}

impl Value {
    /// Looks up a map entry by key. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize(&self, serializer: &mut dyn Serializer) -> Result<()> {
        match self {
            Value::Nil => serializer.serialize_null(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::UInt(value) => serializer.serialize_u64(*value),
            Value::Float32(value) => serializer.serialize_f32(*value),
            Value::Float64(value) => serializer.serialize_f64(*value),
            Value::Str(value) => serializer.serialize_str(value),
            Value::Bin(data) => serializer.serialize_bytes(data),
            Value::Ext(tag, data) => serializer.serialize_ext(*tag, data),
            Value::Array(items) => {
                serializer.begin_array(Some(items.len()))?;
                for item in items {
                    item.serialize(serializer)?;
                }
                serializer.end_array()
            }
            Value::Map(entries) => {
                serializer.begin_object(Some(entries.len()))?;
                for (key, value) in entries {
                    serializer.serialize_key(key)?;
                    value.serialize(serializer)?;
                }
                serializer.end_object()
            }
        }
    }
}

/// Visitor that builds a [`Value`] tree bottom-up from pull callbacks.
#[derive(Default)]
pub struct ValueBuilder {
    value: Option<Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the builder, returning the materialized value.
    pub fn finish(self) -> Result<Value> {
        self.value
            .ok_or_else(|| Error::new(ErrorKind::InvalidType, "visitor produced no value"))
    }
}

impl Visitor for ValueBuilder {
    fn visit_null(&mut self) -> Result<()> {
        self.value = Some(Value::Nil);
        Ok(())
    }

    fn visit_bool(&mut self, value: bool) -> Result<()> {
        self.value = Some(Value::Bool(value));
        Ok(())
    }

    fn visit_i64(&mut self, value: i64) -> Result<()> {
        self.value = Some(Value::Int(value));
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<()> {
        self.value = Some(match i64::try_from(value) {
            Ok(value) => Value::Int(value),
            Err(_) => Value::UInt(value),
        });
        Ok(())
    }

    fn visit_f32(&mut self, value: f32) -> Result<()> {
        self.value = Some(Value::Float32(value));
        Ok(())
    }

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        self.value = Some(Value::Float64(value));
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<()> {
        self.value = Some(Value::Str(value.to_owned()));
        Ok(())
    }

    fn visit_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.value = Some(Value::Bin(value.to_vec()));
        Ok(())
    }

    fn visit_ext(&mut self, tag: i8, data: &[u8]) -> Result<()> {
        self.value = Some(Value::Ext(tag, data.to_vec()));
        Ok(())
    }

    fn visit_seq(&mut self, seq: &mut dyn SeqAccess) -> Result<()> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        loop {
            let mut element = ValueBuilder::new();
            if !seq.next_element(&mut element)? {
                break;
            }
            items.push(element.finish()?);
        }
        self.value = Some(Value::Array(items));
        Ok(())
    }

    fn visit_map(&mut self, map: &mut dyn MapAccess) -> Result<()> {
        let mut entries: Vec<(String, Value)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key()? {
            let mut element = ValueBuilder::new();
            map.next_value(&mut element)?;
            let value = element.finish()?;
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        self.value = Some(Value::Map(entries));
        Ok(())
    }
}
