//! Generic JSON value tree and its visitor-based materializer.

use crate::de::{MapAccess, SeqAccess, Visitor};
use crate::error::{Error, ErrorKind, Result};
use crate::ser::{Serialize, Serializer};

/// Dynamic JSON value.
///
/// The integer/float distinction observed on parse is preserved so
/// re-serialization is lossless. Objects keep insertion order; keys are
/// unique (a duplicate key on parse replaces the earlier value — last
/// wins — while keeping the first occurrence's position).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Integer too large for i64. Only produced for magnitudes above
    /// `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Looks up an object member by key. Returns `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize(&self, serializer: &mut dyn Serializer) -> Result<()> {
        match self {
            Value::Null => serializer.serialize_null(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::UInt(value) => serializer.serialize_u64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Str(value) => serializer.serialize_str(value),
            Value::Array(items) => {
                serializer.begin_array(Some(items.len()))?;
                for item in items {
                    item.serialize(serializer)?;
                }
                serializer.end_array()
            }
            Value::Object(fields) => {
                serializer.begin_object(Some(fields.len()))?;
                for (key, value) in fields {
                    serializer.serialize_key(key)?;
                    value.serialize(serializer)?;
                }
                serializer.end_object()
            }
        }
    }
}

/// Visitor that builds a [`Value`] tree bottom-up from pull callbacks.
///
/// This is the default target for "deserialize into a generic value" and
/// the reference shape for user-defined `Deserialize` implementations.
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
        self.value = Some(Value::Null);
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

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        self.value = Some(Value::Float(value));
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<()> {
        self.value = Some(Value::Str(value.to_owned()));
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
        let mut fields: Vec<(String, Value)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key()? {
            let mut element = ValueBuilder::new();
            map.next_value(&mut element)?;
            let value = element.finish()?;
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => fields.push((key, value)),
            }
        }
        self.value = Some(Value::Object(fields));
        Ok(())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::json!(i),
            Value::UInt(u) => serde_json::json!(u),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
