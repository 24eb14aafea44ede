//! JSON text emitter implementing the serializer capability set.
//!
//! Compact mode writes minimal separators; pretty mode writes a configurable
//! indent unit and one line per nesting level. Output already produced when
//! a call fails stays in the buffer; `finish` refuses to hand it over.

use crate::depth::{Guard, DEFAULT_MAX_DEPTH};
use crate::error::{Error, ErrorKind, Result};
use crate::ser::Serializer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Array,
    Object,
}

struct Frame {
    kind: FrameKind,
    count: usize,
    /// For objects: a key has been written and exactly one value must follow.
    expect_value: bool,
}

/// One-shot JSON text serializer.
pub struct TextSerializer {
    out: String,
    indent: Option<String>,
    frames: Vec<Frame>,
    guard: Guard,
    fault: Option<Error>,
}

impl Default for TextSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSerializer {
    /// Compact output, default depth limit.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: None,
            frames: Vec::new(),
            guard: Guard::new(DEFAULT_MAX_DEPTH),
            fault: None,
        }
    }

    /// Pretty output with the given indent unit.
    pub fn pretty(indent: &str) -> Self {
        Self {
            indent: Some(indent.to_owned()),
            ..Self::new()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.guard = Guard::new(max_depth);
        self
    }

    /// Returns the produced text. Fails if any primitive call failed or a
    /// container was left open.
    pub fn finish(self) -> Result<String> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        if !self.frames.is_empty() {
            return Err(Error::new(ErrorKind::InvalidType, "unclosed container"));
        }
        Ok(self.out)
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

    fn newline_indent(&mut self, level: usize) {
        if let Some(indent) = &self.indent {
            self.out.push('\n');
            for _ in 0..level {
                self.out.push_str(indent);
            }
        }
    }

    /// Separator/position bookkeeping before a value is written.
    fn begin_value(&mut self) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        match frame.kind {
            FrameKind::Array => {
                let first = frame.count == 0;
                frame.count += 1;
                if !first {
                    self.out.push(',');
                }
                self.newline_indent(self.frames.len());
            }
            FrameKind::Object => {
                if !frame.expect_value {
                    return Err(Error::new(
                        ErrorKind::InvalidType,
                        "object value emitted without a key",
                    ));
                }
                frame.expect_value = false;
            }
        }
        Ok(())
    }

    fn write_escaped(&mut self, value: &str) {
        self.out.push('"');
        for ch in value.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                ch if (ch as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", ch as u32));
                }
                // non-ASCII passes through as raw UTF-8
                ch => self.out.push(ch),
            }
        }
        self.out.push('"');
    }
}

impl Serializer for TextSerializer {
    fn serialize_null(&mut self) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.out.push_str("null");
            Ok(())
        })
    }

    fn serialize_bool(&mut self, value: bool) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.out.push_str(if value { "true" } else { "false" });
            Ok(())
        })
    }

    fn serialize_i64(&mut self, value: i64) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.out.push_str(&value.to_string());
            Ok(())
        })
    }

    fn serialize_u64(&mut self, value: u64) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.out.push_str(&value.to_string());
            Ok(())
        })
    }

    fn serialize_f64(&mut self, value: f64) -> Result<()> {
        self.guarded(|s| {
            if !value.is_finite() {
                return Err(Error::new(
                    ErrorKind::NumberOutOfRange,
                    "non-finite float has no JSON representation",
                ));
            }
            s.begin_value()?;
            s.out.push_str(&format_float(value));
            Ok(())
        })
    }

    fn serialize_str(&mut self, value: &str) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.write_escaped(value);
            Ok(())
        })
    }

    fn serialize_bytes(&mut self, _value: &[u8]) -> Result<()> {
        self.guarded(|_| {
            Err(Error::new(
                ErrorKind::InvalidType,
                "binary data is not representable in JSON",
            ))
        })
    }

    fn serialize_ext(&mut self, _tag: i8, _data: &[u8]) -> Result<()> {
        self.guarded(|_| {
            Err(Error::new(
                ErrorKind::InvalidType,
                "extension values are not representable in JSON",
            ))
        })
    }

    fn begin_array(&mut self, _len: Option<usize>) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.guard.enter(None)?;
            s.out.push('[');
            s.frames.push(Frame {
                kind: FrameKind::Array,
                count: 0,
                expect_value: false,
            });
            Ok(())
        })
    }

    fn end_array(&mut self) -> Result<()> {
        self.guarded(|s| {
            let frame = s
                .frames
                .pop()
                .filter(|frame| frame.kind == FrameKind::Array)
                .ok_or_else(|| {
                    Error::new(ErrorKind::InvalidType, "end_array without begin_array")
                })?;
            if frame.count > 0 {
                s.newline_indent(s.frames.len());
            }
            s.out.push(']');
            s.guard.leave();
            Ok(())
        })
    }

    fn begin_object(&mut self, _len: Option<usize>) -> Result<()> {
        self.guarded(|s| {
            s.begin_value()?;
            s.guard.enter(None)?;
            s.out.push('{');
            s.frames.push(Frame {
                kind: FrameKind::Object,
                count: 0,
                expect_value: false,
            });
            Ok(())
        })
    }

    fn serialize_key(&mut self, key: &str) -> Result<()> {
        self.guarded(|s| {
            let Some(frame) = s.frames.last_mut() else {
                return Err(Error::new(ErrorKind::InvalidType, "key outside an object"));
            };
            if frame.kind != FrameKind::Object || frame.expect_value {
                return Err(Error::new(
                    ErrorKind::InvalidType,
                    "key emitted where a value was expected",
                ));
            }
            let first = frame.count == 0;
            frame.count += 1;
            frame.expect_value = true;
            if !first {
                s.out.push(',');
            }
            s.newline_indent(s.frames.len());
            s.write_escaped(key);
            s.out.push(':');
            if s.indent.is_some() {
                s.out.push(' ');
            }
            Ok(())
        })
    }

    fn end_object(&mut self) -> Result<()> {
        self.guarded(|s| {
            let frame = s
                .frames
                .pop()
                .filter(|frame| frame.kind == FrameKind::Object && !frame.expect_value)
                .ok_or_else(|| {
                    Error::new(ErrorKind::InvalidType, "end_object without begin_object")
                })?;
            if frame.count > 0 {
                s.newline_indent(s.frames.len());
            }
            s.out.push('}');
            s.guard.leave();
            Ok(())
        })
    }
}

/// Round-trip-safe formatting for finite floats. Rust's shortest `{}`
/// representation is kept, with a `.0` suffix when it would otherwise read
/// back as an integer.
fn format_float(value: f64) -> String {
    let mut text = format!("{value}");
    if !text.contains('.') && !text.contains('e') && !text.contains('E') {
        text.push_str(".0");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::value::Value;
    use crate::ser::Serialize;

    fn compact(value: &Value) -> String {
        let mut serializer = TextSerializer::new();
        value.serialize(&mut serializer).unwrap();
        serializer.finish().unwrap()
    }

    #[test]
    fn compact_has_minimal_separators() {
        let value = Value::Object(vec![
            ("a".into(), Value::Int(1)),
            (
                "b".into(),
                Value::Array(vec![Value::Bool(true), Value::Null]),
            ),
        ]);
        assert_eq!(compact(&value), r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn floats_keep_their_tag() {
        assert_eq!(compact(&Value::Float(2.0)), "2.0");
        assert_eq!(compact(&Value::Float(-0.25)), "-0.25");
        assert_eq!(compact(&Value::Int(2)), "2");
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut serializer = TextSerializer::new();
            let err = serializer.serialize_f64(value).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NumberOutOfRange);
        }
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            compact(&Value::Str("a\"b\\c\nd\u{1}".into())),
            r#""a\"b\\c\nd\u0001""#
        );
        // raw UTF-8 passthrough
        assert_eq!(compact(&Value::Str("héllo".into())), "\"héllo\"");
    }

    #[test]
    fn pretty_indents_per_level() {
        let value = Value::Object(vec![(
            "a".into(),
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
        )]);
        let mut serializer = TextSerializer::pretty("  ");
        value.serialize(&mut serializer).unwrap();
        assert_eq!(
            serializer.finish().unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn pretty_keeps_empty_containers_tight() {
        let value = Value::Array(vec![Value::Object(vec![])]);
        let mut serializer = TextSerializer::pretty("  ");
        value.serialize(&mut serializer).unwrap();
        assert_eq!(serializer.finish().unwrap(), "[\n  {}\n]");
    }

    #[test]
    fn bytes_are_rejected_and_stick() {
        let mut serializer = TextSerializer::new();
        let err = serializer.serialize_bytes(&[1, 2]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
        // sticky: an otherwise valid call now returns the same error
        let again = serializer.serialize_null().unwrap_err();
        assert_eq!(err, again);
        assert!(serializer.finish().is_err());
    }

    #[test]
    fn misuse_is_detected() {
        let mut serializer = TextSerializer::new();
        serializer.begin_object(None).unwrap();
        let err = serializer.serialize_i64(1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);

        let mut serializer = TextSerializer::new();
        serializer.begin_array(None).unwrap();
        assert!(serializer.end_object().is_err());
    }

    #[test]
    fn unclosed_container_fails_finish() {
        let mut serializer = TextSerializer::new();
        serializer.begin_array(None).unwrap();
        serializer.serialize_i64(1).unwrap();
        assert!(serializer.finish().is_err());
    }

    #[test]
    fn depth_guard_applies_to_serialization() {
        let mut serializer = TextSerializer::new().with_max_depth(3);
        for _ in 0..3 {
            serializer.begin_array(None).unwrap();
        }
        let err = serializer.begin_array(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DepthExceeded);
    }
}
