//! A user-defined type wired through the capability traits, exercised
//! against both backends without any format-specific code of its own.

use formpack::json::{self, ValueBuilder};
use formpack::msgpack;
use formpack::{
    Deserialize, Deserializer, Error, ErrorKind, Result, Serialize, Serializer,
};

#[derive(Debug, Default, PartialEq)]
struct Package {
    name: String,
    version: i64,
    tags: Vec<String>,
}

impl Serialize for Package {
    fn serialize(&self, serializer: &mut dyn Serializer) -> Result<()> {
        serializer.begin_object(Some(3))?;
        serializer.serialize_key("name")?;
        serializer.serialize_str(&self.name)?;
        serializer.serialize_key("version")?;
        serializer.serialize_i64(self.version)?;
        serializer.serialize_key("tags")?;
        serializer.begin_array(Some(self.tags.len()))?;
        for tag in &self.tags {
            serializer.serialize_str(tag)?;
        }
        serializer.end_array()?;
        serializer.end_object()
    }
}

impl Deserialize for Package {
    fn deserialize(&mut self, deserializer: &mut dyn Deserializer) -> Result<()> {
        let mut builder = ValueBuilder::new();
        deserializer.deserialize_any(&mut builder)?;
        let value = builder.finish()?;

        let missing = |field: &str| {
            Error::new(ErrorKind::InvalidType, format!("missing field {field:?}"))
        };
        let name = match value.get("name") {
            Some(json::Value::Str(name)) => name.clone(),
            _ => return Err(missing("name")),
        };
        let version = match value.get("version") {
            Some(json::Value::Int(version)) => *version,
            _ => return Err(missing("version")),
        };
        let tags = match value.get("tags") {
            Some(json::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    json::Value::Str(tag) => Ok(tag.clone()),
                    _ => Err(Error::new(ErrorKind::InvalidType, "tag must be a string")),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(missing("tags")),
        };

        self.name = name;
        self.version = version;
        self.tags = tags;
        Ok(())
    }
}

fn sample() -> Package {
    Package {
        name: "formpack".into(),
        version: 3,
        tags: vec!["codec".into(), "wire".into()],
    }
}

#[test]
fn serializes_to_json_text() {
    assert_eq!(
        json::to_string(&sample()).unwrap(),
        r#"{"name":"formpack","version":3,"tags":["codec","wire"]}"#
    );
}

#[test]
fn reads_back_from_json() {
    let text = json::to_string(&sample()).unwrap();
    let mut decoded = Package::default();
    decoded
        .deserialize(&mut formpack::json::Parser::new(text.as_bytes()))
        .unwrap();
    assert_eq!(decoded, sample());
}

#[test]
fn reads_back_from_msgpack() {
    let bytes = msgpack::to_vec(&sample()).unwrap();
    let mut decoded = Package::default();
    decoded
        .deserialize(&mut msgpack::Decoder::new(&bytes))
        .unwrap();
    assert_eq!(decoded, sample());
}

#[test]
fn missing_field_is_reported() {
    let mut decoded = Package::default();
    let err = decoded
        .deserialize(&mut formpack::json::Parser::new(br#"{"name":"x"}"#))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidType);
    assert!(err.message.contains("version"));
}

#[test]
fn shape_mismatch_is_reported() {
    let mut decoded = Package::default();
    let err = decoded
        .deserialize(&mut formpack::json::Parser::new(
            br#"{"name":"x","version":1,"tags":[2]}"#,
        ))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidType);
}
