use formpack::msgpack::{self, Value};
use formpack::{ErrorKind, Position};

#[test]
fn small_map_encodes_to_known_bytes() {
    let value = Value::Map(vec![("a".into(), Value::Bool(true))]);
    assert_eq!(msgpack::to_vec(&value).unwrap(), [0x81, 0xa1, b'a', 0xc3]);
    assert_eq!(msgpack::to_hex(&value).unwrap(), "81 a1 61 c3");
}

#[test]
fn integer_encoding_boundaries() {
    let cases: &[(i64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7f]),
        (128, &[0xcc, 0x80]),
        (255, &[0xcc, 0xff]),
        (256, &[0xcd, 0x01, 0x00]),
        (65535, &[0xcd, 0xff, 0xff]),
        (65536, &[0xce, 0x00, 0x01, 0x00, 0x00]),
        (-1, &[0xff]),
        (-32, &[0xe0]),
        (-33, &[0xd0, 0xdf]),
        (-128, &[0xd0, 0x80]),
        (-129, &[0xd1, 0xff, 0x7f]),
        (-32768, &[0xd1, 0x80, 0x00]),
        (-32769, &[0xd2, 0xff, 0xff, 0x7f, 0xff]),
    ];
    for (input, expected) in cases {
        let bytes = msgpack::to_vec(&Value::Int(*input)).unwrap();
        assert_eq!(&bytes, expected, "value: {input}");
        assert_eq!(msgpack::from_slice(&bytes).unwrap(), Value::Int(*input));
    }
}

#[test]
fn u64_above_i64_uses_uint64_and_keeps_its_shape() {
    let bytes = msgpack::to_vec(&Value::UInt(u64::MAX)).unwrap();
    assert_eq!(bytes[0], 0xcf);
    assert_eq!(msgpack::from_slice(&bytes).unwrap(), Value::UInt(u64::MAX));

    // a u64 that fits i64 decodes as a plain integer
    let bytes = msgpack::to_vec(&Value::UInt(1)).unwrap();
    assert_eq!(bytes, [0x01]);
    assert_eq!(msgpack::from_slice(&bytes).unwrap(), Value::Int(1));
}

#[test]
fn string_header_boundaries() {
    let s31 = "x".repeat(31);
    assert_eq!(msgpack::to_vec(&Value::Str(s31)).unwrap()[0], 0xbf);

    let s32 = "x".repeat(32);
    assert_eq!(&msgpack::to_vec(&Value::Str(s32)).unwrap()[..2], &[0xd9, 32]);

    let s256 = "x".repeat(256);
    assert_eq!(
        &msgpack::to_vec(&Value::Str(s256)).unwrap()[..3],
        &[0xda, 0x01, 0x00]
    );
}

#[test]
fn container_header_boundaries() {
    let a15 = Value::Array(vec![Value::Nil; 15]);
    assert_eq!(msgpack::to_vec(&a15).unwrap()[0], 0x9f);

    let a16 = Value::Array(vec![Value::Nil; 16]);
    assert_eq!(&msgpack::to_vec(&a16).unwrap()[..3], &[0xdc, 0x00, 0x10]);

    let m16 = Value::Map((0..16).map(|i| (i.to_string(), Value::Nil)).collect());
    assert_eq!(&msgpack::to_vec(&m16).unwrap()[..3], &[0xde, 0x00, 0x10]);
}

#[test]
fn floats_round_trip_with_width() {
    let value = Value::Array(vec![Value::Float32(1.5), Value::Float64(-2.25)]);
    let bytes = msgpack::to_vec(&value).unwrap();
    assert_eq!(bytes[1], 0xca);
    assert_eq!(msgpack::from_slice(&bytes).unwrap(), value);
}

#[test]
fn binary_and_ext_round_trip() {
    let value = Value::Map(vec![
        ("raw".into(), Value::Bin(vec![0x00, 0xff, 0x80])),
        ("stamp".into(), Value::Ext(-1, vec![1, 2, 3, 4])),
    ]);
    let bytes = msgpack::to_vec(&value).unwrap();
    assert_eq!(msgpack::from_slice(&bytes).unwrap(), value);
}

#[test]
fn truncated_input_fails_with_unexpected_end() {
    // str8 declaring 10 bytes, only 3 present
    let err = msgpack::from_slice(&[0xd9, 10, b'a', b'b', b'c']).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEnd);

    // array declaring 2 elements, only 1 present
    let err = msgpack::from_slice(&[0x92, 0xc0]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEnd);
}

#[test]
fn reserved_marker_fails_with_its_offset() {
    let err = msgpack::from_slice(&[0x91, 0xc1]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTag);
    assert_eq!(err.position, Some(Position::Offset(1)));
}

#[test]
fn trailing_bytes_are_rejected() {
    let err = msgpack::from_slice(&[0xc3, 0xc3]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TrailingData);

    let (value, consumed) = msgpack::from_slice_partial(&[0xc3, 0xc3]).unwrap();
    assert_eq!(value, Value::Bool(true));
    assert_eq!(consumed, 1);
}

#[test]
fn duplicate_map_keys_last_value_wins() {
    // {"a": 1, "a": 2}
    let data = [0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
    assert_eq!(
        msgpack::from_slice(&data).unwrap(),
        Value::Map(vec![("a".into(), Value::Int(2))])
    );
}

#[test]
fn depth_limit_is_enforced() {
    let mut deep = vec![0x91u8; 1024];
    deep.push(0xc0);
    assert!(msgpack::from_slice(&deep).is_ok());

    let mut too_deep = vec![0x91u8; 1025];
    too_deep.push(0xc0);
    let err = msgpack::from_slice(&too_deep).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthExceeded);
}

#[test]
fn invalid_utf8_in_strings_is_rejected() {
    let err = msgpack::from_slice(&[0xa2, 0xff, 0xfe]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidUtf8);
}

#[test]
fn cross_format_transcoding() {
    // JSON text in, MessagePack bytes out, and back
    let value = formpack::json::from_str(r#"{"n":[1,2.5,"x",null,true]}"#).unwrap();
    let bytes = msgpack::to_vec(&value).unwrap();
    let back = msgpack::from_slice(&bytes).unwrap();
    assert_eq!(
        back,
        Value::Map(vec![(
            "n".into(),
            Value::Array(vec![
                Value::Int(1),
                Value::Float64(2.5),
                Value::Str("x".into()),
                Value::Nil,
                Value::Bool(true),
            ])
        )])
    );
}
