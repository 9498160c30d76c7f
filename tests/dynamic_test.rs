use bytes::Bytes;
use chrono::{TimeZone, Utc};
use cork::{
    decode, decode_with, encode, encode_with, Binary, Complex, CorkError, ElementType, Handle,
    Value,
};
use std::collections::BTreeMap;

fn dynamic(bytes: &[u8]) -> cork::Result<Value> {
    let mut buf = Bytes::copy_from_slice(bytes);
    decode(&mut buf)
}

#[test]
fn test_integer_widths_follow_markers() {
    assert_eq!(dynamic(&[0x05]).unwrap(), Value::Int8(5));
    assert_eq!(dynamic(&[0xF0, 0xFF]).unwrap(), Value::Int8(-1));
    assert_eq!(dynamic(&[0xF1, 0x01, 0x2C]).unwrap(), Value::Int16(300));
    assert_eq!(dynamic(&[0xF4, 0xC8]).unwrap(), Value::Uint8(200));
    assert_eq!(
        dynamic(&[0xF6, 0x00, 0x01, 0x11, 0x70]).unwrap(),
        Value::Uint32(70000)
    );

    let handle = Handle::new().with_precision(true);
    let mut buf = encode_with(&5i32, &handle).unwrap();
    assert_eq!(decode::<Value>(&mut buf).unwrap(), Value::Int32(5));
    let mut buf = encode_with(&Value::Uint16(1), &handle).unwrap();
    assert_eq!(&buf[..], &[0xF5, 0x00, 0x01]);
    assert_eq!(decode::<Value>(&mut buf).unwrap(), Value::Uint16(1));
}

#[test]
fn test_scalar_kinds() {
    assert_eq!(dynamic(&[0xE0]).unwrap(), Value::Nil);
    assert_eq!(dynamic(&[0xE1]).unwrap(), Value::Bool(true));
    assert_eq!(dynamic(&[0x82, b'h', b'i']).unwrap(), Value::from("hi"));
    assert_eq!(
        dynamic(&[0xA2, 1, 2]).unwrap(),
        Value::Binary(Bytes::from_static(&[1, 2]))
    );

    let mut buf = encode(&2.5f32).unwrap();
    assert_eq!(decode::<Value>(&mut buf).unwrap(), Value::Float32(2.5));
    let mut buf = encode(&Complex::new(1.0f64, 2.0)).unwrap();
    assert_eq!(
        decode::<Value>(&mut buf).unwrap(),
        Value::Complex128(Complex::new(1.0, 2.0))
    );

    let t = Utc.timestamp_nanos(123_456_789);
    let mut buf = encode(&t).unwrap();
    let v: Value = decode(&mut buf).unwrap();
    assert_eq!(v.as_time(), Some(&t));
    assert_eq!(v.kind(), "time");
}

#[test]
fn test_reserved_tag_is_invalid() {
    assert!(matches!(dynamic(&[0xFF]), Err(CorkError::InvalidTag(0xFF))));
}

#[test]
fn test_nested_containers() {
    let mut map = BTreeMap::new();
    map.insert("list".to_string(), vec![1u32, 2, 3]);
    map.insert("none".to_string(), vec![]);
    let mut buf = encode(&map).unwrap();
    let value: Value = decode(&mut buf).unwrap();

    let list = value.get("list").and_then(Value::as_array).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[2].as_u64(), Some(3));
    assert_eq!(value.get("none").and_then(Value::as_array).map(|a| a.len()), Some(0));
    assert!(value.get("missing").is_none());
}

#[test]
fn test_value_reencodes_identically() {
    let source = Value::Map(vec![
        (Value::from("a"), Value::Int16(-300)),
        (Value::from(1u8), Value::Array(vec![Value::Nil, Value::Bool(false)])),
        (Value::from("bin"), Value::Binary(Bytes::from_static(b"\x00\x01"))),
    ]);
    let bytes = encode(&source).unwrap();
    let mut buf = bytes.clone();
    let decoded: Value = decode(&mut buf).unwrap();
    assert_eq!(encode(&decoded).unwrap(), bytes);
}

#[test]
fn test_array_element_type_coercion() {
    let bytes = encode(&(1u8, -2i32, 300u16)).unwrap();

    let handle = Handle::new().with_array_type(ElementType::Int);
    let mut buf = bytes.clone();
    let value: Value = decode_with(&mut buf, &handle).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::Int64(1), Value::Int64(-2), Value::Int64(300)])
    );

    let handle = Handle::new().with_array_type(ElementType::Uint);
    let mut buf = bytes.clone();
    let err = decode_with::<Value>(&mut buf, &handle).unwrap_err();
    assert!(matches!(err, CorkError::Overflow { target: "u64", .. }));

    let handle = Handle::new().with_array_type(ElementType::Float);
    let mut buf = encode(&(1.5f32, 2.5f64)).unwrap();
    let value: Value = decode_with(&mut buf, &handle).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::Float64(1.5), Value::Float64(2.5)])
    );
}

#[test]
fn test_element_type_rejects_other_kinds() {
    let handle = Handle::new().with_array_type(ElementType::String);
    let mut buf = encode(&("ok", 5u8)).unwrap();
    let err = decode_with::<Value>(&mut buf, &handle).unwrap_err();
    assert!(matches!(err, CorkError::TypeMismatch { expected: "string", found: 0x05 }));

    // nil passes any element type
    let mut buf = encode(&("ok", ())).unwrap();
    let value: Value = decode_with(&mut buf, &handle).unwrap();
    assert_eq!(value, Value::Array(vec![Value::from("ok"), Value::Nil]));
}

#[test]
fn test_binary_element_type_accepts_strings() {
    let handle = Handle::new().with_array_type(ElementType::Binary);
    let mut buf = encode(&("ab", Binary(vec![1]))).unwrap();
    let value: Value = decode_with(&mut buf, &handle).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![
            Value::Binary(Bytes::from_static(b"ab")),
            Value::Binary(Bytes::from_static(&[1])),
        ])
    );
}

#[test]
fn test_map_element_types() {
    let mut map = BTreeMap::new();
    map.insert(1u8, 10u8);
    map.insert(2u8, 200u8);
    let handle = Handle::new().with_map_type(ElementType::Uint, ElementType::Int);
    let mut buf = encode(&map).unwrap();
    let value: Value = decode_with(&mut buf, &handle).unwrap();
    assert_eq!(
        value,
        Value::Map(vec![
            (Value::Uint64(1), Value::Int64(10)),
            (Value::Uint64(2), Value::Int64(200)),
        ])
    );

    let handle = Handle::new().with_map_type(ElementType::String, ElementType::Any);
    let mut buf = encode(&map).unwrap();
    assert!(matches!(
        decode_with::<Value>(&mut buf, &handle),
        Err(CorkError::TypeMismatch { expected: "string", .. })
    ));
}

#[test]
fn test_value_conversions() {
    assert_eq!(Value::from(Some(3u16)), Value::Uint16(3));
    assert_eq!(Value::from(None::<u16>), Value::Nil);
    assert_eq!(Value::Int8(-4).as_i64(), Some(-4));
    assert_eq!(Value::Int8(-4).as_u64(), None);
    assert_eq!(Value::Uint64(u64::MAX).as_i64(), None);
    assert_eq!(Value::from("s").as_str(), Some("s"));
    assert!(Value::default().is_nil());
}
