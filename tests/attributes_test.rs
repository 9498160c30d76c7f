use bytes::Bytes;
use cork::{decode, decode_into, encode, encode_with, CorkError, Decode, Encode, Handle, Value};
use std::collections::HashMap;

// =============================================================================
// Field names and tags
// =============================================================================

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Account {
    #[cork("id")]
    account_id: u32,
    name: String,
    #[cork(",omitempty")]
    note: String,
    #[cork("-")]
    session: Option<String>,
}

#[test]
fn test_struct_is_a_map_of_wire_names() {
    let account = Account {
        account_id: 7,
        name: "ann".to_string(),
        note: String::new(),
        session: Some("secret".to_string()),
    };
    let bytes = encode(&account).unwrap();
    // {"id": 7, "name": "ann"}; empty note omitted, session never written
    assert_eq!(
        &bytes[..],
        &[0xD2, 0x82, b'i', b'd', 0x07, 0x84, b'n', b'a', b'm', b'e', 0x83, b'a', b'n', b'n']
    );

    let mut buf = bytes;
    let decoded: Account = decode(&mut buf).unwrap();
    assert_eq!(decoded.account_id, 7);
    assert_eq!(decoded.name, "ann");
    assert_eq!(decoded.session, None);
}

#[test]
fn test_omitempty_writes_non_empty_values() {
    let account = Account {
        note: "vip".to_string(),
        ..Account::default()
    };
    let mut buf = encode(&account).unwrap();
    assert_eq!(buf[0], 0xD3);
    let value: Value = decode(&mut buf).unwrap();
    assert_eq!(value.get("note").and_then(Value::as_str), Some("vip"));
    // Non-omitempty fields are written even when empty.
    assert_eq!(value.get("name").and_then(Value::as_str), Some(""));
    assert!(value.get("session").is_none());
}

#[test]
fn test_skipped_field_is_never_read() {
    let mut buf = encode(&Value::Map(vec![
        (Value::from("id"), Value::from(3u8)),
        (Value::from("session"), Value::from("injected")),
        (Value::from("-"), Value::from("dash")),
    ]))
    .unwrap();
    let mut account = Account {
        session: Some("kept".to_string()),
        ..Account::default()
    };
    decode_into(&mut buf, &mut account).unwrap();
    assert_eq!(account.account_id, 3);
    assert_eq!(account.session.as_deref(), Some("kept"));
    assert!(buf.is_empty());
}

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Renamed {
    #[cork("n,omitempty")]
    count: i64,
    #[cork("")]
    plain: bool,
}

#[test]
fn test_rename_with_options_and_empty_tag() {
    let mut buf = encode(&Renamed { count: 2, plain: true }).unwrap();
    let value: Value = decode(&mut buf).unwrap();
    assert_eq!(value.get("n").and_then(Value::as_i64), Some(2));
    assert_eq!(value.get("plain").and_then(Value::as_bool), Some(true));
    assert!(value.get("count").is_none());

    let bytes = encode(&Renamed::default()).unwrap();
    assert_eq!(&bytes[..], &[0xD1, 0x85, b'p', b'l', b'a', b'i', b'n', 0xE2]);
}

// =============================================================================
// Merge semantics
// =============================================================================

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Small {
    a: i32,
    b: String,
}

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Large {
    a: i32,
    b: String,
    c: Vec<u32>,
}

#[test]
fn test_missing_fields_keep_their_value() {
    let mut buf = encode(&Small {
        a: 1,
        b: "new".to_string(),
    })
    .unwrap();
    let mut large = Large {
        a: 9,
        b: "old".to_string(),
        c: vec![4, 5],
    };
    decode_into(&mut buf, &mut large).unwrap();
    assert_eq!(
        large,
        Large {
            a: 1,
            b: "new".to_string(),
            c: vec![4, 5],
        }
    );
}

#[test]
fn test_unknown_keys_are_skipped() {
    let mut buf = encode(&Large {
        a: 5,
        b: "x".to_string(),
        c: vec![1, 2, 3],
    })
    .unwrap();
    let small: Small = decode(&mut buf).unwrap();
    assert_eq!(
        small,
        Small {
            a: 5,
            b: "x".to_string()
        }
    );
    assert!(buf.is_empty());
}

#[test]
fn test_non_string_keys_are_skipped() {
    let mut buf = encode(&Value::Map(vec![
        (Value::from(1u8), Value::Array(vec![Value::from(1u8)])),
        (Value::from("a"), Value::from(8u8)),
    ]))
    .unwrap();
    let small: Small = decode(&mut buf).unwrap();
    assert_eq!(small.a, 8);
}

#[test]
fn test_nil_leaves_struct_untouched() {
    let mut small = Small {
        a: 3,
        b: "keep".to_string(),
    };
    let mut buf = Bytes::from_static(&[0xE0]);
    decode_into(&mut buf, &mut small).unwrap();
    assert_eq!(small.a, 3);
    assert_eq!(small.b, "keep");

    // a nil field value is a no-op for that field
    let mut buf = encode(&Value::Map(vec![(Value::from("b"), Value::Nil)])).unwrap();
    decode_into(&mut buf, &mut small).unwrap();
    assert_eq!(small.b, "keep");
}

#[test]
fn test_struct_from_non_map_fails() {
    let mut buf = encode(&[1u32, 2]).unwrap();
    let err = decode::<Small>(&mut buf).unwrap_err();
    assert!(matches!(err, CorkError::TypeMismatch { found: 0xC2, .. }));
}

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Nested {
    inner: Small,
    tags: HashMap<String, i32>,
    maybe: Option<Small>,
}

#[test]
fn test_nested_structs_merge_recursively() {
    let mut target = Nested {
        inner: Small {
            a: 1,
            b: "inner".to_string(),
        },
        tags: HashMap::from([("x".to_string(), 1)]),
        maybe: Some(Small {
            a: 10,
            b: "opt".to_string(),
        }),
    };
    let patch = Value::Map(vec![
        (
            Value::from("inner"),
            Value::Map(vec![(Value::from("a"), Value::from(2u8))]),
        ),
        (
            Value::from("tags"),
            Value::Map(vec![(Value::from("y"), Value::from(2u8))]),
        ),
        (
            Value::from("maybe"),
            Value::Map(vec![(Value::from("a"), Value::from(11u8))]),
        ),
    ]);
    let mut buf = encode(&patch).unwrap();
    decode_into(&mut buf, &mut target).unwrap();

    assert_eq!(target.inner.a, 2);
    assert_eq!(target.inner.b, "inner");
    assert_eq!(target.tags.len(), 2);
    assert_eq!(target.tags["y"], 2);
    let maybe = target.maybe.as_ref().unwrap();
    assert_eq!(maybe.a, 11);
    assert_eq!(maybe.b, "opt");
}

#[test]
fn test_struct_fields_keep_declaration_order_when_sorted() {
    #[derive(Encode, Default)]
    struct Ordered {
        zeta: u8,
        alpha: u8,
    }
    let handle = Handle::new().with_sorted_keys(true);
    let bytes = encode_with(&Ordered { zeta: 1, alpha: 2 }, &handle).unwrap();
    assert_eq!(bytes[1], 0x84);
    assert_eq!(&bytes[2..6], b"zeta");
}

// =============================================================================
// Tuple and unit structs
// =============================================================================

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Pair(u8, String);

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Marker;

#[test]
fn test_tuple_struct_is_an_array() {
    let pair = Pair(1, "a".to_string());
    let bytes = encode(&pair).unwrap();
    assert_eq!(&bytes[..], &[0xC2, 0x01, 0x81, b'a']);
    let mut buf = bytes;
    assert_eq!(decode::<Pair>(&mut buf).unwrap(), pair);

    let mut buf = encode(&(1u8, "a", true)).unwrap();
    let err = decode::<Pair>(&mut buf).unwrap_err();
    assert!(matches!(err, CorkError::Length { expected: 2, found: 3 }));
}

#[test]
fn test_unit_struct_is_nil() {
    let bytes = encode(&Marker).unwrap();
    assert_eq!(&bytes[..], &[0xE0]);
    let mut buf = bytes;
    assert_eq!(decode::<Marker>(&mut buf).unwrap(), Marker);
}

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Wrapper<T> {
    value: T,
    items: Vec<T>,
}

#[test]
fn test_generic_struct() {
    let w = Wrapper {
        value: 3u16,
        items: vec![1, 2],
    };
    let mut buf = encode(&w).unwrap();
    assert_eq!(decode::<Wrapper<u16>>(&mut buf).unwrap(), w);
}

#[derive(Encode, Decode, Debug, PartialEq, Default)]
struct Node {
    children: Vec<Node>,
}

#[test]
fn test_recursive_struct_depth_is_bounded() {
    let leaf = Node {
        children: vec![Node::default(), Node::default()],
    };
    let mut buf = encode(&leaf).unwrap();
    assert_eq!(decode::<Node>(&mut buf).unwrap(), leaf);

    // {"children": [{"children": [ ... ]}]}
    let mut out = Vec::new();
    for _ in 0..100_000 {
        out.extend_from_slice(&[0xD1, 0x88]);
        out.extend_from_slice(b"children");
        out.push(0xC1);
    }
    out.push(0xE0);
    let mut buf = Bytes::from(out);
    assert!(matches!(decode::<Node>(&mut buf), Err(CorkError::Malformed(_))));
}

