#[allow(unused_imports)]
use cork::{decode, decode_into, encode, encode_with, Handle};

#[cfg(feature = "indexmap")]
#[test]
fn test_indexmap_keeps_insertion_order() {
    use indexmap::{IndexMap, IndexSet};

    let mut map = IndexMap::new();
    map.insert("z".to_string(), 1u8);
    map.insert("a".to_string(), 2u8);
    let bytes = encode(&map).unwrap();
    assert_eq!(&bytes[..], &[0xD2, 0x81, b'z', 1, 0x81, b'a', 2]);
    let mut buf = bytes;
    let decoded: IndexMap<String, u8> = decode(&mut buf).unwrap();
    assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["z", "a"]);

    let handle = Handle::new().with_sorted_keys(true);
    let bytes = encode_with(&map, &handle).unwrap();
    assert_eq!(&bytes[..], &[0xD2, 0x81, b'a', 2, 0x81, b'z', 1]);

    let mut set: IndexSet<u32> = IndexSet::from([1, 2]);
    let mut buf = encode(&IndexSet::from([3u32])).unwrap();
    decode_into(&mut buf, &mut set).unwrap();
    assert_eq!(set.len(), 3);
}

#[cfg(feature = "rust_decimal")]
#[test]
fn test_decimal_as_string() {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    let d = Decimal::from_str("-12.3400").unwrap();
    let bytes = encode(&d).unwrap();
    assert_eq!(bytes[0], 0x88);
    assert_eq!(&bytes[1..], b"-12.3400");
    let mut buf = bytes;
    assert_eq!(decode::<Decimal>(&mut buf).unwrap(), d);

    let mut buf = encode(&42u32).unwrap();
    assert_eq!(decode::<Decimal>(&mut buf).unwrap(), Decimal::from(42));

    let mut buf = encode("not a number").unwrap();
    assert!(decode::<Decimal>(&mut buf).is_err());
}

#[cfg(feature = "bigdecimal")]
#[test]
fn test_bigdecimal_as_string() {
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    let d = BigDecimal::from_str("123456789012345678901234567890.000000001").unwrap();
    let mut buf = encode(&d).unwrap();
    assert_eq!(decode::<BigDecimal>(&mut buf).unwrap(), d);

    let mut buf = encode(&-7i64).unwrap();
    assert_eq!(decode::<BigDecimal>(&mut buf).unwrap(), BigDecimal::from(-7));
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_as_binary() {
    use uuid::Uuid;

    let id = Uuid::new_v4();
    let bytes = encode(&id).unwrap();
    assert_eq!(&bytes[..2], &[0xE8, 16]);
    assert_eq!(&bytes[2..], id.as_bytes());
    let mut buf = bytes;
    assert_eq!(decode::<Uuid>(&mut buf).unwrap(), id);

    let mut buf = encode(&id.to_string()).unwrap();
    assert_eq!(decode::<Uuid>(&mut buf).unwrap(), id);

    let mut buf = encode(&cork::Binary(vec![1, 2, 3])).unwrap();
    assert!(matches!(
        decode::<Uuid>(&mut buf),
        Err(cork::CorkError::Length { expected: 16, found: 3 })
    ));
}

#[cfg(feature = "ulid")]
#[test]
fn test_ulid_as_binary() {
    use ulid::Ulid;

    let id = Ulid::new();
    let mut buf = encode(&id).unwrap();
    assert_eq!(buf.len(), 18);
    assert_eq!(decode::<Ulid>(&mut buf).unwrap(), id);

    let mut buf = encode(&id.to_string()).unwrap();
    assert_eq!(decode::<Ulid>(&mut buf).unwrap(), id);
}

#[cfg(feature = "serde_json")]
#[test]
fn test_json_values() {
    use serde_json::json;

    let value = json!({
        "name": "cork",
        "n": -3,
        "big": 300,
        "ratio": 0.5,
        "ok": true,
        "none": null,
        "list": [1, "two", [3]],
    });
    let mut buf = encode(&value).unwrap();
    let decoded: serde_json::Value = decode(&mut buf).unwrap();
    assert_eq!(decoded, value);
}

#[cfg(feature = "ahash")]
#[test]
fn test_ahash_collections() {
    use ahash::{AHashMap, AHashSet};

    let mut map: AHashMap<String, u8> = AHashMap::new();
    map.insert("a".to_string(), 1);
    let mut buf = encode(&map).unwrap();
    assert_eq!(decode::<AHashMap<String, u8>>(&mut buf).unwrap(), map);

    let mut set: AHashSet<u8> = AHashSet::new();
    set.insert(9);
    let mut buf = encode(&AHashSet::<u8>::new()).unwrap();
    decode_into(&mut buf, &mut set).unwrap();
    assert!(set.is_empty());
}

#[cfg(feature = "smol_str")]
#[test]
fn test_smol_str() {
    use smol_str::SmolStr;

    let s = SmolStr::new("short");
    let bytes = encode(&s).unwrap();
    assert_eq!(&bytes[..], &[0x85, b's', b'h', b'o', b'r', b't']);
    let mut buf = bytes;
    assert_eq!(decode::<SmolStr>(&mut buf).unwrap(), s);
}
