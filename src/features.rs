#[cfg(feature = "ahash")]
use ahash::{AHashMap, AHashSet};
#[cfg(feature = "bigdecimal")]
use bigdecimal::BigDecimal;
#[cfg(feature = "indexmap")]
use indexmap::{IndexMap, IndexSet};
#[cfg(feature = "rust_decimal")]
use rust_decimal::Decimal;
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;
#[cfg(feature = "ulid")]
use ulid::Ulid;
#[cfg(feature = "uuid")]
use uuid::Uuid;

#[allow(unused_imports)]
use crate::collections::{encode_map, encode_set, merge_map, merge_set, Collect};
#[allow(unused_imports)]
use crate::core::*;
#[allow(unused_imports)]
use crate::tags::*;
#[allow(unused_imports)]
use crate::*;
#[allow(unused_imports)]
use std::hash::{BuildHasher, Hash};

/// Reads exactly 16 bytes of binary, for identifier types.
#[cfg(any(feature = "uuid", feature = "ulid"))]
fn read_id_bytes(reader: &mut Reader, tag: u8) -> Result<[u8; 16]> {
    let bytes = read_bytes_body(reader, tag)?;
    <[u8; 16]>::try_from(&bytes[..]).map_err(|_| CorkError::Length {
        expected: 16,
        found: bytes.len(),
    })
}

// --- IndexSet ---
#[cfg(feature = "indexmap")]
impl<T: Eq + Hash, S: BuildHasher> Collect for IndexSet<T, S> {
    type Item = T;

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, item: T) {
        self.insert(item);
    }
}
#[cfg(feature = "indexmap")]
impl<T: Encoder + Eq + Hash, S: BuildHasher> Encoder for IndexSet<T, S> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_set(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
#[cfg(feature = "indexmap")]
impl<T: Decoder + Eq + Hash, S: BuildHasher + Default> Decoder for IndexSet<T, S> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut set = IndexSet::with_hasher(S::default());
        merge_set(reader, &mut set)?;
        Ok(set)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_set(reader, self)
    }
}

// --- IndexMap ---
#[cfg(feature = "indexmap")]
impl<K: Eq + Hash, V, S: BuildHasher> Collect for IndexMap<K, V, S> {
    type Item = (K, V);

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, (k, v): (K, V)) {
        self.insert(k, v);
    }
}
/// Keeps insertion order unless the handle sorts keys.
#[cfg(feature = "indexmap")]
impl<K: Encoder + Eq + Hash, V: Encoder, S: BuildHasher> Encoder for IndexMap<K, V, S> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_map(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
#[cfg(feature = "indexmap")]
impl<K, V, S> Decoder for IndexMap<K, V, S>
where
    K: Decoder + Eq + Hash,
    V: Decoder,
    S: BuildHasher + Default,
{
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut map = IndexMap::with_hasher(S::default());
        merge_map(reader, &mut map)?;
        Ok(map)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_map(reader, self)
    }
}

// --- Decimal ---
/// Decimals travel as their canonical string so no precision is lost.
#[cfg(feature = "rust_decimal")]
impl Encoder for Decimal {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, &self.to_string());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_zero()
    }
}
#[cfg(feature = "rust_decimal")]
impl Decoder for Decimal {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        if is_int(tag) || is_uint(tag) {
            let value = read_integer(reader, tag)?;
            return Decimal::try_from_i128_with_scale(value, 0)
                .map_err(|_| CorkError::Overflow {
                    target: "Decimal",
                    value: value.to_string(),
                });
        }
        let s = read_string_body(reader, tag)?;
        s.parse::<Decimal>()
            .map_err(|e| CorkError::Malformed(format!("invalid decimal {:?}: {}", s, e)))
    }
}

// --- BigDecimal ---
#[cfg(feature = "bigdecimal")]
impl Encoder for BigDecimal {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, &self.to_string());
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == BigDecimal::default()
    }
}
#[cfg(feature = "bigdecimal")]
impl Decoder for BigDecimal {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        if is_int(tag) || is_uint(tag) {
            let value = read_integer(reader, tag)?;
            return Ok(BigDecimal::new(bigdecimal::num_bigint::BigInt::from(value), 0));
        }
        let s = read_string_body(reader, tag)?;
        s.parse::<BigDecimal>()
            .map_err(|e| CorkError::Malformed(format!("invalid decimal {:?}: {}", s, e)))
    }
}

// --- UUID ---
/// Encodes a UUID as 16 bytes of binary. Decoding also accepts the hyphenated string form.
#[cfg(feature = "uuid")]
impl Encoder for Uuid {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_bin(writer, self.as_bytes());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_nil()
    }
}
#[cfg(feature = "uuid")]
impl Decoder for Uuid {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        if is_str(tag) {
            let s = read_string_body(reader, tag)?;
            return Uuid::parse_str(&s)
                .map_err(|e| CorkError::Malformed(format!("invalid uuid {:?}: {}", s, e)));
        }
        Ok(Uuid::from_bytes(read_id_bytes(reader, tag)?))
    }
}

// --- ULID ---
#[cfg(feature = "ulid")]
impl Encoder for Ulid {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_bin(writer, &self.to_bytes());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_nil()
    }
}
#[cfg(feature = "ulid")]
impl Decoder for Ulid {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        if is_str(tag) {
            let s = read_string_body(reader, tag)?;
            return Ulid::from_string(&s)
                .map_err(|e| CorkError::Malformed(format!("invalid ulid {:?}: {}", s, e)));
        }
        Ok(Ulid::from_bytes(read_id_bytes(reader, tag)?))
    }
}

// --- serde_json::Value ---
/// JSON values map onto the native kinds: null is nil, numbers are
/// integers or float64, objects are maps with string keys.
#[cfg(feature = "serde_json")]
impl Encoder for serde_json::Value {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        use serde_json::Value as Json;
        match self {
            Json::Null => {
                writer.write_one(NIL);
                Ok(())
            }
            Json::Bool(b) => b.encode(writer),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    u.encode(writer)
                } else if let Some(i) = n.as_i64() {
                    i.encode(writer)
                } else {
                    n.as_f64().unwrap_or(f64::NAN).encode(writer)
                }
            }
            Json::String(s) => s.encode(writer),
            Json::Array(items) => crate::collections::encode_array(writer, items.len(), items),
            Json::Object(obj) => encode_map(writer, obj.len(), obj),
        }
    }

    fn is_default(&self) -> bool {
        self.is_null()
    }
}

#[cfg(feature = "serde_json")]
impl Decoder for serde_json::Value {
    fn decode(reader: &mut Reader) -> Result<Self> {
        json_from_value(Value::decode(reader)?)
    }
}

#[cfg(feature = "serde_json")]
fn json_from_value(value: Value) -> Result<serde_json::Value> {
    use serde_json::{Map, Number, Value as Json};
    let float = |f: f64| Number::from_f64(f).map_or(Json::Null, Json::Number);
    Ok(match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(b),
        Value::Float32(f) => float(f as f64),
        Value::Float64(f) => float(f),
        Value::Complex64(c) => Json::Array(vec![float(c.re as f64), float(c.im as f64)]),
        Value::Complex128(c) => Json::Array(vec![float(c.re), float(c.im)]),
        Value::Time(t) => Json::String(t.to_rfc3339()),
        Value::String(s) => Json::String(s),
        Value::Binary(b) => Json::Array(b.iter().map(|&x| Json::from(x)).collect()),
        Value::Array(items) => Json::Array(
            items
                .into_iter()
                .map(json_from_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(pairs) => {
            let mut obj = Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = match k {
                    Value::String(s) => s,
                    other => json_from_value(other)?.to_string(),
                };
                obj.insert(key, json_from_value(v)?);
            }
            Json::Object(obj)
        }
        Value::Extension(e) => {
            return Err(CorkError::mismatch("JSON-compatible value", e.tag()));
        }
        int => match (int.as_i64(), int.as_u64()) {
            (Some(i), _) => Json::from(i),
            (None, Some(u)) => Json::from(u),
            _ => Json::Null,
        },
    })
}

// --- AHashMap ---
#[cfg(feature = "ahash")]
impl<K: Encoder + Eq + Hash, V: Encoder> Encoder for AHashMap<K, V> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_map(writer, self.len(), self.iter())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
#[cfg(feature = "ahash")]
impl<K: Decoder + Eq + Hash, V: Decoder> Decoder for AHashMap<K, V> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut map = AHashMap::new();
        merge_map(reader, &mut *map)?;
        Ok(map)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_map(reader, &mut **self)
    }
}

// --- AHashSet ---
#[cfg(feature = "ahash")]
impl<T: Encoder + Eq + Hash> Encoder for AHashSet<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_set(writer, self.len(), self.iter())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
#[cfg(feature = "ahash")]
impl<T: Decoder + Eq + Hash> Decoder for AHashSet<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut set = AHashSet::new();
        merge_set(reader, &mut *set)?;
        Ok(set)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_set(reader, &mut **self)
    }
}

// --- SmolStr ---
#[cfg(feature = "smol_str")]
impl Encoder for SmolStr {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, self.as_str());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
#[cfg(feature = "smol_str")]
impl Decoder for SmolStr {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(SmolStr::from(String::decode(reader)?))
    }
}
