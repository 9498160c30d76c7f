//! Schema-free value model.
//!
//! [`Value`] is the decode target when the destination type is not known.
//! It keeps the width of every integer marker it reads, so a stream written
//! with [`crate::Handle::precision`] decodes back to the declared widths.

use crate::collections::{bounded, encode_array, encode_map};
use crate::core::*;
use crate::ext::{read_ext_value, read_symbol_body, Extension};
use crate::tags::*;
use crate::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Any value the wire format can carry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
    Time(DateTime<Utc>),
    String(String),
    Binary(Bytes),
    Array(Vec<Value>),
    /// Pairs in stream order.
    Map(Vec<(Value, Value)>),
    Extension(Extension),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer variant that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(v as i64),
            Value::Int16(v) => Some(v as i64),
            Value::Int32(v) => Some(v as i64),
            Value::Int64(v) => Some(v),
            Value::Uint8(v) => Some(v as i64),
            Value::Uint16(v) => Some(v as i64),
            Value::Uint32(v) => Some(v as i64),
            Value::Uint64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any non-negative integer variant.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Uint8(v) => Some(v as u64),
            Value::Uint16(v) => Some(v as u64),
            Value::Uint32(v) => Some(v as u64),
            Value::Uint64(v) => Some(v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&Extension> {
        match self {
            Value::Extension(e) => Some(e),
            _ => None,
        }
    }

    /// Looks up a string key in a map value. The first matching pair wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int8(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_) => "int",
            Value::Uint8(_) | Value::Uint16(_) | Value::Uint32(_) | Value::Uint64(_) => "uint",
            Value::Float32(_) | Value::Float64(_) => "float",
            Value::Complex64(_) | Value::Complex128(_) => "complex",
            Value::Time(_) => "time",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Extension(_) => "extension",
        }
    }
}

impl Encoder for Value {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Value::Nil => writer.write_one(NIL),
            Value::Bool(b) => return b.encode(writer),
            Value::Int8(v) => encode_signed(writer, *v as i64, INT8),
            Value::Int16(v) => encode_signed(writer, *v as i64, INT16),
            Value::Int32(v) => encode_signed(writer, *v as i64, INT32),
            Value::Int64(v) => encode_signed(writer, *v, INT64),
            Value::Uint8(v) => encode_unsigned(writer, *v as u64, UINT8),
            Value::Uint16(v) => encode_unsigned(writer, *v as u64, UINT16),
            Value::Uint32(v) => encode_unsigned(writer, *v as u64, UINT32),
            Value::Uint64(v) => encode_unsigned(writer, *v, UINT64),
            Value::Float32(v) => return v.encode(writer),
            Value::Float64(v) => return v.encode(writer),
            Value::Complex64(c) => return c.encode(writer),
            Value::Complex128(c) => return c.encode(writer),
            Value::Time(t) => return t.encode(writer),
            Value::String(s) => write_str(writer, s),
            Value::Binary(b) => write_bin(writer, b),
            Value::Array(items) => return encode_array(writer, items.len(), items),
            Value::Map(pairs) => return encode_map(writer, pairs.len(), pairs.iter().map(|(k, v)| (k, v))),
            Value::Extension(e) => return e.encode(writer),
        }
        Ok(())
    }

    fn is_default(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(b) => !b,
            Value::String(s) => s.is_empty(),
            Value::Binary(b) => b.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(pairs) => pairs.is_empty(),
            Value::Extension(_) => false,
            other => other.as_i64() == Some(0) || other.as_u64() == Some(0) || other.as_f64() == Some(0.0),
        }
    }
}

/// Decodes whatever the stream holds.
///
/// Arrays and maps are materialized according to the handle's
/// `array_type` and `map_type`.
impl Decoder for Value {
    fn decode(reader: &mut Reader) -> Result<Self> {
        read_value(reader)
    }

    /// Replaces the destination; nil becomes `Value::Nil`.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        *self = read_value(reader)?;
        Ok(())
    }
}

fn read_value(reader: &mut Reader) -> Result<Value> {
    let tag = reader.read_one()?;
    let value = match kind_of(tag) {
        Kind::Nil => Value::Nil,
        Kind::Bool => Value::Bool(tag == TRUE),
        Kind::Time => Value::Time(read_time_body(reader)?),
        Kind::Int | Kind::Uint => read_number(reader, tag)?,
        Kind::Float => match tag {
            FLOAT32 => Value::Float32(f32::from_bits(reader.read_u32()?)),
            _ => Value::Float64(f64::from_bits(reader.read_u64()?)),
        },
        Kind::Complex => match tag {
            COMPLEX64 => {
                let re = f32::from_bits(reader.read_u32()?);
                let im = f32::from_bits(reader.read_u32()?);
                Value::Complex64(Complex { re, im })
            }
            _ => {
                let re = f64::from_bits(reader.read_u64()?);
                let im = f64::from_bits(reader.read_u64()?);
                Value::Complex128(Complex { re, im })
            }
        },
        Kind::Str => Value::String(read_string_body(reader, tag)?),
        Kind::Bin => Value::Binary(read_bytes_body(reader, tag)?),
        Kind::Ext => Value::Extension(read_ext_value(reader, tag)?),
        Kind::Symbol => Value::Extension(read_symbol_body(reader)?),
        Kind::Arr => {
            let count = array_count(reader, tag)?;
            let element = reader.handle().array_type;
            let items = reader.nested(|reader| {
                let mut items = Vec::with_capacity(bounded(count, reader));
                for _ in 0..count {
                    items.push(read_element(reader, element)?);
                }
                Ok(items)
            })?;
            Value::Array(items)
        }
        Kind::Map => {
            let count = map_count(reader, tag)?;
            let MapType { key, value } = reader.handle().map_type;
            let pairs = reader.nested(|reader| {
                let mut pairs = Vec::with_capacity(bounded(count, reader));
                for _ in 0..count {
                    let k = read_element(reader, key)?;
                    let v = read_element(reader, value)?;
                    pairs.push((k, v));
                }
                Ok(pairs)
            })?;
            Value::Map(pairs)
        }
        Kind::Reserved => return Err(CorkError::InvalidTag(tag)),
    };
    Ok(value)
}

/// Reads an integer at the width its marker declares.
fn read_number(reader: &mut Reader, tag: u8) -> Result<Value> {
    Ok(match tag {
        FIX_INT..=FIX_INT_MAX => Value::Int8(tag as i8),
        INT8 => Value::Int8(reader.read_one()? as i8),
        INT16 => Value::Int16(reader.read_u16()? as i16),
        INT32 => Value::Int32(reader.read_u32()? as i32),
        INT64 => Value::Int64(reader.read_u64()? as i64),
        UINT8 => Value::Uint8(reader.read_one()?),
        UINT16 => Value::Uint16(reader.read_u16()?),
        UINT32 => Value::Uint32(reader.read_u32()?),
        UINT64 => Value::Uint64(reader.read_u64()?),
        other => return Err(CorkError::mismatch("integer", other)),
    })
}

/// Reads one array element or map key/value and coerces it to `element`.
///
/// Nil passes through any element type.
fn read_element(reader: &mut Reader, element: ElementType) -> Result<Value> {
    let tag = reader.peek_one()?;
    let value = read_value(reader)?;
    if element == ElementType::Any || value.is_nil() {
        return Ok(value);
    }
    let overflow = |v: &Value, target: &'static str| CorkError::Overflow {
        target,
        value: format!("{:?}", v),
    };
    let coerced = match element {
        ElementType::Any => Some(value),
        ElementType::Bool => value.as_bool().map(Value::Bool),
        ElementType::Int if is_int(tag) || is_uint(tag) => {
            Some(Value::Int64(value.as_i64().ok_or_else(|| overflow(&value, "i64"))?))
        }
        ElementType::Uint if is_int(tag) || is_uint(tag) => {
            Some(Value::Uint64(value.as_u64().ok_or_else(|| overflow(&value, "u64"))?))
        }
        ElementType::Float => value.as_f64().map(Value::Float64),
        ElementType::Complex => match value {
            Value::Complex64(c) => Some(Value::Complex128(Complex::new(c.re as f64, c.im as f64))),
            Value::Complex128(_) => Some(value),
            _ => None,
        },
        ElementType::Time => matches!(value, Value::Time(_)).then_some(value),
        ElementType::String => matches!(value, Value::String(_)).then_some(value),
        ElementType::Binary => match value {
            Value::Binary(_) => Some(value),
            Value::String(s) => Some(Value::Binary(Bytes::from(s.into_bytes()))),
            _ => None,
        },
        ElementType::Int | ElementType::Uint => None,
    };
    coerced.ok_or_else(|| CorkError::mismatch(element_name(element), tag))
}

fn element_name(element: ElementType) -> &'static str {
    match element {
        ElementType::Any => "any",
        ElementType::Bool => "bool",
        ElementType::Int => "int",
        ElementType::Uint => "uint",
        ElementType::Float => "float",
        ElementType::Complex => "complex",
        ElementType::Time => "time",
        ElementType::String => "string",
        ElementType::Binary => "binary",
    }
}

// --- Conversions ---
macro_rules! impl_from {
    ($($t:ty => $variant:ident;)*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
    )*};
}

impl_from! {
    bool => Bool;
    i8 => Int8;
    i16 => Int16;
    i32 => Int32;
    i64 => Int64;
    u8 => Uint8;
    u16 => Uint16;
    u32 => Uint32;
    u64 => Uint64;
    f32 => Float32;
    f64 => Float64;
    Complex<f32> => Complex64;
    Complex<f64> => Complex128;
    DateTime<Utc> => Time;
    String => String;
    Bytes => Binary;
    Vec<Value> => Array;
    Vec<(Value, Value)> => Map;
    Extension => Extension;
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}
