use crate::tags::*;
use crate::*;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// --- Size classes ---
/// Writes the tag (and length) for a value whose size is `len`.
///
/// Uses the fixed tag `fixed + len` when `len <= fixed_max`, otherwise the
/// smallest of the four length markers starting at `marker8`.
pub(crate) fn write_header(writer: &mut Writer, fixed: u8, fixed_max: usize, marker8: u8, len: usize) {
    if len <= fixed_max {
        writer.write_one(fixed + len as u8);
    } else if len <= u8::MAX as usize {
        writer.write_one(marker8);
        writer.write_one(len as u8);
    } else if len <= u16::MAX as usize {
        writer.write_one(marker8 + 1);
        writer.write_u16(len as u16);
    } else if len as u64 <= u32::MAX as u64 {
        writer.write_one(marker8 + 2);
        writer.write_u32(len as u32);
    } else {
        writer.write_one(marker8 + 3);
        writer.write_u64(len as u64);
    }
}

/// Reads the length that belongs to a string, binary or extension tag.
pub(crate) fn read_length(reader: &mut Reader, tag: u8) -> Result<usize> {
    if let Some(n) = fixed_size(tag) {
        return Ok(n);
    }
    let len = match marker_width(tag) {
        Some(1) => reader.read_one()? as u64,
        Some(2) => reader.read_u16()? as u64,
        Some(4) => reader.read_u32()? as u64,
        Some(8) => reader.read_u64()?,
        _ => return Err(CorkError::InvalidTag(tag)),
    };
    usize::try_from(len).map_err(|_| CorkError::Malformed(format!("length {} is too large", len)))
}

/// Writes an array or map count: fixed tag up to 15, else the marker and
/// the count as the smallest unsigned integer.
pub(crate) fn write_count(writer: &mut Writer, fixed: u8, marker: u8, count: usize) {
    if count <= 15 {
        writer.write_one(fixed + count as u8);
    } else {
        writer.write_one(marker);
        write_uint_smallest(writer, count as u64);
    }
}

fn read_count(reader: &mut Reader, tag: u8) -> Result<usize> {
    if let Some(n) = fixed_size(tag) {
        return Ok(n);
    }
    let tag = reader.read_one()?;
    let count = read_integer(reader, tag)?;
    usize::try_from(count).map_err(|_| CorkError::Malformed(format!("invalid element count {}", count)))
}

/// Count of the array that starts with `tag`.
pub(crate) fn array_count(reader: &mut Reader, tag: u8) -> Result<usize> {
    if !is_arr(tag) {
        return Err(CorkError::mismatch(Kind::Arr.name(), tag));
    }
    read_count(reader, tag)
}

/// Count of the map that starts with `tag`.
pub(crate) fn map_count(reader: &mut Reader, tag: u8) -> Result<usize> {
    if !is_map(tag) {
        return Err(CorkError::mismatch(Kind::Map.name(), tag));
    }
    read_count(reader, tag)
}

pub(crate) fn read_array_header(reader: &mut Reader) -> Result<usize> {
    let tag = reader.read_one()?;
    array_count(reader, tag)
}

pub(crate) fn read_map_header(reader: &mut Reader) -> Result<usize> {
    let tag = reader.read_one()?;
    map_count(reader, tag)
}

/// Writes nil for a value with no wire form, or fails, per the handle.
pub(crate) fn encode_unsupported(writer: &mut Writer, what: &'static str) -> Result<()> {
    match writer.handle().unsupported {
        Unsupported::Nil => {
            tracing::debug!(kind = what, "encoding unsupported value as nil");
            writer.write_one(NIL);
            Ok(())
        }
        Unsupported::Error => Err(CorkError::Unsupported(what)),
    }
}

// --- Integers ---
fn put_int(writer: &mut Writer, marker: u8, v: i64) {
    writer.write_one(marker);
    match marker {
        INT8 => writer.write_one(v as i8 as u8),
        INT16 => writer.write_u16(v as i16 as u16),
        INT32 => writer.write_u32(v as i32 as u32),
        _ => writer.write_u64(v as u64),
    }
}

fn put_uint(writer: &mut Writer, marker: u8, v: u64) {
    writer.write_one(marker);
    match marker {
        UINT8 => writer.write_one(v as u8),
        UINT16 => writer.write_u16(v as u16),
        UINT32 => writer.write_u32(v as u32),
        _ => writer.write_u64(v),
    }
}

/// Encodes a signed integer declared with the width of `declared`.
///
/// Without precision the value shrinks to the fixed range or the smallest
/// signed marker that holds it.
pub(crate) fn encode_signed(writer: &mut Writer, v: i64, declared: u8) {
    if writer.handle().precision {
        put_int(writer, declared, v);
        return;
    }
    write_int_smallest(writer, v);
}

pub(crate) fn write_int_smallest(writer: &mut Writer, v: i64) {
    if (0..=FIX_INT_MAX as i64).contains(&v) {
        writer.write_one(v as u8);
    } else if i8::try_from(v).is_ok() {
        put_int(writer, INT8, v);
    } else if i16::try_from(v).is_ok() {
        put_int(writer, INT16, v);
    } else if i32::try_from(v).is_ok() {
        put_int(writer, INT32, v);
    } else {
        put_int(writer, INT64, v);
    }
}

pub(crate) fn encode_unsigned(writer: &mut Writer, v: u64, declared: u8) {
    if writer.handle().precision {
        put_uint(writer, declared, v);
        return;
    }
    write_uint_smallest(writer, v);
}

pub(crate) fn write_uint_smallest(writer: &mut Writer, v: u64) {
    if v <= FIX_INT_MAX as u64 {
        writer.write_one(v as u8);
    } else if v <= u8::MAX as u64 {
        put_uint(writer, UINT8, v);
    } else if v <= u16::MAX as u64 {
        put_uint(writer, UINT16, v);
    } else if v <= u32::MAX as u64 {
        put_uint(writer, UINT32, v);
    } else {
        put_uint(writer, UINT64, v);
    }
}

/// Reads the payload of any integer tag, signed or unsigned.
pub(crate) fn read_integer(reader: &mut Reader, tag: u8) -> Result<i128> {
    Ok(match tag {
        FIX_INT..=FIX_INT_MAX => tag as i128,
        INT8 => reader.read_one()? as i8 as i128,
        INT16 => reader.read_u16()? as i16 as i128,
        INT32 => reader.read_u32()? as i32 as i128,
        INT64 => reader.read_u64()? as i64 as i128,
        UINT8 => reader.read_one()? as i128,
        UINT16 => reader.read_u16()? as i128,
        UINT32 => reader.read_u32()? as i128,
        UINT64 => reader.read_u64()? as i128,
        other => return Err(CorkError::mismatch("integer", other)),
    })
}

/// Implements the codec for integer types.
///
/// Any integer tag decodes into any integer type as long as the value fits.
macro_rules! impl_integer {
    ($($t:ty => $encode:ident, $marker:expr;)*) => {$(
        impl Encoder for $t {
            fn encode(&self, writer: &mut Writer) -> Result<()> {
                $encode(writer, *self as _, $marker);
                Ok(())
            }

            fn is_default(&self) -> bool {
                *self == 0
            }
        }
        impl Decoder for $t {
            fn decode(reader: &mut Reader) -> Result<Self> {
                let tag = reader.read_one()?;
                let value = read_integer(reader, tag)?;
                <$t>::try_from(value).map_err(|_| CorkError::Overflow {
                    target: stringify!($t),
                    value: value.to_string(),
                })
            }
        }
    )*};
}

impl_integer! {
    i8 => encode_signed, INT8;
    i16 => encode_signed, INT16;
    i32 => encode_signed, INT32;
    i64 => encode_signed, INT64;
    isize => encode_signed, INT64;
    u16 => encode_unsigned, UINT16;
    u32 => encode_unsigned, UINT32;
    u64 => encode_unsigned, UINT64;
    usize => encode_unsigned, UINT64;
}

/// `u8` sequences travel as binary values.
impl Encoder for u8 {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_unsigned(writer, *self as u64, UINT8);
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == 0
    }

    fn encode_slice(items: &[Self], writer: &mut Writer) -> Result<()> {
        write_bin(writer, items);
        Ok(())
    }
}
impl Decoder for u8 {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        let value = read_integer(reader, tag)?;
        u8::try_from(value).map_err(|_| CorkError::Overflow {
            target: "u8",
            value: value.to_string(),
        })
    }

    fn vec_from_bytes(reader: &mut Reader, tag: u8) -> Result<Option<Vec<Self>>> {
        if !(is_bin(tag) || is_str(tag)) {
            return Ok(None);
        }
        Ok(Some(read_bytes_body(reader, tag)?.to_vec()))
    }
}

// --- bool ---
impl Encoder for bool {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(if *self { TRUE } else { FALSE });
        Ok(())
    }

    fn is_default(&self) -> bool {
        !(*self)
    }
}
impl Decoder for bool {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            other => Err(CorkError::mismatch(Kind::Bool.name(), other)),
        }
    }
}

// --- Floats ---
impl Encoder for f32 {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(FLOAT32);
        writer.write_u32(self.to_bits());
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == 0.0
    }
}
/// Accepts float32 only; a float64 cannot narrow losslessly.
impl Decoder for f32 {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            FLOAT32 => Ok(f32::from_bits(reader.read_u32()?)),
            other => Err(CorkError::mismatch("float32", other)),
        }
    }
}
impl Encoder for f64 {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(FLOAT64);
        writer.write_u64(self.to_bits());
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == 0.0
    }
}
impl Decoder for f64 {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            FLOAT32 => Ok(f32::from_bits(reader.read_u32()?) as f64),
            FLOAT64 => Ok(f64::from_bits(reader.read_u64()?)),
            other => Err(CorkError::mismatch("float", other)),
        }
    }
}

/// A complex number as a real/imaginary pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

impl Encoder for Complex<f32> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(COMPLEX64);
        writer.write_u32(self.re.to_bits());
        writer.write_u32(self.im.to_bits());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}
impl Decoder for Complex<f32> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            COMPLEX64 => {
                let re = f32::from_bits(reader.read_u32()?);
                let im = f32::from_bits(reader.read_u32()?);
                Ok(Complex { re, im })
            }
            other => Err(CorkError::mismatch("complex64", other)),
        }
    }
}
impl Encoder for Complex<f64> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(COMPLEX128);
        writer.write_u64(self.re.to_bits());
        writer.write_u64(self.im.to_bits());
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}
impl Decoder for Complex<f64> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            COMPLEX64 => {
                let re = f32::from_bits(reader.read_u32()?) as f64;
                let im = f32::from_bits(reader.read_u32()?) as f64;
                Ok(Complex { re, im })
            }
            COMPLEX128 => {
                let re = f64::from_bits(reader.read_u64()?);
                let im = f64::from_bits(reader.read_u64()?);
                Ok(Complex { re, im })
            }
            other => Err(CorkError::mismatch("complex", other)),
        }
    }
}

// --- Strings and binaries ---
pub(crate) fn write_str(writer: &mut Writer, s: &str) {
    write_header(writer, FIX_STR, (FIX_STR_MAX - FIX_STR) as usize, STR8, s.len());
    writer.write_many(s.as_bytes());
}

pub(crate) fn write_bin(writer: &mut Writer, b: &[u8]) {
    write_header(writer, FIX_BIN, (FIX_BIN_MAX - FIX_BIN) as usize, BIN8, b.len());
    writer.write_many(b);
}

/// Reads the body of a string or binary whose tag was already consumed.
pub(crate) fn read_bytes_body(reader: &mut Reader, tag: u8) -> Result<Bytes> {
    if !is_str(tag) && !is_bin(tag) {
        return Err(CorkError::mismatch("string or binary", tag));
    }
    let len = read_length(reader, tag)?;
    reader.read_many(len)
}

pub(crate) fn read_string_body(reader: &mut Reader, tag: u8) -> Result<String> {
    let bytes = read_bytes_body(reader, tag)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CorkError::InvalidUtf8)
}

impl Encoder for str {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, self);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl Encoder for String {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, self);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
/// Decodes a `String` from a string or binary value.
impl Decoder for String {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        read_string_body(reader, tag)
    }
}
impl Encoder for Cow<'_, str> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_str(writer, self);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl Decoder for Cow<'static, str> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Cow::Owned(String::decode(reader)?))
    }
}
impl Encoder for char {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        let mut buf = [0u8; 4];
        write_str(writer, self.encode_utf8(&mut buf));
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == '\0'
    }
}
impl Decoder for char {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let s = String::decode(reader)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CorkError::Length {
                expected: 1,
                found: s.chars().count(),
            }),
        }
    }
}

impl Encoder for Bytes {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_bin(writer, self);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl Decoder for Bytes {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        read_bytes_body(reader, tag)
    }
}

/// Raw bytes that always encode as a binary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(v: Vec<u8>) -> Self {
        Binary(v)
    }
}

impl std::ops::Deref for Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Encoder for Binary {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_bin(writer, &self.0);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}
impl Decoder for Binary {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Binary(Bytes::decode(reader)?.to_vec()))
    }
}

// --- Timestamps ---
pub(crate) fn write_time(writer: &mut Writer, nanos: i64) {
    writer.write_one(TIME);
    writer.write_u64(nanos as u64);
}

pub(crate) fn read_time_body(reader: &mut Reader) -> Result<DateTime<Utc>> {
    let nanos = reader.read_u64()? as i64;
    Ok(Utc.timestamp_nanos(nanos))
}

fn read_time_nanos(reader: &mut Reader) -> Result<i64> {
    match reader.read_one()? {
        TIME => Ok(reader.read_u64()? as i64),
        other => Err(CorkError::mismatch(Kind::Time.name(), other)),
    }
}

fn read_time(reader: &mut Reader) -> Result<DateTime<Utc>> {
    Ok(Utc.timestamp_nanos(read_time_nanos(reader)?))
}

fn nanos_of<Tz: TimeZone>(t: &DateTime<Tz>) -> Result<i64> {
    t.timestamp_nanos_opt().ok_or_else(|| CorkError::Overflow {
        target: "timestamp nanoseconds",
        value: t.naive_utc().to_string(),
    })
}

impl Encoder for DateTime<Utc> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_time(writer, nanos_of(self)?);
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}
impl Decoder for DateTime<Utc> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        read_time(reader)
    }
}
impl Encoder for DateTime<FixedOffset> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_time(writer, nanos_of(self)?);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.with_timezone(&Utc) == DateTime::<Utc>::default()
    }
}
/// Decodes in UTC; the wire form carries no offset.
impl Decoder for DateTime<FixedOffset> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(read_time(reader)?.with_timezone(&Utc.fix()))
    }
}
impl Encoder for DateTime<Local> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_time(writer, nanos_of(self)?);
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.with_timezone(&Utc) == DateTime::<Utc>::default()
    }
}
impl Decoder for DateTime<Local> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(read_time(reader)?.with_timezone(&Local))
    }
}
/// Naive date-times are taken to be UTC.
impl Encoder for NaiveDateTime {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        write_time(writer, nanos_of(&Utc.from_utc_datetime(self))?);
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}
impl Decoder for NaiveDateTime {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(read_time(reader)?.naive_utc())
    }
}
/// Encodes the date at UTC midnight.
impl Encoder for NaiveDate {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        let midnight = self.and_hms_opt(0, 0, 0).ok_or_else(|| CorkError::Overflow {
            target: "timestamp",
            value: self.to_string(),
        })?;
        midnight.encode(writer)
    }

    fn is_default(&self) -> bool {
        *self == NaiveDate::default()
    }
}
impl Decoder for NaiveDate {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(read_time(reader)?.date_naive())
    }
}
impl Encoder for SystemTime {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        let nanos = match self.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_nanos()).ok(),
            Err(e) => i64::try_from(e.duration().as_nanos()).ok().map(|n| -n),
        };
        let nanos = nanos.ok_or_else(|| CorkError::Overflow {
            target: "timestamp nanoseconds",
            value: format!("{:?}", self),
        })?;
        write_time(writer, nanos);
        Ok(())
    }

    fn is_default(&self) -> bool {
        *self == UNIX_EPOCH
    }
}
impl Decoder for SystemTime {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let nanos = read_time_nanos(reader)?;
        let offset = Duration::from_nanos(nanos.unsigned_abs());
        Ok(if nanos >= 0 {
            UNIX_EPOCH + offset
        } else {
            UNIX_EPOCH - offset
        })
    }
}

// --- Nil and indirection ---
impl Encoder for () {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_one(NIL);
        Ok(())
    }

    fn is_default(&self) -> bool {
        true
    }
}
impl Decoder for () {
    fn decode(reader: &mut Reader) -> Result<Self> {
        match reader.read_one()? {
            NIL => Ok(()),
            other => Err(CorkError::mismatch(Kind::Nil.name(), other)),
        }
    }
}

/// `None` is nil; `Some` is transparent.
impl<T: Encoder> Encoder for Option<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Some(v) => v.encode(writer),
            None => {
                writer.write_one(NIL);
                Ok(())
            }
        }
    }

    fn is_default(&self) -> bool {
        self.is_none()
    }
}
impl<T: Decoder> Decoder for Option<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        if reader.take_nil()? {
            return Ok(None);
        }
        Ok(Some(T::decode(reader)?))
    }

    /// Nil clears the option; anything else merges into the held value.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        if reader.take_nil()? {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.decode_into(reader),
            None => {
                *self = Some(T::decode(reader)?);
                Ok(())
            }
        }
    }
}

impl<T: Encoder + ?Sized> Encoder for &T {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }
}
impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }
}
impl<T: Decoder> Decoder for Box<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Box::new(T::decode(reader)?))
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        (**self).decode_into(reader)
    }
}
impl<T: Encoder + ?Sized> Encoder for Arc<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }
}
impl<T: Decoder> Decoder for Arc<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Arc::new(T::decode(reader)?))
    }
}
impl<T: Encoder + ?Sized> Encoder for Rc<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }
}
impl<T: Decoder> Decoder for Rc<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Rc::new(T::decode(reader)?))
    }
}

// --- Values with no wire form ---
macro_rules! impl_unsupported {
    ($what:literal; $($ty:ty $(, $param:ident)*;)*) => {$(
        impl<$($param),*> Encoder for $ty {
            fn encode(&self, writer: &mut Writer) -> Result<()> {
                encode_unsupported(writer, $what)
            }

            fn is_default(&self) -> bool {
                false
            }
        }
    )*};
}

impl_unsupported! { "function";
    fn() -> R, R;
    fn(A) -> R, A, R;
    fn(A, B) -> R, A, B, R;
    fn(A, B, C) -> R, A, B, C, R;
}
impl_unsupported! { "channel";
    mpsc::Sender<T>, T;
    mpsc::SyncSender<T>, T;
    mpsc::Receiver<T>, T;
}

// --- Skipping ---
/// Steps over one complete value without materializing it.
///
/// Stream-protocol extensions frame themselves, so skipping one decodes it
/// through the reader's registry.
///
/// # Errors
/// Returns an error if the value is truncated or starts with an invalid tag.
pub fn skip_value(reader: &mut Reader) -> Result<()> {
    let tag = reader.read_one()?;
    match kind_of(tag) {
        Kind::Nil | Kind::Bool => Ok(()),
        Kind::Int | Kind::Uint | Kind::Float | Kind::Complex | Kind::Time => match marker_width(tag) {
            Some(width) => reader.skip(width),
            None => Ok(()),
        },
        Kind::Str | Kind::Bin => {
            let len = read_length(reader, tag)?;
            reader.skip(len)
        }
        Kind::Ext => {
            let len = read_length(reader, tag)?;
            let total = len
                .checked_add(1)
                .ok_or_else(|| CorkError::Malformed(format!("extension length {} is too large", len)))?;
            reader.skip(total)
        }
        Kind::Symbol => {
            crate::ext::read_symbol_body(reader)?;
            Ok(())
        }
        Kind::Arr => {
            let count = read_count(reader, tag)?;
            reader.nested(|reader| {
                for _ in 0..count {
                    skip_value(reader)?;
                }
                Ok(())
            })
        }
        Kind::Map => {
            let count = read_count(reader, tag)?;
            reader.nested(|reader| {
                for _ in 0..count {
                    skip_value(reader)?;
                    skip_value(reader)?;
                }
                Ok(())
            })
        }
        Kind::Reserved => Err(CorkError::InvalidTag(tag)),
    }
}
