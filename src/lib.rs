//! # cork
//!
//! A compact, self-describing binary serialization format.
//!
//! - Every value starts with a tag byte; small integers, short strings,
//!   binaries, arrays and maps fit their size into the tag itself
//! - Integers shrink to the smallest wire form unless [`Handle::precision`] is set
//! - Structs encode as maps keyed by field name and decode by *merging* into
//!   an existing value: unknown keys are skipped, absent fields are kept
//! - Values can be decoded without knowing their type into a [`Value`]
//! - Application types can supply their own byte form through the
//!   [`Corker`] (buffer) or [`Selfer`] (stream) extension protocols
//!
//! ## Attribute Macros
//!
//! - `#[cork("name")]` - Use `name` as the map key for this field.
//! - `#[cork("name,omitempty")]` / `#[cork(",omitempty")]` - Do not write the field when it holds its empty value.
//! - `#[cork("-")]` - Never write or read this field.
//! - `#[cork(corker)]` / `#[cork(selfer)]` on a type - Encode it through its extension protocol.
//!
//! ## Feature Flags
//!
//! - `uuid` - Enables encoding/decoding of `uuid::Uuid` as 16-byte binary.
//! - `ulid` - Enables encoding/decoding of `ulid::Ulid` as 16-byte binary.
//! - `rust_decimal` - Enables encoding/decoding of `rust_decimal::Decimal` as a string.
//! - `bigdecimal` - Enables encoding/decoding of `bigdecimal::BigDecimal` as a string.
//! - `indexmap` - Enables encoding/decoding of `IndexMap` and `IndexSet` collections.
//! - `ahash` - Enables encoding/decoding of `ahash::AHashMap` and `ahash::AHashSet`.
//! - `smol_str` - Enables encoding/decoding of `smol_str::SmolStr`.
//! - `serde_json` - Enables encoding/decoding of `serde_json::Value`.

mod buffer;
mod collections;
pub mod core;
pub mod ext;
mod features;
pub mod fields;
mod handle;
pub mod registry;
mod stream;
pub mod tags;
mod value;

pub use crate::buffer::{Reader, Writer};
pub use crate::core::{skip_value, Binary, Complex};
pub use crate::ext::{Corker, ExtError, Extension, Selfer};
pub use crate::fields::{parse_tag, StructDecoder, StructEncoder, TagOptions};
pub use crate::handle::{ElementType, Handle, MapType, Unsupported, DEFAULT_MAX_DEPTH};
pub use crate::registry::{register, register_selfer, Registry};
pub use crate::stream::{decode_from, StreamDecoder};
pub use crate::value::Value;
pub use cork_derive::{Decode, Encode};

use bytes::Bytes;
use std::io;

/// Errors that can occur during encoding or decoding operations.
#[derive(Debug, thiserror::Error)]
pub enum CorkError {
    /// The stream ended before the current value was complete.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    /// A tag byte that cannot start a value.
    #[error("invalid tag byte 0x{0:02X}")]
    InvalidTag(u8),
    /// An extension tag with no registered type, met during dynamic decode.
    #[error("no extension registered for tag {0}")]
    UnregisteredExtension(u8),
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("malformed stream: {0}")]
    Malformed(String),
    /// The stream holds a value of a different kind than the destination.
    #[error("type mismatch: expected {expected}, found {} (tag 0x{found:02X})", kind_name(.found))]
    TypeMismatch { expected: &'static str, found: u8 },
    /// A numeric value does not fit the destination type.
    #[error("value {value} does not fit in {target}")]
    Overflow { target: &'static str, value: String },
    /// A fixed-size destination got a different number of elements.
    #[error("length mismatch: expected {expected}, found {found}")]
    Length { expected: usize, found: usize },
    /// A user extension failed to marshal or unmarshal itself.
    #[error("extension {tag} codec failed: {source}")]
    UserCodec {
        tag: u8,
        #[source]
        source: ExtError,
    },
    /// The value has no wire representation and the handle asks to fail.
    #[error("unsupported value: {0}")]
    Unsupported(&'static str),
    #[error("extension tag {tag} is already registered to {existing}, cannot register {incoming}")]
    DuplicateExtension {
        tag: u8,
        existing: &'static str,
        incoming: &'static str,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn kind_name(tag: &u8) -> &'static str {
    tags::kind_of(*tag).name()
}

/// Broad category of a [`CorkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedStream,
    TypeMismatch,
    UserCodec,
    Unsupported,
    Registry,
    Io,
}

impl CorkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CorkError::UnexpectedEof { .. }
            | CorkError::InvalidTag(_)
            | CorkError::UnregisteredExtension(_)
            | CorkError::InvalidUtf8
            | CorkError::Malformed(_) => ErrorKind::MalformedStream,
            CorkError::TypeMismatch { .. }
            | CorkError::Overflow { .. }
            | CorkError::Length { .. } => ErrorKind::TypeMismatch,
            CorkError::UserCodec { .. } => ErrorKind::UserCodec,
            CorkError::Unsupported(_) => ErrorKind::Unsupported,
            CorkError::DuplicateExtension { .. } => ErrorKind::Registry,
            CorkError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: u8) -> Self {
        CorkError::TypeMismatch { expected, found }
    }

    /// Wraps a failure of user extension code.
    pub fn user_codec(tag: u8, source: impl Into<ExtError>) -> Self {
        CorkError::UserCodec {
            tag,
            source: source.into(),
        }
    }
}

/// The result type used throughout this crate for encode/decode operations.
pub type Result<T> = std::result::Result<T, CorkError>;

/// Trait for types that can be encoded into the cork binary format.
///
/// Most users should use `#[derive(Encode)]` instead of manual implementation.
pub trait Encoder {
    /// Append the encoded form of the value to `writer`.
    fn encode(&self, writer: &mut Writer) -> Result<()>;

    /// Returns true if this value is the empty/zero value of its type.
    /// Used by the `omitempty` field option.
    fn is_default(&self) -> bool;

    /// Encodes a slice of this type. `u8` writes a binary value instead of an array.
    #[doc(hidden)]
    fn encode_slice(items: &[Self], writer: &mut Writer) -> Result<()>
    where
        Self: Sized,
    {
        collections::encode_array(writer, items.len(), items)
    }
}

/// Trait for types that can be decoded from the cork binary format.
///
/// Most users should use `#[derive(Decode)]` instead of manual implementation.
pub trait Decoder: Sized {
    /// Decode a fresh value from the front of `reader`.
    fn decode(reader: &mut Reader) -> Result<Self>;

    /// Decode the next value into `self`, merging where the type supports it.
    ///
    /// A nil in the stream leaves `self` untouched.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        if reader.take_nil()? {
            return Ok(());
        }
        *self = Self::decode(reader)?;
        Ok(())
    }

    /// Reads the string or binary value starting with `tag` as a vector of
    /// this type. Only `u8` accepts one; every other type returns `None`.
    #[doc(hidden)]
    fn vec_from_bytes(_reader: &mut Reader, _tag: u8) -> Result<Option<Vec<Self>>> {
        Ok(None)
    }
}

/// Encodes a value with the default [`Handle`].
///
/// # Example
/// ```rust
/// use cork::{encode, decode, Encode, Decode};
///
/// #[derive(Encode, Decode, PartialEq, Debug, Default)]
/// struct MyStruct {
///     id: u32,
///     name: String,
/// }
///
/// let value = MyStruct { id: 42, name: "hello".to_string() };
/// let mut buf = encode(&value).unwrap();
/// let decoded: MyStruct = decode(&mut buf).unwrap();
/// assert_eq!(value, decoded);
/// ```
pub fn encode<T: Encoder + ?Sized>(value: &T) -> Result<Bytes> {
    encode_with(value, &Handle::default())
}

/// Encodes a value with the given options.
pub fn encode_with<T: Encoder + ?Sized>(value: &T, handle: &Handle) -> Result<Bytes> {
    let mut writer = Writer::new(handle.clone());
    value.encode(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Encodes a value and writes the bytes to `out`.
pub fn encode_to<T, W>(value: &T, handle: &Handle, mut out: W) -> Result<()>
where
    T: Encoder + ?Sized,
    W: io::Write,
{
    let bytes = encode_with(value, handle)?;
    out.write_all(&bytes)?;
    Ok(())
}

/// Decodes one value from the front of `reader` with the default [`Handle`].
///
/// The bytes after the value stay in `reader`, so consecutive values can be
/// decoded one after another.
pub fn decode<T: Decoder>(reader: &mut Bytes) -> Result<T> {
    decode_with(reader, &Handle::default())
}

pub fn decode_with<T: Decoder>(reader: &mut Bytes, handle: &Handle) -> Result<T> {
    let mut r = Reader::with_handle(reader.clone(), handle.clone());
    let value = T::decode(&mut r)?;
    *reader = r.into_inner();
    Ok(value)
}

/// Decodes one value from the front of `reader` into `dest`, merging.
pub fn decode_into<T: Decoder>(reader: &mut Bytes, dest: &mut T) -> Result<()> {
    decode_into_with(reader, dest, &Handle::default())
}

pub fn decode_into_with<T: Decoder>(reader: &mut Bytes, dest: &mut T, handle: &Handle) -> Result<()> {
    let mut r = Reader::with_handle(reader.clone(), handle.clone());
    dest.decode_into(&mut r)?;
    *reader = r.into_inner();
    Ok(())
}
