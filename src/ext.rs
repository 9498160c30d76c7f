//! User-defined extension types.
//!
//! A type can take over its own wire form through one of two protocols:
//!
//! - [`Corker`] (buffer protocol) hands over a complete byte payload. The
//!   payload is framed by an extension tag carrying its length, so readers
//!   that do not know the type can still skip it.
//! - [`Selfer`] (stream protocol) writes directly into the [`Writer`] and
//!   reads back from the [`Reader`]. The content frames itself.
//!
//! Types that should decode into a [`crate::Value`] must also be registered
//! with a [`crate::Registry`] under their extension tag.

use crate::core::{read_length, write_header};
use crate::tags::*;
use crate::{CorkError, Reader, Result, Writer};
use bytes::Bytes;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Error returned by user marshal/unmarshal code.
pub type ExtError = Box<dyn std::error::Error + Send + Sync>;

/// Upcast to `Any`, so registered extensions can be downcast again.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Buffer-protocol extension: the type converts itself to and from bytes.
///
/// # Example
/// ```rust
/// use cork::{Corker, ExtError};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i16, y: i16 }
///
/// impl Corker for Point {
///     fn ext_tag(&self) -> u8 { 5 }
///     fn marshal_cork(&self) -> Result<Vec<u8>, ExtError> {
///         let mut out = self.x.to_be_bytes().to_vec();
///         out.extend_from_slice(&self.y.to_be_bytes());
///         Ok(out)
///     }
///     fn unmarshal_cork(&mut self, data: &[u8]) -> Result<(), ExtError> {
///         if data.len() != 4 {
///             return Err("point payload must be 4 bytes".into());
///         }
///         self.x = i16::from_be_bytes([data[0], data[1]]);
///         self.y = i16::from_be_bytes([data[2], data[3]]);
///         Ok(())
///     }
/// }
/// ```
pub trait Corker: AsAny + fmt::Debug + Send + Sync {
    /// The extension tag identifying this type on the wire.
    fn ext_tag(&self) -> u8;

    fn marshal_cork(&self) -> std::result::Result<Vec<u8>, ExtError>;

    fn unmarshal_cork(&mut self, data: &[u8]) -> std::result::Result<(), ExtError>;
}

/// Stream-protocol extension: the type writes and reads its own content.
///
/// Implementations must read back exactly what they wrote. Failures of the
/// type's own logic should be reported with [`CorkError::user_codec`].
pub trait Selfer: AsAny + fmt::Debug + Send + Sync {
    /// The extension tag identifying this type on the wire.
    fn ext_tag(&self) -> u8;

    fn marshal_to(&self, writer: &mut Writer) -> Result<()>;

    fn unmarshal_from(&mut self, reader: &mut Reader) -> Result<()>;
}

/// A decoded extension value held by a [`crate::Value`].
#[derive(Clone)]
pub enum Extension {
    Corker(Arc<dyn Corker>),
    Selfer(Arc<dyn Selfer>),
}

impl Extension {
    pub fn from_corker<T: Corker + 'static>(value: T) -> Self {
        Extension::Corker(Arc::new(value))
    }

    pub fn from_selfer<T: Selfer + 'static>(value: T) -> Self {
        Extension::Selfer(Arc::new(value))
    }

    pub fn tag(&self) -> u8 {
        match self {
            Extension::Corker(c) => c.ext_tag(),
            Extension::Selfer(s) => s.ext_tag(),
        }
    }

    /// Returns the concrete value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Extension::Corker(c) => AsAny::as_any(&**c).downcast_ref::<T>(),
            Extension::Selfer(s) => AsAny::as_any(&**s).downcast_ref::<T>(),
        }
    }

    fn write_to(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Extension::Corker(c) => encode_corker(&**c, writer),
            Extension::Selfer(s) => encode_selfer(&**s, writer),
        }
    }

    fn wire_bytes(&self) -> Option<Bytes> {
        let mut writer = Writer::default();
        self.write_to(&mut writer).ok()?;
        Some(writer.into_bytes())
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Corker(c) => f.debug_tuple("Corker").field(c).finish(),
            Extension::Selfer(s) => f.debug_tuple("Selfer").field(s).finish(),
        }
    }
}

/// Extensions are equal when they carry the same tag and encode to the same bytes.
impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        if self.tag() != other.tag() {
            return false;
        }
        match (self.wire_bytes(), other.wire_bytes()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

// --- Buffer protocol ---
/// Writes the extension length class, the tag byte and the payload.
///
/// The length counts the payload only.
pub fn encode_corker<T: Corker + ?Sized>(value: &T, writer: &mut Writer) -> Result<()> {
    let tag = value.ext_tag();
    let payload = value.marshal_cork().map_err(|e| CorkError::user_codec(tag, e))?;
    write_header(writer, FIX_EXT, (FIX_EXT_MAX - FIX_EXT) as usize, EXT8, payload.len());
    writer.write_one(tag);
    writer.write_many(&payload);
    Ok(())
}

/// Reads an extension frame whose tag byte was already consumed.
/// Returns the extension tag and the payload.
pub(crate) fn read_ext_frame(reader: &mut Reader, tag: u8) -> Result<(u8, Bytes)> {
    let len = read_length(reader, tag)?;
    let ext = reader.read_one()?;
    let payload = reader.read_many(len)?;
    Ok((ext, payload))
}

/// Decodes a buffer-protocol extension into `value`.
///
/// Fails with `TypeMismatch` when the stream holds a different kind of value
/// or an extension with another tag.
pub fn decode_corker<T: Corker + ?Sized>(value: &mut T, reader: &mut Reader) -> Result<()> {
    let tag = reader.read_one()?;
    if !is_ext(tag) {
        return Err(CorkError::mismatch(Kind::Ext.name(), tag));
    }
    let (ext, payload) = read_ext_frame(reader, tag)?;
    if ext != value.ext_tag() {
        return Err(CorkError::mismatch("extension with matching tag", ext));
    }
    value
        .unmarshal_cork(&payload)
        .map_err(|e| CorkError::user_codec(ext, e))
}

// --- Stream protocol ---
pub fn encode_selfer<T: Selfer + ?Sized>(value: &T, writer: &mut Writer) -> Result<()> {
    writer.write_one(SYMBOL);
    writer.write_one(value.ext_tag());
    value.marshal_to(writer)
}

pub fn decode_selfer<T: Selfer + ?Sized>(value: &mut T, reader: &mut Reader) -> Result<()> {
    let tag = reader.read_one()?;
    if tag != SYMBOL {
        return Err(CorkError::mismatch("stream extension", tag));
    }
    let ext = reader.read_one()?;
    if ext != value.ext_tag() {
        return Err(CorkError::mismatch("stream extension with matching tag", ext));
    }
    value.unmarshal_from(reader)
}

// --- Dynamic decode through the registry ---
/// Instantiates the registered buffer-protocol type for an extension frame.
pub(crate) fn read_ext_value(reader: &mut Reader, tag: u8) -> Result<Extension> {
    let (ext, payload) = read_ext_frame(reader, tag)?;
    let mut value = reader.registry().new_corker(ext)?;
    value
        .unmarshal_cork(&payload)
        .map_err(|e| CorkError::user_codec(ext, e))?;
    Ok(Extension::Corker(Arc::from(value)))
}

/// Instantiates the registered stream-protocol type after a symbol tag.
pub(crate) fn read_symbol_body(reader: &mut Reader) -> Result<Extension> {
    let ext = reader.read_one()?;
    let mut value = reader.registry().new_selfer(ext)?;
    value.unmarshal_from(reader)?;
    Ok(Extension::Selfer(Arc::from(value)))
}

impl crate::Encoder for Extension {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        self.write_to(writer)
    }

    fn is_default(&self) -> bool {
        false
    }
}

/// Decodes any registered extension, buffer or stream protocol.
impl crate::Decoder for Extension {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        match kind_of(tag) {
            Kind::Ext => read_ext_value(reader, tag),
            Kind::Symbol => read_symbol_body(reader),
            _ => Err(CorkError::mismatch(Kind::Ext.name(), tag)),
        }
    }
}
