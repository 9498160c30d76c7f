//! Struct field metadata and the map-shaped struct codec.
//!
//! `#[derive(Encode, Decode)]` on a struct with named fields emits a static
//! table of [`RawField`]s plus per-index accessors. The wire names and
//! options are parsed from the field tags once per type and kept in the
//! process-wide [`FieldCache`].

use crate::core::{array_count, map_count, skip_value, write_count, write_str};
use crate::tags::*;
use crate::{CorkError, Decoder, Reader, Result, Writer};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Parsed form of a `#[cork("…")]` field tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagOptions {
    /// Wire name override. `None` keeps the field identifier.
    pub name: Option<String>,
    /// The field is excluded from encoding and decoding.
    pub skip: bool,
    /// The field is not written when it holds its empty value.
    pub omit_empty: bool,
}

/// Splits a field tag.
///
/// `"-"` skips the field. Otherwise the text before the first comma renames
/// it (an empty name keeps the identifier) and the options after the comma
/// may contain `omitempty`.
///
/// ```rust
/// use cork::parse_tag;
///
/// let opts = parse_tag("data,omitempty");
/// assert_eq!(opts.name.as_deref(), Some("data"));
/// assert!(opts.omit_empty);
/// assert!(parse_tag("-").skip);
/// ```
pub fn parse_tag(tag: &str) -> TagOptions {
    if tag == "-" {
        return TagOptions {
            skip: true,
            ..TagOptions::default()
        };
    }
    let (name, options) = match tag.split_once(',') {
        Some((name, options)) => (name, options),
        None => (tag, ""),
    };
    TagOptions {
        name: (!name.is_empty()).then(|| name.to_string()),
        skip: false,
        omit_empty: options.split(',').any(|opt| opt.trim() == "omitempty"),
    }
}

/// A struct field as the derive macro sees it.
#[derive(Debug, Clone, Copy)]
pub struct RawField {
    pub ident: &'static str,
    pub tag: Option<&'static str>,
}

/// Resolved metadata of one encodable field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Position in the type's `RawField` table.
    pub index: usize,
    pub ident: &'static str,
    /// Map key on the wire.
    pub name: String,
    pub omit_empty: bool,
}

/// Resolved metadata of a struct type, in declaration order.
#[derive(Debug, Default)]
pub struct StructInfo {
    pub fields: Vec<FieldInfo>,
    by_name: HashMap<String, usize>,
}

impl StructInfo {
    pub fn build(raw: &[RawField]) -> Self {
        let mut info = StructInfo::default();
        for (index, field) in raw.iter().enumerate() {
            let opts = field.tag.map(parse_tag).unwrap_or_default();
            if opts.skip {
                continue;
            }
            let name = opts.name.unwrap_or_else(|| field.ident.to_string());
            info.by_name.insert(name.clone(), info.fields.len());
            info.fields.push(FieldInfo {
                index,
                ident: field.ident,
                name,
                omit_empty: opts.omit_empty,
            });
        }
        info
    }

    /// The field whose wire name is `name`.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }
}

/// Process-wide cache of [`StructInfo`] keyed by type.
///
/// Entries are computed on first use and never invalidated.
#[derive(Debug, Default)]
pub struct FieldCache {
    types: RwLock<HashMap<TypeId, Arc<StructInfo>>>,
}

impl FieldCache {
    pub fn global() -> &'static FieldCache {
        static GLOBAL: OnceLock<FieldCache> = OnceLock::new();
        GLOBAL.get_or_init(FieldCache::default)
    }

    pub fn get(&self, type_id: TypeId, type_name: &'static str, raw: &[RawField]) -> Arc<StructInfo> {
        if let Some(info) = self.types.read().get(&type_id) {
            return info.clone();
        }
        let guard = self.types.upgradable_read();
        if let Some(info) = guard.get(&type_id) {
            return info.clone();
        }
        let info = Arc::new(StructInfo::build(raw));
        tracing::trace!(type_name, fields = info.fields.len(), "cached struct fields");
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        guard.insert(type_id, info.clone());
        info
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

fn info_of<T: 'static>(raw: &[RawField]) -> Arc<StructInfo> {
    FieldCache::global().get(TypeId::of::<T>(), type_name::<T>(), raw)
}

/// Field access for map-shaped struct encoding. Implemented by `#[derive(Encode)]`.
pub trait StructEncoder: 'static {
    const FIELDS: &'static [RawField];

    /// Encodes the field at `index` of [`Self::FIELDS`].
    fn encode_field(&self, index: usize, writer: &mut Writer) -> Result<()>;

    fn field_is_default(&self, index: usize) -> bool;
}

/// Field access for map-shaped struct decoding. Implemented by `#[derive(Decode)]`.
pub trait StructDecoder: 'static {
    const FIELDS: &'static [RawField];

    /// Merges the next stream value into the field at `index` of [`Self::FIELDS`].
    fn decode_field(&mut self, index: usize, reader: &mut Reader) -> Result<()>;
}

/// Writes a struct as a map of wire name to field value.
///
/// The count written is the number of fields left after `omitempty`.
pub fn encode_struct<T: StructEncoder>(value: &T, writer: &mut Writer) -> Result<()> {
    let info = info_of::<T>(T::FIELDS);
    let present = |f: &&FieldInfo| !(f.omit_empty && value.field_is_default(f.index));
    let count = info.fields.iter().filter(present).count();
    write_count(writer, FIX_MAP, MAP, count);
    for field in info.fields.iter().filter(present) {
        write_str(writer, &field.name);
        value.encode_field(field.index, writer)?;
    }
    Ok(())
}

/// Merges a stream map into a struct.
///
/// Keys with no matching field are skipped, fields with no key keep their
/// value, and nil leaves the struct untouched.
pub fn decode_struct<T: StructDecoder>(value: &mut T, reader: &mut Reader) -> Result<()> {
    let tag = reader.read_one()?;
    if tag == NIL {
        return Ok(());
    }
    let count = map_count(reader, tag)?;
    let info = info_of::<T>(T::FIELDS);
    reader.nested(|reader| {
        for _ in 0..count {
            if !is_str(reader.peek_one()?) {
                skip_value(reader)?;
                skip_value(reader)?;
                continue;
            }
            let key = String::decode(reader)?;
            match info.field(&key) {
                Some(field) => value.decode_field(field.index, reader)?,
                None => {
                    tracing::trace!(key = %key, target_type = type_name::<T>(), "skipping unknown struct key");
                    skip_value(reader)?;
                }
            }
        }
        Ok(())
    })
}

/// Writes the array header of a tuple struct with `len` fields.
pub fn encode_tuple_header(writer: &mut Writer, len: usize) {
    write_count(writer, FIX_ARR, ARR, len);
}

/// Reads the array header of a tuple struct with `len` fields.
///
/// Returns false when the stream holds nil instead.
pub fn decode_tuple_header(reader: &mut Reader, len: usize) -> Result<bool> {
    let tag = reader.read_one()?;
    if tag == NIL {
        return Ok(false);
    }
    let count = array_count(reader, tag)?;
    if count != len {
        return Err(CorkError::Length {
            expected: len,
            found: count,
        });
    }
    Ok(true)
}
