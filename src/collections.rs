//! Arrays, maps, sets and tuples.
//!
//! Sequences use the array tags, keyed collections the map tags. Decoding
//! into an existing collection merges: vectors reuse their elements, maps
//! and sets keep entries the stream does not mention.

use crate::core::*;
use crate::tags::*;
use crate::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

// --- Shared helpers ---
pub(crate) fn encode_array<'a, T, I>(writer: &mut Writer, len: usize, items: I) -> Result<()>
where
    T: Encoder + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    write_count(writer, FIX_ARR, ARR, len);
    for item in items {
        item.encode(writer)?;
    }
    Ok(())
}

/// Encodes set members, in byte order of their encoding when keys are sorted.
pub(crate) fn encode_set<'a, T, I>(writer: &mut Writer, len: usize, items: I) -> Result<()>
where
    T: Encoder + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if !writer.handle().sort_map_keys {
        return encode_array(writer, len, items);
    }
    let mut encoded = Vec::with_capacity(len);
    for item in items {
        let mut scratch = writer.scratch();
        item.encode(&mut scratch)?;
        encoded.push(scratch.into_bytes());
    }
    encoded.sort();
    write_count(writer, FIX_ARR, ARR, len);
    for bytes in encoded {
        writer.write_many(&bytes);
    }
    Ok(())
}

/// Encodes map pairs, in byte order of the encoded keys when keys are sorted.
pub(crate) fn encode_map<'a, K, V, I>(writer: &mut Writer, len: usize, entries: I) -> Result<()>
where
    K: Encoder + ?Sized + 'a,
    V: Encoder + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    write_count(writer, FIX_MAP, MAP, len);
    if writer.handle().sort_map_keys {
        let mut sorted = Vec::with_capacity(len);
        for (k, v) in entries {
            let mut scratch = writer.scratch();
            k.encode(&mut scratch)?;
            sorted.push((scratch.into_bytes(), v));
        }
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, v) in sorted {
            writer.write_many(&key);
            v.encode(writer)?;
        }
    } else {
        for (k, v) in entries {
            k.encode(writer)?;
            v.encode(writer)?;
        }
    }
    Ok(())
}

/// Capacity hint that a hostile count cannot blow up.
#[inline]
pub(crate) fn bounded(count: usize, reader: &Reader) -> usize {
    count.min(reader.remaining())
}

/// Collections that accept decoded members one at a time.
pub(crate) trait Collect {
    type Item;
    fn clear_all(&mut self);
    fn put(&mut self, item: Self::Item);
}

/// Merges a stream array into a set-like collection.
///
/// An empty array clears it; nil leaves it alone.
pub(crate) fn merge_set<C>(reader: &mut Reader, dest: &mut C) -> Result<()>
where
    C: Collect,
    C::Item: Decoder,
{
    if reader.take_nil()? {
        return Ok(());
    }
    let count = read_array_header(reader)?;
    if count == 0 {
        dest.clear_all();
        return Ok(());
    }
    reader.nested(|reader| {
        for _ in 0..count {
            dest.put(C::Item::decode(reader)?);
        }
        Ok(())
    })
}

/// Merges a stream map into a map, overwriting colliding keys.
///
/// An empty map clears it; nil leaves it alone.
pub(crate) fn merge_map<C, K, V>(reader: &mut Reader, dest: &mut C) -> Result<()>
where
    C: Collect<Item = (K, V)>,
    K: Decoder,
    V: Decoder,
{
    if reader.take_nil()? {
        return Ok(());
    }
    let count = read_map_header(reader)?;
    if count == 0 {
        dest.clear_all();
        return Ok(());
    }
    reader.nested(|reader| {
        for _ in 0..count {
            let k = K::decode(reader)?;
            let v = V::decode(reader)?;
            dest.put((k, v));
        }
        Ok(())
    })
}

// --- Vec<T> ---
/// Encodes a `Vec<T>` as an array. `Vec<u8>` is encoded as binary.
impl<T: Encoder> Encoder for Vec<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        T::encode_slice(self, writer)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl<T: Encoder> Encoder for [T] {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        T::encode_slice(self, writer)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
/// Decodes a `Vec<T>` from an array; `Vec<u8>` also accepts binary and string values.
///
/// Nil decodes as an empty vector.
impl<T: Decoder> Decoder for Vec<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_one()?;
        if tag == NIL {
            return Ok(Vec::new());
        }
        if let Some(bytes) = T::vec_from_bytes(reader, tag)? {
            return Ok(bytes);
        }
        let count = array_count(reader, tag)?;
        reader.nested(|reader| {
            let mut vec = Vec::with_capacity(bounded(count, reader));
            for _ in 0..count {
                vec.push(T::decode(reader)?);
            }
            Ok(vec)
        })
    }

    /// Decodes elements in place when the vector already holds enough of
    /// them, then truncates to the stream count. A shorter vector is replaced.
    ///
    /// Merged in place, a nil element keeps the element it lands on, where a
    /// fresh decode of a scalar element from nil fails.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        if reader.take_nil()? {
            return Ok(());
        }
        let tag = reader.read_one()?;
        if let Some(bytes) = T::vec_from_bytes(reader, tag)? {
            *self = bytes;
            return Ok(());
        }
        let count = array_count(reader, tag)?;
        reader.nested(|reader| {
            if self.len() >= count {
                for item in self.iter_mut().take(count) {
                    item.decode_into(reader)?;
                }
                self.truncate(count);
            } else {
                let mut fresh = Vec::with_capacity(bounded(count, reader));
                for _ in 0..count {
                    fresh.push(T::decode(reader)?);
                }
                *self = fresh;
            }
            Ok(())
        })
    }
}

// --- Array ---
/// Encodes a fixed-size array as an array. `[u8; N]` is encoded as binary.
impl<T: Encoder, const N: usize> Encoder for [T; N] {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        T::encode_slice(self, writer)
    }

    fn is_default(&self) -> bool {
        self.iter().all(|item| item.is_default())
    }
}
impl<T: Decoder, const N: usize> Decoder for [T; N] {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let vec = Vec::<T>::decode(reader)?;
        let found = vec.len();
        vec.try_into().map_err(|_| CorkError::Length { expected: N, found })
    }

    /// Merges the first `count` elements; the rest keep their values.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        if reader.take_nil()? {
            return Ok(());
        }
        let tag = reader.read_one()?;
        if let Some(bytes) = T::vec_from_bytes(reader, tag)? {
            if bytes.len() > N {
                return Err(CorkError::Length {
                    expected: N,
                    found: bytes.len(),
                });
            }
            for (slot, b) in self.iter_mut().zip(bytes) {
                *slot = b;
            }
            return Ok(());
        }
        let count = array_count(reader, tag)?;
        if count > N {
            return Err(CorkError::Length {
                expected: N,
                found: count,
            });
        }
        reader.nested(|reader| {
            for item in self.iter_mut().take(count) {
                item.decode_into(reader)?;
            }
            Ok(())
        })
    }
}

// --- VecDeque ---
impl<T: Encoder> Encoder for VecDeque<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_array(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl<T: Decoder> Decoder for VecDeque<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        if reader.take_nil()? {
            return Ok(VecDeque::new());
        }
        let count = read_array_header(reader)?;
        reader.nested(|reader| {
            let mut deque = VecDeque::with_capacity(bounded(count, reader));
            for _ in 0..count {
                deque.push_back(T::decode(reader)?);
            }
            Ok(deque)
        })
    }
}

// --- Sets ---
impl<T: Eq + Hash, S: BuildHasher> Collect for HashSet<T, S> {
    type Item = T;

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, item: T) {
        self.insert(item);
    }
}
impl<T: Ord> Collect for BTreeSet<T> {
    type Item = T;

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, item: T) {
        self.insert(item);
    }
}
impl<T: Encoder + Eq + Hash, S: BuildHasher> Encoder for HashSet<T, S> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_set(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl<T: Decoder + Eq + Hash, S: BuildHasher + Default> Decoder for HashSet<T, S> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut set = HashSet::with_hasher(S::default());
        merge_set(reader, &mut set)?;
        Ok(set)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_set(reader, self)
    }
}
impl<T: Encoder + Ord> Encoder for BTreeSet<T> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_set(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl<T: Decoder + Ord> Decoder for BTreeSet<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut set = BTreeSet::new();
        merge_set(reader, &mut set)?;
        Ok(set)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_set(reader, self)
    }
}

// --- Maps ---
impl<K: Eq + Hash, V, S: BuildHasher> Collect for HashMap<K, V, S> {
    type Item = (K, V);

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, (k, v): (K, V)) {
        self.insert(k, v);
    }
}
impl<K: Ord, V> Collect for BTreeMap<K, V> {
    type Item = (K, V);

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, (k, v): (K, V)) {
        self.insert(k, v);
    }
}
impl<K: Encoder + Eq + Hash, V: Encoder, S: BuildHasher> Encoder for HashMap<K, V, S> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_map(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
/// Decodes a map; nil decodes as an empty map.
impl<K, V, S> Decoder for HashMap<K, V, S>
where
    K: Decoder + Eq + Hash,
    V: Decoder,
    S: BuildHasher + Default,
{
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut map = HashMap::with_hasher(S::default());
        merge_map(reader, &mut map)?;
        Ok(map)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_map(reader, self)
    }
}
impl<K: Encoder + Ord, V: Encoder> Encoder for BTreeMap<K, V> {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        encode_map(writer, self.len(), self)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}
impl<K: Decoder + Ord, V: Decoder> Decoder for BTreeMap<K, V> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut map = BTreeMap::new();
        merge_map(reader, &mut map)?;
        Ok(map)
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        merge_map(reader, self)
    }
}

// --- Tuple ---
/// Implements encoding/decoding for tuples up to 12 elements.
///
/// Each tuple is encoded as an array of its elements.
macro_rules! impl_tuple {
    ($($T:ident : $idx:tt),+) => {
        impl<$($T: Encoder),+> Encoder for ($($T,)+) {
            fn encode(&self, writer: &mut Writer) -> Result<()> {
                write_count(writer, FIX_ARR, ARR, count_args!($($T),+));
                $(
                    self.$idx.encode(writer)?;
                )+
                Ok(())
            }

            fn is_default(&self) -> bool {
                $(self.$idx.is_default())&&+
            }
        }
        impl<$($T: Decoder),+> Decoder for ($($T,)+) {
            fn decode(reader: &mut Reader) -> Result<Self> {
                let count = read_array_header(reader)?;
                let expected = count_args!($($T),+);
                if count != expected {
                    return Err(CorkError::Length { expected, found: count });
                }
                reader.nested(|reader| Ok(($(
                    $T::decode(reader)?,
                )+)))
            }

            fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
                if reader.take_nil()? {
                    return Ok(());
                }
                let count = read_array_header(reader)?;
                let expected = count_args!($($T),+);
                if count != expected {
                    return Err(CorkError::Length { expected, found: count });
                }
                reader.nested(|reader| {
                    $(
                        self.$idx.decode_into(reader)?;
                    )+
                    Ok(())
                })
            }
        }
    };
}

macro_rules! count_args {
    () => { 0 };
    ($head:ident $(, $tail:ident)*) => { 1 + count_args!($($tail),*) };
}

impl_tuple!(T0: 0);
impl_tuple!(T0: 0, T1: 1);
impl_tuple!(T0: 0, T1: 1, T2: 2);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7, T8: 8);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7, T8: 8, T9: 9);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7, T8: 8, T9: 9, T10: 10);
impl_tuple!(T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7, T8: 8, T9: 9, T10: 10, T11: 11);
