//! Decoding straight from an `io::Read`.
//!
//! A value is decoded against the bytes read so far. When it runs out, the
//! missing byte count from the `UnexpectedEof` error says how much more to
//! read before trying again. Blocking is left to the source.

use crate::core::skip_value;
use crate::registry::Registry;
use crate::{CorkError, Decoder, Handle, Reader, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read};
use std::sync::Arc;

/// Size of a single read from the source.
const READ_CHUNK: usize = 8 * 1024;

/// Decodes consecutive values from a byte source.
///
/// Bytes read past the end of one value are kept for the next call.
///
/// ```rust
/// use cork::{encode_to, Handle, StreamDecoder};
///
/// let mut out = Vec::new();
/// encode_to(&1u8, &Handle::default(), &mut out).unwrap();
/// encode_to("two", &Handle::default(), &mut out).unwrap();
///
/// let mut stream = StreamDecoder::new(out.as_slice());
/// assert_eq!(stream.decode::<u8>().unwrap(), 1);
/// assert_eq!(stream.decode::<String>().unwrap(), "two");
/// ```
#[derive(Debug)]
pub struct StreamDecoder<R> {
    input: R,
    buf: Bytes,
    handle: Handle,
    registry: Arc<Registry>,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(input: R) -> Self {
        Self::with_handle(input, Handle::default())
    }

    pub fn with_handle(input: R, handle: Handle) -> Self {
        Self {
            input,
            buf: Bytes::new(),
            handle,
            registry: Registry::global(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Decodes the next value.
    ///
    /// A source that ends cleanly between values yields `UnexpectedEof`
    /// with nothing remaining.
    pub fn decode<T: Decoder>(&mut self) -> Result<T> {
        self.attempt(T::decode)
    }

    /// Merges the next value into `dest`.
    ///
    /// The whole value is buffered first, so a short source never leaves
    /// `dest` half merged.
    pub fn decode_into<T: Decoder>(&mut self, dest: &mut T) -> Result<()> {
        self.attempt(|reader| skip_value(&mut reader.clone()))?;
        self.attempt(|reader| dest.decode_into(reader))
    }

    /// Bytes read from the source but not decoded yet.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// The source and the bytes already read from it.
    pub fn into_parts(self) -> (R, Bytes) {
        (self.input, self.buf)
    }

    fn attempt<T>(&mut self, mut f: impl FnMut(&mut Reader) -> Result<T>) -> Result<T> {
        loop {
            let mut reader = Reader::with_handle(self.buf.clone(), self.handle.clone())
                .with_registry(self.registry.clone());
            match f(&mut reader) {
                Ok(value) => {
                    self.buf = reader.into_inner();
                    return Ok(value);
                }
                Err(CorkError::UnexpectedEof { needed, remaining }) => {
                    let missing = needed.saturating_sub(remaining).max(1);
                    let before = self.buf.len();
                    if !self.fill(missing)? {
                        return Err(CorkError::UnexpectedEof {
                            needed,
                            remaining: remaining + (self.buf.len() - before),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads until `missing` more bytes are buffered. Returns false if the
    /// source ended first.
    fn fill(&mut self, missing: usize) -> Result<bool> {
        let mut grown = BytesMut::with_capacity(self.buf.len() + missing.min(READ_CHUNK));
        grown.extend_from_slice(&self.buf);
        let mut chunk = [0u8; READ_CHUNK];
        let mut left = missing;
        let mut ended = false;
        while left > 0 {
            let n = match self.input.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf = grown.freeze();
                    return Err(e.into());
                }
            };
            if n == 0 {
                ended = true;
                break;
            }
            grown.extend_from_slice(&chunk[..n]);
            left = left.saturating_sub(n);
        }
        tracing::trace!(missing, buffered = grown.len(), ended, "refilled decode buffer");
        self.buf = grown.freeze();
        Ok(!ended)
    }
}

/// Decodes one value from `input`, reading no byte past its end.
///
/// Consecutive calls on the same source return consecutive values. Every
/// refill is sized to the bytes still missing, so for many small values a
/// [`StreamDecoder`] does fewer reads.
pub fn decode_from<T, R>(mut input: R, handle: &Handle) -> Result<T>
where
    T: Decoder,
    R: Read,
{
    let mut buf = Vec::new();
    loop {
        let mut reader = Reader::with_handle(Bytes::copy_from_slice(&buf), handle.clone());
        match T::decode(&mut reader) {
            Err(CorkError::UnexpectedEof { needed, remaining }) => {
                let missing = needed.saturating_sub(remaining).max(1);
                let got = input.by_ref().take(missing as u64).read_to_end(&mut buf)?;
                if got < missing {
                    return Err(CorkError::UnexpectedEof {
                        needed,
                        remaining: remaining + got,
                    });
                }
            }
            other => return other,
        }
    }
}
