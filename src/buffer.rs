//! Byte sink and source used by every codec.
//!
//! [`Writer`] appends to a `BytesMut`, [`Reader`] consumes a `Bytes` without
//! copying. Both carry the [`Handle`] of the current call so nested values
//! see the same options.

use crate::handle::Handle;
use crate::registry::Registry;
use crate::{CorkError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::sync::Arc;

/// Append-only output buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
    handle: Handle,
}

impl Writer {
    pub fn new(handle: Handle) -> Self {
        Self {
            buf: BytesMut::new(),
            handle,
        }
    }

    pub fn with_capacity(capacity: usize, handle: Handle) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            handle,
        }
    }

    /// An empty writer sharing this writer's options.
    ///
    /// Used to pre-encode map keys for canonical ordering.
    pub fn scratch(&self) -> Writer {
        Writer::new(self.handle.clone())
    }

    #[inline]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    #[inline]
    pub fn write_one(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    #[inline]
    pub fn write_many(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    #[inline]
    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Zero-copy input buffer.
///
/// Holds the extension [`Registry`] used to resolve extension tags met
/// while decoding into a [`crate::Value`]. The process-wide registry is used
/// unless another one is injected with [`Reader::with_registry`].
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    handle: Handle,
    registry: Arc<Registry>,
    depth: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self::with_handle(buf, Handle::default())
    }

    pub fn with_handle(buf: Bytes, handle: Handle) -> Self {
        Self {
            buf,
            handle,
            registry: Registry::global(),
            depth: 0,
        }
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Fails with `UnexpectedEof` unless `n` more bytes are available.
    #[inline]
    pub fn ensure(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(CorkError::UnexpectedEof {
                needed: n,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn read_one(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    #[inline]
    pub fn peek_one(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf[0])
    }

    /// Splits the next `n` bytes off the buffer without copying.
    pub fn read_many(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        Ok(self.buf.split_to(n))
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.buf.advance(n);
        Ok(())
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    /// Runs `f` one container level deeper.
    ///
    /// Fails with `Malformed` instead of recursing past the handle's
    /// `max_depth`, so hostile nesting cannot exhaust the stack.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.handle.max_depth {
            return Err(CorkError::Malformed(format!(
                "nesting too deep: more than {} levels",
                self.handle.max_depth
            )));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// Consumes a nil tag if one is next. Returns whether it did.
    pub fn take_nil(&mut self) -> Result<bool> {
        if self.peek_one()? == crate::tags::NIL {
            self.buf.advance(1);
            return Ok(true);
        }
        Ok(false)
    }

    /// The unread part of the input.
    pub fn into_inner(self) -> Bytes {
        self.buf
    }
}
