//! Wire reader
//!
//! Bounds-checked little-endian decoding from a byte slice. Every read
//! returns an error instead of panicking on truncated input.

use std::sync::Arc;

use bytes::Buf;

use super::pool::MaskPool;
use super::NULL_LENGTH;
use crate::error::{PdlError, Result};

/// Binary input stream for the wire format
pub struct WireReader<'a> {
    buf: &'a [u8],
    consumed: usize,
    pool: Option<Arc<MaskPool>>,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            consumed: 0,
            pool: None,
        }
    }

    /// A reader that borrows presence masks from `pool`
    pub fn with_pool(buf: &'a [u8], pool: Arc<MaskPool>) -> Self {
        Self {
            buf,
            consumed: 0,
            pool: Some(pool),
        }
    }

    pub fn pool(&self) -> Option<Arc<MaskPool>> {
        self.pool.clone()
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(PdlError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        self.consumed += 8;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.buf.get_f32_le())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        self.consumed += 8;
        Ok(self.buf.get_f64_le())
    }

    /// One byte; anything other than 0 or 1 is rejected
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(PdlError::Decode(format!("invalid bool byte 0x{:02x}", other))),
        }
    }

    /// Element count; negative counts are rejected
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| PdlError::Decode(format!("negative length {}", len)))
    }

    /// Length-prefixed bytes; `-1` decodes to `None`
    pub fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_i32()?;
        if len == NULL_LENGTH {
            return Ok(None);
        }
        let len = usize::try_from(len)
            .map_err(|_| PdlError::Decode(format!("invalid byte length {}", len)))?;
        self.ensure(len)?;

        let bytes = self.buf[..len].to_vec();
        self.buf.advance(len);
        self.consumed += len;
        Ok(Some(bytes))
    }

    /// Length-prefixed UTF-8; `-1` decodes to `None`
    pub fn read_str(&mut self) -> Result<Option<String>> {
        match self.read_bytes()? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| PdlError::Decode(format!("invalid UTF-8 string: {}", e))),
            None => Ok(None),
        }
    }
}
