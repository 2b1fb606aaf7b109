//! Wire writer
//!
//! Appends little-endian primitive encodings to a growable buffer.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use super::pool::MaskPool;
use super::NULL_LENGTH;
use crate::error::{PdlError, Result};

/// Binary output stream for the wire format
#[derive(Default)]
pub struct WireWriter {
    buf: BytesMut,
    pool: Option<Arc<MaskPool>>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            pool: None,
        }
    }

    /// A writer that borrows presence masks from `pool`
    pub fn with_pool(pool: Arc<MaskPool>) -> Self {
        Self {
            buf: BytesMut::new(),
            pool: Some(pool),
        }
    }

    /// Pool handle for mask acquisition
    pub fn pool(&self) -> Option<Arc<MaskPool>> {
        self.pool.clone()
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    /// Element count or byte length as `i32`
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| PdlError::Encode(format!("length {} exceeds i32::MAX", len)))?;
        self.write_i32(len);
        Ok(())
    }

    /// Length-prefixed UTF-8; `None` writes the `-1` null sentinel
    pub fn write_str(&mut self, value: Option<&str>) -> Result<()> {
        self.write_bytes(value.map(str::as_bytes))
    }

    /// Length-prefixed raw bytes; `None` writes the `-1` null sentinel
    pub fn write_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(bytes) => {
                self.write_len(bytes.len())?;
                self.buf.put_slice(bytes);
            }
            None => self.write_i32(NULL_LENGTH),
        }
        Ok(())
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Discard written bytes, keeping capacity and pool
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
