//! Message encoding
//!
//! The presence-mask algorithm shared by every generated message type.
//!
//! ## Layout
//! ```text
//! ┌────────────┬─────┬────────────┬──────────────────────────────────┐
//! │ Mask 0 (4) │ ... │ Mask k (4) │ values of present fields, in     │
//! │ fields 0-31│     │            │ declaration order                │
//! └────────────┴─────┴────────────┴──────────────────────────────────┘
//! ```
//! `k = ceil(field_count / 32) - 1`. A field whose bit is clear costs
//! nothing beyond its bit; the reader leaves it at its default.

use super::mask::{words_for, PresenceMask};
use super::pool::PooledMask;
use super::reader::WireReader;
use super::value::WireValue;
use super::writer::WireWriter;
use super::NULL_TAG;
use crate::error::{PdlError, Result};

/// A message type with a presence-mask encoding.
///
/// Generated code implements the three field hooks; framing, mask words and
/// pooling are provided.
pub trait WireMessage: Default + Send + Sync + 'static {
    /// Qualified schema name (`namespace.Message`)
    const TYPE_NAME: &'static str;

    /// Stable tag written in polymorphic object slots
    const TYPE_TAG: i32;

    /// Declared field count; fixes the number of mask words
    const FIELD_COUNT: usize;

    /// Set the bit of every field that differs from its zero value
    fn mark_present(&self, mask: &mut PresenceMask);

    /// Write the value of every field whose bit is set, in order
    fn write_present(&self, mask: &PresenceMask, w: &mut WireWriter) -> Result<()>;

    /// Read the value of every field whose bit is set, in order
    fn read_present(&mut self, mask: &PresenceMask, r: &mut WireReader<'_>) -> Result<()>;

    /// Mask words followed by present field values
    fn write_message(&self, w: &mut WireWriter) -> Result<()> {
        let mut mask = PooledMask::acquire(w.pool(), words_for(Self::FIELD_COUNT));
        self.mark_present(&mut mask);
        for &word in mask.words() {
            w.write_u32(word);
        }
        self.write_present(&mask, w)
    }

    fn read_message(r: &mut WireReader<'_>) -> Result<Self> {
        let mut mask = PooledMask::acquire(r.pool(), words_for(Self::FIELD_COUNT));
        for word in mask.words_mut() {
            *word = r.read_u32()?;
        }
        let mut value = Self::default();
        value.read_present(&mask, r)?;
        Ok(value)
    }
}

/// Encode one message into a fresh buffer
pub fn encode_to_vec<T: WireMessage>(message: &T) -> Result<Vec<u8>> {
    let mut w = WireWriter::new();
    message.write_message(&mut w)?;
    Ok(w.into_vec())
}

/// Decode one message; trailing bytes are an error
pub fn decode_from_slice<T: WireMessage>(bytes: &[u8]) -> Result<T> {
    let mut r = WireReader::new(bytes);
    let value = T::read_message(&mut r)?;
    if !r.is_empty() {
        return Err(PdlError::Decode(format!(
            "{} trailing bytes after {}",
            r.remaining(),
            T::TYPE_NAME
        )));
    }
    Ok(value)
}

// =============================================================================
// Field Helpers (used by generated code)
// =============================================================================

/// `count` followed by each element
pub fn write_repeated<V: WireValue>(values: &[V], w: &mut WireWriter) -> Result<()> {
    w.write_len(values.len())?;
    for value in values {
        value.write_to(w)?;
    }
    Ok(())
}

pub fn read_repeated<V: WireValue>(r: &mut WireReader<'_>) -> Result<Vec<V>> {
    let count = r.read_len()?;
    let mut values = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        values.push(V::read_from(r)?);
    }
    Ok(values)
}

/// Struct-typed field: `tag` + body, or the null tag
pub fn write_nested<T: WireMessage>(value: Option<&T>, w: &mut WireWriter) -> Result<()> {
    match value {
        Some(value) => {
            w.write_i32(T::TYPE_TAG);
            value.write_message(w)
        }
        None => {
            w.write_i32(NULL_TAG);
            Ok(())
        }
    }
}

/// Read a struct-typed field whose static type is known
pub fn read_nested<T: WireMessage>(r: &mut WireReader<'_>) -> Result<Option<T>> {
    let tag = r.read_i32()?;
    if tag == NULL_TAG {
        return Ok(None);
    }
    if tag != T::TYPE_TAG {
        return Err(PdlError::TypeMismatch {
            expected: format!("{} (tag {})", T::TYPE_NAME, T::TYPE_TAG),
            actual: format!("tag {}", tag),
        });
    }
    T::read_message(r).map(Some)
}

pub fn write_repeated_nested<T: WireMessage>(values: &[T], w: &mut WireWriter) -> Result<()> {
    w.write_len(values.len())?;
    for value in values {
        write_nested(Some(value), w)?;
    }
    Ok(())
}

/// Null elements written by other runtimes decode as defaults
pub fn read_repeated_nested<T: WireMessage>(r: &mut WireReader<'_>) -> Result<Vec<T>> {
    let count = r.read_len()?;
    let mut values = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        values.push(read_nested::<T>(r)?.unwrap_or_default());
    }
    Ok(values)
}
