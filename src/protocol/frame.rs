//! Frame codec
//!
//! Length-prefixed framing for requests and responses.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//! `Len` is a little-endian u32 counting payload bytes only.

use std::io::{Read, Write};

use crate::error::{PdlError, Result};

/// Length prefix size
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Prefix a payload with its length
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        PdlError::Protocol(format!("Payload too large: {} bytes", payload.len()))
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Split one complete frame off the front of `bytes`.
///
/// Returns the payload and the number of bytes consumed.
pub fn decode_frame(bytes: &[u8], max_payload: u32) -> Result<(&[u8], usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(PdlError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    check_len(payload_len, max_payload)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(PdlError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((&bytes[HEADER_SIZE..total_len], total_len))
}

fn check_len(payload_len: u32, max_payload: u32) -> Result<()> {
    if payload_len > max_payload {
        return Err(PdlError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, max_payload
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame payload from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R, max_payload: u32) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_le_bytes(header);
    check_len(payload_len, max_payload)?;

    let mut payload = vec![0u8; payload_len as usize];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }
    Ok(payload)
}

/// Write one frame to a stream and flush it
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        PdlError::Protocol(format!("Payload too large: {} bytes", payload.len()))
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}
