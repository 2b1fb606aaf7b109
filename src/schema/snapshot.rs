//! Compiled schema snapshots
//!
//! A snapshot freezes one parsed definition so every target can be
//! regenerated from exactly the same IR.
//!
//! ## File Format
//! ```text
//! ┌──────────┬─────────────┬───────────┬──────────────────────┐
//! │Magic (4) │ Version (2) │ CRC32 (4) │ bincode(definition)  │
//! └──────────┴─────────────┴───────────┴──────────────────────┘
//! ```

use std::fs;
use std::path::Path;

use super::ir::ProtocolDefinition;
use crate::error::{PdlError, Result};

/// Magic bytes identifying a compiled schema
pub const MAGIC: &[u8; 4] = b"PDLC";

/// Current snapshot format version
pub const VERSION: u16 = 1;

/// Magic (4) + Version (2) + CRC (4)
pub const HEADER_SIZE: usize = 10;

/// Encode a definition into snapshot bytes
pub fn encode(definition: &ProtocolDefinition) -> Result<Vec<u8>> {
    let body = bincode::serialize(definition)
        .map_err(|e| PdlError::Snapshot(format!("failed to encode definition: {}", e)))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode snapshot bytes, verifying magic, version and checksum
pub fn decode(bytes: &[u8]) -> Result<ProtocolDefinition> {
    if bytes.len() < HEADER_SIZE {
        return Err(PdlError::Snapshot(format!(
            "snapshot too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(PdlError::Snapshot("bad magic".to_string()));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(PdlError::Snapshot(format!(
            "unsupported snapshot version {}",
            version
        )));
    }

    let expected = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let body = &bytes[HEADER_SIZE..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(PdlError::Snapshot(format!(
            "checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    bincode::deserialize(body)
        .map_err(|e| PdlError::Snapshot(format!("failed to decode definition: {}", e)))
}

/// Write a snapshot file
pub fn save(definition: &ProtocolDefinition, path: &Path) -> Result<()> {
    let bytes = encode(definition)?;
    fs::write(path, bytes)?;
    tracing::debug!("Wrote schema snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot file
pub fn load(path: &Path) -> Result<ProtocolDefinition> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}
