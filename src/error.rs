//! Error types for pdlkit
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::ErrorCode;

/// Result type alias using PdlError
pub type Result<T> = std::result::Result<T, PdlError>;

/// Unified error type for pdlkit operations
#[derive(Debug, Error)]
pub enum PdlError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Type tag {tag} already registered for {existing}")]
    DuplicateTypeTag { tag: i32, existing: &'static str },

    #[error("Type tag {0} is reserved")]
    ReservedTypeTag(i32),

    #[error("No handler registered for type tag {0}")]
    UnknownTypeTag(i32),

    #[error("No handler registered for type {0}")]
    UnregisteredType(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    // -------------------------------------------------------------------------
    // Generation Errors
    // -------------------------------------------------------------------------
    #[error("Generation error: {0}")]
    Generation(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote error ({code:?}): {message}")]
    Remote { code: ErrorCode, message: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
