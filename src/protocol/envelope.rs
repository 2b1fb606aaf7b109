//! Request and response envelopes
//!
//! ## Request Payload
//! ```text
//! ┌────────────────────────────┬──────────────────────────────┐
//! │ string "<Service>.<Method>"│ object (tag + body, -1 null) │
//! └────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Response Payload
//! ```text
//! Ok:  ┌────────────┬──────────────────────────────┐
//!      │ Status (1) │ object (tag + body, -1 null) │
//!      └────────────┴──────────────────────────────┘
//! Err: ┌────────────┬──────────┬────────────────┐
//!      │ Status (1) │ Code (4) │ string message │
//!      └────────────┴──────────┴────────────────┘
//! ```

use std::any::Any;
use std::fmt;

use crate::error::{PdlError, Result};
use crate::wire::{AnyObject, TypeRegistry, WireReader, WireWriter};

/// Response status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Err = 0x01,
}

/// Error codes carried by an `Err` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// No service registered under the key's service name
    UnknownService = 1,
    /// The service has no such method
    UnknownMethod = 2,
    /// Request key or payload could not be decoded, or had the wrong type
    BadRequest = 3,
    /// The handler returned an error or panicked
    HandlerFailed = 4,
    /// The server could not encode the handler's result
    Internal = 5,
}

impl ErrorCode {
    /// Unknown codes from newer peers collapse to `Internal`
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ErrorCode::UnknownService,
            2 => ErrorCode::UnknownMethod,
            3 => ErrorCode::BadRequest,
            4 => ErrorCode::HandlerFailed,
            _ => ErrorCode::Internal,
        }
    }
}

/// Failure reported by the remote side (or produced by a handler)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Handler-level failure
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::HandlerFailed, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<RpcError> for PdlError {
    fn from(err: RpcError) -> Self {
        PdlError::Remote {
            code: err.code,
            message: err.message,
        }
    }
}

/// Decoded response envelope
pub enum RpcResponse {
    Ok(Option<AnyObject>),
    Err(RpcError),
}

impl RpcResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResponse::Ok(_))
    }

    /// The error, if this is an `Err` response
    pub fn error(&self) -> Option<&RpcError> {
        match self {
            RpcResponse::Err(err) => Some(err),
            RpcResponse::Ok(_) => None,
        }
    }
}

impl fmt::Debug for RpcResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcResponse::Ok(Some(_)) => write!(f, "Ok(<object>)"),
            RpcResponse::Ok(None) => write!(f, "Ok(null)"),
            RpcResponse::Err(err) => write!(f, "Err({})", err),
        }
    }
}

/// Split a method key on its first `.` into service and method
pub fn split_method_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('.')
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

pub fn encode_request(
    registry: &TypeRegistry,
    method_key: &str,
    payload: Option<&(dyn Any + Send)>,
    w: &mut WireWriter,
) -> Result<()> {
    w.write_str(Some(method_key))?;
    registry.write_object(payload, w)
}

/// Read the method key at the start of a request payload
pub fn decode_method_key(r: &mut WireReader<'_>) -> Result<String> {
    r.read_str()?
        .ok_or_else(|| PdlError::Protocol("request has a null method key".to_string()))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

pub fn encode_response(
    registry: &TypeRegistry,
    response: &RpcResponse,
    w: &mut WireWriter,
) -> Result<()> {
    match response {
        RpcResponse::Ok(object) => {
            w.write_u8(Status::Ok as u8);
            registry.write_object(object.as_deref(), w)
        }
        RpcResponse::Err(err) => encode_error(err, w),
    }
}

pub fn encode_error(err: &RpcError, w: &mut WireWriter) -> Result<()> {
    w.write_u8(Status::Err as u8);
    w.write_i32(err.code as i32);
    w.write_str(Some(&err.message))
}

pub fn decode_response(registry: &TypeRegistry, r: &mut WireReader<'_>) -> Result<RpcResponse> {
    match r.read_u8()? {
        0x00 => Ok(RpcResponse::Ok(registry.read_object(r)?)),
        0x01 => {
            let code = ErrorCode::from_code(r.read_i32()?);
            let message = r.read_str()?.unwrap_or_default();
            Ok(RpcResponse::Err(RpcError { code, message }))
        }
        other => Err(PdlError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            other
        ))),
    }
}
