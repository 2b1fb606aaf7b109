//! Protocol Module
//!
//! Defines the RPC wire protocol between clients and servers.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! ### Request Payload
//! - method key string `"<Service>.<Method>"`
//! - one polymorphic object (type tag + body)
//!
//! ### Response Payload
//! - 0x00: OK    - followed by one polymorphic object
//! - 0x01: ERROR - followed by i32 error code + message string
//!
//! One request is in flight per connection; responses come back in request
//! order.

mod envelope;
mod frame;

pub use envelope::{
    decode_method_key, decode_response, encode_error, encode_request, encode_response,
    split_method_key, ErrorCode, RpcError, RpcResponse, Status,
};
pub use frame::{
    decode_frame, encode_frame, read_frame, write_frame, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
