//! Wire Module
//!
//! Compact binary encoding shared by generated serializers and the RPC
//! transport.
//!
//! ## Primitive Encodings
//! - int32 / int64: fixed-width little-endian
//! - float / double: IEEE-754 little-endian
//! - bool: one byte (0 or 1)
//! - string: i32 length + UTF-8 bytes, length -1 = null
//! - vector3: three floats
//! - datetime: int64 milliseconds since the Unix epoch
//! - repeated: i32 count + elements
//! - object slot: i32 type tag + body, tag -1 = null
//!
//! There is no checksum, version or magic number: reader and writer must be
//! generated from the same schema.

pub mod mask;
pub mod message;
pub mod pool;
pub mod reader;
pub mod registry;
pub mod value;
pub mod writer;

pub use mask::PresenceMask;
pub use message::{decode_from_slice, encode_to_vec, WireMessage};
pub use pool::{MaskPool, PoolStats, PooledMask};
pub use reader::WireReader;
pub use registry::{downcast, AnyObject, TypeHandler, TypeRegistry};
pub use value::{Timestamp, Vector3, WireValue};
pub use writer::WireWriter;

/// Length sentinel for a null string or byte run
pub const NULL_LENGTH: i32 = -1;

/// Type-tag sentinel for a null object
pub const NULL_TAG: i32 = -1;
