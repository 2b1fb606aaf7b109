//! Type handler registry
//!
//! Maps runtime types and wire tags to encoder/decoder pairs so values can be
//! written into slots whose static type is unknown (RPC payloads).
//!
//! ## Lifecycle
//! Build one registry at startup, register every message type, then wrap it
//! in `Arc` and hand it to clients and servers. After that it is read-only.
//!
//! ## Tags
//! - `-1`: null object
//! - `0..=15`: reserved for primitives (1..=9 in use)
//! - everything else: CRC-32 of the qualified message name, computed by the
//!   parser and baked into generated code

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::message::WireMessage;
use super::reader::WireReader;
use super::value::{Timestamp, Vector3, WireValue};
use super::writer::WireWriter;
use super::NULL_TAG;
use crate::error::{PdlError, Result};

/// A decoded value of any registered type
pub type AnyObject = Box<dyn Any + Send>;

/// Highest tag reserved for built-in handlers
pub const RESERVED_TAG_MAX: i32 = 15;

/// Built-in handler tags
pub mod tags {
    pub const INT32: i32 = 1;
    pub const INT64: i32 = 2;
    pub const FLOAT: i32 = 3;
    pub const DOUBLE: i32 = 4;
    pub const BOOL: i32 = 5;
    pub const STRING: i32 = 6;
    pub const BYTES: i32 = 7;
    pub const VECTOR3: i32 = 8;
    pub const DATETIME: i32 = 9;
}

/// Stable wire tag for a qualified type name
pub fn type_tag_for(qualified_name: &str) -> i32 {
    crc32fast::hash(qualified_name.as_bytes()) as i32
}

/// Encoder/decoder pair for one type
pub trait TypeHandler: Send + Sync {
    fn type_tag(&self) -> i32;

    fn type_name(&self) -> &'static str;

    /// Rust type handled; used for the by-type lookup
    fn value_type(&self) -> TypeId;

    fn write(&self, value: &(dyn Any + Send), w: &mut WireWriter) -> Result<()>;

    fn read(&self, r: &mut WireReader<'_>) -> Result<AnyObject>;
}

fn mismatch(expected: &'static str) -> PdlError {
    PdlError::TypeMismatch {
        expected: expected.to_string(),
        actual: "value of another type".to_string(),
    }
}

// =============================================================================
// Built-in Handlers
// =============================================================================

/// Handler for any scalar implementing `WireValue`
struct ValueHandler<V> {
    tag: i32,
    name: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> ValueHandler<V> {
    fn new(tag: i32, name: &'static str) -> Self {
        Self {
            tag,
            name,
            _value: PhantomData,
        }
    }
}

impl<V: WireValue + Send + 'static> TypeHandler for ValueHandler<V> {
    fn type_tag(&self) -> i32 {
        self.tag
    }

    fn type_name(&self) -> &'static str {
        self.name
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn write(&self, value: &(dyn Any + Send), w: &mut WireWriter) -> Result<()> {
        value
            .downcast_ref::<V>()
            .ok_or_else(|| mismatch(self.name))?
            .write_to(w)
    }

    fn read(&self, r: &mut WireReader<'_>) -> Result<AnyObject> {
        Ok(Box::new(V::read_from(r)?))
    }
}

/// `Vec<u8>` as length-prefixed bytes; null decodes as empty
struct BytesHandler;

impl TypeHandler for BytesHandler {
    fn type_tag(&self) -> i32 {
        tags::BYTES
    }

    fn type_name(&self) -> &'static str {
        "bytes"
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<Vec<u8>>()
    }

    fn write(&self, value: &(dyn Any + Send), w: &mut WireWriter) -> Result<()> {
        let bytes = value
            .downcast_ref::<Vec<u8>>()
            .ok_or_else(|| mismatch("bytes"))?;
        w.write_bytes(Some(bytes))
    }

    fn read(&self, r: &mut WireReader<'_>) -> Result<AnyObject> {
        Ok(Box::new(r.read_bytes()?.unwrap_or_default()))
    }
}

/// Handler for a generated message type
pub struct MessageHandler<T> {
    _message: PhantomData<fn() -> T>,
}

impl<T> Default for MessageHandler<T> {
    fn default() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<T: WireMessage> TypeHandler for MessageHandler<T> {
    fn type_tag(&self) -> i32 {
        T::TYPE_TAG
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn write(&self, value: &(dyn Any + Send), w: &mut WireWriter) -> Result<()> {
        value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch(T::TYPE_NAME))?
            .write_message(w)
    }

    fn read(&self, r: &mut WireReader<'_>) -> Result<AnyObject> {
        Ok(Box::new(T::read_message(r)?))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Type handlers by Rust type and by wire tag
pub struct TypeRegistry {
    by_type: HashMap<TypeId, Arc<dyn TypeHandler>>,
    by_tag: HashMap<i32, Arc<dyn TypeHandler>>,
}

impl TypeRegistry {
    /// A registry holding the built-in primitive handlers
    pub fn new() -> Self {
        let mut registry = Self {
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
        };

        let builtins: [Arc<dyn TypeHandler>; 9] = [
            Arc::new(ValueHandler::<i32>::new(tags::INT32, "int32")),
            Arc::new(ValueHandler::<i64>::new(tags::INT64, "int64")),
            Arc::new(ValueHandler::<f32>::new(tags::FLOAT, "float")),
            Arc::new(ValueHandler::<f64>::new(tags::DOUBLE, "double")),
            Arc::new(ValueHandler::<bool>::new(tags::BOOL, "bool")),
            Arc::new(ValueHandler::<String>::new(tags::STRING, "string")),
            Arc::new(BytesHandler),
            Arc::new(ValueHandler::<Vector3>::new(tags::VECTOR3, "vector3")),
            Arc::new(ValueHandler::<Timestamp>::new(tags::DATETIME, "datetime")),
        ];
        for handler in builtins {
            registry.insert(handler);
        }
        registry
    }

    /// Register a generated message type.
    ///
    /// Registering the same type twice is a no-op; a tag already taken by a
    /// different type, or a reserved tag, is an error.
    pub fn register_message<T: WireMessage>(&mut self) -> Result<()> {
        self.register_handler(Arc::new(MessageHandler::<T>::default()))
    }

    /// Register a custom handler under a non-reserved tag
    pub fn register_handler(&mut self, handler: Arc<dyn TypeHandler>) -> Result<()> {
        let tag = handler.type_tag();
        if tag == NULL_TAG || (0..=RESERVED_TAG_MAX).contains(&tag) {
            return Err(PdlError::ReservedTypeTag(tag));
        }
        if let Some(existing) = self.by_tag.get(&tag) {
            if existing.value_type() == handler.value_type() {
                return Ok(());
            }
            return Err(PdlError::DuplicateTypeTag {
                tag,
                existing: existing.type_name(),
            });
        }
        if let Some(existing) = self.by_type.get(&handler.value_type()) {
            return Err(PdlError::Config(format!(
                "type {} already registered under tag {}",
                existing.type_name(),
                existing.type_tag()
            )));
        }

        tracing::trace!("Registered {} as tag {}", handler.type_name(), tag);
        self.insert(handler);
        Ok(())
    }

    fn insert(&mut self, handler: Arc<dyn TypeHandler>) {
        self.by_type.insert(handler.value_type(), Arc::clone(&handler));
        self.by_tag.insert(handler.type_tag(), handler);
    }

    pub fn handler_for_tag(&self, tag: i32) -> Option<&Arc<dyn TypeHandler>> {
        self.by_tag.get(&tag)
    }

    pub fn handler_for_type(&self, type_id: TypeId) -> Option<&Arc<dyn TypeHandler>> {
        self.by_type.get(&type_id)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered handlers, built-ins included
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    // =========================================================================
    // Polymorphic Slots
    // =========================================================================

    /// Write `tag` + body, or the null tag for `None`
    pub fn write_object(&self, value: Option<&(dyn Any + Send)>, w: &mut WireWriter) -> Result<()> {
        let Some(value) = value else {
            w.write_i32(NULL_TAG);
            return Ok(());
        };

        let handler = self
            .by_type
            .get(&value.type_id())
            .ok_or_else(|| PdlError::UnregisteredType(format!("{:?}", value.type_id())))?;
        w.write_i32(handler.type_tag());
        handler.write(value, w)
    }

    /// Typed convenience over `write_object`
    pub fn write_value<T: Any + Send>(&self, value: &T, w: &mut WireWriter) -> Result<()> {
        self.write_object(Some(value as &(dyn Any + Send)), w)
    }

    /// Read `tag` + body; the null tag yields `None`
    pub fn read_object(&self, r: &mut WireReader<'_>) -> Result<Option<AnyObject>> {
        let tag = r.read_i32()?;
        if tag == NULL_TAG {
            return Ok(None);
        }
        let handler = self
            .by_tag
            .get(&tag)
            .ok_or(PdlError::UnknownTypeTag(tag))?;
        handler.read(r).map(Some)
    }

    /// Read an object and downcast it to `T`
    pub fn read_value<T: Any>(&self, r: &mut WireReader<'_>) -> Result<Option<T>> {
        match self.read_object(r)? {
            Some(object) => downcast::<T>(object).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Take a decoded object as a concrete type
pub fn downcast<T: Any>(object: AnyObject) -> Result<T> {
    object
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| PdlError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: "object of another type".to_string(),
        })
}
