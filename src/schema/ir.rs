//! Intermediate representation
//!
//! The parsed protocol model shared by the validator, the snapshot codec and
//! every code generator. Values are built by the parser and are read-only
//! afterwards: fields are crate-private and exposed through accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field value types understood by the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    String,
    Struct,
    Vector3,
    DateTime,
    /// Reserved, never produced by the parser
    List,
    /// Reserved, never produced by the parser
    Map,
}

impl FieldType {
    /// Look up a primitive type name (case-insensitive).
    ///
    /// Returns `None` for names that must be treated as message references.
    pub fn from_primitive_name(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "int32" | "int" => FieldType::Int32,
            "int64" | "long" => FieldType::Int64,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            "bool" => FieldType::Bool,
            "string" => FieldType::String,
            "vector3" => FieldType::Vector3,
            "datetime" | "timestamp" => FieldType::DateTime,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical PDL spelling
    pub fn pdl_name(self) -> &'static str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Struct => "struct",
            FieldType::Vector3 => "vector3",
            FieldType::DateTime => "datetime",
            FieldType::List => "list",
            FieldType::Map => "map",
        }
    }
}

/// A single message field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolField {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) id: i32,
    pub(crate) repeated: bool,
    pub(crate) custom_type: Option<String>,
    pub(crate) line: usize,
}

impl ProtocolField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Declared id (`= <id>` in the schema). Not the presence-bit index.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Referenced message name; set only for `FieldType::Struct`
    pub fn custom_type(&self) -> Option<&str> {
        self.custom_type.as_deref()
    }

    /// Source line the field was declared on (1-based)
    pub fn line(&self) -> usize {
        self.line
    }
}

/// A message: name plus fields in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub(crate) name: String,
    pub(crate) fields: Vec<ProtocolField>,
    pub(crate) type_tag: i32,
    pub(crate) line: usize,
}

impl ProtocolMessage {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order; the index is the presence-bit index
    pub fn fields(&self) -> &[ProtocolField] {
        &self.fields
    }

    /// Stable wire tag used in polymorphic object slots
    pub fn type_tag(&self) -> i32 {
        self.type_tag
    }

    /// Number of 32-bit presence words this message writes
    pub fn mask_words(&self) -> usize {
        crate::wire::mask::words_for(self.fields.len())
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

/// An RPC method; request/response are message names resolved lazily
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMethod {
    pub(crate) name: String,
    pub(crate) request_type: String,
    pub(crate) response_type: String,
    pub(crate) line: usize,
}

impl ProtocolMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    pub fn response_type(&self) -> &str {
        &self.response_type
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

/// A service: name plus methods in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolService {
    pub(crate) name: String,
    pub(crate) methods: Vec<ProtocolMethod>,
    pub(crate) line: usize,
}

impl ProtocolService {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[ProtocolMethod] {
        &self.methods
    }

    /// Wire key for a method of this service: `"<Service>.<Method>"`
    pub fn method_key(&self, method: &ProtocolMethod) -> String {
        format!("{}.{}", self.name, method.name)
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

/// A complete parsed protocol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    pub(crate) namespace: String,
    pub(crate) messages: Vec<ProtocolMessage>,
    pub(crate) services: Vec<ProtocolService>,
    pub(crate) options: BTreeMap<String, String>,
}

impl ProtocolDefinition {
    /// Dotted namespace exactly as written in the schema
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn messages(&self) -> &[ProtocolMessage] {
        &self.messages
    }

    pub fn services(&self) -> &[ProtocolService] {
        &self.services
    }

    /// Options map; ordered so generators iterate deterministically
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Find a message by name
    pub fn message(&self, name: &str) -> Option<&ProtocolMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Find a service by name
    pub fn service(&self, name: &str) -> Option<&ProtocolService> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Name used to derive type tags: `namespace.Name`, or `Name` without one
    pub fn qualified_name(&self, message: &str) -> String {
        if self.namespace.is_empty() {
            message.to_string()
        } else {
            format!("{}.{}", self.namespace, message)
        }
    }

    /// Assign every message its type tag. Called once when parsing completes.
    pub(crate) fn assign_type_tags(&mut self) {
        for i in 0..self.messages.len() {
            let qualified = self.qualified_name(&self.messages[i].name);
            self.messages[i].type_tag = crate::wire::registry::type_tag_for(&qualified);
        }
    }
}
