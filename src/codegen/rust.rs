//! Rust Target
//!
//! Emits a module tree that compiles against this crate's runtime:
//!
//! ```text
//! <out>/
//! ├── mod.rs
//! ├── types.rs                  message structs
//! ├── registry.rs               register_all()
//! ├── serialization/
//! │   ├── mod.rs
//! │   └── <message>.rs          impl WireMessage
//! ├── client/
//! │   ├── mod.rs
//! │   └── <service>.rs          typed client stub
//! └── server/
//!     ├── mod.rs
//!     ├── <service>_service.rs  handler trait
//!     └── <service>_dispatch.rs dispatch table builder
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{to_snake_case, CodeWriter, EmitContext, GeneratedFile, Target};
use crate::schema::{FieldType, ProtocolField, ProtocolMessage, ProtocolService};

const INDENT: &str = "    ";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

pub struct RustTarget;

/// How a field is carried on the wire
enum Shape<'a> {
    Value,
    Repeated,
    Nested(&'a str),
    RepeatedNested(&'a str),
}

fn shape(field: &ProtocolField) -> Shape<'_> {
    match (field.custom_type(), field.is_repeated()) {
        (Some(name), false) if field.field_type() == FieldType::Struct => Shape::Nested(name),
        (Some(name), true) if field.field_type() == FieldType::Struct => {
            Shape::RepeatedNested(name)
        }
        (_, false) => Shape::Value,
        (_, true) => Shape::Repeated,
    }
}

fn escape(ident: String) -> String {
    if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{}", ident)
    } else {
        ident
    }
}

fn module_name(name: &str) -> String {
    escape(to_snake_case(name))
}

fn file_for(dir: &str, name: &str) -> PathBuf {
    Path::new(dir).join(format!("{}.rs", to_snake_case(name)))
}

impl RustTarget {
    fn writer(cx: &EmitContext<'_>) -> CodeWriter {
        let mut w = CodeWriter::new(INDENT);
        w.lines(cx.banner("//"));
        w.blank();
        w
    }

    fn serialization_imports(message: &ProtocolMessage) -> Vec<&'static str> {
        let mut helpers = BTreeSet::new();
        for field in message.fields() {
            match shape(field) {
                Shape::Value => {}
                Shape::Repeated => {
                    helpers.insert("read_repeated");
                    helpers.insert("write_repeated");
                }
                Shape::Nested(_) => {
                    helpers.insert("read_nested");
                    helpers.insert("write_nested");
                }
                Shape::RepeatedNested(_) => {
                    helpers.insert("read_repeated_nested");
                    helpers.insert("write_repeated_nested");
                }
            }
        }
        helpers.into_iter().collect()
    }

    fn index_unit(dir: &str, modules: &[String], reexports: &[String]) -> GeneratedFile {
        let mut w = CodeWriter::new(INDENT);
        for module in modules {
            w.line(format!("mod {};", module));
        }
        if !reexports.is_empty() {
            w.blank();
            for path in reexports {
                w.line(format!("pub use {};", path));
            }
        }
        GeneratedFile::new(Path::new(dir).join("mod.rs"), w.finish())
    }
}

impl Target for RustTarget {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn scalar_type(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 => "i32",
            FieldType::Int64 => "i64",
            FieldType::Float => "f32",
            FieldType::Double => "f64",
            FieldType::Bool => "bool",
            FieldType::String => "String",
            FieldType::Vector3 => "pdlkit::wire::Vector3",
            FieldType::DateTime => "pdlkit::wire::Timestamp",
            FieldType::Struct | FieldType::List | FieldType::Map => "Vec<u8>",
        }
    }

    fn default_literal(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 | FieldType::Int64 => "0",
            FieldType::Float | FieldType::Double => "0.0",
            FieldType::Bool => "false",
            FieldType::String => "String::new()",
            FieldType::Vector3 => "pdlkit::wire::Vector3::ZERO",
            FieldType::DateTime => "pdlkit::wire::Timestamp::EPOCH",
            FieldType::Struct | FieldType::List | FieldType::Map => "Vec::new()",
        }
    }

    fn struct_ref(&self, name: &str) -> String {
        format!("Option<Box<{}>>", name)
    }

    fn struct_element(&self, name: &str) -> String {
        name.to_string()
    }

    fn null_literal(&self) -> &'static str {
        "None"
    }

    fn repeated_type(&self, element: &str) -> String {
        format!("Vec<{}>", element)
    }

    fn empty_repeated(&self, _element: &str) -> String {
        "Vec::new()".to_string()
    }

    fn translate_namespace(&self, schema_namespace: &str) -> String {
        schema_namespace
            .split('.')
            .filter(|s| !s.is_empty())
            .map(module_name)
            .collect::<Vec<_>>()
            .join("::")
    }

    fn field_name(&self, name: &str) -> String {
        escape(to_snake_case(name))
    }

    fn method_name(&self, name: &str) -> String {
        module_name(name)
    }

    fn reserved_type_names(&self) -> &'static [&'static str] {
        &["Box", "Option", "Self", "String", "Vec"]
    }

    fn messages_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut w = Self::writer(cx);

        for (i, message) in cx.definition.messages().iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            w.line(format!("/// `{}`", cx.qualified_name(message)));
            w.line("#[derive(Debug, Clone, Default, PartialEq)]");
            w.block(format!("pub struct {} {{", message.name()), "}", |w| {
                for field in message.fields() {
                    w.line(format!(
                        "pub {}: {},",
                        self.field_name(field.name()),
                        self.field_type(field)
                    ));
                }
            });
            w.blank();
            w.block(format!("impl {} {{", message.name()), "}", |w| {
                w.line("/// Every field at its zero value");
                w.block("pub fn new() -> Self {", "}", |w| {
                    if message.fields().is_empty() {
                        w.line("Self {}");
                        return;
                    }
                    w.block("Self {", "}", |w| {
                        for field in message.fields() {
                            w.line(format!(
                                "{}: {},",
                                self.field_name(field.name()),
                                self.field_default(field)
                            ));
                        }
                    });
                });
            });
        }

        GeneratedFile::new("types.rs", w.finish())
    }

    fn serializer_unit(&self, cx: &EmitContext<'_>, message: &ProtocolMessage) -> GeneratedFile {
        let mut w = Self::writer(cx);
        let helpers = Self::serialization_imports(message);
        let has_values = message
            .fields()
            .iter()
            .any(|f| matches!(shape(f), Shape::Value));

        if !helpers.is_empty() {
            w.line(format!("use pdlkit::wire::message::{{{}}};", helpers.join(", ")));
        }
        if has_values {
            w.line("use pdlkit::wire::WireValue as _;");
        }
        if !helpers.is_empty() || has_values {
            w.blank();
        }
        w.line("use super::super::types::*;");
        w.blank();

        let (mask, out, input) = if message.fields().is_empty() {
            ("_mask", "_w", "_r")
        } else {
            ("mask", "w", "r")
        };

        w.block(format!("impl pdlkit::wire::WireMessage for {} {{", message.name()), "}", |w| {
            w.line(format!(
                "const TYPE_NAME: &'static str = \"{}\";",
                cx.qualified_name(message)
            ));
            w.line(format!("const TYPE_TAG: i32 = {};", message.type_tag()));
            w.line(format!("const FIELD_COUNT: usize = {};", message.fields().len()));
            w.blank();

            w.block(
                format!("fn mark_present(&self, {}: &mut pdlkit::wire::PresenceMask) {{", mask),
                "}",
                |w| {
                    for (bit, field) in message.fields().iter().enumerate() {
                        let name = self.field_name(field.name());
                        let present = match shape(field) {
                            Shape::Value => format!("!self.{}.is_default()", name),
                            Shape::Nested(_) => format!("self.{}.is_some()", name),
                            Shape::Repeated | Shape::RepeatedNested(_) => {
                                format!("!self.{}.is_empty()", name)
                            }
                        };
                        w.line(format!("mask.set_if({}, {});", bit, present));
                    }
                },
            );
            w.blank();

            w.block(
                format!(
                    "fn write_present(&self, {}: &pdlkit::wire::PresenceMask, {}: &mut pdlkit::wire::WireWriter) -> pdlkit::Result<()> {{",
                    mask, out
                ),
                "}",
                |w| {
                    for (bit, field) in message.fields().iter().enumerate() {
                        let name = self.field_name(field.name());
                        let stmt = match shape(field) {
                            Shape::Value => format!("self.{}.write_to(w)?;", name),
                            Shape::Repeated => format!("write_repeated(&self.{}, w)?;", name),
                            Shape::Nested(_) => format!("write_nested(self.{}.as_deref(), w)?;", name),
                            Shape::RepeatedNested(_) => {
                                format!("write_repeated_nested(&self.{}, w)?;", name)
                            }
                        };
                        w.block(format!("if mask.is_set({}) {{", bit), "}", |w| {
                            w.line(stmt);
                        });
                    }
                    w.line("Ok(())");
                },
            );
            w.blank();

            w.block(
                format!(
                    "fn read_present(&mut self, {}: &pdlkit::wire::PresenceMask, {}: &mut pdlkit::wire::WireReader<'_>) -> pdlkit::Result<()> {{",
                    mask, input
                ),
                "}",
                |w| {
                    for (bit, field) in message.fields().iter().enumerate() {
                        let name = self.field_name(field.name());
                        let stmt = match shape(field) {
                            Shape::Value => format!("self.{} = pdlkit::wire::WireValue::read_from(r)?;", name),
                            Shape::Repeated => format!("self.{} = read_repeated(r)?;", name),
                            Shape::Nested(ty) => {
                                format!("self.{} = read_nested::<{}>(r)?.map(Box::new);", name, ty)
                            }
                            Shape::RepeatedNested(ty) => {
                                format!("self.{} = read_repeated_nested::<{}>(r)?;", name, ty)
                            }
                        };
                        w.block(format!("if mask.is_set({}) {{", bit), "}", |w| {
                            w.line(stmt);
                        });
                    }
                    w.line("Ok(())");
                },
            );
        });

        GeneratedFile::new(file_for("serialization", message.name()), w.finish())
    }

    fn registry_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut w = Self::writer(cx);
        if !cx.definition.messages().is_empty() {
            w.line("use super::types::*;");
            w.blank();
        }
        let param = if cx.definition.messages().is_empty() {
            "_registry"
        } else {
            "registry"
        };
        w.line("/// Register every message type of this schema");
        w.block(
            format!(
                "pub fn register_all({}: &mut pdlkit::wire::TypeRegistry) -> pdlkit::Result<()> {{",
                param
            ),
            "}",
            |w| {
                for message in cx.definition.messages() {
                    w.line(format!("registry.register_message::<{}>()?;", message.name()));
                }
                w.line("Ok(())");
            },
        );
        GeneratedFile::new("registry.rs", w.finish())
    }

    fn client_unit(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> GeneratedFile {
        let mut w = Self::writer(cx);
        if !service.methods().is_empty() {
            w.line("use super::super::types::*;");
            w.blank();
        }

        let client = format!("{}Client", service.name());
        w.line(format!("/// Typed client for the `{}` service", service.name()));
        w.block(format!("pub struct {} {{", client), "}", |w| {
            w.line("inner: pdlkit::network::RpcClient,");
        });
        w.blank();
        w.block(format!("impl {} {{", client), "}", |w| {
            w.line(format!(
                "pub const SERVICE_NAME: &'static str = \"{}\";",
                service.name()
            ));
            w.blank();
            w.block("pub fn new(inner: pdlkit::network::RpcClient) -> Self {", "}", |w| {
                w.line("Self { inner }");
            });
            w.blank();
            w.block("pub fn into_inner(self) -> pdlkit::network::RpcClient {", "}", |w| {
                w.line("self.inner");
            });
            for method in service.methods() {
                w.blank();
                w.line(format!("/// `{}`", service.method_key(method)));
                w.block(
                    format!(
                        "pub fn {}(&mut self, request: &{}) -> pdlkit::Result<{}> {{",
                        self.method_name(method.name()),
                        method.request_type(),
                        method.response_type()
                    ),
                    "}",
                    |w| {
                        w.line(format!(
                            "self.inner.call(\"{}\", request)",
                            service.method_key(method)
                        ));
                    },
                );
            }
        });

        GeneratedFile::new(file_for("client", service.name()), w.finish())
    }

    fn server_units(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> Vec<GeneratedFile> {
        let trait_name = format!("{}Service", service.name());
        let snake = to_snake_case(service.name());

        // Handler trait
        let mut w = Self::writer(cx);
        if !service.methods().is_empty() {
            w.line("use super::super::types::*;");
            w.blank();
        }
        w.line(format!("/// Handlers for the `{}` service", service.name()));
        w.block(
            format!("pub trait {}: Send + Sync + 'static {{", trait_name),
            "}",
            |w| {
                for (i, method) in service.methods().iter().enumerate() {
                    if i > 0 {
                        w.blank();
                    }
                    w.line(format!("/// `{}`", service.method_key(method)));
                    w.line(format!(
                        "fn {}(&self, request: {}) -> std::result::Result<{}, pdlkit::protocol::RpcError>;",
                        self.method_name(method.name()),
                        method.request_type(),
                        method.response_type()
                    ));
                }
            },
        );
        let service_file = GeneratedFile::new(
            Path::new("server").join(format!("{}_service.rs", snake)),
            w.finish(),
        );

        // Dispatch builder
        let mut w = Self::writer(cx);
        if !service.methods().is_empty() {
            w.line("use super::super::types::*;");
            w.blank();
        }
        let param = if service.methods().is_empty() {
            "_service"
        } else {
            "service"
        };
        w.line(format!(
            "/// Route `{}.*` requests to `service`",
            service.name()
        ));
        w.block(
            format!(
                "pub fn {}_dispatch<S: super::{}_service::{}>({}: std::sync::Arc<S>) -> pdlkit::network::ServiceDispatch {{",
                snake, snake, trait_name, param
            ),
            "}",
            |w| {
                w.line(format!("pdlkit::network::ServiceDispatch::new(\"{}\")", service.name()));
                w.indent();
                for method in service.methods() {
                    w.block(format!(".method(\"{}\", {{", method.name()), "})", |w| {
                        w.line("let service = std::sync::Arc::clone(&service);");
                        w.line(format!(
                            "move |request: {}| service.{}(request)",
                            method.request_type(),
                            self.method_name(method.name())
                        ));
                    });
                }
                w.dedent();
            },
        );
        let dispatch_file = GeneratedFile::new(
            Path::new("server").join(format!("{}_dispatch.rs", snake)),
            w.finish(),
        );

        vec![service_file, dispatch_file]
    }

    fn support_units(&self, cx: &EmitContext<'_>, files: &[GeneratedFile]) -> Vec<GeneratedFile> {
        let in_dir = |dir: &str| -> Vec<String> {
            let stems: BTreeSet<String> = files
                .iter()
                .filter(|f| f.path.parent() == Some(Path::new(dir)))
                .filter_map(|f| f.path.file_stem().and_then(|s| s.to_str()))
                .map(|s| escape(s.to_string()))
                .collect();
            stems.into_iter().collect()
        };
        let has = |path: &str| files.iter().any(|f| f.path == Path::new(path));

        let mut units = Vec::new();
        let mut root = Self::writer(cx);
        if cx.namespace.is_empty() {
            root.line("//! Generated protocol");
        } else {
            root.line(format!("//! Generated protocol `{}`", cx.namespace));
        }
        root.blank();
        root.line("pub mod types;");

        let serialization = in_dir("serialization");
        if !serialization.is_empty() {
            root.line("pub mod serialization;");
            units.push(Self::index_unit("serialization", &serialization, &[]));
        }
        if has("registry.rs") {
            root.line("pub mod registry;");
        }

        let clients = in_dir("client");
        if !clients.is_empty() {
            root.line("pub mod client;");
            let reexports: Vec<String> = cx
                .definition
                .services()
                .iter()
                .map(|s| format!("{}::{}Client", module_name(s.name()), s.name()))
                .collect();
            units.push(Self::index_unit("client", &clients, &reexports));
        }

        let servers = in_dir("server");
        if !servers.is_empty() {
            root.line("pub mod server;");
            let reexports: Vec<String> = cx
                .definition
                .services()
                .iter()
                .flat_map(|s| {
                    let snake = to_snake_case(s.name());
                    [
                        format!("{}_dispatch::{}_dispatch", snake, snake),
                        format!("{}_service::{}Service", snake, s.name()),
                    ]
                })
                .collect();
            units.push(Self::index_unit("server", &servers, &reexports));
        }

        root.blank();
        root.line("pub use types::*;");
        if has("registry.rs") {
            root.line("pub use registry::register_all;");
        }
        units.push(GeneratedFile::new("mod.rs", root.finish()));
        units
    }
}
