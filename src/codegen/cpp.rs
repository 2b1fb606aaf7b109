//! C++ Target
//!
//! Header-only output plus a CMake file that ties it to the runtime
//! library:
//!
//! ```text
//! <out>/
//! ├── CMakeLists.txt
//! ├── messages.h
//! ├── serialization/
//! │   ├── <message>_serializer.h
//! │   └── serializer_registry.h
//! ├── client/<service>_client.h
//! └── server/
//!     ├── i_<service>_service.h
//!     └── <service>_service_base.h
//! ```

use std::path::{Path, PathBuf};

use super::{to_snake_case, CodeWriter, EmitContext, GeneratedFile, Target};
use crate::schema::{FieldType, ProtocolField, ProtocolMessage, ProtocolService};

const INDENT: &str = "    ";

/// CMake target every generated library links against
const CORE_LIBRARY: &str = "pdlkit::core";

pub struct CppTarget;

fn wire_method(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Int32 => "int32",
        FieldType::Int64 => "int64",
        FieldType::Float => "float",
        FieldType::Double => "double",
        FieldType::Bool => "bool",
        FieldType::String => "string",
        FieldType::Vector3 => "vector3",
        FieldType::DateTime => "timestamp",
        FieldType::Struct | FieldType::List | FieldType::Map => "object",
    }
}

fn path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl CppTarget {
    fn writer(cx: &EmitContext<'_>, includes: &[&str]) -> CodeWriter {
        let mut w = CodeWriter::new(INDENT);
        w.lines(cx.banner("//"));
        w.blank();
        w.line("#pragma once");
        w.blank();
        for include in includes {
            if include.is_empty() {
                w.blank();
            } else {
                w.line(format!("#include {}", include));
            }
        }
        w.blank();
        w
    }

    fn namespace(cx: &EmitContext<'_>, sub: Option<&str>) -> String {
        match sub {
            Some(sub) => format!("{}::{}", cx.namespace, sub),
            None => cx.namespace.clone(),
        }
    }

    /// Wrap `body` in a namespace block
    fn in_namespace(w: &mut CodeWriter, namespace: &str, body: impl FnOnce(&mut CodeWriter)) {
        w.line(format!("namespace {} {{", namespace));
        w.blank();
        body(w);
        w.blank();
        w.line(format!("}}  // namespace {}", namespace));
    }

    fn presence(&self, field: &ProtocolField, access: &str) -> String {
        if field.is_repeated() {
            return format!("!{}.empty()", access);
        }
        match field.field_type() {
            FieldType::Int32 | FieldType::Int64 | FieldType::Float | FieldType::Double => {
                format!("{} != 0", access)
            }
            FieldType::Bool => access.to_string(),
            FieldType::String => format!("!{}.empty()", access),
            FieldType::Vector3 => format!("!{}.is_zero()", access),
            FieldType::DateTime => format!("{}.millis != 0", access),
            FieldType::Struct | FieldType::List | FieldType::Map => format!("{} != nullptr", access),
        }
    }

    fn read_call(&self, field: &ProtocolField) -> String {
        match (field.field_type(), field.custom_type()) {
            (FieldType::Struct, Some(name)) => format!("reader.read_object<{}>()", name),
            (ty, _) => format!("reader.read_{}()", wire_method(ty)),
        }
    }

    fn serializer_path(message: &ProtocolMessage) -> PathBuf {
        Path::new("serialization").join(format!("{}_serializer.h", to_snake_case(message.name())))
    }
}

impl Target for CppTarget {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn scalar_type(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 => "std::int32_t",
            FieldType::Int64 => "std::int64_t",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "std::string",
            FieldType::Vector3 => "pdlkit::Vector3",
            FieldType::DateTime => "pdlkit::Timestamp",
            FieldType::Struct | FieldType::List | FieldType::Map => "pdlkit::Object",
        }
    }

    fn default_literal(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 => "0",
            FieldType::Int64 => "0LL",
            FieldType::Float => "0.0f",
            FieldType::Double => "0.0",
            FieldType::Bool => "false",
            FieldType::String => "\"\"",
            FieldType::Vector3 | FieldType::DateTime => "{}",
            FieldType::Struct | FieldType::List | FieldType::Map => "{}",
        }
    }

    fn struct_ref(&self, name: &str) -> String {
        format!("std::shared_ptr<{}>", name)
    }

    fn null_literal(&self) -> &'static str {
        "nullptr"
    }

    fn repeated_type(&self, element: &str) -> String {
        format!("std::vector<{}>", element)
    }

    fn empty_repeated(&self, _element: &str) -> String {
        "{}".to_string()
    }

    fn translate_namespace(&self, schema_namespace: &str) -> String {
        let parts: Vec<String> = schema_namespace
            .split('.')
            .filter(|s| !s.is_empty())
            .map(to_snake_case)
            .collect();
        if parts.is_empty() {
            "generated".to_string()
        } else {
            parts.join("::")
        }
    }

    fn field_name(&self, name: &str) -> String {
        to_snake_case(name)
    }

    fn method_name(&self, name: &str) -> String {
        to_snake_case(name)
    }

    fn messages_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut w = Self::writer(
            cx,
            &[
                "<cstdint>",
                "<memory>",
                "<string>",
                "<vector>",
                "",
                "\"pdlkit/object.h\"",
                "\"pdlkit/timestamp.h\"",
                "\"pdlkit/vector3.h\"",
            ],
        );

        Self::in_namespace(&mut w, &cx.namespace, |w| {
            let messages = cx.definition.messages();
            for message in messages {
                w.line(format!("struct {};", message.name()));
            }
            for message in messages {
                w.blank();
                w.line(format!("// {}", cx.qualified_name(message)));
                w.block(format!("struct {} {{", message.name()), "};", |w| {
                    for field in message.fields() {
                        w.line(format!(
                            "{} {} = {};",
                            self.field_type(field),
                            self.field_name(field.name()),
                            self.field_default(field)
                        ));
                    }
                    if !message.fields().is_empty() {
                        w.blank();
                    }
                    w.line(format!("{}() = default;", message.name()));
                });
            }
        });

        GeneratedFile::new("messages.h", w.finish())
    }

    fn serializer_unit(&self, cx: &EmitContext<'_>, message: &ProtocolMessage) -> GeneratedFile {
        let mut w = Self::writer(cx, &["<cstddef>", "<cstdint>", "", "\"pdlkit/wire.h\"", "\"../messages.h\""]);
        let serializer = format!("{}Serializer", message.name());

        Self::in_namespace(&mut w, &Self::namespace(cx, Some("serialization")), |w| {
            w.block(format!("struct {} {{", serializer), "};", |w| {
                w.line(format!(
                    "static constexpr const char* kTypeName = \"{}\";",
                    cx.qualified_name(message)
                ));
                w.line(format!(
                    "static constexpr std::int32_t kTypeTag = {};",
                    message.type_tag()
                ));
                w.line(format!(
                    "static constexpr std::size_t kFieldCount = {};",
                    message.fields().len()
                ));
                w.line(format!(
                    "static constexpr std::size_t kMaskWords = {};",
                    message.mask_words()
                ));
                w.blank();

                w.block(
                    format!(
                        "static void write(const {}& value, pdlkit::WireWriter& writer) {{",
                        message.name()
                    ),
                    "}",
                    |w| {
                        w.line("pdlkit::PooledMask mask(kMaskWords);");
                        for (bit, field) in message.fields().iter().enumerate() {
                            let access = format!("value.{}", self.field_name(field.name()));
                            w.line(format!(
                                "if ({}) mask.set({});",
                                self.presence(field, &access),
                                bit
                            ));
                        }
                        w.line("writer.write_mask(mask);");
                        for (bit, field) in message.fields().iter().enumerate() {
                            let access = format!("value.{}", self.field_name(field.name()));
                            let method = wire_method(field.field_type());
                            w.block(format!("if (mask.is_set({})) {{", bit), "}", |w| {
                                if field.is_repeated() {
                                    w.line(format!(
                                        "writer.write_int32(static_cast<std::int32_t>({}.size()));",
                                        access
                                    ));
                                    w.block(format!("for (const auto& item : {}) {{", access), "}", |w| {
                                        w.line(format!("writer.write_{}(item);", method));
                                    });
                                } else {
                                    w.line(format!("writer.write_{}({});", method, access));
                                }
                            });
                        }
                    },
                );
                w.blank();

                w.block(
                    format!(
                        "static {} read(pdlkit::WireReader& reader) {{",
                        message.name()
                    ),
                    "}",
                    |w| {
                        w.line("pdlkit::PooledMask mask(kMaskWords);");
                        w.line("reader.read_mask(mask);");
                        w.line(format!("{} value;", message.name()));
                        for (bit, field) in message.fields().iter().enumerate() {
                            let access = format!("value.{}", self.field_name(field.name()));
                            w.block(format!("if (mask.is_set({})) {{", bit), "}", |w| {
                                if field.is_repeated() {
                                    w.line("const std::int32_t count = reader.read_int32();");
                                    w.line(format!("{}.reserve(count);", access));
                                    w.block("for (std::int32_t i = 0; i < count; ++i) {", "}", |w| {
                                        w.line(format!(
                                            "{}.push_back({});",
                                            access,
                                            self.read_call(field)
                                        ));
                                    });
                                } else {
                                    w.line(format!("{} = {};", access, self.read_call(field)));
                                }
                            });
                        }
                        w.line("return value;");
                    },
                );
            });
        });

        GeneratedFile::new(Self::serializer_path(message), w.finish())
    }

    fn registry_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut includes = vec!["\"pdlkit/type_registry.h\"".to_string()];
        for message in cx.definition.messages() {
            includes.push(format!(
                "\"{}_serializer.h\"",
                to_snake_case(message.name())
            ));
        }
        let refs: Vec<&str> = includes.iter().map(String::as_str).collect();
        let mut w = Self::writer(cx, &refs);

        Self::in_namespace(&mut w, &Self::namespace(cx, Some("serialization")), |w| {
            w.block(
                "inline void register_all(pdlkit::TypeRegistry& registry) {",
                "}",
                |w| {
                    for message in cx.definition.messages() {
                        w.line(format!(
                            "registry.register_type<{0}>({0}Serializer::kTypeTag, &{0}Serializer::write, &{0}Serializer::read);",
                            message.name()
                        ));
                    }
                },
            );
        });

        GeneratedFile::new(
            Path::new("serialization").join("serializer_registry.h"),
            w.finish(),
        )
    }

    fn client_unit(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> GeneratedFile {
        let mut w = Self::writer(
            cx,
            &["<future>", "", "\"pdlkit/rpc_client.h\"", "\"../messages.h\""],
        );
        let client = format!("{}Client", service.name());

        Self::in_namespace(&mut w, &Self::namespace(cx, Some("client")), |w| {
            w.block(format!("class {} {{", client), "};", |w| {
                w.line("public:");
                w.line(format!(
                    "static constexpr const char* kServiceName = \"{}\";",
                    service.name()
                ));
                w.blank();
                w.line(format!(
                    "explicit {}(pdlkit::RpcClient& client) : client_(client) {{}}",
                    client
                ));
                for method in service.methods() {
                    w.blank();
                    w.block(
                        format!(
                            "std::future<{}> {}(const {}& request) {{",
                            method.response_type(),
                            self.method_name(method.name()),
                            method.request_type()
                        ),
                        "}",
                        |w| {
                            w.line(format!(
                                "return client_.call_async<{}, {}>(\"{}\", request);",
                                method.request_type(),
                                method.response_type(),
                                service.method_key(method)
                            ));
                        },
                    );
                }
                w.blank();
                w.line("private:");
                w.line("pdlkit::RpcClient& client_;");
            });
        });

        GeneratedFile::new(
            Path::new("client").join(format!("{}_client.h", to_snake_case(service.name()))),
            w.finish(),
        )
    }

    fn server_units(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> Vec<GeneratedFile> {
        let snake = to_snake_case(service.name());
        let interface = format!("I{}Service", service.name());
        let base = format!("{}ServiceBase", service.name());
        let namespace = Self::namespace(cx, Some("server"));

        let mut w = Self::writer(cx, &["\"../messages.h\""]);
        Self::in_namespace(&mut w, &namespace, |w| {
            w.block(format!("class {} {{", interface), "};", |w| {
                w.line("public:");
                w.line(format!("virtual ~{}() = default;", interface));
                for method in service.methods() {
                    w.line(format!(
                        "virtual {} {}(const {}& request) = 0;",
                        method.response_type(),
                        self.method_name(method.name()),
                        method.request_type()
                    ));
                }
            });
        });
        let interface_file = GeneratedFile::new(
            Path::new("server").join(format!("i_{}_service.h", snake)),
            w.finish(),
        );

        let interface_include = format!("\"i_{}_service.h\"", snake);
        let mut w = Self::writer(
            cx,
            &["\"pdlkit/dispatch.h\"", "\"../messages.h\"", &interface_include],
        );
        Self::in_namespace(&mut w, &namespace, |w| {
            w.block(
                format!("class {} : public {} {{", base, interface),
                "};",
                |w| {
                    w.line("public:");
                    w.line(format!(
                        "static constexpr const char* kServiceName = \"{}\";",
                        service.name()
                    ));
                    w.blank();
                    w.block("pdlkit::DispatchTable build_dispatch_table() {", "}", |w| {
                        w.line("pdlkit::DispatchTable table;");
                        for method in service.methods() {
                            w.block(
                                format!(
                                    "table.emplace(\"{}\", [this](const pdlkit::Object& request) {{",
                                    method.name()
                                ),
                                "});",
                                |w| {
                                    w.line(format!(
                                        "return pdlkit::Object({}(request.as<{}>()));",
                                        self.method_name(method.name()),
                                        method.request_type()
                                    ));
                                },
                            );
                        }
                        w.line("return table;");
                    });
                },
            );
        });
        let base_file = GeneratedFile::new(
            Path::new("server").join(format!("{}_service_base.h", snake)),
            w.finish(),
        );

        vec![interface_file, base_file]
    }

    fn support_units(&self, cx: &EmitContext<'_>, files: &[GeneratedFile]) -> Vec<GeneratedFile> {
        let library = match cx.definition.namespace() {
            "" => "generated_protocol".to_string(),
            ns => format!("{}_protocol", to_snake_case(ns)),
        };
        let mut headers: Vec<String> = files.iter().map(|f| path_string(&f.path)).collect();
        headers.sort();

        let mut w = CodeWriter::new(INDENT);
        w.lines(cx.banner("#"));
        w.blank();
        w.line("cmake_minimum_required(VERSION 3.16)");
        w.blank();
        w.line(format!("add_library({} INTERFACE)", library));
        w.blank();
        w.block(format!("target_sources({} INTERFACE", library), ")", |w| {
            for header in &headers {
                w.line(format!("${{CMAKE_CURRENT_SOURCE_DIR}}/{}", header));
            }
        });
        w.blank();
        w.line(format!(
            "target_include_directories({} INTERFACE ${{CMAKE_CURRENT_SOURCE_DIR}})",
            library
        ));
        w.line(format!(
            "target_link_libraries({} INTERFACE {})",
            library, CORE_LIBRARY
        ));
        w.line(format!("target_compile_features({} INTERFACE cxx_std_17)", library));

        vec![GeneratedFile::new("CMakeLists.txt", w.finish())]
    }
}
