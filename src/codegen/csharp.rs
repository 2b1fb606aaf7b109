//! C# Target
//!
//! ```text
//! <out>/
//! ├── Messages.cs
//! ├── Serialization/
//! │   ├── <Message>Serializer.cs
//! │   └── SerializerRegistry.cs
//! ├── Client/<Service>Client.cs
//! └── Server/
//!     ├── I<Service>Service.cs
//!     └── <Service>ServiceBase.cs
//! ```
//!
//! Generated code targets the `PdlKit.Wire` / `PdlKit.Rpc` runtime
//! namespaces and uses the same wire layout as the Rust runtime.

use std::path::Path;

use super::{to_pascal_case, CodeWriter, EmitContext, GeneratedFile, Target};
use crate::schema::{FieldType, ProtocolField, ProtocolMessage, ProtocolService};

const INDENT: &str = "    ";

pub struct CSharpTarget;

/// Suffix of the runtime's `WriteX` / `ReadX` pair for a scalar
fn wire_method(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Int32 => "Int32",
        FieldType::Int64 => "Int64",
        FieldType::Float => "Single",
        FieldType::Double => "Double",
        FieldType::Bool => "Bool",
        FieldType::String => "String",
        FieldType::Vector3 => "Vector3",
        FieldType::DateTime => "DateTime",
        FieldType::Struct | FieldType::List | FieldType::Map => "Object",
    }
}

impl CSharpTarget {
    fn writer(cx: &EmitContext<'_>, usings: &[&str]) -> CodeWriter {
        let mut w = CodeWriter::new(INDENT);
        w.line("// <auto-generated />");
        w.lines(cx.banner("//"));
        w.blank();
        if !usings.is_empty() {
            for using in usings {
                w.line(format!("using {};", using));
            }
            w.blank();
        }
        w
    }

    fn sub_namespace(cx: &EmitContext<'_>, sub: &str) -> String {
        format!("{}.{}", cx.namespace, sub)
    }

    fn presence(&self, field: &ProtocolField, access: &str) -> String {
        if field.is_repeated() {
            return format!("{} != null && {}.Count > 0", access, access);
        }
        match field.field_type() {
            FieldType::Int32
            | FieldType::Int64
            | FieldType::Float
            | FieldType::Double => format!("{} != 0", access),
            FieldType::Bool => access.to_string(),
            FieldType::String => format!("!string.IsNullOrEmpty({})", access),
            FieldType::Vector3 => format!("{} != Vector3.Zero", access),
            FieldType::DateTime => format!("{} != DateTime.UnixEpoch", access),
            FieldType::Struct | FieldType::List | FieldType::Map => format!("{} != null", access),
        }
    }

    fn read_call(&self, field: &ProtocolField) -> String {
        match (field.field_type(), field.custom_type()) {
            (FieldType::Struct, Some(name)) => format!("reader.ReadObject<{}>()", name),
            (ty, _) => format!("reader.Read{}()", wire_method(ty)),
        }
    }

    fn write_field(&self, w: &mut CodeWriter, field: &ProtocolField) {
        let access = format!("value.{}", self.field_name(field.name()));
        let method = wire_method(field.field_type());
        if field.is_repeated() {
            w.line(format!("writer.WriteInt32({}.Count);", access));
            w.brace(format!("foreach (var item in {})", access), |w| {
                w.line(format!("writer.Write{}(item);", method));
            });
        } else {
            w.line(format!("writer.Write{}({});", method, access));
        }
    }

    fn read_field(&self, w: &mut CodeWriter, field: &ProtocolField) {
        let access = format!("value.{}", self.field_name(field.name()));
        if field.is_repeated() {
            w.line("var count = reader.ReadInt32();");
            w.line(format!(
                "{} = new List<{}>(count);",
                access,
                self.element_type(field)
            ));
            w.brace("for (var i = 0; i < count; i++)", |w| {
                w.line(format!("{}.Add({});", access, self.read_call(field)));
            });
        } else {
            w.line(format!("{} = {};", access, self.read_call(field)));
        }
    }
}

/// `{`-on-its-own-line block, C# style
trait Braces {
    fn brace(&mut self, head: impl AsRef<str>, body: impl FnOnce(&mut CodeWriter));
}

impl Braces for CodeWriter {
    fn brace(&mut self, head: impl AsRef<str>, body: impl FnOnce(&mut CodeWriter)) {
        self.line(head);
        self.block("{", "}", body);
    }
}

impl Target for CSharpTarget {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn scalar_type(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 => "int",
            FieldType::Int64 => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Vector3 => "Vector3",
            FieldType::DateTime => "DateTime",
            FieldType::Struct | FieldType::List | FieldType::Map => "object",
        }
    }

    fn default_literal(&self, ty: FieldType) -> &'static str {
        match ty {
            FieldType::Int32 => "0",
            FieldType::Int64 => "0L",
            FieldType::Float => "0.0f",
            FieldType::Double => "0.0",
            FieldType::Bool => "false",
            FieldType::String => "string.Empty",
            FieldType::Vector3 => "Vector3.Zero",
            FieldType::DateTime => "DateTime.UnixEpoch",
            FieldType::Struct | FieldType::List | FieldType::Map => "null",
        }
    }

    fn struct_ref(&self, name: &str) -> String {
        name.to_string()
    }

    fn null_literal(&self) -> &'static str {
        "null"
    }

    fn repeated_type(&self, element: &str) -> String {
        format!("List<{}>", element)
    }

    fn empty_repeated(&self, element: &str) -> String {
        format!("new List<{}>()", element)
    }

    fn translate_namespace(&self, schema_namespace: &str) -> String {
        let parts: Vec<String> = schema_namespace
            .split('.')
            .filter(|s| !s.is_empty())
            .map(to_pascal_case)
            .collect();
        if parts.is_empty() {
            "Generated".to_string()
        } else {
            parts.join(".")
        }
    }

    fn field_name(&self, name: &str) -> String {
        to_pascal_case(name)
    }

    fn member_clashes_with_type(&self) -> bool {
        true
    }

    fn messages_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut w = Self::writer(
            cx,
            &["System", "System.Collections.Generic", "System.Numerics"],
        );
        w.brace(format!("namespace {}", cx.namespace), |w| {
            for (i, message) in cx.definition.messages().iter().enumerate() {
                if i > 0 {
                    w.blank();
                }
                w.line("/// <summary>");
                w.line(format!("/// {}", cx.qualified_name(message)));
                w.line("/// </summary>");
                w.brace(format!("public sealed class {}", message.name()), |w| {
                    for field in message.fields() {
                        w.line(format!(
                            "public {} {} {{ get; set; }}",
                            self.field_type(field),
                            self.field_name(field.name())
                        ));
                    }
                    if !message.fields().is_empty() {
                        w.blank();
                    }
                    w.brace(format!("public {}()", message.name()), |w| {
                        for field in message.fields() {
                            w.line(format!(
                                "{} = {};",
                                self.field_name(field.name()),
                                self.field_default(field)
                            ));
                        }
                    });
                });
            }
        });
        GeneratedFile::new("Messages.cs", w.finish())
    }

    fn serializer_unit(&self, cx: &EmitContext<'_>, message: &ProtocolMessage) -> GeneratedFile {
        let serializer = format!("{}Serializer", message.name());
        let words = message.mask_words();
        let mut w = Self::writer(
            cx,
            &[
                "System",
                "System.Collections.Generic",
                "System.Numerics",
                "PdlKit.Wire",
            ],
        );

        w.brace(
            format!("namespace {}", Self::sub_namespace(cx, "Serialization")),
            |w| {
                w.brace(
                    format!(
                        "public sealed class {} : IMessageSerializer<{}>",
                        serializer,
                        message.name()
                    ),
                    |w| {
                        w.line(format!(
                            "public const string TypeName = \"{}\";",
                            cx.qualified_name(message)
                        ));
                        w.line(format!("public const int TypeTag = {};", message.type_tag()));
                        w.line(format!(
                            "public const int FieldCount = {};",
                            message.fields().len()
                        ));
                        w.line(format!("public const int MaskWords = {};", words));
                        w.blank();
                        w.line(format!(
                            "public static readonly {} Instance = new {}();",
                            serializer, serializer
                        ));
                        w.blank();

                        w.brace(
                            format!("public void Write({} value, WireWriter writer)", message.name()),
                            |w| {
                                w.line("var mask = MaskPool.Shared.Acquire(MaskWords);");
                                w.brace("try", |w| {
                                    for (bit, field) in message.fields().iter().enumerate() {
                                        let access =
                                            format!("value.{}", self.field_name(field.name()));
                                        w.line(format!(
                                            "if ({}) mask.Set({});",
                                            self.presence(field, &access),
                                            bit
                                        ));
                                    }
                                    w.line("writer.WriteMask(mask);");
                                    for (bit, field) in message.fields().iter().enumerate() {
                                        w.brace(format!("if (mask.IsSet({}))", bit), |w| {
                                            self.write_field(w, field);
                                        });
                                    }
                                });
                                w.brace("finally", |w| {
                                    w.line("MaskPool.Shared.Release(mask);");
                                });
                            },
                        );
                        w.blank();

                        w.brace(
                            format!("public {} Read(WireReader reader)", message.name()),
                            |w| {
                                w.line("var mask = MaskPool.Shared.Acquire(MaskWords);");
                                w.brace("try", |w| {
                                    w.line("reader.ReadMask(mask);");
                                    w.line(format!("var value = new {}();", message.name()));
                                    for (bit, field) in message.fields().iter().enumerate() {
                                        w.brace(format!("if (mask.IsSet({}))", bit), |w| {
                                            self.read_field(w, field);
                                        });
                                    }
                                    w.line("return value;");
                                });
                                w.brace("finally", |w| {
                                    w.line("MaskPool.Shared.Release(mask);");
                                });
                            },
                        );
                    },
                );
            },
        );

        GeneratedFile::new(
            Path::new("Serialization").join(format!("{}.cs", serializer)),
            w.finish(),
        )
    }

    fn registry_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile {
        let mut w = Self::writer(cx, &["PdlKit.Wire"]);
        w.brace(
            format!("namespace {}", Self::sub_namespace(cx, "Serialization")),
            |w| {
                w.brace("public static class SerializerRegistry", |w| {
                    w.brace("public static void RegisterAll(TypeRegistry registry)", |w| {
                        for message in cx.definition.messages() {
                            w.line(format!(
                                "registry.Register<{}>({}Serializer.TypeTag, {}Serializer.Instance);",
                                message.name(),
                                message.name(),
                                message.name()
                            ));
                        }
                    });
                });
            },
        );
        GeneratedFile::new(
            Path::new("Serialization").join("SerializerRegistry.cs"),
            w.finish(),
        )
    }

    fn client_unit(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> GeneratedFile {
        let client = format!("{}Client", service.name());
        let mut w = Self::writer(cx, &["System.Threading.Tasks", "PdlKit.Rpc"]);
        w.brace(format!("namespace {}", Self::sub_namespace(cx, "Client")), |w| {
            w.brace(format!("public sealed class {}", client), |w| {
                w.line(format!(
                    "public const string ServiceName = \"{}\";",
                    service.name()
                ));
                w.blank();
                w.line("private readonly RpcClient _client;");
                w.blank();
                w.brace(format!("public {}(RpcClient client)", client), |w| {
                    w.line("_client = client;");
                });
                for method in service.methods() {
                    w.blank();
                    w.brace(
                        format!(
                            "public Task<{}> {}Async({} request)",
                            method.response_type(),
                            method.name(),
                            method.request_type()
                        ),
                        |w| {
                            w.line(format!(
                                "return _client.CallAsync<{}, {}>(\"{}\", request);",
                                method.request_type(),
                                method.response_type(),
                                service.method_key(method)
                            ));
                        },
                    );
                }
            });
        });
        GeneratedFile::new(
            Path::new("Client").join(format!("{}.cs", client)),
            w.finish(),
        )
    }

    fn server_units(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> Vec<GeneratedFile> {
        let interface = format!("I{}Service", service.name());
        let base = format!("{}ServiceBase", service.name());

        let mut w = Self::writer(cx, &["System.Threading.Tasks"]);
        w.brace(format!("namespace {}", Self::sub_namespace(cx, "Server")), |w| {
            w.brace(format!("public interface {}", interface), |w| {
                for method in service.methods() {
                    w.line(format!(
                        "Task<{}> {}Async({} request);",
                        method.response_type(),
                        method.name(),
                        method.request_type()
                    ));
                }
            });
        });
        let interface_file = GeneratedFile::new(
            Path::new("Server").join(format!("{}.cs", interface)),
            w.finish(),
        );

        let mut w = Self::writer(
            cx,
            &["System", "System.Collections.Generic", "System.Threading.Tasks"],
        );
        w.brace(format!("namespace {}", Self::sub_namespace(cx, "Server")), |w| {
            w.brace(
                format!("public abstract class {} : {}", base, interface),
                |w| {
                    w.line(format!(
                        "public const string ServiceName = \"{}\";",
                        service.name()
                    ));
                    for method in service.methods() {
                        w.blank();
                        w.line(format!(
                            "public abstract Task<{}> {}Async({} request);",
                            method.response_type(),
                            method.name(),
                            method.request_type()
                        ));
                    }
                    w.blank();
                    w.brace(
                        "public IReadOnlyDictionary<string, Func<object, Task<object>>> BuildDispatchTable()",
                        |w| {
                            w.line("return new Dictionary<string, Func<object, Task<object>>>");
                            w.line("{");
                            w.indent();
                            for method in service.methods() {
                                w.line(format!(
                                    "[\"{}\"] = async request => await {}Async(({})request),",
                                    method.name(),
                                    method.name(),
                                    method.request_type()
                                ));
                            }
                            w.dedent();
                            w.line("};");
                        },
                    );
                },
            );
        });
        let base_file = GeneratedFile::new(
            Path::new("Server").join(format!("{}.cs", base)),
            w.finish(),
        );

        vec![interface_file, base_file]
    }
}
