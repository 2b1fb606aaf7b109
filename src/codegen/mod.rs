//! Codegen Module
//!
//! Turns a validated `ProtocolDefinition` into source code for a target
//! language.
//!
//! ## Responsibilities
//! - Walk the IR in declaration order (the only source of ordering)
//! - Ask the target for each unit: data types, serializers, registry,
//!   clients, server interface + base
//! - Write the units under the output directory
//!
//! Output is a pure function of IR and options: no timestamps, no hash-map
//! iteration order. Running twice yields byte-identical files.

pub mod cpp;
pub mod csharp;
pub mod printer;
pub mod rust;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::GeneratorOptions;
use crate::error::{PdlError, Result};
use crate::schema::diagnostic::summarize_errors;
use crate::schema::{
    validate, FieldType, ProtocolDefinition, ProtocolField, ProtocolMessage, ProtocolService,
};

pub use printer::CodeWriter;

/// One generated source file, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Result of one target's generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub target: &'static str,
    pub output_dir: PathBuf,
    /// Relative paths, sorted
    pub files: Vec<PathBuf>,
}

/// Everything a target needs while emitting units
pub struct EmitContext<'a> {
    pub definition: &'a ProtocolDefinition,
    pub options: &'a GeneratorOptions,
    /// Namespace in target syntax
    pub namespace: String,
}

impl EmitContext<'_> {
    /// Header comment lines, each prefixed with `comment`
    pub fn banner(&self, comment: &str) -> Vec<String> {
        let source = match self.definition.namespace() {
            "" => "schema".to_string(),
            ns => format!("schema `{}`", ns),
        };
        let mut lines = vec![format!(
            "{} Code generated by pdlkit from {}. DO NOT EDIT.",
            comment, source
        )];
        if let Some(header) = self.definition.option("header") {
            lines.extend(header.split("\\n").map(|l| format!("{} {}", comment, l)));
        }
        lines
    }

    /// Name used for type tags and `TYPE_NAME`
    pub fn qualified_name(&self, message: &ProtocolMessage) -> String {
        self.definition.qualified_name(message.name())
    }

    pub fn message(&self, name: &str) -> Option<&ProtocolMessage> {
        self.definition.message(name)
    }
}

/// A target language.
///
/// Implementors provide the type mapping and per-unit text; the driver in
/// this module decides which units exist and in which order.
pub trait Target {
    /// Short name: `rust`, `csharp`, `cpp`
    fn name(&self) -> &'static str;

    // =========================================================================
    // Type Mapping
    // =========================================================================

    /// Native type for a scalar; `Struct`, `List` and `Map` map to the
    /// target's opaque type
    fn scalar_type(&self, ty: FieldType) -> &'static str;

    /// Zero-value literal for a scalar
    fn default_literal(&self, ty: FieldType) -> &'static str;

    /// Type of a singular field referencing message `name`
    fn struct_ref(&self, name: &str) -> String;

    /// Type of one element of a repeated field of message `name`
    fn struct_element(&self, name: &str) -> String {
        self.struct_ref(name)
    }

    /// Literal for an absent struct reference
    fn null_literal(&self) -> &'static str;

    fn repeated_type(&self, element: &str) -> String;

    fn empty_repeated(&self, element: &str) -> String;

    /// Namespace in target syntax from the dotted schema namespace
    fn translate_namespace(&self, schema_namespace: &str) -> String;

    /// Member name for a schema field name
    fn field_name(&self, name: &str) -> String;

    /// Member name for an RPC method
    fn method_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Whether a member may not share its enclosing type's name
    fn member_clashes_with_type(&self) -> bool {
        false
    }

    /// Names generated code relies on that a message must not shadow
    fn reserved_type_names(&self) -> &'static [&'static str] {
        &[]
    }

    // =========================================================================
    // Units
    // =========================================================================

    fn messages_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile;

    fn serializer_unit(&self, cx: &EmitContext<'_>, message: &ProtocolMessage) -> GeneratedFile;

    fn registry_unit(&self, cx: &EmitContext<'_>) -> GeneratedFile;

    fn client_unit(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> GeneratedFile;

    /// Interface + base implementation
    fn server_units(&self, cx: &EmitContext<'_>, service: &ProtocolService) -> Vec<GeneratedFile>;

    /// Module indexes, build files; sees every other unit
    fn support_units(&self, _cx: &EmitContext<'_>, _files: &[GeneratedFile]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    // =========================================================================
    // Provided
    // =========================================================================

    /// Element type of a field, ignoring `repeated`
    fn element_type(&self, field: &ProtocolField) -> String {
        match (field.field_type(), field.custom_type()) {
            (FieldType::Struct, Some(name)) if field.is_repeated() => self.struct_element(name),
            (FieldType::Struct, Some(name)) => self.struct_ref(name),
            (ty, _) => self.scalar_type(ty).to_string(),
        }
    }

    /// Declared member type of a field
    fn field_type(&self, field: &ProtocolField) -> String {
        let element = self.element_type(field);
        if field.is_repeated() {
            self.repeated_type(&element)
        } else {
            element
        }
    }

    /// Default-initializer for a field
    fn field_default(&self, field: &ProtocolField) -> String {
        if field.is_repeated() {
            self.empty_repeated(&self.element_type(field))
        } else if field.field_type() == FieldType::Struct {
            self.null_literal().to_string()
        } else {
            self.default_literal(field.field_type()).to_string()
        }
    }
}

/// Look up a target by name
pub fn target_by_name(name: &str) -> Option<Box<dyn Target>> {
    match name.to_ascii_lowercase().as_str() {
        "rust" | "rs" => Some(Box::new(rust::RustTarget)),
        "csharp" | "cs" | "c#" => Some(Box::new(csharp::CSharpTarget)),
        "cpp" | "c++" | "cxx" => Some(Box::new(cpp::CppTarget)),
        _ => None,
    }
}

/// Render every unit for `target` without touching the filesystem.
///
/// Refuses definitions with validation errors.
pub fn render(
    target: &dyn Target,
    definition: &ProtocolDefinition,
    options: &GeneratorOptions,
) -> Result<Vec<GeneratedFile>> {
    let diagnostics = validate(definition);
    if let Some(errors) = summarize_errors(&diagnostics) {
        return Err(PdlError::Schema(errors));
    }

    check_names(target, definition)?;

    let namespace = if options.namespace.is_empty() {
        target.translate_namespace(definition.namespace())
    } else {
        options.namespace.clone()
    };
    let cx = EmitContext {
        definition,
        options,
        namespace,
    };

    let mut files = vec![target.messages_unit(&cx)];

    if options.generate_serialization {
        for message in definition.messages() {
            files.push(target.serializer_unit(&cx, message));
        }
        if options.generate_factories {
            files.push(target.registry_unit(&cx));
        }
    } else if options.generate_factories {
        tracing::warn!(
            "{}: factories need serializers; skipping registry unit",
            target.name()
        );
    }

    if options.generate_client_server {
        for service in definition.services() {
            files.push(target.client_unit(&cx, service));
            files.extend(target.server_units(&cx, service));
        }
    }

    let support = target.support_units(&cx, &files);
    files.extend(support);
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(pair) = files.windows(2).find(|w| w[0].path == w[1].path) {
        return Err(PdlError::Generation(format!(
            "two units map to {}; rename one of the colliding declarations",
            pair[0].path.display()
        )));
    }

    Ok(files)
}

/// Reject schemas whose declarations map onto the same target identifier
fn check_names(target: &dyn Target, definition: &ProtocolDefinition) -> Result<()> {
    let clash = |what: String| PdlError::Generation(format!("{}: {}", target.name(), what));

    for message in definition.messages() {
        if target.reserved_type_names().contains(&message.name()) {
            return Err(clash(format!(
                "message `{}` shadows a type the generated code uses",
                message.name()
            )));
        }

        let mut members: HashMap<String, &str> = HashMap::new();
        for field in message.fields() {
            let member = target.field_name(field.name());
            if target.member_clashes_with_type() && member == message.name() {
                return Err(clash(format!(
                    "field `{}` of `{}` maps to the message's own name",
                    field.name(),
                    message.name()
                )));
            }
            if let Some(previous) = members.insert(member.clone(), field.name()) {
                return Err(clash(format!(
                    "fields `{}` and `{}` of `{}` both map to `{}`",
                    previous,
                    field.name(),
                    message.name(),
                    member
                )));
            }
        }
    }

    for service in definition.services() {
        let mut members: HashMap<String, &str> = HashMap::new();
        for method in service.methods() {
            let member = target.method_name(method.name());
            if let Some(previous) = members.insert(member.clone(), method.name()) {
                return Err(clash(format!(
                    "methods `{}` and `{}` of `{}` both map to `{}`",
                    previous,
                    method.name(),
                    service.name(),
                    member
                )));
            }
        }
    }
    Ok(())
}

/// Write rendered files under `output_dir`, creating directories.
///
/// Stops at the first failure; files already written stay on disk.
pub fn write_files(output_dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = output_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.contents)?;
        tracing::trace!("Wrote {}", path.display());
    }
    Ok(())
}

/// Render and write one target
pub fn generate(
    target: &dyn Target,
    definition: &ProtocolDefinition,
    options: &GeneratorOptions,
) -> Result<GenerationReport> {
    let files = render(target, definition, options)?;
    write_files(&options.output_dir, &files)?;

    tracing::info!(
        "{}: wrote {} files to {}",
        target.name(),
        files.len(),
        options.output_dir.display()
    );

    Ok(GenerationReport {
        target: target.name(),
        output_dir: options.output_dir.clone(),
        files: files.into_iter().map(|f| f.path).collect(),
    })
}

// =============================================================================
// Naming Helpers
// =============================================================================

/// Split an identifier into lowercase words at `_` and case boundaries
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `user_name`, `userName` → `UserName`
pub fn to_pascal_case(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `UserName`, `HTTPServer` → `user_name`, `http_server`
pub fn to_snake_case(name: &str) -> String {
    words(name).join("_")
}
