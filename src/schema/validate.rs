//! Semantic validation
//!
//! The parser never rejects a schema on semantic grounds. This pass checks
//! name uniqueness, field ids and type references, and the generators refuse
//! to run while it reports errors.

use std::collections::{HashMap, HashSet};

use super::diagnostic::Diagnostic;
use super::ir::{FieldType, ProtocolDefinition, ProtocolMessage, ProtocolService};
use crate::wire::registry::RESERVED_TAG_MAX;
use crate::wire::NULL_TAG;

/// Run every check; an empty result means the schema is sound
pub fn validate(definition: &ProtocolDefinition) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if definition.namespace().is_empty() {
        diagnostics.push(Diagnostic::warning(0, "schema declares no namespace"));
    }

    let mut message_names: HashMap<&str, usize> = HashMap::new();
    for message in definition.messages() {
        if let Some(first) = message_names.insert(message.name(), message.line()) {
            diagnostics.push(Diagnostic::error(
                message.line(),
                format!(
                    "message `{}` already declared on line {}",
                    message.name(),
                    first
                ),
            ));
        }
        check_message(definition, message, &mut diagnostics);
    }

    check_type_tags(definition, &mut diagnostics);

    let mut service_names: HashSet<&str> = HashSet::new();
    for service in definition.services() {
        if !service_names.insert(service.name()) {
            diagnostics.push(Diagnostic::error(
                service.line(),
                format!("service `{}` declared more than once", service.name()),
            ));
        }
        check_service(definition, service, &mut diagnostics);
    }

    diagnostics
}

fn check_message(
    definition: &ProtocolDefinition,
    message: &ProtocolMessage,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut names = HashSet::new();
    let mut ids = HashMap::new();

    for field in message.fields() {
        if !names.insert(field.name()) {
            diagnostics.push(Diagnostic::error(
                field.line(),
                format!(
                    "field `{}` declared twice in message `{}`",
                    field.name(),
                    message.name()
                ),
            ));
        }

        if field.id() <= 0 {
            diagnostics.push(Diagnostic::error(
                field.line(),
                format!("field `{}` has non-positive id {}", field.name(), field.id()),
            ));
        } else if let Some(other) = ids.insert(field.id(), field.name()) {
            diagnostics.push(Diagnostic::error(
                field.line(),
                format!(
                    "field id {} of `{}` already used by `{}` in message `{}`",
                    field.id(),
                    field.name(),
                    other,
                    message.name()
                ),
            ));
        }

        match field.field_type() {
            FieldType::Struct => {
                let target = field.custom_type().unwrap_or_default();
                if definition.message(target).is_none() {
                    diagnostics.push(Diagnostic::error(
                        field.line(),
                        format!(
                            "field `{}.{}` references unknown message `{}`",
                            message.name(),
                            field.name(),
                            target
                        ),
                    ));
                }
            }
            FieldType::List | FieldType::Map => diagnostics.push(Diagnostic::error(
                field.line(),
                format!("field `{}` uses a reserved type", field.name()),
            )),
            _ => {}
        }
    }
}

fn check_type_tags(definition: &ProtocolDefinition, diagnostics: &mut Vec<Diagnostic>) {
    let mut tags: HashMap<i32, &str> = HashMap::new();
    for message in definition.messages() {
        let tag = message.type_tag();
        if tag == NULL_TAG || (0..=RESERVED_TAG_MAX).contains(&tag) {
            diagnostics.push(Diagnostic::error(
                message.line(),
                format!("message `{}` hashes to reserved tag {}", message.name(), tag),
            ));
            continue;
        }
        match tags.insert(tag, message.name()) {
            Some(other) if other != message.name() => diagnostics.push(Diagnostic::error(
                message.line(),
                format!(
                    "messages `{}` and `{}` share type tag {}; rename one",
                    other,
                    message.name(),
                    tag
                ),
            )),
            _ => {}
        }
    }
}

fn check_service(
    definition: &ProtocolDefinition,
    service: &ProtocolService,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if service.methods().is_empty() {
        diagnostics.push(Diagnostic::warning(
            service.line(),
            format!("service `{}` declares no methods", service.name()),
        ));
    }

    let mut methods = HashSet::new();
    for method in service.methods() {
        if !methods.insert(method.name()) {
            diagnostics.push(Diagnostic::error(
                method.line(),
                format!(
                    "method `{}` declared twice in service `{}`",
                    method.name(),
                    service.name()
                ),
            ));
        }
        for (role, type_name) in [
            ("request", method.request_type()),
            ("response", method.response_type()),
        ] {
            if definition.message(type_name).is_none() {
                diagnostics.push(Diagnostic::error(
                    method.line(),
                    format!(
                        "{} type `{}` of `{}.{}` is not a declared message",
                        role,
                        type_name,
                        service.name(),
                        method.name()
                    ),
                ));
            }
        }
    }
}
