//! Validator Tests

use pdlkit::schema::{parse, validate, Diagnostic, Severity};

fn errors(source: &str) -> Vec<Diagnostic> {
    let output = parse(source);
    validate(&output.definition)
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect()
}

#[test]
fn test_sound_schema_has_no_findings() {
    let source = r#"
        namespace demo
        message Req { string name = 1; }
        message Resp { string text = 1; Req echo = 2; }
        service Greeter { rpc Hello(Req) returns (Resp); }
    "#;
    let output = parse(source);
    assert!(validate(&output.definition).is_empty());
}

#[test]
fn test_missing_namespace_is_warning() {
    let output = parse("message M { int32 a = 1; }");
    let findings = validate(&output.definition);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[test]
fn test_duplicate_field_id() {
    let found = errors("namespace t\nmessage M {\n  int32 a = 1;\n  int32 b = 1;\n}");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].line, 4);
    assert!(found[0].message.contains("id 1"));
}

#[test]
fn test_duplicate_field_name() {
    let found = errors("namespace t\nmessage M { int32 a = 1; string a = 2; }");
    assert_eq!(found.len(), 1);
}

#[test]
fn test_non_positive_field_id() {
    let found = errors("namespace t\nmessage M { int32 a = 0; int32 b = -3; }");
    assert_eq!(found.len(), 2);
}

#[test]
fn test_unknown_field_type() {
    let found = errors("namespace t\nmessage M { Missing m = 1; }");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("Missing"));
}

#[test]
fn test_duplicate_message() {
    let found = errors("namespace t\nmessage M { int32 a = 1; }\nmessage M { int32 b = 1; }");
    assert!(found.iter().any(|d| d.message.contains("already declared on line 2")));
}

#[test]
fn test_unresolved_rpc_types() {
    let found = errors("namespace t\nmessage A { int32 a = 1; }\nservice S { rpc Go(A) returns (B); }");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("response type `B`"));
}

#[test]
fn test_duplicate_method() {
    let source = "namespace t\nmessage A { int32 a = 1; }\nservice S {\n  rpc Go(A) returns (A);\n  rpc Go(A) returns (A);\n}";
    let found = errors(source);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].line, 5);
}

#[test]
fn test_empty_service_is_warning() {
    let output = parse("namespace t\nservice Idle { }");
    let findings = validate(&output.definition);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[test]
fn test_self_reference_is_allowed() {
    let found = errors("namespace t\nmessage Node { int32 value = 1; Node next = 2; repeated Node children = 3; }");
    assert!(found.is_empty());
}
