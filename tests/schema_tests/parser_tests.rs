//! Parser Tests

use pdlkit::schema::{parse, FieldType, Severity};
use pdlkit::wire::registry::type_tag_for;

const CHAT: &str = r#"
namespace demo.chat
option header = "Chat protocol"

// A chat participant
message User {
    int32 id = 1;
    string name = 2;
    repeated string tags = 3;
}

message Note { User author = 1; datetime sent = 2; vector3 pos = 3; }

service Chat {
    rpc Post(Note) returns (User);
}
"#;

// =============================================================================
// Well-formed Input
// =============================================================================

#[test]
fn test_parse_full_schema() {
    let output = parse(CHAT);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let def = &output.definition;
    assert_eq!(def.namespace(), "demo.chat");
    assert_eq!(def.option("header"), Some("Chat protocol"));
    assert_eq!(def.messages().len(), 2);
    assert_eq!(def.services().len(), 1);

    let user = def.message("User").unwrap();
    let names: Vec<&str> = user.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["id", "name", "tags"]);
    assert_eq!(user.fields()[0].field_type(), FieldType::Int32);
    assert!(user.fields()[2].is_repeated());
    assert_eq!(user.fields()[2].field_type(), FieldType::String);
}

#[test]
fn test_single_line_message() {
    let output = parse(CHAT);
    let note = output.definition.message("Note").unwrap();

    assert_eq!(note.fields().len(), 3);
    assert_eq!(note.fields()[0].field_type(), FieldType::Struct);
    assert_eq!(note.fields()[0].custom_type(), Some("User"));
    assert_eq!(note.fields()[1].field_type(), FieldType::DateTime);
    assert_eq!(note.fields()[2].field_type(), FieldType::Vector3);
}

#[test]
fn test_parse_service() {
    let output = parse(CHAT);
    let chat = output.definition.service("Chat").unwrap();
    let post = &chat.methods()[0];

    assert_eq!(post.name(), "Post");
    assert_eq!(post.request_type(), "Note");
    assert_eq!(post.response_type(), "User");
    assert_eq!(chat.method_key(post), "Chat.Post");
}

#[test]
fn test_type_tags_use_qualified_name() {
    let output = parse(CHAT);
    let user = output.definition.message("User").unwrap();
    assert_eq!(user.type_tag(), type_tag_for("demo.chat.User"));
}

#[test]
fn test_type_aliases() {
    let output = parse("message M { int a = 1; long b = 2; timestamp c = 3; Bool d = 4; }");
    let fields = output.definition.messages()[0].fields();

    assert_eq!(fields[0].field_type(), FieldType::Int32);
    assert_eq!(fields[1].field_type(), FieldType::Int64);
    assert_eq!(fields[2].field_type(), FieldType::DateTime);
    assert_eq!(fields[3].field_type(), FieldType::Bool);
}

#[test]
fn test_field_order_follows_declaration_not_ids() {
    let output = parse("message M { int32 late = 9; int32 early = 1; }");
    let names: Vec<&str> = output.definition.messages()[0]
        .fields()
        .iter()
        .map(|f| f.name())
        .collect();
    assert_eq!(names, vec!["late", "early"]);
}

#[test]
fn test_empty_input() {
    let output = parse("");
    assert!(output.diagnostics.is_empty());
    assert!(output.definition.messages().is_empty());
    assert_eq!(output.definition.namespace(), "");
}

// =============================================================================
// Lenient Handling
// =============================================================================

#[test]
fn test_malformed_field_is_skipped_with_line() {
    let source = "message M {\n  int32 ok = 1;\n  this is nonsense\n  int32 also_ok = 2;\n}\n";
    let output = parse(source);

    let fields = output.definition.messages()[0].fields();
    assert_eq!(fields.len(), 2);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].line, 3);
    assert_eq!(output.diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_unknown_top_level_statement() {
    let output = parse("enum Color { RED = 0; }\nmessage M { int32 a = 1; }");

    assert!(output.has_errors());
    assert_eq!(output.definition.messages().len(), 1);
    assert_eq!(output.diagnostics[0].line, 1);
}

#[test]
fn test_unterminated_message_is_kept() {
    let output = parse("message M {\n  int32 a = 1;\n");

    assert_eq!(output.definition.messages().len(), 1);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    assert!(!output.has_errors());
}

#[test]
fn test_nested_block_is_skipped() {
    let source = "message Outer {\n  int32 a = 1;\n  message Inner { int32 b = 1; }\n  int32 c = 2;\n}";
    let output = parse(source);

    let outer = &output.definition.messages()[0];
    assert_eq!(outer.name(), "Outer");
    let names: Vec<&str> = outer.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert!(output.has_errors());
}

#[test]
fn test_bad_rpc_is_skipped() {
    let output = parse("service S {\n  rpc Good(A) returns (B);\n  rpc Bad(A) gives (B);\n}");
    let service = &output.definition.services()[0];

    assert_eq!(service.methods().len(), 1);
    assert_eq!(output.diagnostics[0].line, 3);
}

#[test]
fn test_option_requires_quotes() {
    let output = parse("option header = unquoted");
    assert!(output.has_errors());
    assert!(output.definition.options().is_empty());
}

#[test]
fn test_comments_are_ignored() {
    let output = parse("// message Hidden { int32 a = 1; }\nmessage Shown { int32 a = 1; } // trailing");
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.definition.messages().len(), 1);
    assert_eq!(output.definition.messages()[0].name(), "Shown");
}
