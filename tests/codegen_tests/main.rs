//! Codegen Tests
//!
//! Rendering per target, generator flags, and writing to disk.

mod layout_tests;

use pdlkit::schema::{parse, ProtocolDefinition};

pub const GREETER: &str = r#"
namespace demo.chat
option header = "Chat protocol\nVersion 1"

message HelloRequest {
    string name = 1;
    repeated int32 lucky = 2;
}

message HelloReply {
    string message = 1;
    HelloRequest echo = 2;
    repeated HelloRequest history = 3;
    datetime sent = 4;
}

service Greeter {
    rpc Hello(HelloRequest) returns (HelloReply);
}
"#;

pub fn greeter() -> ProtocolDefinition {
    let output = parse(GREETER);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    output.definition
}
