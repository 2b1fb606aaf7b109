//! Generated file layout per target

use std::path::PathBuf;

use pdlkit::codegen::{render, target_by_name, GeneratedFile};
use pdlkit::GeneratorOptions;

use crate::greeter;

fn paths(files: &[GeneratedFile]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            f.path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

fn render_paths(lang: &str, options: &GeneratorOptions) -> Vec<String> {
    let target = target_by_name(lang).unwrap();
    paths(&render(target.as_ref(), &greeter(), options).unwrap())
}

#[test]
fn test_rust_layout() {
    let found = render_paths("rust", &GeneratorOptions::default());
    assert_eq!(
        found,
        vec![
            "client/greeter.rs",
            "client/mod.rs",
            "mod.rs",
            "registry.rs",
            "serialization/hello_reply.rs",
            "serialization/hello_request.rs",
            "serialization/mod.rs",
            "server/greeter_dispatch.rs",
            "server/greeter_service.rs",
            "server/mod.rs",
            "types.rs",
        ]
    );
}

#[test]
fn test_csharp_layout() {
    let found = render_paths("csharp", &GeneratorOptions::default());
    assert_eq!(
        found,
        vec![
            "Client/GreeterClient.cs",
            "Messages.cs",
            "Serialization/HelloReplySerializer.cs",
            "Serialization/HelloRequestSerializer.cs",
            "Serialization/SerializerRegistry.cs",
            "Server/GreeterServiceBase.cs",
            "Server/IGreeterService.cs",
        ]
    );
}

#[test]
fn test_cpp_layout() {
    let found = render_paths("cpp", &GeneratorOptions::default());
    assert_eq!(
        found,
        vec![
            "CMakeLists.txt",
            "client/greeter_client.h",
            "messages.h",
            "serialization/hello_reply_serializer.h",
            "serialization/hello_request_serializer.h",
            "serialization/serializer_registry.h",
            "server/greeter_service_base.h",
            "server/i_greeter_service.h",
        ]
    );
}

#[test]
fn test_output_is_sorted_for_every_target() {
    for lang in ["rust", "csharp", "cpp"] {
        let target = target_by_name(lang).unwrap();
        let files = render(target.as_ref(), &greeter(), &GeneratorOptions::default()).unwrap();
        let sorted: Vec<PathBuf> = {
            let mut p: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
            p.sort();
            p
        };
        let actual: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(actual, sorted, "{}", lang);
    }
}

#[test]
fn test_flags_remove_units() {
    let options = GeneratorOptions::builder()
        .generate_client_server(false)
        .build();
    let found = render_paths("rust", &options);
    assert!(!found.iter().any(|p| p.starts_with("client/") || p.starts_with("server/")));
    assert!(found.contains(&"registry.rs".to_string()));

    let options = GeneratorOptions::builder().generate_factories(false).build();
    assert!(!render_paths("csharp", &options).contains(&"Serialization/SerializerRegistry.cs".to_string()));

    // The registry has nothing to register without serializers
    let options = GeneratorOptions::builder()
        .generate_serialization(false)
        .generate_client_server(false)
        .build();
    assert_eq!(render_paths("cpp", &options), vec!["CMakeLists.txt", "messages.h"]);
    assert_eq!(render_paths("rust", &options), vec!["mod.rs", "types.rs"]);
}

#[test]
fn test_target_aliases() {
    for name in ["rust", "RS", "csharp", "C#", "cs", "cpp", "c++", "CXX"] {
        assert!(target_by_name(name).is_some(), "{}", name);
    }
    assert!(target_by_name("cobol").is_none());
}
