//! Snapshot Tests

use std::fs;

use pdlkit::schema::snapshot::{self, HEADER_SIZE, MAGIC};
use pdlkit::schema::{self as pdl, parse};
use pdlkit::PdlError;
use tempfile::tempdir;

const SOURCE: &str = r#"
namespace demo
option header = "frozen"
message Req { string name = 1; repeated int64 ids = 2; }
message Resp { Req echo = 1; }
service Greeter { rpc Hello(Req) returns (Resp); }
"#;

#[test]
fn test_snapshot_preserves_definition() {
    let def = parse(SOURCE).definition;
    let bytes = snapshot::encode(&def).unwrap();

    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(snapshot::decode(&bytes).unwrap(), def);
}

#[test]
fn test_snapshot_file_loads_through_schema_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.pdlc");
    let def = parse(SOURCE).definition;

    snapshot::save(&def, &path).unwrap();
    let loaded = pdl::load(&path).unwrap();

    assert_eq!(loaded.definition, def);
    assert!(loaded.diagnostics.is_empty());
}

#[test]
fn test_schema_load_parses_source_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.pdl");
    fs::write(&path, SOURCE).unwrap();

    let loaded = pdl::load(&path).unwrap();
    assert_eq!(loaded.definition.messages().len(), 2);
}

#[test]
fn test_corrupted_body_is_rejected() {
    let def = parse(SOURCE).definition;
    let mut bytes = snapshot::encode(&def).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    match snapshot::decode(&bytes) {
        Err(PdlError::Snapshot(msg)) => assert!(msg.contains("checksum")),
        other => panic!("Expected checksum error, got {:?}", other),
    }
}

#[test]
fn test_bad_magic_and_version() {
    let def = parse(SOURCE).definition;
    let good = snapshot::encode(&def).unwrap();

    let mut bad_magic = good.clone();
    bad_magic[0] = b'X';
    assert!(matches!(snapshot::decode(&bad_magic), Err(PdlError::Snapshot(_))));

    let mut bad_version = good;
    bad_version[4] = 99;
    match snapshot::decode(&bad_version) {
        Err(PdlError::Snapshot(msg)) => assert!(msg.contains("version")),
        other => panic!("Expected version error, got {:?}", other),
    }
}

#[test]
fn test_truncated_snapshot() {
    assert!(snapshot::decode(&MAGIC[..]).is_err());
    assert!(snapshot::decode(&[0u8; HEADER_SIZE - 1]).is_err());
}
