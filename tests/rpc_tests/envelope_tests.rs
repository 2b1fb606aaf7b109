//! Envelope Tests

use pdlkit::protocol::{
    decode_method_key, decode_response, encode_error, encode_request, encode_response,
    split_method_key, ErrorCode, RpcError, RpcResponse,
};
use pdlkit::wire::{downcast, WireReader, WireWriter};
use pdlkit::PdlError;

use crate::fixtures::{registry, HelloReply, HelloRequest};

#[test]
fn test_request_layout() {
    let registry = registry();
    let mut w = WireWriter::new();
    let request = HelloRequest {
        name: "Ann".to_string(),
    };
    encode_request(&registry, "Greeter.Hello", Some(&request), &mut w).unwrap();

    let bytes = w.as_slice();
    assert_eq!(&bytes[..4], &13i32.to_le_bytes());
    assert_eq!(&bytes[4..17], b"Greeter.Hello");
    assert_eq!(&bytes[17..21], &0x1000_0001i32.to_le_bytes());

    let mut r = WireReader::new(bytes);
    assert_eq!(decode_method_key(&mut r).unwrap(), "Greeter.Hello");
    let object = registry.read_object(&mut r).unwrap().unwrap();
    assert_eq!(downcast::<HelloRequest>(object).unwrap(), request);
    assert!(r.is_empty());
}

#[test]
fn test_null_request_payload() {
    let registry = registry();
    let mut w = WireWriter::new();
    encode_request(&registry, "Greeter.Hello", None, &mut w).unwrap();

    let mut r = WireReader::new(w.as_slice());
    decode_method_key(&mut r).unwrap();
    assert!(registry.read_object(&mut r).unwrap().is_none());
}

#[test]
fn test_null_method_key_is_protocol_error() {
    let mut w = WireWriter::new();
    w.write_str(None).unwrap();

    let mut r = WireReader::new(w.as_slice());
    assert!(matches!(decode_method_key(&mut r), Err(PdlError::Protocol(_))));
}

#[test]
fn test_ok_response_round_trip() {
    let registry = registry();
    let reply = HelloReply {
        message: "Hello, Ann".to_string(),
    };
    let mut w = WireWriter::new();
    encode_response(&registry, &RpcResponse::Ok(Some(Box::new(reply.clone()))), &mut w).unwrap();
    assert_eq!(w.as_slice()[0], 0x00);

    let mut r = WireReader::new(w.as_slice());
    match decode_response(&registry, &mut r).unwrap() {
        RpcResponse::Ok(Some(object)) => assert_eq!(downcast::<HelloReply>(object).unwrap(), reply),
        other => panic!("Expected Ok, got {:?}", other),
    }
}

#[test]
fn test_error_response_layout() {
    let registry = registry();
    let mut w = WireWriter::new();
    encode_error(&RpcError::bad_request("no"), &mut w).unwrap();

    assert_eq!(w.as_slice(), &[0x01, 3, 0, 0, 0, 2, 0, 0, 0, b'n', b'o']);

    let mut r = WireReader::new(w.as_slice());
    let response = decode_response(&registry, &mut r).unwrap();
    let err = response.error().unwrap();
    assert_eq!(err.code, ErrorCode::BadRequest);
    assert_eq!(err.message, "no");
}

#[test]
fn test_unknown_status_byte() {
    let registry = registry();
    let mut r = WireReader::new(&[0x07]);
    assert!(matches!(decode_response(&registry, &mut r), Err(PdlError::Protocol(_))));
}

#[test]
fn test_unknown_error_code_maps_to_internal() {
    assert_eq!(ErrorCode::from_code(3), ErrorCode::BadRequest);
    assert_eq!(ErrorCode::from_code(99), ErrorCode::Internal);
    assert_eq!(ErrorCode::from_code(-1), ErrorCode::Internal);
}

#[test]
fn test_split_method_key() {
    assert_eq!(split_method_key("Greeter.Hello"), Some(("Greeter", "Hello")));
    assert_eq!(split_method_key("a.b.c"), Some(("a", "b.c")));
    assert_eq!(split_method_key("NoDot"), None);
}

#[test]
fn test_rpc_error_converts_to_remote() {
    let err: PdlError = RpcError::handler("boom").into();
    match err {
        PdlError::Remote { code, message } => {
            assert_eq!(code, ErrorCode::HandlerFailed);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected remote error, got {:?}", other),
    }
}
