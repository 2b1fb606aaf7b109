//! Primitive Encoding Tests

use pdlkit::wire::{Timestamp, Vector3, WireReader, WireValue, WireWriter, NULL_LENGTH};
use pdlkit::PdlError;

#[test]
fn test_fixed_width_little_endian() {
    let mut w = WireWriter::new();
    w.write_i32(-2);
    w.write_i64(1);
    w.write_f32(1.0);
    w.write_bool(true);

    assert_eq!(
        w.as_slice(),
        &[
            0xFE, 0xFF, 0xFF, 0xFF, // i32 -2
            0x01, 0, 0, 0, 0, 0, 0, 0, // i64 1
            0x00, 0x00, 0x80, 0x3F, // f32 1.0
            0x01, // bool
        ]
    );
}

#[test]
fn test_null_string() {
    let mut w = WireWriter::new();
    w.write_str(None).unwrap();
    w.write_str(Some("")).unwrap();
    assert_eq!(w.as_slice(), &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);

    let mut r = WireReader::new(w.as_slice());
    assert_eq!(r.read_str().unwrap(), None);
    assert_eq!(r.read_str().unwrap(), Some(String::new()));
    assert!(r.is_empty());
}

#[test]
fn test_null_string_reads_as_empty_field() {
    let bytes = NULL_LENGTH.to_le_bytes();
    let mut r = WireReader::new(&bytes);
    assert_eq!(String::read_from(&mut r).unwrap(), "");
}

#[test]
fn test_vector_and_timestamp() {
    let mut w = WireWriter::new();
    Vector3::new(1.0, 2.0, 3.0).write_to(&mut w).unwrap();
    Timestamp::from_millis(-5).write_to(&mut w).unwrap();
    assert_eq!(w.len(), 12 + 8);

    let mut r = WireReader::new(w.as_slice());
    assert_eq!(Vector3::read_from(&mut r).unwrap(), Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(Timestamp::read_from(&mut r).unwrap().millis, -5);
}

#[test]
fn test_invalid_bool_byte() {
    let mut r = WireReader::new(&[2]);
    assert!(matches!(r.read_bool(), Err(PdlError::Decode(_))));
}

#[test]
fn test_invalid_utf8() {
    let mut w = WireWriter::new();
    w.write_bytes(Some(&[0xC3, 0x28])).unwrap();
    let mut r = WireReader::new(w.as_slice());
    assert!(matches!(r.read_str(), Err(PdlError::Decode(_))));
}

#[test]
fn test_string_length_past_end() {
    let mut w = WireWriter::new();
    w.write_i32(10);
    w.write_u8(b'a');
    let mut r = WireReader::new(w.as_slice());
    assert!(matches!(
        r.read_str(),
        Err(PdlError::UnexpectedEof {
            needed: 10,
            remaining: 1
        })
    ));
}

#[test]
fn test_position_tracks_consumed_bytes() {
    let mut w = WireWriter::new();
    w.write_i64(7);
    w.write_i32(8);
    let mut r = WireReader::new(w.as_slice());

    r.read_i64().unwrap();
    assert_eq!(r.position(), 8);
    assert_eq!(r.remaining(), 4);
}
