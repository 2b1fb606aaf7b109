//! Message Encoding Tests

use std::sync::Arc;

use pdlkit::wire::message::{read_nested, read_repeated_nested, write_nested};
use pdlkit::wire::{
    decode_from_slice, encode_to_vec, MaskPool, WireMessage, WireReader, WireWriter, NULL_TAG,
};
use pdlkit::PdlError;

use crate::fixtures::{full_sample, Empty, Impostor, Point, Sample, Wide};

// =============================================================================
// Byte Layout
// =============================================================================

#[test]
fn test_single_present_int() {
    let point = Point { x: 5, y: 0 };
    let bytes = encode_to_vec(&point).unwrap();
    assert_eq!(bytes, vec![0x01, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00]);
}

#[test]
fn test_default_message_is_mask_only() {
    assert_eq!(encode_to_vec(&Point::default()).unwrap(), vec![0, 0, 0, 0]);
    assert_eq!(encode_to_vec(&Sample::default()).unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn test_zero_field_message_is_empty() {
    let bytes = encode_to_vec(&Empty).unwrap();
    assert!(bytes.is_empty());
    assert_eq!(decode_from_slice::<Empty>(&bytes).unwrap(), Empty);
}

#[test]
fn test_string_field_layout() {
    let sample = Sample {
        name: "x".to_string(),
        ..Sample::default()
    };
    let bytes = encode_to_vec(&sample).unwrap();
    assert_eq!(bytes, vec![0x20, 0, 0, 0, 1, 0, 0, 0, b'x']);
}

#[test]
fn test_second_mask_word() {
    let mut wide = Wide::default();
    wide.values[35] = 7;

    let bytes = encode_to_vec(&wide).unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 0, 0x08, 0, 0, 0, 7, 0, 0, 0]);
    assert_eq!(decode_from_slice::<Wide>(&bytes).unwrap(), wide);
}

#[test]
fn test_wide_message_round_trip() {
    let mut wide = Wide::default();
    for (i, value) in wide.values.iter_mut().enumerate() {
        if i % 3 != 0 {
            *value = i as i32 * 11;
        }
    }
    let bytes = encode_to_vec(&wide).unwrap();
    assert_eq!(decode_from_slice::<Wide>(&bytes).unwrap(), wide);
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_full_sample_round_trip() {
    let sample = full_sample();
    let bytes = encode_to_vec(&sample).unwrap();
    assert_eq!(decode_from_slice::<Sample>(&bytes).unwrap(), sample);
}

#[test]
fn test_absent_fields_decode_as_defaults() {
    let sample = Sample {
        big: 12,
        flag: true,
        ..Sample::default()
    };
    let decoded: Sample = decode_from_slice(&encode_to_vec(&sample).unwrap()).unwrap();

    assert_eq!(decoded.big, 12);
    assert!(decoded.flag);
    assert_eq!(decoded.id, 0);
    assert!(decoded.name.is_empty());
    assert!(decoded.origin.is_none());
    assert!(decoded.path.is_empty());
}

#[test]
fn test_negative_zero_is_elided() {
    let sample = Sample {
        ratio: -0.0,
        score: -0.0,
        ..Sample::default()
    };
    assert_eq!(encode_to_vec(&sample).unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn test_pooled_encoding_matches_unpooled() {
    let pool = Arc::new(MaskPool::default());
    let sample = full_sample();

    let mut pooled = WireWriter::with_pool(Arc::clone(&pool));
    sample.write_message(&mut pooled).unwrap();
    assert_eq!(pooled.as_slice(), encode_to_vec(&sample).unwrap().as_slice());

    let bytes = pooled.into_vec();
    let mut r = WireReader::with_pool(&bytes, Arc::clone(&pool));
    assert_eq!(Sample::read_message(&mut r).unwrap(), sample);
    assert!(r.is_empty());

    // Sample and the nested points each borrowed a one-word mask
    assert!(pool.stats().reused > 0);
}

// =============================================================================
// Nested Objects
// =============================================================================

#[test]
fn test_null_nested_is_null_tag() {
    let mut w = WireWriter::new();
    write_nested::<Point>(None, &mut w).unwrap();
    assert_eq!(w.as_slice(), &NULL_TAG.to_le_bytes());

    let mut r = WireReader::new(w.as_slice());
    assert_eq!(read_nested::<Point>(&mut r).unwrap(), None);
}

#[test]
fn test_nested_tag_mismatch() {
    let mut w = WireWriter::new();
    write_nested(Some(&Impostor { x: 1, y: 2 }), &mut w).unwrap();

    let mut r = WireReader::new(w.as_slice());
    assert!(matches!(
        read_nested::<Point>(&mut r),
        Err(PdlError::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_element_in_repeated_nested() {
    let mut w = WireWriter::new();
    w.write_i32(2);
    w.write_i32(NULL_TAG);
    write_nested(Some(&Point { x: 9, y: 9 }), &mut w).unwrap();

    let mut r = WireReader::new(w.as_slice());
    let points = read_repeated_nested::<Point>(&mut r).unwrap();
    assert_eq!(points, vec![Point::default(), Point { x: 9, y: 9 }]);
}

// =============================================================================
// Malformed Input
// =============================================================================

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = encode_to_vec(&Point { x: 1, y: 1 }).unwrap();
    bytes.push(0);
    assert!(matches!(
        decode_from_slice::<Point>(&bytes),
        Err(PdlError::Decode(_))
    ));
}

#[test]
fn test_truncated_message_rejected() {
    let bytes = encode_to_vec(&full_sample()).unwrap();
    for cut in [0, 3, 4, 10, bytes.len() - 1] {
        assert!(
            decode_from_slice::<Sample>(&bytes[..cut]).is_err(),
            "decoding {} of {} bytes should fail",
            cut,
            bytes.len()
        );
    }
}

#[test]
fn test_negative_repeated_count_rejected() {
    // tags present with count -2
    let mut w = WireWriter::new();
    w.write_u32(1 << 8);
    w.write_i32(-2);
    assert!(matches!(
        decode_from_slice::<Sample>(w.as_slice()),
        Err(PdlError::Decode(_))
    ));
}
