//! The canonical encoding is persisted and compared across processes, so its exact bytes are
//! pinned here.

use quill_data::{decode_values, encode_value, Datum};
use rust_decimal::Decimal;

fn encode(value: Datum) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(&mut buf, &[value]).unwrap();
    buf
}

#[test]
fn null_encoding() {
    assert_eq!(encode(Datum::None), vec![0, 0, 0, 0]);
}

#[test]
fn int_encoding() {
    assert_eq!(
        encode(Datum::Int(1)),
        vec![1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        encode(Datum::Int(-1)),
        vec![1, 0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255]
    );
}

#[test]
fn text_encoding() {
    assert_eq!(
        encode(Datum::from("ab")),
        vec![4, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, b'a', b'b']
    );
}

#[test]
fn encoding_is_deterministic() {
    let values = [
        Datum::from(Decimal::new(1234, 2)),
        Datum::Double(3.25),
        Datum::from(vec![1u8, 2, 3]),
        Datum::UnsignedInt(u64::MAX),
    ];
    for value in values {
        assert_eq!(encode(value.clone()), encode(value.clone()));
        assert_eq!(decode_values(&encode(value.clone())).unwrap(), vec![value]);
    }
}

#[test]
fn rows_concatenate() {
    let mut row = Vec::new();
    encode_value(&mut row, &[Datum::Int(1), Datum::None]).unwrap();
    let mut expected = encode(Datum::Int(1));
    expected.extend(encode(Datum::None));
    assert_eq!(row, expected);
}
