//! Canonical binary encoding of values.
//!
//! Encoded bytes are deterministic: values which compare equal within a kind always encode to the
//! same bytes, which makes the encoding suitable as a hash or deduplication key.

use std::io::Cursor;

use quill_errors::{QuillError, QuillResult};
use crate::Datum;

fn encoding_error(what: &str, err: bincode::Error) -> QuillError {
    QuillError::EncodingError {
        what: what.to_owned(),
        message: err.to_string(),
    }
}

/// Append the canonical encoding of each of `values` to `buf`.
pub fn encode_value(buf: &mut Vec<u8>, values: &[Datum]) -> QuillResult<()> {
    for value in values {
        bincode::serialize_into(&mut *buf, value).map_err(|e| encoding_error("value", e))?;
    }
    Ok(())
}

/// Decode a sequence of values previously written by [`encode_value`].
pub fn decode_values(bytes: &[u8]) -> QuillResult<Vec<Datum>> {
    let mut cursor = Cursor::new(bytes);
    let mut values = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        values.push(
            bincode::deserialize_from(&mut cursor).map_err(|e| encoding_error("value", e))?,
        );
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn encode_then_decode_row() {
        let row = vec![Datum::Int(1), Datum::None, Datum::from("x")];
        let mut buf = Vec::new();
        encode_value(&mut buf, &row).unwrap();
        assert_eq!(decode_values(&buf).unwrap(), row);
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode_values(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut buf = Vec::new();
        encode_value(&mut buf, &[Datum::Int(300)]).unwrap();
        buf.pop();
        assert!(matches!(
            decode_values(&buf),
            Err(QuillError::EncodingError { .. })
        ));
    }
}
