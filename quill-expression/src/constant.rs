use std::cmp::Ordering;
use std::fmt;

use lazy_static::lazy_static;
use quill_data::codec::encode_value;
use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::QuillResult;
use tracing::error;

use crate::{Expr, Expression, Schema};

lazy_static! {
    /// The constant `1`, typed `tinyint`
    pub static ref ONE: Constant = Constant::new(Datum::Int(1), FieldType::tiny());
    /// The constant `0`, typed `tinyint`
    pub static ref ZERO: Constant = Constant::new(Datum::Int(0), FieldType::tiny());
    /// The constant `NULL`, typed `tinyint`
    pub static ref NULL: Constant = Constant::new(Datum::None, FieldType::tiny());
}

/// A literal value together with its declared type.
///
/// Both parts are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    value: Datum,
    ret_type: FieldType,
}

impl Constant {
    pub fn new(value: Datum, ret_type: FieldType) -> Self {
        Self { value, ret_type }
    }

    /// Construct a constant whose type is inferred from the value
    pub fn from_datum(value: Datum) -> Self {
        let ret_type = value.infer_type();
        Self { value, ret_type }
    }

    pub fn value(&self) -> &Datum {
        &self.value
    }

    pub fn into_value(self) -> Datum {
        self.value
    }
}

/// Leading byte of a column's hash code. Constant hash codes start with a datum variant tag, which
/// is always smaller.
pub(crate) const COLUMN_HASH_TAG: u8 = 0xfe;
/// Leading byte of a function application's hash code
pub(crate) const FUNCTION_HASH_TAG: u8 = 0xff;

/// Append the canonical encoding of `value` to `buf`. `-0.0` encodes as `0.0`, since the two
/// compare equal.
///
/// Encoding a [`Datum`] into memory cannot fail for any value the type can hold; should it ever,
/// the failure is logged and `buf` is left as it was.
pub(crate) fn encode_for_hash(buf: &mut Vec<u8>, value: &Datum) {
    let len = buf.len();
    let zero = Datum::Double(0.0);
    let value = match value {
        Datum::Double(v) if *v == 0.0 => &zero,
        value => value,
    };
    if let Err(error) = encode_value(buf, std::slice::from_ref(value)) {
        error!(%error, %value, "Failed to encode value for hashing");
        buf.truncate(len);
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Datum::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            value => write!(f, "{value}"),
        }
    }
}

impl Expression for Constant {
    fn eval(&self, _row: &[Datum]) -> QuillResult<Datum> {
        Ok(self.value.clone())
    }

    fn ty(&self) -> &FieldType {
        &self.ret_type
    }

    fn hash_code(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_for_hash(&mut buf, &self.value);
        buf
    }

    fn equals(&self, other: &Expr, ctx: &StatementContext) -> bool {
        match other {
            Expr::Constant(other) => matches!(
                self.value.compare(ctx, &other.value),
                Ok(Ordering::Equal)
            ),
            _ => false,
        }
    }

    fn is_correlated(&self) -> bool {
        false
    }

    fn decorrelate(&self, _schema: &Schema) -> Expr {
        Expr::Constant(self.clone())
    }

    fn resolve_indices(&mut self, _schema: &Schema) -> QuillResult<()> {
        Ok(())
    }
}
