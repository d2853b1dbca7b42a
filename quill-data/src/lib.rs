//! Scalar values and SQL field types.
//!
//! [`Datum`] is the runtime value that expressions evaluate to. Conversions between kinds of
//! values go through a [`StatementContext`], which decides whether lossy conversions are errors or
//! warnings.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use quill_errors::{QuillError, QuillResult};
use rust_decimal::{Decimal, RoundingStrategy};

pub mod codec;
mod collation;
mod context;
mod float;
mod integer;
mod serde;
mod text;
mod r#type;

pub use crate::codec::{decode_values, encode_value};
pub use crate::collation::Collation;
pub use crate::context::{SessionConfig, StatementContext};
pub use crate::r#type::{FieldType, TypeClass, TypeCode};

/// A runtime scalar value.
///
/// The derived-looking [`PartialEq`] implementation is *structural*: it is suitable for tests and
/// for comparing constants, but SQL comparison semantics (collations, mixed kinds, `NULL`) live in
/// [`Datum::compare`].
#[derive(Clone, Debug, Default)]
pub enum Datum {
    /// SQL `NULL`
    #[default]
    None,
    Int(i64),
    UnsignedInt(u64),
    Double(f64),
    Text(Arc<str>),
    ByteArray(Arc<[u8]>),
    Numeric(Arc<Decimal>),
}

/// Numeric ordering of doubles, under which `-0.0` equals `0.0`. NaN falls back to the total
/// order so that every pair of values is ordered.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

impl Datum {
    /// Returns `true` if this is SQL `NULL`
    pub fn is_none(&self) -> bool {
        matches!(self, Datum::None)
    }

    /// Returns `None` if this is SQL `NULL`, and a reference to `self` otherwise
    pub fn non_null(&self) -> Option<&Self> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }

    /// Returns `None` if this is SQL `NULL`, and `self` otherwise
    pub fn into_non_null(self) -> Option<Self> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }

    /// The name of this value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::None => "NULL",
            Datum::Int(_) => "BIGINT",
            Datum::UnsignedInt(_) => "BIGINT UNSIGNED",
            Datum::Double(_) => "DOUBLE",
            Datum::Text(_) => "TEXT",
            Datum::ByteArray(_) => "BLOB",
            Datum::Numeric(_) => "DECIMAL",
        }
    }

    /// Returns the integer held by this value without conversion, if it holds one that fits
    pub fn get_int64(&self) -> Option<i64> {
        match self {
            Datum::Int(v) => Some(*v),
            Datum::UnsignedInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the double held by this value without conversion
    pub fn get_f64(&self) -> Option<f64> {
        match self {
            Datum::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text held by this value without conversion
    pub fn get_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(&**s),
            _ => None,
        }
    }

    /// Returns the decimal held by this value without conversion
    pub fn get_decimal(&self) -> Option<&Decimal> {
        match self {
            Datum::Numeric(d) => Some(&**d),
            _ => None,
        }
    }

    /// Reads a byte array as UTF-8 for conversion to `target_type`
    fn utf8(&self, target_type: &str) -> QuillResult<&str> {
        match self {
            Datum::Text(s) => Ok(&**s),
            Datum::ByteArray(bytes) => {
                std::str::from_utf8(bytes).map_err(|e| QuillError::DatumConversionError {
                    src_type: self.kind_name().to_owned(),
                    target_type: target_type.to_owned(),
                    details: e.to_string(),
                })
            }
            _ => Err(QuillError::DatumConversionError {
                src_type: self.kind_name().to_owned(),
                target_type: target_type.to_owned(),
                details: "not a string value".to_owned(),
            }),
        }
    }

    /// Convert this value to its textual form.
    ///
    /// `NULL` converts to the empty string.
    pub fn to_text(&self) -> QuillResult<String> {
        Ok(match self {
            Datum::None => String::new(),
            Datum::Int(v) => v.to_string(),
            Datum::UnsignedInt(v) => v.to_string(),
            Datum::Double(f) => f.to_string(),
            Datum::Numeric(d) => d.to_string(),
            Datum::Text(s) => s.to_string(),
            Datum::ByteArray(_) => self.utf8("TEXT")?.to_owned(),
        })
    }

    /// Returns the truth value of this value, or `None` for `NULL`.
    pub fn to_bool(&self, ctx: &StatementContext) -> QuillResult<Option<bool>> {
        Ok(Some(match self {
            Datum::None => return Ok(None),
            Datum::Int(v) => *v != 0,
            Datum::UnsignedInt(v) => *v != 0,
            Datum::Double(f) => *f != 0.0,
            Datum::Numeric(d) => !d.is_zero(),
            Datum::Text(_) | Datum::ByteArray(_) => self.to_f64(ctx)? != 0.0,
        }))
    }

    /// Returns the natural field type of this value when it appears as a literal.
    pub fn infer_type(&self) -> FieldType {
        match self {
            Datum::None => FieldType::null(),
            Datum::Int(_) => FieldType::new(TypeCode::BigInt),
            Datum::UnsignedInt(_) => FieldType::new(TypeCode::BigInt).unsigned(),
            Datum::Double(_) => FieldType::new(TypeCode::Double),
            Datum::Text(_) => FieldType::new(TypeCode::VarChar),
            Datum::ByteArray(_) => FieldType::new(TypeCode::Blob),
            Datum::Numeric(d) => FieldType::new(TypeCode::NewDecimal)
                .with_decimal(u8::try_from(d.scale()).unwrap_or(u8::MAX)),
        }
    }

    /// Convert this value to the given field type, following its evaluation class.
    ///
    /// `NULL` converts to `NULL` for every type.
    pub fn coerce_to(&self, ty: &FieldType, ctx: &StatementContext) -> QuillResult<Datum> {
        if self.is_none() || ty.is_null_type() {
            return Ok(Datum::None);
        }
        Ok(match ty.class() {
            TypeClass::Int => {
                let v = self.to_i64(ctx)?;
                if ty.unsigned {
                    match u64::try_from(v) {
                        Ok(v) => Datum::UnsignedInt(v),
                        Err(_) => {
                            ctx.handle_overflow(QuillError::Overflow {
                                value: v.to_string(),
                                target_type: ty.to_string(),
                            })?;
                            Datum::UnsignedInt(0)
                        }
                    }
                } else {
                    Datum::Int(v)
                }
            }
            TypeClass::Real => Datum::Double(self.to_f64(ctx)?),
            TypeClass::Decimal => {
                let mut d = self.to_decimal(ctx)?;
                if let Some(scale) = ty.decimal {
                    d = d.round_dp_with_strategy(
                        u32::from(scale),
                        RoundingStrategy::MidpointAwayFromZero,
                    );
                }
                Datum::from(d)
            }
            TypeClass::String => {
                let s = self.to_text()?;
                match ty.flen {
                    Some(flen) if s.chars().count() > flen as usize => {
                        ctx.handle_truncate(QuillError::Truncated {
                            value: s.clone(),
                            target_type: ty.to_string(),
                        })?;
                        Datum::from(s.chars().take(flen as usize).collect::<String>())
                    }
                    _ => Datum::from(s),
                }
            }
        })
    }

    /// Compare two values with SQL semantics.
    ///
    /// `NULL` sorts before every other value and equal to itself. Numbers compare numerically
    /// regardless of kind, strings compare under the context's collation, and a string compared to
    /// a number is converted to that number's kind first.
    pub fn compare(&self, ctx: &StatementContext, other: &Datum) -> QuillResult<Ordering> {
        use Datum::*;

        Ok(match (self, other) {
            (None, None) => Ordering::Equal,
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,

            (Int(a), Int(b)) => a.cmp(b),
            (UnsignedInt(a), UnsignedInt(b)) => a.cmp(b),
            (Int(a), UnsignedInt(b)) => i128::from(*a).cmp(&i128::from(*b)),
            (UnsignedInt(a), Int(b)) => i128::from(*a).cmp(&i128::from(*b)),

            (Double(a), Double(b)) => cmp_f64(*a, *b),
            (Double(a), Int(_) | UnsignedInt(_)) => cmp_f64(*a, other.to_f64(ctx)?),
            (Int(_) | UnsignedInt(_), Double(b)) => cmp_f64(self.to_f64(ctx)?, *b),

            (Numeric(a), Numeric(b)) => a.cmp(b),
            (Numeric(a), Int(_) | UnsignedInt(_)) => (**a).cmp(&other.to_decimal(ctx)?),
            (Int(_) | UnsignedInt(_), Numeric(b)) => self.to_decimal(ctx)?.cmp(b),
            (Numeric(_), Double(b)) => cmp_f64(self.to_f64(ctx)?, *b),
            (Double(a), Numeric(_)) => cmp_f64(*a, other.to_f64(ctx)?),

            (Text(a), Text(b)) => ctx.collation.compare_strs(a, b),
            (ByteArray(a), ByteArray(b)) => a.cmp(b),
            (Text(a), ByteArray(b)) => a.as_bytes().cmp(&**b),
            (ByteArray(a), Text(b)) => (**a).cmp(b.as_bytes()),

            (Text(_) | ByteArray(_), Numeric(b)) => self.to_decimal(ctx)?.cmp(b),
            (Numeric(a), Text(_) | ByteArray(_)) => (**a).cmp(&other.to_decimal(ctx)?),
            (Text(_) | ByteArray(_), _) => cmp_f64(self.to_f64(ctx)?, other.to_f64(ctx)?),
            (_, Text(_) | ByteArray(_)) => cmp_f64(self.to_f64(ctx)?, other.to_f64(ctx)?),
        })
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::None, Datum::None) => true,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::UnsignedInt(a), Datum::UnsignedInt(b)) => a == b,
            (Datum::Double(a), Datum::Double(b)) => a.to_bits() == b.to_bits(),
            (Datum::Text(a), Datum::Text(b)) => a == b,
            (Datum::ByteArray(a), Datum::ByteArray(b)) => a == b,
            (Datum::Numeric(a), Datum::Numeric(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::None => write!(f, "NULL"),
            Datum::Int(v) => write!(f, "{v}"),
            Datum::UnsignedInt(v) => write!(f, "{v}"),
            // keeps a fractional part or exponent, unlike `Int`
            Datum::Double(v) => write!(f, "{v:?}"),
            Datum::Text(s) => write!(f, "{s}"),
            Datum::ByteArray(bytes) => {
                write!(f, "0x{}", bytes.iter().map(|b| format!("{b:02x}")).join(""))
            }
            Datum::Numeric(d) => write!(f, "{d}"),
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int(v.into())
    }
}

impl From<u64> for Datum {
    fn from(v: u64) -> Self {
        Datum::UnsignedInt(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Double(v)
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Int(b.into())
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.into())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s.into())
    }
}

impl From<Vec<u8>> for Datum {
    fn from(bytes: Vec<u8>) -> Self {
        Datum::ByteArray(bytes.into())
    }
}

impl From<Decimal> for Datum {
    fn from(d: Decimal) -> Self {
        Datum::Numeric(Arc::new(d))
    }
}

impl<T> From<Option<T>> for Datum
where
    Datum: From<T>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Datum::None, Datum::from)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn null_sorts_first() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::None.compare(&ctx, &Datum::Int(i64::MIN)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Datum::None.compare(&ctx, &Datum::None).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Datum::from("").compare(&ctx, &Datum::None).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn mixed_numeric_comparison() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::Int(-1)
                .compare(&ctx, &Datum::UnsignedInt(u64::MAX))
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Datum::Int(2).compare(&ctx, &Datum::Double(2.0)).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Datum::from(Decimal::new(15, 1))
                .compare(&ctx, &Datum::Int(1))
                .unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn signed_zeros_compare_equal() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::Double(-0.0).compare(&ctx, &Datum::Double(0.0)).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Datum::Double(-0.0).compare(&ctx, &Datum::Int(0)).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Datum::from(Decimal::ZERO)
                .compare(&ctx, &Datum::Double(-0.0))
                .unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Datum::Double(-0.5).compare(&ctx, &Datum::Double(0.0)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn doubles_display_as_floats() {
        assert_eq!(Datum::Double(1.0).to_string(), "1.0");
        assert_eq!(Datum::Int(1).to_string(), "1");
        assert_eq!(Datum::Double(0.25).to_string(), "0.25");
        assert_eq!(Datum::Double(-0.0).to_string(), "-0.0");
        // textual conversion is unaffected
        assert_eq!(Datum::Double(1.0).to_text().unwrap(), "1");
    }

    #[test]
    fn string_comparison_uses_collation() {
        let bin = StatementContext::strict();
        assert_ne!(
            Datum::from("abc")
                .compare(&bin, &Datum::from("ABC"))
                .unwrap(),
            Ordering::Equal
        );

        let ci = StatementContext {
            collation: Collation::Utf8GeneralCi,
            ..Default::default()
        };
        assert_eq!(
            Datum::from("abc").compare(&ci, &Datum::from("ABC")).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn string_number_comparison() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::from("10").compare(&ctx, &Datum::Int(9)).unwrap(),
            Ordering::Greater
        );
        assert!(Datum::from("10x").compare(&ctx, &Datum::Int(9)).is_err());
    }

    #[test]
    fn truthiness() {
        let ctx = StatementContext::strict();
        assert_eq!(Datum::Int(0).to_bool(&ctx).unwrap(), Some(false));
        assert_eq!(Datum::Double(0.1).to_bool(&ctx).unwrap(), Some(true));
        assert_eq!(Datum::from("0.0").to_bool(&ctx).unwrap(), Some(false));
        assert_eq!(Datum::None.to_bool(&ctx).unwrap(), None);
    }

    #[test]
    fn coerce_to_types() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::from("12")
                .coerce_to(&FieldType::new(TypeCode::Int), &ctx)
                .unwrap(),
            Datum::Int(12)
        );
        assert_eq!(
            Datum::Double(1.255)
                .coerce_to(
                    &FieldType::new(TypeCode::NewDecimal)
                        .with_flen(10)
                        .with_decimal(1),
                    &ctx
                )
                .unwrap(),
            Datum::from(Decimal::new(13, 1))
        );
        assert_eq!(
            Datum::Int(7)
                .coerce_to(&FieldType::new(TypeCode::VarChar), &ctx)
                .unwrap(),
            Datum::from("7")
        );
        assert_eq!(
            Datum::Int(7).coerce_to(&FieldType::null(), &ctx).unwrap(),
            Datum::None
        );
        assert!(Datum::Int(-1)
            .coerce_to(&FieldType::new(TypeCode::BigInt).unsigned(), &ctx)
            .is_err());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Datum::Double(1.0), Datum::Double(1.0));
        assert_ne!(Datum::Int(1), Datum::UnsignedInt(1));
        assert_eq!(Datum::from(Some(3i64)), Datum::Int(3));
        assert_eq!(Datum::from(None::<i64>), Datum::None);
    }

    #[test]
    fn display() {
        assert_eq!(Datum::None.to_string(), "NULL");
        assert_eq!(Datum::from(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Datum::from(Decimal::new(-125, 2)).to_string(), "-1.25");
    }

    #[test]
    fn infer_type() {
        assert_eq!(Datum::None.infer_type(), FieldType::null());
        assert_eq!(Datum::Int(1).infer_type().class(), TypeClass::Int);
        assert_eq!(Datum::from("x").infer_type().tp, TypeCode::VarChar);
    }
}
