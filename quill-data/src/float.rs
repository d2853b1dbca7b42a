use std::str::FromStr;

use quill_errors::{QuillError, QuillResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::text::{float_prefix, NumericPrefix};
use crate::{Datum, StatementContext};

/// Most fractional digits a decimal can hold
const MAX_DECIMAL_SCALE: usize = 28;

fn truncated(s: &str, target_type: &str) -> QuillError {
    QuillError::Truncated {
        value: s.to_owned(),
        target_type: target_type.to_owned(),
    }
}

fn overflow(value: impl ToString, target_type: &str) -> QuillError {
    QuillError::Overflow {
        value: value.to_string(),
        target_type: target_type.to_owned(),
    }
}

pub(crate) fn text_to_f64(s: &str, ctx: &StatementContext) -> QuillResult<f64> {
    let trimmed = s.trim();
    let prefix = float_prefix(trimmed);

    let mut value = if prefix.is_empty() {
        0.0
    } else {
        prefix
            .text
            .parse::<f64>()
            .map_err(|e| QuillError::DatumConversionError {
                src_type: "TEXT".to_owned(),
                target_type: "DOUBLE".to_owned(),
                details: e.to_string(),
            })?
    };
    if value.is_infinite() {
        ctx.handle_overflow(overflow(prefix.text, "DOUBLE"))?;
        value = if value.is_sign_negative() {
            f64::MIN
        } else {
            f64::MAX
        };
    }

    if prefix.text.len() != trimmed.len() {
        ctx.handle_truncate(truncated(s, "DOUBLE"))?;
    }
    Ok(value)
}

pub(crate) fn text_to_decimal(s: &str, ctx: &StatementContext) -> QuillResult<Decimal> {
    let trimmed = s.trim();
    let prefix = float_prefix(trimmed);

    let value = if prefix.is_empty() {
        Decimal::ZERO
    } else {
        let mantissa = prefix.mantissa();
        let parsed = match prefix.exponent {
            Some(exp) if exp.starts_with('-') => {
                let shift = exp[1..].parse::<usize>().unwrap_or(usize::MAX);
                let (plain, dropped_digits) = shift_point_left(&prefix, shift);
                if dropped_digits {
                    ctx.handle_truncate(truncated(s, "DECIMAL"))?;
                }
                Decimal::from_str(&plain)
            }
            Some(exp) => Decimal::from_scientific(&format!("{mantissa}e{exp}")),
            None => Decimal::from_str(&mantissa),
        };
        match parsed {
            Ok(d) => d,
            Err(_) => {
                ctx.handle_overflow(overflow(prefix.text, "DECIMAL"))?;
                if prefix.negative {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                }
            }
        }
    };

    if prefix.text.len() != trimmed.len() {
        ctx.handle_truncate(truncated(s, "DECIMAL"))?;
    }
    Ok(value)
}

/// Render the mantissa of `prefix` divided by `10^shift` in plain notation, keeping at most
/// [`MAX_DECIMAL_SCALE`] fractional digits.
///
/// Also returns whether any nonzero digit was dropped.
fn shift_point_left(prefix: &NumericPrefix<'_>, shift: usize) -> (String, bool) {
    let digits = format!("{}{}", prefix.int_digits, prefix.frac_digits);
    let point = prefix.int_digits.len();

    let (int_part, mut frac_part) = if shift >= point {
        let leading_zeros = shift - point;
        if leading_zeros >= MAX_DECIMAL_SCALE {
            return ("0".to_owned(), digits.bytes().any(|b| b != b'0'));
        }
        ("0".to_owned(), "0".repeat(leading_zeros) + &digits)
    } else {
        let (int_part, frac_part) = digits.split_at(point - shift);
        (int_part.to_owned(), frac_part.to_owned())
    };

    let dropped = frac_part.len() > MAX_DECIMAL_SCALE
        && frac_part.as_bytes()[MAX_DECIMAL_SCALE..]
            .iter()
            .any(|b| *b != b'0');
    frac_part.truncate(MAX_DECIMAL_SCALE);

    let mut out = String::with_capacity(int_part.len() + frac_part.len() + 2);
    if prefix.negative {
        out.push('-');
    }
    out.push_str(&int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    (out, dropped)
}

fn f64_to_decimal(f: f64, ctx: &StatementContext) -> QuillResult<Decimal> {
    if f.is_nan() {
        return Err(QuillError::DatumConversionError {
            src_type: "DOUBLE".to_owned(),
            target_type: "DECIMAL".to_owned(),
            details: "NaN has no decimal representation".to_owned(),
        });
    }
    match Decimal::from_f64(f) {
        Some(d) => Ok(d),
        None => {
            ctx.handle_overflow(overflow(f, "DECIMAL"))?;
            Ok(if f.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            })
        }
    }
}

impl Datum {
    /// Convert this value to a double, applying the truncation and overflow policy of `ctx`.
    ///
    /// `NULL` converts to `0.0`.
    pub fn to_f64(&self, ctx: &StatementContext) -> QuillResult<f64> {
        match self {
            Datum::None => Ok(0.0),
            Datum::Int(v) => Ok(*v as f64),
            Datum::UnsignedInt(v) => Ok(*v as f64),
            Datum::Double(f) => Ok(*f),
            Datum::Numeric(d) => d.to_f64().ok_or_else(|| QuillError::DatumConversionError {
                src_type: "DECIMAL".to_owned(),
                target_type: "DOUBLE".to_owned(),
                details: format!("{d} is not representable as a double"),
            }),
            Datum::Text(s) => text_to_f64(s, ctx),
            Datum::ByteArray(_) => text_to_f64(self.utf8("DOUBLE")?, ctx),
        }
    }

    /// Convert this value to a decimal, applying the truncation and overflow policy of `ctx`.
    ///
    /// `NULL` converts to zero.
    pub fn to_decimal(&self, ctx: &StatementContext) -> QuillResult<Decimal> {
        match self {
            Datum::None => Ok(Decimal::ZERO),
            Datum::Int(v) => Ok(Decimal::from(*v)),
            Datum::UnsignedInt(v) => Ok(Decimal::from(*v)),
            Datum::Double(f) => f64_to_decimal(*f, ctx),
            Datum::Numeric(d) => Ok(**d),
            Datum::Text(s) => text_to_decimal(s, ctx),
            Datum::ByteArray(_) => text_to_decimal(self.utf8("DECIMAL")?, ctx),
        }
    }
}
