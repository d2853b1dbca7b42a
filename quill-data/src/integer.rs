use quill_errors::{QuillError, QuillResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::text::int_prefix;
use crate::{Datum, StatementContext};

const TARGET: &str = "BIGINT";

fn overflow(value: impl ToString) -> QuillError {
    QuillError::Overflow {
        value: value.to_string(),
        target_type: TARGET.to_owned(),
    }
}

pub(crate) fn text_to_i64(s: &str, ctx: &StatementContext) -> QuillResult<i64> {
    let trimmed = s.trim();
    let prefix = int_prefix(trimmed);

    let value = if prefix.is_empty() {
        0
    } else {
        match prefix.text.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                ctx.handle_overflow(overflow(prefix.text))?;
                if prefix.negative {
                    i64::MIN
                } else {
                    i64::MAX
                }
            }
        }
    };

    if prefix.text.len() != trimmed.len() {
        ctx.handle_truncate(QuillError::Truncated {
            value: s.to_owned(),
            target_type: "INTEGER".to_owned(),
        })?;
    }
    Ok(value)
}

/// Rounds half away from zero, then range-checks.
pub(crate) fn f64_to_i64(f: f64, ctx: &StatementContext) -> QuillResult<i64> {
    if f.is_nan() {
        return Err(QuillError::DatumConversionError {
            src_type: "DOUBLE".to_owned(),
            target_type: TARGET.to_owned(),
            details: "NaN has no integer representation".to_owned(),
        });
    }
    let rounded = f.round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if rounded >= i64::MAX as f64 {
        ctx.handle_overflow(overflow(f))?;
        Ok(i64::MAX)
    } else if rounded < i64::MIN as f64 {
        ctx.handle_overflow(overflow(f))?;
        Ok(i64::MIN)
    } else {
        Ok(rounded as i64)
    }
}

pub(crate) fn decimal_to_i64(d: &Decimal, ctx: &StatementContext) -> QuillResult<i64> {
    match d
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
    {
        Some(v) => Ok(v),
        None => {
            ctx.handle_overflow(overflow(d))?;
            Ok(if d.is_sign_negative() {
                i64::MIN
            } else {
                i64::MAX
            })
        }
    }
}

impl Datum {
    /// Convert this value to a signed 64-bit integer, applying the truncation and overflow policy
    /// of `ctx`.
    ///
    /// `NULL` converts to `0`; callers are expected to check for `NULL` first.
    pub fn to_i64(&self, ctx: &StatementContext) -> QuillResult<i64> {
        match self {
            Datum::None => Ok(0),
            Datum::Int(v) => Ok(*v),
            Datum::UnsignedInt(v) => match i64::try_from(*v) {
                Ok(v) => Ok(v),
                Err(_) => {
                    ctx.handle_overflow(overflow(v))?;
                    Ok(i64::MAX)
                }
            },
            Datum::Double(f) => f64_to_i64(*f, ctx),
            Datum::Numeric(d) => decimal_to_i64(d, ctx),
            Datum::Text(s) => text_to_i64(s, ctx),
            Datum::ByteArray(_) => text_to_i64(self.utf8(TARGET)?, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_pass_through() {
        let ctx = StatementContext::strict();
        assert_eq!(Datum::Int(-5).to_i64(&ctx).unwrap(), -5);
        assert_eq!(Datum::UnsignedInt(5).to_i64(&ctx).unwrap(), 5);
        assert_eq!(Datum::None.to_i64(&ctx).unwrap(), 0);
    }

    #[test]
    fn unsigned_overflow() {
        let strict = StatementContext::strict();
        assert!(matches!(
            Datum::UnsignedInt(u64::MAX).to_i64(&strict),
            Err(QuillError::Overflow { .. })
        ));

        let lenient = StatementContext::lenient();
        assert_eq!(
            Datum::UnsignedInt(u64::MAX).to_i64(&lenient).unwrap(),
            i64::MAX
        );
        assert_eq!(lenient.warning_count(), 1);
    }

    #[test]
    fn doubles_round_half_away_from_zero() {
        let ctx = StatementContext::strict();
        assert_eq!(Datum::Double(2.5).to_i64(&ctx).unwrap(), 3);
        assert_eq!(Datum::Double(-2.5).to_i64(&ctx).unwrap(), -3);
        assert_eq!(Datum::Double(2.4).to_i64(&ctx).unwrap(), 2);
        assert!(Datum::Double(1e20).to_i64(&ctx).is_err());
        assert!(Datum::Double(f64::NAN).to_i64(&ctx).is_err());
    }

    #[test]
    fn decimals_round() {
        let ctx = StatementContext::strict();
        assert_eq!(
            Datum::from(Decimal::new(-155, 1)).to_i64(&ctx).unwrap(),
            -16
        );
        assert_eq!(Datum::from(Decimal::new(154, 1)).to_i64(&ctx).unwrap(), 15);
    }

    #[test]
    fn text_prefixes() {
        let strict = StatementContext::strict();
        assert_eq!(Datum::from(" 42 ").to_i64(&strict).unwrap(), 42);
        assert!(matches!(
            Datum::from("42abc").to_i64(&strict),
            Err(QuillError::Truncated { .. })
        ));

        let lenient = StatementContext::lenient();
        assert_eq!(Datum::from("42abc").to_i64(&lenient).unwrap(), 42);
        assert_eq!(Datum::from("abc").to_i64(&lenient).unwrap(), 0);
        assert_eq!(
            Datum::from("99999999999999999999").to_i64(&lenient).unwrap(),
            i64::MAX
        );
        assert_eq!(
            Datum::from("-99999999999999999999").to_i64(&lenient).unwrap(),
            i64::MIN
        );
        assert_eq!(lenient.warning_count(), 4);
    }
}
